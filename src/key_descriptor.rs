//! # Certificate Selection
//!
//! Locates the `KeyDescriptor` collection of a metadata tree and resolves the
//! embedded certificate bodies by role.
//!
//! A descriptor looks like this once parsed:
//!
//! ```text
//! md:KeyDescriptor
//! ├── @use: "signing"
//! └── ds:KeyInfo
//!     └── ds:X509Data
//!         └── ds:X509Certificate: "MIIC..."
//! ```
//!
//! Only the first collection found in document order is consulted.

use std::collections::BTreeMap;
use std::slice;

use crate::common::{
    MetadataError, MetadataResult, KEY_DESCRIPTOR, ROLE_ALL, ROLE_UNKNOWN, USE_ATTRIBUTE,
};
use crate::metadata_tree::MetadataNode;

/// Raw certificate bodies keyed by role.
pub type CertificateBodies = BTreeMap<String, String>;

const CERTIFICATE_PATH: [&str; 3] = ["KeyInfo", "X509Data", "X509Certificate"];

/// Read-only view over one descriptor node.
#[derive(Clone, Copy, Debug)]
pub struct KeyDescriptor<'a> {
    node: &'a MetadataNode,
}

impl<'a> KeyDescriptor<'a> {
    pub fn new(node: &'a MetadataNode) -> Self {
        Self { node }
    }

    /// The declared `use` of the descriptor, if any.
    pub fn declared_role(&self) -> Option<&'a str> {
        self.node.get(USE_ATTRIBUTE).and_then(MetadataNode::text)
    }

    /// The declared role, or `"unknown"` when the descriptor has none.
    pub fn role(&self) -> &'a str {
        self.declared_role().unwrap_or(ROLE_UNKNOWN)
    }

    /// The certificate body under `KeyInfo/X509Data/X509Certificate`.
    ///
    /// Where an element repeats, the first occurrence is followed.
    pub fn certificate(&self) -> Option<&'a str> {
        CERTIFICATE_PATH
            .iter()
            .try_fold(self.node, |node, name| node.child(name).map(first_occurrence))
            .and_then(MetadataNode::text)
    }

    fn certificate_body(&self) -> MetadataResult<String> {
        self.certificate()
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MissingCertificate {
                role: self.role().to_string(),
            })
    }
}

fn first_occurrence(node: &MetadataNode) -> &MetadataNode {
    match node {
        MetadataNode::Sequence(items) => items.first().unwrap_or(node),
        _ => node,
    }
}

/// Returns the descriptors of the first `KeyDescriptor` collection in the tree.
///
/// A single descriptor parses as a mapping rather than a sequence and is
/// returned as a one-element collection.
///
/// # Errors
///
/// * `MetadataError::LookupFailure` - If no `KeyDescriptor` key exists anywhere in the tree
pub fn key_descriptors(tree: &MetadataNode) -> MetadataResult<Vec<KeyDescriptor<'_>>> {
    let collection = tree
        .extract(KEY_DESCRIPTOR)
        .next()
        .ok_or_else(|| MetadataError::LookupFailure(KEY_DESCRIPTOR.to_string()))?;
    let nodes: &[MetadataNode] = match collection {
        MetadataNode::Sequence(items) => items,
        MetadataNode::Mapping(_) => slice::from_ref(collection),
        MetadataNode::Scalar(_) => &[],
    };
    Ok(nodes.iter().map(KeyDescriptor::new).collect())
}

/// Resolves certificate bodies by role.
///
/// With `"all"` every descriptor contributes an entry under its role. When
/// two descriptors share a role the later one replaces the earlier one.
/// With any other role, the first descriptor whose `use` equals it exactly
/// is returned as a single-entry mapping.
///
/// # Errors
///
/// * `MetadataError::LookupFailure` - If the tree has no descriptor collection
/// * `MetadataError::RoleNotFound` - If no descriptor declares the requested role
/// * `MetadataError::MissingCertificate` - If a selected descriptor embeds no certificate
pub fn fetch_certificates(tree: &MetadataNode, role: &str) -> MetadataResult<CertificateBodies> {
    let descriptors = key_descriptors(tree)?;
    log::debug!("Found {} key descriptors", descriptors.len());
    if role == ROLE_ALL {
        collect_all(&descriptors)
    } else {
        select_role(&descriptors, role)
    }
}

fn collect_all(descriptors: &[KeyDescriptor]) -> MetadataResult<CertificateBodies> {
    let mut bodies = CertificateBodies::new();
    for descriptor in descriptors {
        let role = descriptor.role();
        if bodies
            .insert(role.to_string(), descriptor.certificate_body()?)
            .is_some()
        {
            log::warn!("Certificate of type {role} replaced by a later descriptor");
        }
    }
    Ok(bodies)
}

fn select_role(descriptors: &[KeyDescriptor], role: &str) -> MetadataResult<CertificateBodies> {
    let descriptor = descriptors
        .iter()
        .find(|descriptor| descriptor.declared_role() == Some(role))
        .ok_or_else(|| MetadataError::RoleNotFound(role.to_string()))?;
    Ok(CertificateBodies::from([(
        role.to_string(),
        descriptor.certificate_body()?,
    )]))
}
