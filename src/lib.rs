//! # saml-cert-expiry
//!
//! Inspects the X.509 certificates embedded in SAML federation metadata and
//! reports their attributes and how many days remain until they expire.
//!
//! The pipeline is:
//!
//! 1. [`fetcher::Fetcher`] retrieves the metadata document
//! 2. [`metadata_tree::MetadataNode::parse`] turns it into a tree
//! 3. [`key_descriptor::fetch_certificates`] picks certificate bodies by role
//! 4. [`certificate::evaluate_certificate`] decodes each body
//!
//! [`inspection::inspect`] chains the last two steps with per-certificate
//! failure isolation.

pub mod certificate;
pub mod common;
pub mod extractor;
pub mod fetcher;
pub mod inspection;
pub mod key_descriptor;
pub mod logging;
pub mod metadata_tree;
