//! Runs selection and evaluation over a whole metadata tree.
//!
//! Selection failures abort the inspection. Each selected certificate is then
//! evaluated on its own, so one undecodable body does not hide the others.

use chrono::{DateTime, Utc};

use crate::certificate::{evaluate_certificate_at, CertificateRecord};
use crate::common::MetadataResult;
use crate::key_descriptor::fetch_certificates;
use crate::metadata_tree::MetadataNode;

/// Outcome of evaluating the certificate selected for one role.
#[derive(Clone, Debug, PartialEq)]
pub struct CertificateReport {
    pub role: String,
    pub outcome: MetadataResult<(i64, CertificateRecord)>,
}

/// Selects the certificates for `role` and evaluates each of them at `now`.
///
/// Reports come back ordered by role.
pub fn inspect(
    tree: &MetadataNode,
    role: &str,
    now: DateTime<Utc>,
) -> MetadataResult<Vec<CertificateReport>> {
    let bodies = fetch_certificates(tree, role)?;
    Ok(bodies
        .into_iter()
        .map(|(role, body)| {
            let outcome = evaluate_certificate_at(&body, now);
            if let Err(e) = &outcome {
                log::warn!("Certificate of type {role} could not be evaluated: {e}");
            }
            CertificateReport { role, outcome }
        })
        .collect())
}
