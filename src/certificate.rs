//! # Certificate Evaluation
//!
//! Decodes the base64 certificate bodies embedded in metadata and computes
//! how many whole days remain until they expire.
//!
//! Bodies carry no PEM armor in metadata documents. They are re-armored
//! before decoding, and any failure along the way (bad base64, bad DER,
//! undecodable attribute values, validity times that are not whole-second
//! UTC) is reported as `MetadataError::DecodeFailure`. The strict time
//! decoding is done by `x509-certificate` itself.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use num_bigint::BigInt;
use x509_certificate::rfc3280::Name;
use x509_certificate::rfc5280::{self, Version};
use x509_certificate::X509Certificate;

use crate::common::{MetadataError, MetadataResult, PEM_FOOTER, PEM_HEADER};

const PEM_LINE_WIDTH: usize = 64;

/// Short names for the distinguished name attributes, keyed by dotted OID.
const ATTRIBUTE_SHORT_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.4", "SN"),
    ("2.5.4.5", "serialNumber"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.9", "street"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.12", "title"),
    ("2.5.4.17", "postalCode"),
    ("2.5.4.42", "GN"),
    ("2.5.4.43", "initials"),
    ("2.5.4.46", "dnQualifier"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
    ("0.9.2342.19200300.100.1.1", "UID"),
    ("0.9.2342.19200300.100.1.25", "DC"),
];

/// Distinguished name attributes in first-appearance order.
///
/// Inserting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_name(name: &Name) -> MetadataResult<Self> {
        let mut attributes = Self::new();
        for attribute in name.iter_attributes() {
            let oid = attribute.typ.to_string();
            let value = attribute
                .value
                .to_string()
                .map_err(|e| MetadataError::DecodeFailure(format!("attribute {oid}: {e:?}")))?;
            attributes.insert(short_name(&oid), value);
        }
        Ok(attributes)
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

fn short_name(oid: &str) -> String {
    ATTRIBUTE_SHORT_NAMES
        .iter()
        .find(|(dotted, _)| *dotted == oid)
        .map_or_else(|| oid.to_string(), |(_, short)| short.to_string())
}

/// Decoded attributes of one embedded certificate.
#[derive(Clone, Debug, PartialEq)]
pub struct CertificateRecord {
    pub subject: AttributeMap,
    pub issuer: AttributeMap,
    pub serial_number: BigInt,
    /// Raw X.509 version field, zero based (v3 certificates report 2).
    pub version: u8,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateRecord {
    /// Whole days from `now` until `not_after`, truncated toward zero.
    ///
    /// `now` is reduced to second precision first. The result is negative
    /// for expired certificates and zero within the last day of validity.
    pub fn expiration_days(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now.trunc_subsecs(0)).num_days()
    }
}

impl<'a> TryFrom<&'a str> for CertificateRecord {
    type Error = MetadataError;

    fn try_from(body: &'a str) -> Result<Self, Self::Error> {
        let certificate = X509Certificate::from_pem(armor(body))
            .map_err(|e| MetadataError::DecodeFailure(format!("{e:?}")))?;
        let raw: &rfc5280::Certificate = certificate.as_ref();
        let version = match raw.tbs_certificate.version {
            None | Some(Version::V1) => 0,
            Some(Version::V2) => 1,
            Some(Version::V3) => 2,
        };
        Ok(Self {
            subject: AttributeMap::from_name(certificate.subject_name())?,
            issuer: AttributeMap::from_name(certificate.issuer_name())?,
            serial_number: BigInt::from_signed_bytes_be(
                certificate.serial_number_asn1().as_slice(),
            ),
            version,
            not_before: certificate.validity_not_before().trunc_subsecs(0),
            not_after: certificate.validity_not_after().trunc_subsecs(0),
        })
    }
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "Issuer: {}", self.issuer)?;
        writeln!(f, "Serial Number: {}", self.serial_number)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Not Before: {}", self.not_before)?;
        write!(f, "Not After: {}", self.not_after)
    }
}

/// Wraps a bare base64 body in PEM armor.
///
/// Whitespace inside the body is dropped and the content re-flowed to the
/// usual 64 columns.
pub fn armor(body: &str) -> String {
    let compact: Vec<char> = body.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pem = String::with_capacity(compact.len() + compact.len() / PEM_LINE_WIDTH + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in compact.chunks(PEM_LINE_WIDTH) {
        pem.extend(line);
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

/// Decodes a certificate body and computes its days to expiration from now.
pub fn evaluate_certificate(body: &str) -> MetadataResult<(i64, CertificateRecord)> {
    evaluate_certificate_at(body, Utc::now())
}

/// Decodes a certificate body and computes its days to expiration from `now`.
///
/// # Errors
///
/// * `MetadataError::DecodeFailure` - If the body is not a decodable certificate
pub fn evaluate_certificate_at(
    body: &str,
    now: DateTime<Utc>,
) -> MetadataResult<(i64, CertificateRecord)> {
    let record = CertificateRecord::try_from(body)?;
    let expiration_days = record.expiration_days(now);
    log::info!(
        "Certificate {} expires on {} ({expiration_days} days)",
        record.subject,
        record.not_after
    );
    Ok((expiration_days, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armor_reflows_wrapped_bodies() {
        let body = format!("{}\n  {}", "A".repeat(50), "B".repeat(30));
        let pem = armor(&body);
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], PEM_HEADER);
        assert_eq!(lines[1], format!("{}{}", "A".repeat(50), "B".repeat(14)));
        assert_eq!(lines[2], "B".repeat(16));
        assert_eq!(lines[3], PEM_FOOTER);
    }

    #[test]
    fn short_names_fall_back_to_the_dotted_oid() {
        assert_eq!(short_name("2.5.4.3"), "CN");
        assert_eq!(short_name("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn attribute_map_keeps_first_position_and_last_value() {
        let mut attributes = AttributeMap::new();
        attributes.insert("OU".into(), "first".into());
        attributes.insert("CN".into(), "name".into());
        attributes.insert("OU".into(), "second".into());
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("OU"), Some("second"));
        assert_eq!(attributes.to_string(), "OU=second, CN=name");
    }
}
