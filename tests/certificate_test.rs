use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use num_bigint::BigInt;

use saml_cert_expiry::certificate::{
    armor, evaluate_certificate, evaluate_certificate_at, CertificateRecord,
};
use saml_cert_expiry::common::{MetadataError, MetadataResult};

const IDP_SIGNING: &str = include_str!("fixtures/idp_signing.b64");
const SP_EXPIRED: &str = include_str!("fixtures/sp_expired.b64");
const MALFORMED_NOT_BEFORE: &str = include_str!("fixtures/malformed_not_before.b64");

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid test instant")
}

fn days_between(from: (i32, u32, u32), to: (i32, u32, u32)) -> i64 {
    let from = NaiveDate::from_ymd_opt(from.0, from.1, from.2).expect("valid date");
    let to = NaiveDate::from_ymd_opt(to.0, to.1, to.2).expect("valid date");
    (to - from).num_days()
}

#[test]
fn test_record_attributes() -> MetadataResult<()> {
    let record = CertificateRecord::try_from(IDP_SIGNING)?;
    let subject: Vec<(&str, &str)> = record.subject.iter().collect();
    assert_eq!(
        subject,
        vec![
            ("C", "US"),
            ("O", "Example Federation"),
            ("CN", "idp.example.org"),
        ]
    );
    assert_eq!(record.issuer, record.subject);
    assert_eq!(
        record.serial_number,
        "259463324656128904956085477789184591648077448542"
            .parse::<BigInt>()
            .expect("valid serial")
    );
    assert_eq!(record.version, 2);
    assert_eq!(record.not_before, utc(2020, 1, 1, 0, 0, 0));
    assert_eq!(record.not_after, utc(2030, 1, 1, 0, 0, 0));
    Ok(())
}

#[test]
fn test_expiration_days_across_leap_years() -> MetadataResult<()> {
    let (expiration_days, _) = evaluate_certificate_at(IDP_SIGNING, utc(2024, 1, 1, 0, 0, 0))?;
    let expected = days_between((2024, 1, 1), (2030, 1, 1));
    assert_eq!(expected, 2192);
    assert_eq!(expiration_days, expected);
    Ok(())
}

#[test]
fn test_expiration_days_truncate_toward_zero() -> MetadataResult<()> {
    let record = CertificateRecord::try_from(IDP_SIGNING)?;
    assert_eq!(record.expiration_days(utc(2029, 12, 31, 0, 0, 1)), 0);
    assert_eq!(record.expiration_days(utc(2029, 12, 30, 23, 59, 59)), 1);
    assert_eq!(record.expiration_days(utc(2030, 1, 1, 0, 0, 0)), 0);
    assert_eq!(record.expiration_days(utc(2030, 1, 1, 12, 0, 0)), 0);
    assert_eq!(record.expiration_days(utc(2030, 1, 3, 0, 0, 0)), -2);
    Ok(())
}

#[test]
fn test_expired_certificate_is_negative() -> MetadataResult<()> {
    let now = utc(2024, 1, 1, 0, 0, 0);
    let (expiration_days, record) = evaluate_certificate_at(SP_EXPIRED, now)?;
    assert_eq!(record.subject.get("CN"), Some("sp.example.org"));
    assert_eq!(record.subject.get("C"), Some("NL"));
    assert_eq!(expiration_days, days_between((2024, 1, 1), (2021, 6, 1)));
    assert!(expiration_days < 0);
    Ok(())
}

#[test]
fn test_same_day_evaluations_agree() -> MetadataResult<()> {
    let morning = utc(2025, 3, 10, 8, 0, 0);
    let evening = utc(2025, 3, 10, 20, 30, 0);
    let (first, _) = evaluate_certificate_at(IDP_SIGNING, morning)?;
    let (second, _) = evaluate_certificate_at(IDP_SIGNING, evening)?;
    assert_eq!(first, second);

    let (later, _) = evaluate_certificate_at(IDP_SIGNING, morning + Duration::days(3))?;
    assert_eq!(first - later, 3);
    Ok(())
}

#[test]
fn test_sub_second_instants_are_truncated() -> MetadataResult<()> {
    let record = CertificateRecord::try_from(IDP_SIGNING)?;
    let now = utc(2029, 12, 31, 0, 0, 0) + Duration::milliseconds(999);
    assert_eq!(record.expiration_days(now), 1);
    Ok(())
}

#[test]
fn test_evaluation_against_the_clock() -> MetadataResult<()> {
    let (expiration_days, record) = evaluate_certificate(IDP_SIGNING)?;
    assert_eq!(expiration_days, record.expiration_days(Utc::now()));
    Ok(())
}

#[test]
fn test_wrapped_bodies_decode() -> MetadataResult<()> {
    let wrapped: String = IDP_SIGNING
        .as_bytes()
        .chunks(76)
        .map(|line| format!("  {}\n", String::from_utf8_lossy(line)))
        .collect();
    assert_eq!(
        CertificateRecord::try_from(wrapped.as_str())?,
        CertificateRecord::try_from(IDP_SIGNING)?
    );
    Ok(())
}

#[test]
fn test_invalid_base64_is_a_decode_failure() {
    assert!(matches!(
        CertificateRecord::try_from("this is not base64!"),
        Err(MetadataError::DecodeFailure(_))
    ));
    assert!(matches!(
        evaluate_certificate(""),
        Err(MetadataError::DecodeFailure(_))
    ));
}

#[test]
fn test_valid_base64_that_is_not_a_certificate() {
    assert!(matches!(
        evaluate_certificate("SGVsbG8sIHdvcmxkIQ=="),
        Err(MetadataError::DecodeFailure(_))
    ));
}

#[test]
fn test_malformed_validity_is_a_decode_failure() {
    assert!(matches!(
        evaluate_certificate_at(MALFORMED_NOT_BEFORE, utc(2024, 1, 1, 0, 0, 0)),
        Err(MetadataError::DecodeFailure(_))
    ));
}

#[test]
fn test_armor() {
    let pem = armor("QUJD");
    assert_eq!(
        pem,
        "-----BEGIN CERTIFICATE-----\nQUJD\n-----END CERTIFICATE-----\n"
    );
}
