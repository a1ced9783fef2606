//! End-to-end certificate building, inspection, and trust tests.

mod util;

use pkivault::cert::Certificate;
use pkivault::cert::builder::CertificateBuilder;
use pkivault::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtensionRegistry, ExtensionValue, KeyUsages,
    SubjectAltName, SubjectKeyIdentifier,
};
use pkivault::cert::name::{GeneralName, GeneralNames};
use pkivault::cert::params::{CertificateRequest, Validity};
use pkivault::issuer::{CertificateWithPrivateKey, Issuer};
use pkivault::key::DigestAlgorithm;

use util::{ec_pair, memory_store, name, rsa_pair, self_signed_ca};

#[test]
fn subject_alt_name_survives_der_roundtrip() {
    let store = memory_store();
    let pair = ec_pair(&store, "san-test");
    let san = SubjectAltName {
        names: GeneralNames(vec![
            GeneralName::DnsName("example.com".into()),
            GeneralName::DnsName("www.example.com".into()),
            GeneralName::Rfc822Name("admin@example.com".into()),
            GeneralName::IpAddress(vec![192, 0, 2, 10]),
        ]),
    };

    let cert = CertificateBuilder::new()
        .subject(name("example.com"))
        .issuer(name("example.com"))
        .random_serial_number()
        .valid_for(time::Duration::days(90))
        .unwrap()
        .public_key(pair.public_key().clone(), KeyUsages::DigitalSignature.into())
        .extension(&san)
        .unwrap()
        .build(&pair, DigestAlgorithm::Sha256)
        .unwrap();

    let reparsed = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
    let param = reparsed.extension(&SubjectAltName::OID).expect("SAN present");
    assert!(!param.critical);
    assert_eq!(param.to_extension::<SubjectAltName>().unwrap(), san);

    // The registry reaches the same value through dynamic dispatch.
    let registry = ExtensionRegistry::standard();
    let decoded = registry.decode(&param.oid, &param.value).unwrap().unwrap();
    let typed = decoded.as_any().downcast_ref::<SubjectAltName>().unwrap();
    assert_eq!(*typed, san);
}

#[test]
fn pem_roundtrip_preserves_certificate() {
    let store = memory_store();
    let pair = ec_pair(&store, "pem-test");
    let cert = self_signed_ca("pem-test", &pair);
    let pem = cert.to_pem().unwrap();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(Certificate::from_pem(&pem).unwrap(), cert);
}

#[test]
fn garbage_input_is_rejected() {
    assert!(Certificate::from_der(&[0x30, 0x01, 0xff]).is_err());
    assert!(Certificate::from_pem("not pem at all").is_err());
}

#[test]
fn issued_certificate_carries_issuer_side_extensions() {
    let store = memory_store();
    let ca_key = ec_pair(&store, "ca");
    let ca_cert = self_signed_ca("Test Root", &ca_key);
    let ca = CertificateWithPrivateKey {
        cert: ca_cert.clone(),
        key: ca_key,
    };

    let leaf_key = ec_pair(&store, "leaf");
    let request = CertificateRequest::builder()
        .subject(name("leaf.example.com"))
        .subject_public_key(leaf_key.public_key().clone())
        .usages(KeyUsages::DigitalSignature.into())
        .build();
    let leaf = ca.issue(&request, Validity::for_days(7).unwrap()).unwrap();

    assert_eq!(leaf.issuer(), name("Test Root"));
    let bc = leaf
        .extension(&BasicConstraints::OID)
        .unwrap()
        .to_extension::<BasicConstraints>()
        .unwrap();
    assert!(!bc.is_ca);

    // AKI of the leaf matches SKI derived from the CA key.
    let aki = leaf
        .extension(&AuthorityKeyIdentifier::OID)
        .unwrap()
        .to_extension::<AuthorityKeyIdentifier>()
        .unwrap();
    let ca_ski = SubjectKeyIdentifier::from_public_key(ca.key.public_key()).unwrap();
    assert_eq!(aki.0, ca_ski.0);

    assert!(leaf.verify_signed_by(ca.key.public_key()).unwrap());
}

#[test]
fn matches_certificate_compares_public_keys() {
    let store = memory_store();
    let pair = ec_pair(&store, "match");
    let other = ec_pair(&store, "other");
    let cert = self_signed_ca("match", &pair);

    assert!(pair.matches_certificate(&cert, &[]).unwrap());
    assert!(!other.matches_certificate(&cert, &[]).unwrap());
}

#[test]
fn matches_certificate_honors_trust_anchors() {
    let store = memory_store();
    let ca_key = ec_pair(&store, "ca");
    let ca_cert = self_signed_ca("Root", &ca_key);
    let ca = CertificateWithPrivateKey {
        cert: ca_cert.clone(),
        key: ca_key,
    };

    let leaf_key = ec_pair(&store, "leaf");
    let request = CertificateRequest::builder()
        .subject(name("leaf"))
        .subject_public_key(leaf_key.public_key().clone())
        .build();
    let leaf = ca.issue(&request, Validity::for_days(7).unwrap()).unwrap();

    assert!(leaf_key.matches_certificate(&leaf, &[ca_cert]).unwrap());

    // Key matches but the chain does not anchor.
    let unrelated = self_signed_ca("Unrelated", &ec_pair(&store, "unrelated"));
    assert!(!leaf_key.matches_certificate(&leaf, &[unrelated]).unwrap());
}

#[test]
fn rsa_signed_certificate_verifies() {
    let store = memory_store();
    let pair = rsa_pair(&store, "rsa-sign");
    let cert = CertificateBuilder::new()
        .subject(name("rsa"))
        .issuer(name("rsa"))
        .valid_for(time::Duration::days(1))
        .unwrap()
        .public_key(pair.public_key().clone(), KeyUsages::KeyEncipherment.into())
        .build(&pair, DigestAlgorithm::Sha384)
        .unwrap();
    assert!(cert.verify_signed_by(pair.public_key()).unwrap());
    assert!(cert.valid_at(time::OffsetDateTime::now_utc()).unwrap());
}

#[test]
fn unknown_extensions_are_preserved_raw() {
    let store = memory_store();
    let pair = ec_pair(&store, "raw-ext");
    let raw = pkivault::cert::params::ExtensionParam {
        oid: const_oid::ObjectIdentifier::new_unwrap("1.3.6.1.4.1.99999.42"),
        critical: false,
        value: vec![0x04, 0x02, 0xab, 0xcd],
    };
    let cert = CertificateBuilder::new()
        .subject(name("raw"))
        .issuer(name("raw"))
        .valid_for(time::Duration::days(1))
        .unwrap()
        .public_key(pair.public_key().clone(), Default::default())
        .raw_extension(raw.clone())
        .build(&pair, DigestAlgorithm::Sha256)
        .unwrap();

    let reparsed = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
    assert_eq!(reparsed.extension(&raw.oid), Some(raw.clone()));
    assert!(ExtensionRegistry::standard().decode(&raw.oid, &raw.value).is_none());
}
