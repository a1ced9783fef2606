//! Trust evaluation against an explicit anchor set.

use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::error::Result;

/// Evaluates whether `certificate` is anchored in `trusted`.
///
/// A certificate passes when it is currently valid and either
///
/// * is byte-identical to an anchor and self-signature verifies, or
/// * was directly signed by a currently valid anchor whose subject matches
///   the certificate's issuer.
///
/// Only direct anchoring is evaluated; intermediate chain building is out of
/// scope. A certificate that fails every anchor yields `Ok(false)`; errors
/// are reserved for certificates that cannot be decoded at all.
pub fn evaluate(certificate: &Certificate, trusted: &[Certificate]) -> Result<bool> {
    if trusted.is_empty() {
        return Ok(false);
    }
    let now = OffsetDateTime::now_utc();
    if !certificate.valid_at(now)? {
        return Ok(false);
    }

    for anchor in trusted {
        if anchor == certificate {
            let key = certificate.subject_public_key()?;
            if certificate.verify_signed_by(&key)? {
                return Ok(true);
            }
            continue;
        }
        if anchor.inner.tbs_certificate.subject != certificate.inner.tbs_certificate.issuer {
            continue;
        }
        if !anchor.valid_at(now)? {
            continue;
        }
        let anchor_key = anchor.subject_public_key()?;
        if certificate.verify_signed_by(&anchor_key)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Duration;

    use super::*;
    use crate::cert::builder::CertificateBuilder;
    use crate::cert::params::{CertificateRequest, DistinguishedName, Validity};
    use crate::issuer::{CertificateWithPrivateKey, Issuer};
    use crate::key::{DigestAlgorithm, GenerateOptions, KeyAlgorithm, KeyPair, KeyPairBuilder};
    use crate::store::{MemoryStore, SecureStore};

    fn pair() -> KeyPair {
        let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
        KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })
            .unwrap()
            .generate(&store, "trust-test", b"trust", &GenerateOptions::default())
            .unwrap()
    }

    fn self_signed_ca(cn: &str, key: &KeyPair) -> Certificate {
        let name = DistinguishedName::builder().common_name(cn).build();
        let request = CertificateRequest::builder()
            .subject(name)
            .subject_public_key(key.public_key().clone())
            .is_ca(true)
            .build();
        Certificate::new_self_signed(&request, key, Validity::for_days(30).unwrap()).unwrap()
    }

    #[test]
    fn empty_anchor_set_never_trusts() {
        let key = pair();
        let ca = self_signed_ca("root", &key);
        assert!(!evaluate(&ca, &[]).unwrap());
    }

    #[test]
    fn self_signed_anchor_is_trusted() {
        let key = pair();
        let ca = self_signed_ca("root", &key);
        assert!(evaluate(&ca, &[ca.clone()]).unwrap());
    }

    #[test]
    fn leaf_signed_by_anchor_is_trusted() {
        let ca_key = pair();
        let ca = self_signed_ca("root", &ca_key);
        let issuer = CertificateWithPrivateKey {
            cert: ca.clone(),
            key: ca_key,
        };

        let leaf_key = pair();
        let request = CertificateRequest::builder()
            .subject(DistinguishedName::builder().common_name("leaf").build())
            .subject_public_key(leaf_key.public_key().clone())
            .build();
        let leaf = issuer
            .issue(&request, Validity::for_days(7).unwrap())
            .unwrap();

        assert!(evaluate(&leaf, &[ca.clone()]).unwrap());

        // An unrelated anchor does not trust the leaf.
        let other = self_signed_ca("other", &pair());
        assert!(!evaluate(&leaf, &[other]).unwrap());
    }

    #[test]
    fn expired_certificate_is_not_trusted() {
        let key = pair();
        let name = DistinguishedName::builder().common_name("expired").build();
        let now = OffsetDateTime::now_utc();
        let cert = CertificateBuilder::new()
            .subject(name.clone())
            .issuer(name)
            .validity(Validity {
                not_before: now - Duration::days(30),
                not_after: now - Duration::days(1),
            })
            .public_key(key.public_key().clone(), Default::default())
            .build(&key, DigestAlgorithm::Sha256)
            .unwrap();
        assert!(!evaluate(&cert, &[cert.clone()]).unwrap());
    }
}
