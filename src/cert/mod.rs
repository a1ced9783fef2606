//! Certificate representation, building, and inspection.

pub mod builder;
pub mod extensions;
pub mod name;
pub mod params;

use der::{Decode, Encode, EncodePem};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;

use crate::error::{Error, Result};
use crate::issuer::Issuer;
use crate::key::{DigestAlgorithm, KeyAlgorithm, KeyPair, PublicKey};
use params::{CertificateRequest, ExtensionParam, Validity};

/// The signature algorithms certificates in this crate can carry, each a
/// (key algorithm, digest) pairing with a registered OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    Sha256WithEcdsa,
    Sha384WithEcdsa,
    Sha512WithEcdsa,
}

impl SignatureAlgorithm {
    /// Selects the algorithm for signing with `key` under `digest`.
    ///
    /// ECDSA keys only pair with the digest matched to their curve; anything
    /// else is [`Error::UnsupportedAlgorithm`].
    pub fn for_key(key: &PublicKey, digest: DigestAlgorithm) -> Result<Self> {
        match (key.algorithm(), digest) {
            (KeyAlgorithm::Rsa { .. }, DigestAlgorithm::Sha256) => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            (KeyAlgorithm::Rsa { .. }, DigestAlgorithm::Sha384) => {
                Ok(SignatureAlgorithm::Sha384WithRsa)
            }
            (KeyAlgorithm::Rsa { .. }, DigestAlgorithm::Sha512) => {
                Ok(SignatureAlgorithm::Sha512WithRsa)
            }
            (KeyAlgorithm::EllipticCurve { bits: 256 }, DigestAlgorithm::Sha256) => {
                Ok(SignatureAlgorithm::Sha256WithEcdsa)
            }
            (KeyAlgorithm::EllipticCurve { bits: 384 }, DigestAlgorithm::Sha384) => {
                Ok(SignatureAlgorithm::Sha384WithEcdsa)
            }
            (KeyAlgorithm::EllipticCurve { bits: 521 }, DigestAlgorithm::Sha512) => {
                Ok(SignatureAlgorithm::Sha512WithEcdsa)
            }
            (alg, digest) => Err(Error::UnsupportedAlgorithm(format!(
                "{} {} with {}",
                alg.name(),
                alg.bits(),
                digest.name()
            ))),
        }
    }

    /// The digest half of the pairing.
    pub fn digest(&self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Sha256WithRsa | SignatureAlgorithm::Sha256WithEcdsa => {
                DigestAlgorithm::Sha256
            }
            SignatureAlgorithm::Sha384WithRsa | SignatureAlgorithm::Sha384WithEcdsa => {
                DigestAlgorithm::Sha384
            }
            SignatureAlgorithm::Sha512WithRsa | SignatureAlgorithm::Sha512WithEcdsa => {
                DigestAlgorithm::Sha512
            }
        }
    }
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        let oid = match value {
            SignatureAlgorithm::Sha256WithRsa => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRsa => const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRsa => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
        };
        x509_cert::spki::AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }
}

impl TryFrom<const_oid::ObjectIdentifier> for SignatureAlgorithm {
    type Error = Error;

    fn try_from(oid: const_oid::ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha384WithRsa)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha512WithRsa)
            }
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithEcdsa),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithEcdsa),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => Ok(SignatureAlgorithm::Sha512WithEcdsa),
            other => Err(Error::UnsupportedAlgorithm(format!(
                "signature algorithm {other}"
            ))),
        }
    }
}

/// An X.509 certificate.
///
/// A certificate is an immutable value: it is produced complete by
/// [`builder::CertificateBuilder::build`] or parsed from DER/PEM, and never
/// mutated afterwards. Inspection accessors decode on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// Encodes the certificate into PEM.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| Error::EncodingFailed(e.to_string()))
    }

    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| Error::InvalidCertificate(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parses a PEM-encoded certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = crate::pem_utils::pem_to_der(pem, "CERTIFICATE")?;
        Self::from_der(&der)
    }

    /// The subject name.
    pub fn subject(&self) -> params::DistinguishedName {
        params::DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    /// The issuer name.
    pub fn issuer(&self) -> params::DistinguishedName {
        params::DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// The serial number bytes.
    pub fn serial_number(&self) -> Vec<u8> {
        self.inner.tbs_certificate.serial_number.as_bytes().to_vec()
    }

    /// All extensions in certificate order, as raw params. Typed decoding
    /// goes through [`extensions::ExtensionRegistry`] or
    /// [`ExtensionParam::to_extension`].
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// The first extension with the given OID, if present.
    pub fn extension(&self, oid: &const_oid::ObjectIdentifier) -> Option<ExtensionParam> {
        self.extensions().into_iter().find(|ext| ext.oid == *oid)
    }

    /// The certified public key.
    pub fn subject_public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// The signature algorithm the certificate claims.
    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(self.inner.signature_algorithm.oid)
    }

    /// Whether `at` falls inside the validity window, bounds inclusive.
    pub fn valid_at(&self, at: OffsetDateTime) -> Result<bool> {
        fn to_offset(time: &x509_cert::time::Time) -> OffsetDateTime {
            match time {
                x509_cert::time::Time::UtcTime(t) => OffsetDateTime::from(t.to_system_time()),
                x509_cert::time::Time::GeneralTime(t) => {
                    OffsetDateTime::from(t.to_system_time())
                }
            }
        }
        let validity = &self.inner.tbs_certificate.validity;
        let not_before = to_offset(&validity.not_before);
        let not_after = to_offset(&validity.not_after);
        Ok(not_before <= at && at <= not_after)
    }

    /// Verifies the certificate's signature against `signer`, the public key
    /// of the purported issuer.
    ///
    /// Returns `Ok(false)` for a signature that does not verify or a key that
    /// does not fit the claimed algorithm; only an unsupported or garbled
    /// algorithm identifier is an error.
    pub fn verify_signed_by(&self, signer: &PublicKey) -> Result<bool> {
        let algorithm = self.signature_algorithm()?;
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| Error::InvalidCertificate("signature is not octet-aligned".into()))?;
        match signer.verify(&tbs, signature, algorithm.digest()) {
            Ok(verified) => Ok(verified),
            // Key/digest mismatch means this key did not produce the
            // signature, which is a verification failure, not an error.
            Err(Error::UnsupportedAlgorithm(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Builds a self-signed certificate for `request`, signed by `key`.
    ///
    /// The key pair must hold the private half matching
    /// `request.subject_public_key`.
    pub fn new_self_signed(
        request: &CertificateRequest,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Self> {
        let issuer = SelfIssuer {
            name: request.subject.clone(),
            key,
        };
        issuer.issue(request, validity)
    }
}

struct SelfIssuer<'a> {
    name: params::DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> params::DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}
