//! Incremental certificate assembly.

use const_oid::ObjectIdentifier;
use der::asn1::BitString;
use rand::RngCore;
use time::Duration;

use crate::cert::extensions::{ExtensionValue, FlagSet, KeyUsage, KeyUsages};
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::{Error, Result};
use crate::key::{DigestAlgorithm, KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Accumulates certificate fields and produces a signed [`Certificate`].
///
/// Setters take and return the builder by value, and [`build`] consumes it,
/// so a builder cannot be touched again after signing; reusing a
/// configuration means cloning the builder before the final call.
///
/// [`build`]: CertificateBuilder::build
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use pkivault::cert::builder::CertificateBuilder;
/// use pkivault::cert::extensions::KeyUsages;
/// use pkivault::cert::params::DistinguishedName;
/// use pkivault::key::{DigestAlgorithm, KeyAlgorithm, KeyPairBuilder, GenerateOptions};
/// use pkivault::store::{MemoryStore, SecureStore};
///
/// let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
/// let pair = KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })?
///     .generate(&store, "server", b"tag", &GenerateOptions::default())?;
/// let name = DistinguishedName::builder().common_name("example.com").build();
///
/// let cert = CertificateBuilder::new()
///     .subject(name.clone())
///     .issuer(name)
///     .random_serial_number()
///     .valid_for(time::Duration::days(365))?
///     .public_key(pair.public_key().clone(), KeyUsages::DigitalSignature.into())
///     .build(&pair, DigestAlgorithm::Sha256)?;
/// # Ok::<(), pkivault::error::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CertificateBuilder {
    subject: Option<DistinguishedName>,
    issuer: Option<DistinguishedName>,
    serial_number: Option<Vec<u8>>,
    validity: Option<Validity>,
    public_key: Option<PublicKey>,
    usages: FlagSet<KeyUsages>,
    extensions: Vec<ExtensionParam>,
}

impl CertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: DistinguishedName) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn issuer(mut self, issuer: DistinguishedName) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Sets the serial number to the given big-endian bytes.
    pub fn serial_number(mut self, serial: Vec<u8>) -> Self {
        self.serial_number = Some(serial);
        self
    }

    /// Sets a freshly generated 160-bit random serial number.
    pub fn random_serial_number(mut self) -> Self {
        let mut bytes = vec![0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        // Keep the INTEGER positive.
        bytes[0] &= 0x7f;
        self.serial_number = Some(bytes);
        self
    }

    pub fn validity(mut self, validity: Validity) -> Self {
        self.validity = Some(validity);
        self
    }

    /// Sets a validity window starting now. Fails with
    /// [`Error::InvalidValidityPeriod`] unless the duration is positive.
    pub fn valid_for(mut self, duration: Duration) -> Result<Self> {
        self.validity = Some(Validity::for_duration(duration)?);
        Ok(self)
    }

    /// Sets the subject public key and the key usages to certify for it.
    /// A non-empty usage set becomes a critical KeyUsage extension at build
    /// time.
    pub fn public_key(mut self, key: PublicKey, usages: FlagSet<KeyUsages>) -> Self {
        self.public_key = Some(key);
        self.usages = usages;
        self
    }

    /// Adds a typed extension.
    pub fn extension<E: ExtensionValue>(mut self, extension: &E) -> Result<Self> {
        self.extensions.push(ExtensionParam::from_extension(extension)?);
        Ok(self)
    }

    /// Adds an extension in raw OID/criticality/value form.
    pub fn raw_extension(mut self, extension: ExtensionParam) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Signs the accumulated fields with `signing_key` and produces the
    /// certificate, consuming the builder.
    ///
    /// Fails with [`Error::IncompleteCertificate`] naming every required
    /// field still unset, and with [`Error::InvalidBuilderState`] if two
    /// extensions share an OID.
    pub fn build(self, signing_key: &KeyPair, digest: DigestAlgorithm) -> Result<Certificate> {
        let mut missing = Vec::new();
        if self.subject.is_none() {
            missing.push("subject");
        }
        if self.issuer.is_none() {
            missing.push("issuer");
        }
        if self.validity.is_none() {
            missing.push("validity");
        }
        if self.public_key.is_none() {
            missing.push("subject public key");
        }
        let (Some(subject), Some(issuer), Some(validity), Some(public_key)) =
            (self.subject, self.issuer, self.validity, self.public_key)
        else {
            return Err(Error::IncompleteCertificate { missing });
        };

        let mut extensions = self.extensions;
        if !self.usages.is_empty()
            && !extensions.iter().any(|ext| ext.oid == KeyUsage::OID)
        {
            extensions.push(ExtensionParam::from_extension(&KeyUsage(self.usages))?);
        }
        check_unique_oids(&extensions)?;

        let signature_algorithm = SignatureAlgorithm::for_key(signing_key.public_key(), digest)?;
        let tbs = TbsCertificate {
            serial_number: self.serial_number.unwrap_or_else(|| vec![1]),
            signature_algorithm,
            issuer,
            validity,
            subject,
            subject_public_key: public_key,
            extensions,
        };
        let tbs_inner = tbs.to_tbs_certificate_inner()?;
        let signature = signing_key.sign(&tbs.to_der()?, digest)?;

        Ok(Certificate {
            inner: x509_cert::certificate::CertificateInner {
                tbs_certificate: tbs_inner,
                signature_algorithm: signature_algorithm.into(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }
}

fn check_unique_oids(extensions: &[ExtensionParam]) -> Result<()> {
    let mut seen: Vec<ObjectIdentifier> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        if seen.contains(&ext.oid) {
            return Err(Error::InvalidBuilderState("duplicate extension OID"));
        }
        seen.push(ext.oid);
    }
    Ok(())
}
