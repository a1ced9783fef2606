//! Certificate issuance on top of the builder.

use crate::cert::builder::CertificateBuilder;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtensionValue, SubjectKeyIdentifier,
};
use crate::cert::params::{CertificateRequest, DistinguishedName, Validity};
use crate::cert::Certificate;
use crate::error::Result;
use crate::key::KeyPair;

/// A certificate authority: a name and a signing key, plus a serial-number
/// policy.
///
/// Implementors supply the three accessors; [`Issuer::issue`] turns a
/// [`CertificateRequest`] into a signed certificate, adding the issuer-side
/// extensions (basic constraints, subject and authority key identifiers)
/// unless the request already carries them.
pub trait Issuer {
    /// The issuer name stamped into issued certificates.
    fn issuer_name(&self) -> DistinguishedName;

    /// The key pair that signs issued certificates.
    fn signing_key(&self) -> &KeyPair;

    /// The serial number for the next certificate. Defaults to a fresh
    /// random serial per call.
    fn next_serial(&self) -> Option<Vec<u8>> {
        None
    }

    /// Issues a certificate for `request` over `validity`.
    fn issue(&self, request: &CertificateRequest, validity: Validity) -> Result<Certificate> {
        let signing_key = self.signing_key();
        let mut builder = CertificateBuilder::new()
            .subject(request.subject.clone())
            .issuer(self.issuer_name())
            .validity(validity)
            .public_key(request.subject_public_key.clone(), request.usages);
        builder = match self.next_serial() {
            Some(serial) => builder.serial_number(serial),
            None => builder.random_serial_number(),
        };

        let has = |oid| request.extensions.iter().any(|ext| ext.oid == oid);
        if !has(BasicConstraints::OID) {
            builder = builder.extension(&BasicConstraints {
                is_ca: request.is_ca,
                max_path_length: None,
            })?;
        }
        if !has(SubjectKeyIdentifier::OID) {
            let ski = SubjectKeyIdentifier::from_public_key(&request.subject_public_key)?;
            builder = builder.extension(&ski)?;
        }
        if !has(AuthorityKeyIdentifier::OID) {
            let aki = AuthorityKeyIdentifier::from_issuer_key(signing_key.public_key())?;
            builder = builder.extension(&aki)?;
        }
        for ext in &request.extensions {
            builder = builder.raw_extension(ext.clone());
        }

        builder.build(signing_key, signing_key.default_digest())
    }
}

/// A CA materialized as its own certificate plus the matching private key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> DistinguishedName {
        // Issued certificates name this certificate's subject as issuer.
        self.cert.subject()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}
