use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::OctetString,
    oid::ObjectIdentifier,
};
use sha1::{Digest, Sha1};

use crate::cert::name::GeneralNames;
use crate::error::{Error, Result};
use crate::key::PublicKey;

/// Contract every typed certificate extension implements.
///
/// The extension OID uniquely selects the decode schema used when parsing an
/// unknown extension octet string back into a typed value; [`ExtensionRegistry`]
/// maintains that mapping. Encode and decode are pure transforms obeying
/// `encode(decode(x)) == x` for well-formed input; decode rejects trailing
/// bytes, missing required fields, and tag mismatches with
/// [`Error::MalformedExtension`] rather than silently truncating.
///
/// # Example
/// ```
/// use pkivault::cert::extensions::{ExtensionValue, SubjectAltName};
/// use pkivault::cert::name::{GeneralName, GeneralNames};
///
/// let san = SubjectAltName {
///     names: GeneralNames(vec![GeneralName::DnsName("example.com".into())]),
/// };
/// let encoded = san.to_extension_value().unwrap();
/// let decoded = SubjectAltName::from_extension_value(&encoded).unwrap();
/// assert_eq!(san, decoded);
/// ```
pub trait ExtensionValue {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Whether the extension is marked critical when embedded in a
    /// certificate.
    fn is_critical(&self) -> bool;

    /// Encodes the extension value into DER.
    fn to_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension value from DER.
    fn from_extension_value(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// The Subject Alternative Name extension: additional identities for the
/// certificate subject, as an ordered [`GeneralNames`] sequence.
///
/// Always non-critical; callers cannot mark it critical.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubjectAltName {
    pub names: GeneralNames,
}

impl ExtensionValue for SubjectAltName {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::SubjectAltName as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        false
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        self.names.to_der()
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            names: GeneralNames::from_der(bytes)?,
        })
    }
}

/// The Basic Constraints extension: whether the certificate is a CA and the
/// maximum chain depth below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ExtensionValue for BasicConstraints {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::BasicConstraints as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        true
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };
        Ok(bc.to_der()?)
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(bytes)
            .map_err(|e| Error::MalformedExtension(e.to_string()))?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
pub use x509_cert::ext::pkix::KeyUsages;

/// The Key Usage extension: the purposes the certified key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ExtensionValue for KeyUsage {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::KeyUsage as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        true
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        let ku = x509_cert::ext::pkix::KeyUsage(self.0);
        Ok(ku.to_der()?)
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        let ku = x509_cert::ext::pkix::KeyUsage::from_der(bytes)
            .map_err(|e| Error::MalformedExtension(e.to_string()))?;
        Ok(Self(ku.0))
    }
}

/// The Extended Key Usage extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ExtensionValue for ExtendedKeyUsage {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::ExtendedKeyUsage as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        false
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(bytes)
            .map_err(|e| Error::MalformedExtension(e.to_string()))?;
        let usage = eku
            .0
            .iter()
            .map(|oid| ExtendedKeyUsageOption::try_from(*oid))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { usage })
    }
}

/// A single purpose within the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
        }
    }
}

impl TryFrom<ObjectIdentifier> for ExtendedKeyUsageOption {
    type Error = Error;

    fn try_from(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
            const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
            const_oid::db::rfc5912::ID_KP_CODE_SIGNING => Ok(ExtendedKeyUsageOption::CodeSigning),
            const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                Ok(ExtendedKeyUsageOption::EmailProtection)
            }
            const_oid::db::rfc5912::ID_KP_TIME_STAMPING => Ok(ExtendedKeyUsageOption::TimeStamping),
            const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => Ok(ExtendedKeyUsageOption::OcspSigning),
            other => Err(Error::MalformedExtension(format!(
                "unsupported extended key usage {other}"
            ))),
        }
    }
}

/// The Subject Key Identifier extension: a short identifier for the certified
/// public key, conventionally the SHA-1 digest of the SPKI bit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl SubjectKeyIdentifier {
    /// Derives the identifier from a public key the conventional way.
    pub fn from_public_key(key: &PublicKey) -> Result<Self> {
        let spki = key.to_spki()?;
        let digest = Sha1::digest(spki.subject_public_key.raw_bytes());
        Ok(Self(digest.to_vec()))
    }
}

impl ExtensionValue for SubjectKeyIdentifier {
    const OID: ObjectIdentifier =
        <x509_cert::ext::pkix::SubjectKeyIdentifier as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        false
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(bytes)
            .map_err(|e| Error::MalformedExtension(e.to_string()))?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// The Authority Key Identifier extension, carrying the key identifier of the
/// issuing key (the issuer/serial fields are not populated by this crate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier(pub Vec<u8>);

impl AuthorityKeyIdentifier {
    /// Derives the identifier from the issuer's public key.
    pub fn from_issuer_key(key: &PublicKey) -> Result<Self> {
        Ok(Self(SubjectKeyIdentifier::from_public_key(key)?.0))
    }
}

impl ExtensionValue for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier =
        <x509_cert::ext::pkix::AuthorityKeyIdentifier as AssociatedOid>::OID;

    fn is_critical(&self) -> bool {
        false
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.0.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        Ok(aki.to_der()?)
    }

    fn from_extension_value(bytes: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(bytes)
            .map_err(|e| Error::MalformedExtension(e.to_string()))?;
        let key_identifier = aki
            .key_identifier
            .ok_or_else(|| Error::MalformedExtension("AKI without key identifier".into()))?;
        Ok(Self(key_identifier.as_bytes().to_vec()))
    }
}

/// Object-safe view of a decoded extension, as produced by
/// [`ExtensionRegistry::decode`]. Downcast via [`AnyExtensionValue::as_any`]
/// to recover the concrete type.
pub trait AnyExtensionValue: fmt::Debug {
    fn oid(&self) -> ObjectIdentifier;
    fn is_critical(&self) -> bool;
    fn to_extension_value(&self) -> Result<Vec<u8>>;
    fn as_any(&self) -> &dyn Any;
}

impl<E> AnyExtensionValue for E
where
    E: ExtensionValue + fmt::Debug + 'static,
{
    fn oid(&self) -> ObjectIdentifier {
        E::OID
    }

    fn is_critical(&self) -> bool {
        ExtensionValue::is_critical(self)
    }

    fn to_extension_value(&self) -> Result<Vec<u8>> {
        ExtensionValue::to_extension_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ExtensionDecoder = fn(&[u8]) -> Result<Box<dyn AnyExtensionValue>>;

/// Maps extension OIDs to decoders, so that certificate parsing can turn
/// extension octet strings back into typed values.
///
/// The set of extension kinds is open: third-party types register themselves
/// with [`ExtensionRegistry::register`] without modifying the core codec.
/// Extensions whose OID is not registered are preserved as raw
/// [`crate::cert::params::ExtensionParam`] values, never interpreted.
#[derive(Default)]
pub struct ExtensionRegistry {
    decoders: HashMap<ObjectIdentifier, ExtensionDecoder>,
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the extension types this crate defines.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register::<SubjectAltName>();
        registry.register::<BasicConstraints>();
        registry.register::<KeyUsage>();
        registry.register::<ExtendedKeyUsage>();
        registry.register::<SubjectKeyIdentifier>();
        registry.register::<AuthorityKeyIdentifier>();
        registry
    }

    /// Registers `E`'s decoder under `E::OID`, replacing any previous entry.
    pub fn register<E>(&mut self)
    where
        E: ExtensionValue + fmt::Debug + 'static,
    {
        self.decoders.insert(E::OID, |bytes| {
            Ok(Box::new(E::from_extension_value(bytes)?))
        });
    }

    /// Whether a decoder is registered for `oid`.
    pub fn contains(&self, oid: &ObjectIdentifier) -> bool {
        self.decoders.contains_key(oid)
    }

    /// Decodes an extension value through the decoder registered for its
    /// OID. Returns `None` for unregistered OIDs.
    pub fn decode(
        &self,
        oid: &ObjectIdentifier,
        value: &[u8],
    ) -> Option<Result<Box<dyn AnyExtensionValue>>> {
        self.decoders.get(oid).map(|decode| decode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::name::GeneralName;
    use crate::key::{KeyAlgorithm, PrivateKey};

    #[test]
    fn subject_alt_name_roundtrip() {
        let san = SubjectAltName {
            names: GeneralNames(vec![
                GeneralName::DnsName("example.com".into()),
                GeneralName::DnsName("www.example.com".into()),
                GeneralName::IpAddress(vec![10, 0, 0, 1]),
            ]),
        };
        let encoded = ExtensionValue::to_extension_value(&san).unwrap();
        let decoded = SubjectAltName::from_extension_value(&encoded).unwrap();
        assert_eq!(san, decoded);
        assert!(!ExtensionValue::is_critical(&san));
    }

    #[test]
    fn empty_subject_alt_name_roundtrip() {
        let san = SubjectAltName::default();
        let encoded = ExtensionValue::to_extension_value(&san).unwrap();
        assert_eq!(SubjectAltName::from_extension_value(&encoded).unwrap(), san);
    }

    #[test]
    fn basic_constraints_roundtrip() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = ExtensionValue::to_extension_value(&original).unwrap();
        let decoded = BasicConstraints::from_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn key_usage_roundtrip() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = ExtensionValue::to_extension_value(&original).unwrap();
        let decoded = KeyUsage::from_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn extended_key_usage_roundtrip() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = ExtensionValue::to_extension_value(&original).unwrap();
        let decoded = ExtendedKeyUsage::from_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn key_identifier_extensions_roundtrip() {
        let key = PrivateKey::generate(KeyAlgorithm::EllipticCurve { bits: 256 })
            .unwrap()
            .public_key();
        let ski = SubjectKeyIdentifier::from_public_key(&key).unwrap();
        assert_eq!(ski.0.len(), 20);
        let encoded = ExtensionValue::to_extension_value(&ski).unwrap();
        assert_eq!(SubjectKeyIdentifier::from_extension_value(&encoded).unwrap(), ski);

        let aki = AuthorityKeyIdentifier::from_issuer_key(&key).unwrap();
        assert_eq!(aki.0, ski.0);
        let encoded = ExtensionValue::to_extension_value(&aki).unwrap();
        assert_eq!(AuthorityKeyIdentifier::from_extension_value(&encoded).unwrap(), aki);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SubjectAltName::from_extension_value(&[0x04, 0x01, 0x00]),
            Err(Error::MalformedExtension(_))
        ));
    }

    #[test]
    fn registry_dispatches_on_oid() {
        let registry = ExtensionRegistry::standard();
        let san = SubjectAltName {
            names: GeneralNames(vec![GeneralName::DnsName("example.com".into())]),
        };
        let value = ExtensionValue::to_extension_value(&san).unwrap();

        let decoded = registry
            .decode(&SubjectAltName::OID, &value)
            .expect("registered")
            .unwrap();
        assert_eq!(decoded.oid(), SubjectAltName::OID);
        let typed = decoded.as_any().downcast_ref::<SubjectAltName>().unwrap();
        assert_eq!(*typed, san);

        // Unregistered OIDs are preserved, not interpreted.
        let private_oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.99999.7");
        assert!(registry.decode(&private_oid, &value).is_none());
    }
}
