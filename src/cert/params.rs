use bon::Builder;
use const_oid::ObjectIdentifier;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::RdnSequence;

use crate::cert::extensions::{ExtensionValue, FlagSet, KeyUsages};
use crate::error::{Error, Result};
use crate::key::PublicKey;

/// Parameters for requesting a certificate from an [`crate::issuer::Issuer`].
///
/// Carries the subject, the subject's public key, and the extension content
/// the issuer should embed; the issuer supplies serial number, validity, and
/// issuer-side extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificateRequest {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: FlagSet<KeyUsages>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Subject or issuer name for a certificate.
///
/// Only the attributes that are set appear in the encoded name; an omitted
/// attribute is absent, not empty.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts to an X.509 RDN sequence, emitting only the attributes that
    /// are present.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        use core::str::FromStr;
        let mut parts = vec![format!("CN={}", self.common_name)];
        if let Some(ou) = &self.organization_unit {
            parts.push(format!("OU={ou}"));
        }
        if let Some(o) = &self.organization {
            parts.push(format!("O={o}"));
        }
        if let Some(l) = &self.locality {
            parts.push(format!("L={l}"));
        }
        if let Some(st) = &self.state {
            parts.push(format!("ST={st}"));
        }
        if let Some(c) = &self.country {
            parts.push(format!("C={c}"));
        }
        RdnSequence::from_str(&parts.join(","))
            .map_err(|e| Error::InvalidInput(format!("distinguished name: {e}")))
    }

    /// Extracts the attributes this type models from an X.509 RDN sequence.
    /// Attribute types outside that set are ignored.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let value = attr
                    .value
                    .decode_as::<der::asn1::Utf8StringRef>()
                    .map(|s| s.to_string())
                    .or_else(|_| {
                        attr.value
                            .decode_as::<der::asn1::PrintableStringRef>()
                            .map(|s| s.to_string())
                    });
                let Ok(value) = value else { continue };
                match attr.oid.to_string().as_str() {
                    "2.5.4.3" => dn.common_name = value,
                    "2.5.4.6" => dn.country = Some(value),
                    "2.5.4.8" => dn.state = Some(value),
                    "2.5.4.7" => dn.locality = Some(value),
                    "2.5.4.10" => dn.organization = Some(value),
                    "2.5.4.11" => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }
        dn
    }
}

/// Certificate validity period, the `notBefore`/`notAfter` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A validity window starting now and lasting `duration`. Fails with
    /// [`Error::InvalidValidityPeriod`] unless the duration is positive.
    pub fn for_duration(duration: Duration) -> Result<Self> {
        if duration <= Duration::ZERO {
            return Err(Error::InvalidValidityPeriod);
        }
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            not_before: now,
            not_after: now + duration,
        })
    }

    /// A validity window starting now for the given number of days.
    pub fn for_days(days: i64) -> Result<Self> {
        Self::for_duration(Duration::days(days))
    }

    /// Whether `at` falls inside the window, bounds inclusive.
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// An X.509 extension in raw form: OID, criticality, and DER-encoded value.
///
/// This is the lossless representation every extension reduces to; typed
/// extension values convert through it via [`ExtensionParam::from_extension`]
/// and [`ExtensionParam::to_extension`]. Unrecognized extensions survive as
/// raw params untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes a typed extension into raw form. The criticality comes from
    /// the extension type itself.
    pub fn from_extension<E: ExtensionValue>(extension: &E) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical: extension.is_critical(),
            value: extension.to_extension_value()?,
        })
    }

    /// Decodes the raw value as a specific extension type. Fails with
    /// [`Error::MalformedExtension`] when the OID does not match `E` or the
    /// value does not conform to `E`'s schema.
    pub fn to_extension<E: ExtensionValue>(&self) -> Result<E> {
        if self.oid != E::OID {
            return Err(Error::MalformedExtension(format!(
                "expected OID {}, found {}",
                E::OID,
                self.oid
            )));
        }
        E::from_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{BasicConstraints, SubjectAltName};
    use crate::cert::name::{GeneralName, GeneralNames};

    #[test]
    fn distinguished_name_roundtrip() {
        let dn = DistinguishedName::builder()
            .common_name("example.com")
            .organization("Example Corp")
            .country("US")
            .build();
        let x509 = dn.as_x509_name().unwrap();
        assert_eq!(DistinguishedName::from_x509_name(&x509), dn);
    }

    #[test]
    fn absent_attributes_are_not_encoded() {
        let dn = DistinguishedName::builder().common_name("only-cn").build();
        let x509 = dn.as_x509_name().unwrap();
        assert_eq!(x509.0.len(), 1);
    }

    #[test]
    fn validity_rejects_empty_window() {
        assert!(matches!(
            Validity::for_days(0),
            Err(Error::InvalidValidityPeriod)
        ));
        assert!(matches!(
            Validity::for_duration(Duration::seconds(-1)),
            Err(Error::InvalidValidityPeriod)
        ));
        assert!(Validity::for_days(365).is_ok());
    }

    #[test]
    fn extension_param_roundtrip() {
        let san = SubjectAltName {
            names: GeneralNames(vec![GeneralName::DnsName("example.com".into())]),
        };
        let param = ExtensionParam::from_extension(&san).unwrap();
        assert!(!param.critical);
        assert_eq!(param.to_extension::<SubjectAltName>().unwrap(), san);
    }

    #[test]
    fn to_extension_checks_oid() {
        let san = SubjectAltName::default();
        let param = ExtensionParam::from_extension(&san).unwrap();
        assert!(matches!(
            param.to_extension::<BasicConstraints>(),
            Err(Error::MalformedExtension(_))
        ));
    }
}
