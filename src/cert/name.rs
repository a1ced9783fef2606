//! GeneralName and GeneralNames, the payload of SubjectAltName.
//!
//! RFC 5280 defines GeneralName as a CHOICE of nine context-tagged
//! alternatives:
//!
//! ```text
//! GeneralName ::= CHOICE {
//!     otherName                 [0] OtherName,
//!     rfc822Name                [1] IA5String,
//!     dNSName                   [2] IA5String,
//!     x400Address               [3] ORAddress,
//!     directoryName             [4] Name,
//!     ediPartyName              [5] EDIPartyName,
//!     uniformResourceIdentifier [6] IA5String,
//!     iPAddress                 [7] OCTET STRING,
//!     registeredID              [8] OBJECT IDENTIFIER }
//! ```
//!
//! The nine choices are fixed by the standard, so the type is a closed sum
//! with exhaustive matching. A tag outside `[0]..[8]` is rejected with
//! [`Error::UnknownGeneralNameTag`] rather than skipped: silently dropping a
//! security-relevant name is worse than failing the parse.

use der::oid::ObjectIdentifier;
use der::{Any, Decode, Encode, Reader, SliceReader, Tag, TagNumber, Tagged};
use x509_cert::name::RdnSequence;

use crate::error::{Error, Result};

/// One of the nine standard identity-naming forms.
///
/// String-shaped variants hold Rust strings and are validated as IA5 (ASCII)
/// on encode. `X400Address` and `EdiPartyName` carry their DER content bytes
/// unparsed; they are preserved for round-trip fidelity, not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralName {
    /// `[0]` — an OID-typed name; `value` is the DER of the inner value.
    OtherName {
        type_id: ObjectIdentifier,
        value: Vec<u8>,
    },
    /// `[1]` — an email address.
    Rfc822Name(String),
    /// `[2]` — a DNS name.
    DnsName(String),
    /// `[3]` — raw ORAddress content.
    X400Address(Vec<u8>),
    /// `[4]` — a distinguished name.
    DirectoryName(RdnSequence),
    /// `[5]` — raw EDIPartyName content.
    EdiPartyName(Vec<u8>),
    /// `[6]` — a URI.
    UniformResourceIdentifier(String),
    /// `[7]` — 4 (IPv4) or 16 (IPv6) address octets.
    IpAddress(Vec<u8>),
    /// `[8]` — a registered OID.
    RegisteredId(ObjectIdentifier),
}

fn context(number: u8, constructed: bool) -> Tag {
    Tag::ContextSpecific {
        constructed,
        number: TagNumber::new(number),
    }
}

fn ia5(s: &str) -> Result<&[u8]> {
    if s.is_ascii() {
        Ok(s.as_bytes())
    } else {
        Err(Error::InvalidInput(format!("not an IA5 string: {s:?}")))
    }
}

fn malformed(err: impl ToString) -> Error {
    Error::MalformedExtension(err.to_string())
}

impl GeneralName {
    /// Encodes as a context-tagged ASN.1 value.
    fn to_any(&self) -> Result<Any> {
        let any = match self {
            GeneralName::OtherName { type_id, value } => {
                let mut content = type_id.to_der()?;
                // The inner value is wrapped in an explicit [0] tag.
                let wrapper = Any::new(context(0, true), value.clone())?;
                content.extend(wrapper.to_der()?);
                Any::new(context(0, true), content)?
            }
            GeneralName::Rfc822Name(s) => Any::new(context(1, false), ia5(s)?.to_vec())?,
            GeneralName::DnsName(s) => Any::new(context(2, false), ia5(s)?.to_vec())?,
            GeneralName::X400Address(content) => Any::new(context(3, true), content.clone())?,
            GeneralName::DirectoryName(name) => Any::new(context(4, true), name.to_der()?)?,
            GeneralName::EdiPartyName(content) => Any::new(context(5, true), content.clone())?,
            GeneralName::UniformResourceIdentifier(s) => Any::new(context(6, false), ia5(s)?.to_vec())?,
            GeneralName::IpAddress(octets) => Any::new(context(7, false), octets.clone())?,
            GeneralName::RegisteredId(oid) => Any::new(context(8, false), oid.as_bytes().to_vec())?,
        };
        Ok(any)
    }

    /// Dispatches on the context tag of a decoded element.
    fn from_any(any: &Any) -> Result<Self> {
        let number = match any.tag() {
            Tag::ContextSpecific { number, .. } => number.value(),
            other => return Err(Error::UnknownGeneralNameTag(other.octet())),
        };
        let value = any.value();
        match number {
            0 => {
                let mut reader = SliceReader::new(value).map_err(malformed)?;
                let type_id = ObjectIdentifier::decode(&mut reader).map_err(malformed)?;
                let wrapper = Any::decode(&mut reader).map_err(malformed)?;
                reader.finish(()).map_err(malformed)?;
                if wrapper.tag() != context(0, true) {
                    return Err(Error::MalformedExtension(format!(
                        "otherName value tag {}",
                        wrapper.tag()
                    )));
                }
                Ok(GeneralName::OtherName {
                    type_id,
                    value: wrapper.value().to_vec(),
                })
            }
            1 => Ok(GeneralName::Rfc822Name(ia5_owned(value)?)),
            2 => Ok(GeneralName::DnsName(ia5_owned(value)?)),
            3 => Ok(GeneralName::X400Address(value.to_vec())),
            4 => Ok(GeneralName::DirectoryName(
                RdnSequence::from_der(value).map_err(malformed)?,
            )),
            5 => Ok(GeneralName::EdiPartyName(value.to_vec())),
            6 => Ok(GeneralName::UniformResourceIdentifier(ia5_owned(value)?)),
            7 => Ok(GeneralName::IpAddress(value.to_vec())),
            8 => Ok(GeneralName::RegisteredId(
                ObjectIdentifier::from_bytes(value).map_err(malformed)?,
            )),
            other => Err(Error::UnknownGeneralNameTag(other)),
        }
    }
}

fn ia5_owned(bytes: &[u8]) -> Result<String> {
    let s = std::str::from_utf8(bytes).map_err(malformed)?;
    if s.is_ascii() {
        Ok(s.to_string())
    } else {
        Err(Error::MalformedExtension(format!(
            "not an IA5 string: {s:?}"
        )))
    }
}

/// Ordered sequence of [`GeneralName`] values.
///
/// Insertion order is preserved on the wire and duplicates are permitted;
/// repetition is semantically meaningful (e.g. multiple DNS names).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralNames(pub Vec<GeneralName>);

impl GeneralNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: GeneralName) {
        self.0.push(name);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneralName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes as an ASN.1 SEQUENCE of context-tagged values, in original
    /// order. An empty sequence is valid per the schema.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let elements = self
            .0
            .iter()
            .map(GeneralName::to_any)
            .collect::<Result<Vec<_>>>()?;
        Ok(elements.to_der()?)
    }

    /// Decodes a SEQUENCE OF GeneralName, rejecting trailing bytes, tag
    /// mismatches, and tags outside the nine defined choices.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let elements = Vec::<Any>::from_der(bytes).map_err(malformed)?;
        let names = elements
            .iter()
            .map(GeneralName::from_any)
            .collect::<Result<Vec<_>>>()?;
        Ok(GeneralNames(names))
    }
}

impl From<Vec<GeneralName>> for GeneralNames {
    fn from(names: Vec<GeneralName>) -> Self {
        GeneralNames(names)
    }
}

impl FromIterator<GeneralName> for GeneralNames {
    fn from_iter<I: IntoIterator<Item = GeneralName>>(iter: I) -> Self {
        GeneralNames(iter.into_iter().collect())
    }
}

impl IntoIterator for GeneralNames {
    type Item = GeneralName;
    type IntoIter = std::vec::IntoIter<GeneralName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
