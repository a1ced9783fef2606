//! # PkiVault - X.509 Certificates and Key-Pair Lifecycle in Pure Rust
//!
//! PkiVault builds, signs, and inspects X.509 certificates and manages the
//! full lifecycle of the asymmetric key pairs behind them, built entirely on
//! rustcrypto libraries with no dependency on ring or openssl. Private key
//! material lives behind a pluggable [`store::SecureStore`] boundary; the
//! in-memory key pair holds opaque handles plus the public key.
//!
//! ## Supported Key Types
//!
//! - **RSA**: 2048, 3072, and 4096-bit keys
//! - **ECDSA**: P-256, P-384, and P-521 curves
//!
//! ## Key Features
//!
//! - **Pure Rust**: built entirely with rustcrypto libraries
//! - **Key lifecycle**: generate, persist, reconstruct from handles, export
//!   to password-protected archives, import, delete
//! - **Certificate building**: a consuming builder that reports every
//!   missing field and cannot be reused after signing
//! - **X.509 Extensions**: typed extension values with an open registry;
//!   unknown extensions are preserved, not dropped
//! - **Trust evaluation**: match a key pair against a certificate, optionally
//!   anchored in an explicit trust set
//! - **Format flexibility**: import/export in both PEM and DER
//!
//! ## Quick Start
//!
//! ### Generating a Key Pair and a Self-Signed Certificate
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pkivault::{
//!     cert::{Certificate, params::{CertificateRequest, DistinguishedName, Validity}},
//!     key::{GenerateOptions, KeyAlgorithm, KeyPairBuilder},
//!     store::{MemoryStore, SecureStore},
//! };
//!
//! # fn main() -> Result<(), pkivault::error::Error> {
//! let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
//!
//! // Generate and persist an EC P-256 key pair.
//! let key_pair = KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })?
//!     .generate(&store, "example.com", b"com.example.server", &GenerateOptions::default())?;
//!
//! let subject = DistinguishedName::builder()
//!     .common_name("example.com")
//!     .organization("Example Corp")
//!     .country("US")
//!     .build();
//!
//! let request = CertificateRequest::builder()
//!     .subject(subject)
//!     .subject_public_key(key_pair.public_key().clone())
//!     .build();
//!
//! let certificate =
//!     Certificate::new_self_signed(&request, &key_pair, Validity::for_days(365)?)?;
//! println!("{}", certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Creating a Certificate Chain
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pkivault::{
//!     cert::{Certificate, params::{CertificateRequest, DistinguishedName, Validity}},
//!     issuer::{CertificateWithPrivateKey, Issuer},
//!     key::{GenerateOptions, KeyAlgorithm, KeyPairBuilder},
//!     store::{MemoryStore, SecureStore},
//! };
//!
//! # fn main() -> Result<(), pkivault::error::Error> {
//! let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
//! let options = GenerateOptions::default();
//! let builder = KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })?;
//! let ca_key = builder.generate(&store, "Example CA", b"com.example.ca", &options)?;
//! let server_key = builder.generate(&store, "server", b"com.example.server", &options)?;
//!
//! let ca_request = CertificateRequest::builder()
//!     .subject(DistinguishedName::builder().common_name("Example CA").build())
//!     .subject_public_key(ca_key.public_key().clone())
//!     .is_ca(true)
//!     .build();
//! let ca_cert = Certificate::new_self_signed(&ca_request, &ca_key, Validity::for_days(3650)?)?;
//!
//! let ca = CertificateWithPrivateKey { cert: ca_cert.clone(), key: ca_key };
//! let server_request = CertificateRequest::builder()
//!     .subject(DistinguishedName::builder().common_name("server.example.com").build())
//!     .subject_public_key(server_key.public_key().clone())
//!     .build();
//! let server_cert = ca.issue(&server_request, Validity::for_days(365)?)?;
//!
//! // The issued certificate chains to the CA anchor.
//! assert!(server_key.matches_certificate(&server_cert, &[ca_cert])?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Exporting and Importing Key Pairs
//!
//! ```rust,no_run
//! use pkivault::key::KeyPair;
//!
//! # fn main() -> Result<(), pkivault::error::Error> {
//! # use std::sync::Arc;
//! # use pkivault::key::{GenerateOptions, KeyAlgorithm, KeyPairBuilder};
//! # use pkivault::store::{MemoryStore, SecureStore};
//! # let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
//! # let key_pair = KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })?
//! #     .generate(&store, "k", b"k", &GenerateOptions::default())?;
//! // Password-protected portable archive (PKCS#8 EncryptedPrivateKeyInfo).
//! let archive = key_pair.export("correct horse battery staple")?;
//! let restored = KeyPair::import(&archive, "correct horse battery staple")?;
//! assert_eq!(restored.public_key(), key_pair.public_key());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: key generation, persistence, import/export, signing, and
//!   certificate matching
//! - [`store`]: the secure key storage boundary and an in-memory backend
//! - [`cert`]: certificate building, encoding/decoding, names, and extensions
//! - [`issuer`]: certificate issuing functionality and CA operations
//! - [`trust`]: trust evaluation against explicit anchor sets
//! - [`error`]: the error taxonomy
//! - [`tbs_certificate`]: low-level certificate structure manipulation

pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod store;
pub mod tbs_certificate;
pub mod trust;
