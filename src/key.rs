//! Key generation, persistence, import/export, and certificate matching.
//!
//! A [`KeyPair`] owns a public key value and a *reference* to its private
//! key. For pairs produced by [`KeyPairBuilder::generate`] the private key
//! material lives only inside a [`SecureStore`]; the in-memory entity holds an
//! opaque [`PersistentKeyHandle`] plus the public key. Pairs produced by
//! [`KeyPair::import`] are transient until explicitly persisted.

use std::fmt;
use std::sync::Arc;

use der::{Decode, Encode};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rand_core::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::error::{Error, Result};
use crate::store::{KeyClass, KeyHandle, SecureStore, StoredKey};

/// Key sizes accepted for RSA generation, in bits.
pub const RSA_KEY_SIZES: [u32; 3] = [2048, 3072, 4096];

/// Key sizes accepted for elliptic-curve generation, in bits.
pub const EC_KEY_SIZES: [u32; 3] = [256, 384, 521];

/// Asymmetric key algorithm plus key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa { bits: u32 },
    EllipticCurve { bits: u32 },
}

impl KeyAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa { .. } => "RSA",
            KeyAlgorithm::EllipticCurve { .. } => "EC",
        }
    }

    pub fn bits(&self) -> u32 {
        match *self {
            KeyAlgorithm::Rsa { bits } | KeyAlgorithm::EllipticCurve { bits } => bits,
        }
    }

    /// Checks the key size against the per-algorithm whitelist.
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            KeyAlgorithm::Rsa { bits } => RSA_KEY_SIZES.contains(&bits),
            KeyAlgorithm::EllipticCurve { bits } => EC_KEY_SIZES.contains(&bits),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::UnsupportedKeySize {
                algorithm: self.name(),
                bits: self.bits(),
            })
        }
    }
}

/// Digest algorithms accepted for signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }
}

/// Padding schemes accepted for RSA encryption and decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionPadding {
    /// OAEP with SHA-256.
    Oaep,
    /// PKCS#1 v1.5.
    Pkcs1v15,
}

/// Private key material for the supported algorithms.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP256(p256::ecdsa::SigningKey),
    EcdsaP384(p384::ecdsa::SigningKey),
    EcdsaP521(ecdsa::SigningKey<p521::NistP521>),
}

impl PrivateKey {
    /// Generates fresh key material for a whitelisted algorithm/size.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        algorithm.validate()?;
        match algorithm {
            KeyAlgorithm::Rsa { bits } => {
                let key = RsaPrivateKey::new(&mut OsRng, bits as usize)
                    .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;
                Ok(PrivateKey::Rsa(Box::new(key)))
            }
            KeyAlgorithm::EllipticCurve { bits: 256 } => {
                Ok(PrivateKey::EcdsaP256(p256::ecdsa::SigningKey::random(
                    &mut OsRng,
                )))
            }
            KeyAlgorithm::EllipticCurve { bits: 384 } => {
                Ok(PrivateKey::EcdsaP384(p384::ecdsa::SigningKey::random(
                    &mut OsRng,
                )))
            }
            KeyAlgorithm::EllipticCurve { bits: 521 } => Ok(PrivateKey::EcdsaP521(
                ecdsa::SigningKey::<p521::NistP521>::random(&mut OsRng),
            )),
            KeyAlgorithm::EllipticCurve { bits } => Err(Error::UnsupportedKeySize {
                algorithm: "EC",
                bits,
            }),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Rsa(k) => KeyAlgorithm::Rsa {
                bits: (k.size() * 8) as u32,
            },
            PrivateKey::EcdsaP256(_) => KeyAlgorithm::EllipticCurve { bits: 256 },
            PrivateKey::EcdsaP384(_) => KeyAlgorithm::EllipticCurve { bits: 384 },
            PrivateKey::EcdsaP521(_) => KeyAlgorithm::EllipticCurve { bits: 521 },
        }
    }

    /// Derives the public half of the pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(k) => PublicKey::Rsa(RsaPublicKey::from(k.as_ref())),
            PrivateKey::EcdsaP256(k) => PublicKey::EcdsaP256(*k.verifying_key()),
            PrivateKey::EcdsaP384(k) => PublicKey::EcdsaP384(*k.verifying_key()),
            PrivateKey::EcdsaP521(k) => PublicKey::EcdsaP521(*k.verifying_key()),
        }
    }

    /// Serializes as plaintext PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let doc = match self {
            PrivateKey::Rsa(k) => k.to_pkcs8_der(),
            PrivateKey::EcdsaP256(k) => k.to_pkcs8_der(),
            PrivateKey::EcdsaP384(k) => k.to_pkcs8_der(),
            PrivateKey::EcdsaP521(k) => k.to_pkcs8_der(),
        }
        .map_err(|e| Error::EncodingFailed(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Parses plaintext PKCS#8 DER, dispatching on the algorithm identifier.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info =
            PrivateKeyInfo::try_from(der).map_err(|e| Error::InvalidInput(e.to_string()))?;
        match info.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => RsaPrivateKey::from_pkcs8_der(der)
                .map(|k| PrivateKey::Rsa(Box::new(k)))
                .map_err(|e| Error::InvalidInput(e.to_string())),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .map_err(|e| Error::InvalidInput(e.to_string()))?;
                match curve {
                    const_oid::db::rfc5912::SECP_256_R_1 => {
                        p256::ecdsa::SigningKey::from_pkcs8_der(der)
                            .map(PrivateKey::EcdsaP256)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    const_oid::db::rfc5912::SECP_384_R_1 => {
                        p384::ecdsa::SigningKey::from_pkcs8_der(der)
                            .map(PrivateKey::EcdsaP384)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    const_oid::db::rfc5912::SECP_521_R_1 => {
                        ecdsa::SigningKey::<p521::NistP521>::from_pkcs8_der(der)
                            .map(PrivateKey::EcdsaP521)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    other => Err(Error::UnsupportedAlgorithm(format!("EC curve {other}"))),
                }
            }
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Serializes as PKCS#8 `EncryptedPrivateKeyInfo` (PBES2, scrypt +
    /// AES-256-CBC) under a password-derived key.
    pub fn to_encrypted_pkcs8_der(&self, password: &str) -> Result<Vec<u8>> {
        let doc = match self {
            PrivateKey::Rsa(k) => k.to_pkcs8_encrypted_der(&mut OsRng, password.as_bytes()),
            PrivateKey::EcdsaP256(k) => k.to_pkcs8_encrypted_der(&mut OsRng, password.as_bytes()),
            PrivateKey::EcdsaP384(k) => k.to_pkcs8_encrypted_der(&mut OsRng, password.as_bytes()),
            PrivateKey::EcdsaP521(k) => k.to_pkcs8_encrypted_der(&mut OsRng, password.as_bytes()),
        }
        .map_err(|e| Error::EncodingFailed(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Decrypts and parses a PKCS#8 `EncryptedPrivateKeyInfo` archive.
    pub fn from_encrypted_pkcs8_der(data: &[u8], password: &str) -> Result<Self> {
        let encrypted = EncryptedPrivateKeyInfo::from_der(data)
            .map_err(|e| Error::CorruptArchive(e.to_string()))?;
        let doc = encrypted
            .decrypt(password.as_bytes())
            .map_err(|_| Error::InvalidPassword)?;
        Self::from_pkcs8_der(doc.as_bytes()).map_err(|e| Error::CorruptArchive(e.to_string()))
    }

    /// Signs `data` with the given digest, producing an X.509-compatible
    /// signature (PKCS#1 v1.5 for RSA, DER-encoded ECDSA for EC keys).
    ///
    /// ECDSA keys accept only the digest matched to their curve:
    /// P-256/SHA-256, P-384/SHA-384, P-521/SHA-512.
    pub fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        match (self, digest) {
            (PrivateKey::Rsa(k), DigestAlgorithm::Sha256) => {
                let signer = rsa::pkcs1v15::SigningKey::<Sha256>::new((**k).clone());
                Ok(signer.sign(data).to_vec())
            }
            (PrivateKey::Rsa(k), DigestAlgorithm::Sha384) => {
                let signer = rsa::pkcs1v15::SigningKey::<Sha384>::new((**k).clone());
                Ok(signer.sign(data).to_vec())
            }
            (PrivateKey::Rsa(k), DigestAlgorithm::Sha512) => {
                let signer = rsa::pkcs1v15::SigningKey::<Sha512>::new((**k).clone());
                Ok(signer.sign(data).to_vec())
            }
            (PrivateKey::EcdsaP256(k), DigestAlgorithm::Sha256) => {
                let signature: p256::ecdsa::Signature = k.sign(data);
                Ok(signature.to_der().to_vec())
            }
            (PrivateKey::EcdsaP384(k), DigestAlgorithm::Sha384) => {
                let signature: p384::ecdsa::Signature = k.sign(data);
                Ok(signature.to_der().to_vec())
            }
            (PrivateKey::EcdsaP521(k), DigestAlgorithm::Sha512) => {
                // p521 0.13 implements message-level ECDSA (SHA-512) only on
                // its wrapper type, not on ecdsa::SigningKey<NistP521>.
                let signature: p521::ecdsa::Signature =
                    p521::ecdsa::SigningKey::from(k.clone()).sign(data);
                Ok(signature.to_der().to_vec())
            }
            (key, digest) => Err(Error::UnsupportedAlgorithm(format!(
                "{} {} with {}",
                key.algorithm().name(),
                key.algorithm().bits(),
                digest.name()
            ))),
        }
    }

    /// Decrypts RSA ciphertext with an explicit padding scheme.
    pub fn decrypt(&self, ciphertext: &[u8], padding: EncryptionPadding) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(k) => {
                let plaintext = match padding {
                    EncryptionPadding::Oaep => k.decrypt(rsa::Oaep::new::<Sha256>(), ciphertext)?,
                    EncryptionPadding::Pkcs1v15 => k.decrypt(rsa::Pkcs1v15Encrypt, ciphertext)?,
                };
                Ok(plaintext)
            }
            _ => Err(Error::UnsupportedAlgorithm(
                "decryption requires an RSA key".into(),
            )),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "PrivateKey({:?})", self.algorithm())
    }
}

/// Public key material for the supported algorithms.
///
/// Equality is by canonical SubjectPublicKeyInfo encoding.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
    EcdsaP521(ecdsa::VerifyingKey<p521::NistP521>),
}

impl PublicKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(k) => KeyAlgorithm::Rsa {
                bits: (k.size() * 8) as u32,
            },
            PublicKey::EcdsaP256(_) => KeyAlgorithm::EllipticCurve { bits: 256 },
            PublicKey::EcdsaP384(_) => KeyAlgorithm::EllipticCurve { bits: 384 },
            PublicKey::EcdsaP521(_) => KeyAlgorithm::EllipticCurve { bits: 521 },
        }
    }

    /// Converts to X.509 SubjectPublicKeyInfo form.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        match self {
            PublicKey::Rsa(k) => SubjectPublicKeyInfoOwned::from_key(k.clone()),
            PublicKey::EcdsaP256(k) => SubjectPublicKeyInfoOwned::from_key(*k),
            PublicKey::EcdsaP384(k) => SubjectPublicKeyInfoOwned::from_key(*k),
            PublicKey::EcdsaP521(k) => SubjectPublicKeyInfoOwned::from_key(*k),
        }
        .map_err(|e| Error::EncodingFailed(e.to_string()))
    }

    /// Canonical SubjectPublicKeyInfo DER encoding.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_spki()?.to_der()?)
    }

    /// Reads a public key out of X.509 SubjectPublicKeyInfo form.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let raw = spki.subject_public_key.raw_bytes();
        match spki.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => RsaPublicKey::from_pkcs1_der(raw)
                .map(PublicKey::Rsa)
                .map_err(|e| Error::InvalidInput(e.to_string())),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(|| Error::InvalidInput("EC key without curve parameters".into()))?
                    .decode_as::<der::oid::ObjectIdentifier>()
                    .map_err(|e| Error::InvalidInput(e.to_string()))?;
                match curve {
                    const_oid::db::rfc5912::SECP_256_R_1 => {
                        p256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                            .map(PublicKey::EcdsaP256)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    const_oid::db::rfc5912::SECP_384_R_1 => {
                        p384::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                            .map(PublicKey::EcdsaP384)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    const_oid::db::rfc5912::SECP_521_R_1 => {
                        ecdsa::VerifyingKey::<p521::NistP521>::from_sec1_bytes(raw)
                            .map(PublicKey::EcdsaP521)
                            .map_err(|e| Error::InvalidInput(e.to_string()))
                    }
                    other => Err(Error::UnsupportedAlgorithm(format!("EC curve {other}"))),
                }
            }
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Verifies a signature produced by [`PrivateKey::sign`] with the same
    /// digest. Returns `Ok(false)` for signatures that do not verify,
    /// including unparseable signature bytes.
    pub fn verify(&self, data: &[u8], signature: &[u8], digest: DigestAlgorithm) -> Result<bool> {
        match (self, digest) {
            (PublicKey::Rsa(k), DigestAlgorithm::Sha256) => {
                let verifier = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(k.clone());
                Ok(rsa::pkcs1v15::Signature::try_from(signature)
                    .is_ok_and(|sig| verifier.verify(data, &sig).is_ok()))
            }
            (PublicKey::Rsa(k), DigestAlgorithm::Sha384) => {
                let verifier = rsa::pkcs1v15::VerifyingKey::<Sha384>::new(k.clone());
                Ok(rsa::pkcs1v15::Signature::try_from(signature)
                    .is_ok_and(|sig| verifier.verify(data, &sig).is_ok()))
            }
            (PublicKey::Rsa(k), DigestAlgorithm::Sha512) => {
                let verifier = rsa::pkcs1v15::VerifyingKey::<Sha512>::new(k.clone());
                Ok(rsa::pkcs1v15::Signature::try_from(signature)
                    .is_ok_and(|sig| verifier.verify(data, &sig).is_ok()))
            }
            (PublicKey::EcdsaP256(k), DigestAlgorithm::Sha256) => {
                Ok(ecdsa::Signature::<p256::NistP256>::from_der(signature)
                    .is_ok_and(|sig| k.verify(data, &sig).is_ok()))
            }
            (PublicKey::EcdsaP384(k), DigestAlgorithm::Sha384) => {
                Ok(ecdsa::Signature::<p384::NistP384>::from_der(signature)
                    .is_ok_and(|sig| k.verify(data, &sig).is_ok()))
            }
            (PublicKey::EcdsaP521(k), DigestAlgorithm::Sha512) => {
                // Same wrapper detour as in `sign`: only p521's own
                // VerifyingKey has the SHA-512 message-level Verifier impl.
                Ok(ecdsa::Signature::<p521::NistP521>::from_der(signature)
                    .is_ok_and(|sig| p521::ecdsa::VerifyingKey::from(*k).verify(data, &sig).is_ok()))
            }
            (key, digest) => Err(Error::UnsupportedAlgorithm(format!(
                "{} {} with {}",
                key.algorithm().name(),
                key.algorithm().bits(),
                digest.name()
            ))),
        }
    }

    /// Encrypts with an explicit padding scheme. RSA keys only.
    pub fn encrypt(&self, plaintext: &[u8], padding: EncryptionPadding) -> Result<Vec<u8>> {
        match self {
            PublicKey::Rsa(k) => {
                let ciphertext = match padding {
                    EncryptionPadding::Oaep => {
                        k.encrypt(&mut OsRng, rsa::Oaep::new::<Sha256>(), plaintext)?
                    }
                    EncryptionPadding::Pkcs1v15 => {
                        k.encrypt(&mut OsRng, rsa::Pkcs1v15Encrypt, plaintext)?
                    }
                };
                Ok(ciphertext)
            }
            _ => Err(Error::UnsupportedAlgorithm(
                "encryption requires an RSA key".into(),
            )),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_spki_der(), other.to_spki_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PublicKey {}

/// Opaque reference pair usable to reconstruct a [`KeyPair`] from its store
/// without repeating generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentKeyHandle {
    pub private_key: KeyHandle,
    pub public_key: KeyHandle,
}

#[derive(Clone)]
enum PrivateKeyRef {
    Transient(Box<PrivateKey>),
    Stored {
        store: Arc<dyn SecureStore>,
        handle: PersistentKeyHandle,
    },
}

/// Options for [`KeyPairBuilder::generate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Request hardware-backed storage. Keys generated with this flag are
    /// stored non-exportable; [`KeyPair::export`] refuses them.
    pub hardware_backed: bool,
}

/// Configures algorithm and size for key generation.
pub struct KeyPairBuilder {
    algorithm: KeyAlgorithm,
}

impl KeyPairBuilder {
    /// Fails with [`Error::UnsupportedKeySize`] for sizes outside the
    /// per-algorithm whitelist.
    pub fn new(algorithm: KeyAlgorithm) -> Result<Self> {
        algorithm.validate()?;
        Ok(Self { algorithm })
    }

    /// Generates a key pair and persists it under `(label, tag)`.
    ///
    /// The private key material is handed to the store immediately; the
    /// returned pair holds only a [`PersistentKeyHandle`] plus the public key.
    pub fn generate(
        &self,
        store: &Arc<dyn SecureStore>,
        label: &str,
        tag: &[u8],
        options: &GenerateOptions,
    ) -> Result<KeyPair> {
        let private = PrivateKey::generate(self.algorithm)?;
        KeyPair::store_pair(
            Arc::clone(store),
            private,
            label,
            tag,
            options.hardware_backed,
        )
    }
}

/// An asymmetric key pair with lifecycle management.
///
/// The key material itself has immutable value semantics: a pair is created by
/// [`KeyPairBuilder::generate`] or [`KeyPair::import`] and mutated only by
/// [`KeyPair::delete`], which invalidates the private handle. The public key
/// value remains usable for verification after deletion.
#[derive(Clone)]
pub struct KeyPair {
    algorithm: KeyAlgorithm,
    public: PublicKey,
    private: PrivateKeyRef,
}

impl KeyPair {
    fn store_pair(
        store: Arc<dyn SecureStore>,
        private: PrivateKey,
        label: &str,
        tag: &[u8],
        hardware_backed: bool,
    ) -> Result<Self> {
        let public = private.public_key();
        let private_handle = store.store(StoredKey {
            label: label.to_string(),
            tag: tag.to_vec(),
            class: KeyClass::Private,
            der: private.to_pkcs8_der()?,
            exportable: !hardware_backed,
        })?;
        let public_handle = store.store(StoredKey {
            label: label.to_string(),
            tag: tag.to_vec(),
            class: KeyClass::Public,
            der: public.to_spki_der()?,
            exportable: true,
        })?;
        Ok(KeyPair {
            algorithm: private.algorithm(),
            public,
            private: PrivateKeyRef::Stored {
                store,
                handle: PersistentKeyHandle {
                    private_key: private_handle,
                    public_key: public_handle,
                },
            },
        })
    }

    /// Reconstructs a pair purely from stored handles, without re-deriving
    /// key bytes. Fails with [`Error::HandleNotFound`] if either handle no
    /// longer resolves.
    pub fn from_persistent(
        store: Arc<dyn SecureStore>,
        handle: PersistentKeyHandle,
    ) -> Result<Self> {
        store.load(&handle.private_key)?;
        let public_entry = store.load(&handle.public_key)?;
        let spki = SubjectPublicKeyInfoOwned::from_der(&public_entry.der)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let public = PublicKey::from_spki(&spki)?;
        Ok(KeyPair {
            algorithm: public.algorithm(),
            public,
            private: PrivateKeyRef::Stored { store, handle },
        })
    }

    /// Decrypts and parses a password-protected key archive produced by
    /// [`KeyPair::export`]. Imported pairs are transient until persisted.
    pub fn import(data: &[u8], password: &str) -> Result<Self> {
        let private = PrivateKey::from_encrypted_pkcs8_der(data, password)?;
        let public = private.public_key();
        Ok(KeyPair {
            algorithm: private.algorithm(),
            public,
            private: PrivateKeyRef::Transient(Box::new(private)),
        })
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.private, PrivateKeyRef::Stored { .. })
    }

    /// The digest conventionally paired with this key's algorithm.
    pub fn default_digest(&self) -> DigestAlgorithm {
        match self.algorithm {
            KeyAlgorithm::EllipticCurve { bits: 384 } => DigestAlgorithm::Sha384,
            KeyAlgorithm::EllipticCurve { bits: 521 } => DigestAlgorithm::Sha512,
            _ => DigestAlgorithm::Sha256,
        }
    }

    /// Opaque handles suitable for later reconstruction via
    /// [`KeyPair::from_persistent`]. Fails with [`Error::KeyNotPersisted`]
    /// for transient pairs.
    pub fn persistent_references(&self) -> Result<PersistentKeyHandle> {
        match &self.private {
            PrivateKeyRef::Stored { handle, .. } => Ok(handle.clone()),
            PrivateKeyRef::Transient(_) => Err(Error::KeyNotPersisted),
        }
    }

    /// Moves a transient (imported) pair into a store.
    pub fn persist(self, store: Arc<dyn SecureStore>, label: &str, tag: &[u8]) -> Result<Self> {
        match self.private {
            PrivateKeyRef::Transient(private) => {
                Self::store_pair(store, *private, label, tag, false)
            }
            PrivateKeyRef::Stored { .. } => {
                Err(Error::InvalidInput("key pair is already persisted".into()))
            }
        }
    }

    fn resolve_private(&self) -> Result<PrivateKey> {
        match &self.private {
            PrivateKeyRef::Transient(key) => Ok((**key).clone()),
            PrivateKeyRef::Stored { store, handle } => {
                let entry = store.load(&handle.private_key)?;
                PrivateKey::from_pkcs8_der(&entry.der)
            }
        }
    }

    /// Signs with the private key. For persisted pairs the key material is
    /// resolved through the store on every call; after [`KeyPair::delete`]
    /// this fails with [`Error::HandleNotFound`].
    pub fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        self.resolve_private()?.sign(data, digest)
    }

    /// Decrypts with the private key. RSA pairs only.
    pub fn decrypt(&self, ciphertext: &[u8], padding: EncryptionPadding) -> Result<Vec<u8>> {
        self.resolve_private()?.decrypt(ciphertext, padding)
    }

    /// Serializes the private key into a password-protected portable archive
    /// (PKCS#8 `EncryptedPrivateKeyInfo`). Fails with
    /// [`Error::ExportUnsupported`] for keys stored non-exportable.
    pub fn export(&self, password: &str) -> Result<Vec<u8>> {
        let private = match &self.private {
            PrivateKeyRef::Transient(key) => (**key).clone(),
            PrivateKeyRef::Stored { store, handle } => {
                let entry = store.load(&handle.private_key)?;
                if !entry.exportable {
                    return Err(Error::ExportUnsupported);
                }
                PrivateKey::from_pkcs8_der(&entry.der)?
            }
        };
        private.to_encrypted_pkcs8_der(password)
    }

    /// Removes the private and public key entries from the store.
    ///
    /// Not idempotent: a second call fails with [`Error::KeyNotFound`]. The
    /// in-memory public key value remains usable for verification only.
    pub fn delete(&self) -> Result<()> {
        match &self.private {
            PrivateKeyRef::Transient(_) => Err(Error::KeyNotPersisted),
            PrivateKeyRef::Stored { store, handle } => {
                store.delete(&handle.private_key)?;
                store.delete(&handle.public_key)?;
                Ok(())
            }
        }
    }

    /// Determines whether this pair's public key corresponds to
    /// `certificate`, comparing canonical SubjectPublicKeyInfo encodings.
    ///
    /// When `trusted` is non-empty, the certificate must additionally
    /// validate against that anchor set (signature, issuer chain, validity
    /// window). Key mismatch or a failed chain yields `Ok(false)`; only a
    /// malformed certificate is an error.
    pub fn matches_certificate(
        &self,
        certificate: &Certificate,
        trusted: &[Certificate],
    ) -> Result<bool> {
        let cert_key = certificate.subject_public_key()?;
        if cert_key.to_spki_der()? != self.public.to_spki_der()? {
            return Ok(false);
        }
        if trusted.is_empty() {
            return Ok(true);
        }
        crate::trust::evaluate(certificate, trusted)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("persisted", &self.is_persisted())
            .finish()
    }
}
