use thiserror::Error;

/// Represents errors that can occur in the pkivault library.
///
/// Variants fall into three groups: malformed input (always surfaced, never
/// recovered), state misuse (programmer errors, surfaced immediately), and
/// external capability failures (surfaced verbatim with enough context for
/// the caller to react). No operation in this crate retries or swallows a
/// failure on the caller's behalf.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// An extension octet string did not conform to its declared schema.
    #[error("malformed extension: {0}")]
    MalformedExtension(String),

    /// A GeneralName carried a context tag outside the nine defined choices.
    #[error("unknown GeneralName tag [{0}]")]
    UnknownGeneralNameTag(u8),

    /// A certificate could not be parsed or is structurally invalid.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A key archive could not be parsed.
    #[error("corrupt key archive: {0}")]
    CorruptArchive(String),

    /// A builder was driven outside its legal state sequence.
    #[error("invalid builder state: {0}")]
    InvalidBuilderState(&'static str),

    /// `build()` was invoked with required certificate fields unset.
    #[error("incomplete certificate: missing {}", .missing.join(", "))]
    IncompleteCertificate { missing: Vec<&'static str> },

    /// A validity window was empty or inverted.
    #[error("validity period must be positive")]
    InvalidValidityPeriod,

    /// The crypto provider failed to generate a key pair.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// The requested key size is not in the whitelist for the algorithm.
    #[error("unsupported key size {bits} for {algorithm}")]
    UnsupportedKeySize { algorithm: &'static str, bits: u32 },

    /// A key was expected in the secure store but is no longer there.
    #[error("key not found in store: {0}")]
    KeyNotFound(String),

    /// A persistent handle no longer resolves in the store that issued it.
    #[error("handle does not resolve: {0}")]
    HandleNotFound(String),

    /// The key pair is transient and has no persistent handles.
    #[error("key pair has no persistent handles")]
    KeyNotPersisted,

    /// The private key is not exportable (e.g. hardware-bound).
    #[error("key is not exportable")]
    ExportUnsupported,

    /// The password supplied to `import` did not decrypt the archive.
    #[error("invalid archive password")]
    InvalidPassword,

    /// Error during data encoding.
    #[error("failed to encode data: {0}")]
    EncodingFailed(String),

    /// An algorithm, digest, or padding combination this crate does not support.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Error due to invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Error surfaced by an underlying cryptographic operation.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::EncodingFailed(err.to_string())
    }
}

impl From<rsa::Error> for Error {
    fn from(err: rsa::Error) -> Self {
        Error::Crypto(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for Error {
    fn from(err: rsa::pkcs1::Error) -> Self {
        Error::Crypto(err.to_string())
    }
}

impl From<rsa::signature::Error> for Error {
    fn from(err: rsa::signature::Error) -> Self {
        Error::Crypto(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
