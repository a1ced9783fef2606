//! Key-pair lifecycle tests: generate, persist, export, import, delete.

mod util;

use pkivault::error::Error;
use pkivault::key::{
    DigestAlgorithm, EncryptionPadding, GenerateOptions, KeyAlgorithm, KeyPair, KeyPairBuilder,
};

use util::{ec_pair, memory_store, rsa_pair, self_signed_ca};

#[test]
fn generated_pair_signs_through_the_store() {
    let store = memory_store();
    let pair = ec_pair(&store, "signer");
    assert!(pair.is_persisted());

    let signature = pair.sign(b"payload", DigestAlgorithm::Sha256).unwrap();
    assert!(pair
        .public_key()
        .verify(b"payload", &signature, DigestAlgorithm::Sha256)
        .unwrap());
}

#[test]
fn persistent_references_reconstruct_the_pair() {
    let store = memory_store();
    let pair = ec_pair(&store, "persisted");
    let handles = pair.persistent_references().unwrap();

    let restored = KeyPair::from_persistent(store.clone(), handles).unwrap();
    assert_eq!(restored.public_key(), pair.public_key());
    assert_eq!(restored.algorithm(), KeyAlgorithm::EllipticCurve { bits: 256 });

    // The restored pair signs with the same private key.
    let signature = restored.sign(b"data", DigestAlgorithm::Sha256).unwrap();
    assert!(pair
        .public_key()
        .verify(b"data", &signature, DigestAlgorithm::Sha256)
        .unwrap());
}

#[test]
fn export_import_preserves_the_private_key() {
    let store = memory_store();
    let pair = rsa_pair(&store, "exported");
    let archive = pair.export("hunter2").unwrap();

    let imported = KeyPair::import(&archive, "hunter2").unwrap();
    assert!(!imported.is_persisted());
    assert_eq!(imported.public_key(), pair.public_key());

    // Ciphertext for the original decrypts under the imported copy.
    let ciphertext = pair
        .public_key()
        .encrypt(b"secret", EncryptionPadding::Oaep)
        .unwrap();
    let plaintext = imported
        .decrypt(&ciphertext, EncryptionPadding::Oaep)
        .unwrap();
    assert_eq!(plaintext, b"secret");
}

#[test]
fn wrong_password_is_rejected() {
    let store = memory_store();
    let pair = ec_pair(&store, "password");
    let archive = pair.export("correct").unwrap();
    assert!(matches!(
        KeyPair::import(&archive, "incorrect"),
        Err(Error::InvalidPassword)
    ));
}

#[test]
fn corrupt_archive_is_rejected() {
    assert!(matches!(
        KeyPair::import(&[0xde, 0xad, 0xbe, 0xef], "any"),
        Err(Error::CorruptArchive(_))
    ));

    // Truncating a real archive also fails as corrupt, not as a bad password.
    let store = memory_store();
    let pair = ec_pair(&store, "truncated");
    let archive = pair.export("pw").unwrap();
    assert!(matches!(
        KeyPair::import(&archive[..archive.len() / 2], "pw"),
        Err(Error::CorruptArchive(_))
    ));
}

#[test]
fn imported_pair_is_independent_of_the_original() {
    let store = memory_store();
    let pair = ec_pair(&store, "independent");
    let archive = pair.export("pw").unwrap();
    let imported = KeyPair::import(&archive, "pw").unwrap();

    pair.delete().unwrap();

    // Deleting the stored original does not affect the imported copy.
    let signature = imported.sign(b"still works", DigestAlgorithm::Sha256).unwrap();
    assert!(imported
        .public_key()
        .verify(b"still works", &signature, DigestAlgorithm::Sha256)
        .unwrap());
}

#[test]
fn delete_invalidates_handles_and_is_not_idempotent() {
    let store = memory_store();
    let pair = ec_pair(&store, "deleted");
    let handles = pair.persistent_references().unwrap();

    pair.delete().unwrap();

    assert!(matches!(
        pair.sign(b"data", DigestAlgorithm::Sha256),
        Err(Error::HandleNotFound(_))
    ));
    assert!(matches!(
        KeyPair::from_persistent(store.clone(), handles),
        Err(Error::HandleNotFound(_))
    ));
    assert!(matches!(pair.delete(), Err(Error::KeyNotFound(_))));
}

#[test]
fn hardware_backed_keys_refuse_export() {
    let store = memory_store();
    let pair = KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 384 })
        .unwrap()
        .generate(
            &store,
            "sealed",
            b"sealed",
            &GenerateOptions {
                hardware_backed: true,
            },
        )
        .unwrap();
    assert!(matches!(pair.export("pw"), Err(Error::ExportUnsupported)));

    // Signing still works; only the material is sealed.
    assert!(pair.sign(b"data", DigestAlgorithm::Sha384).is_ok());
}

#[test]
fn transient_pairs_have_no_handles_until_persisted() {
    let store = memory_store();
    let pair = ec_pair(&store, "source");
    let archive = pair.export("pw").unwrap();
    let imported = KeyPair::import(&archive, "pw").unwrap();

    assert!(matches!(
        imported.persistent_references(),
        Err(Error::KeyNotPersisted)
    ));
    assert!(matches!(imported.delete(), Err(Error::KeyNotPersisted)));

    let persisted = imported.persist(store.clone(), "adopted", b"adopted").unwrap();
    assert!(persisted.is_persisted());
    assert!(persisted.persistent_references().is_ok());
}

#[test]
fn deleted_pair_still_matches_its_certificate_key() {
    let store = memory_store();
    let pair = ec_pair(&store, "verify-after-delete");
    let cert = self_signed_ca("verify-after-delete", &pair);

    pair.delete().unwrap();

    // Public-key comparison needs no private material.
    assert!(pair.matches_certificate(&cert, &[]).unwrap());
    assert!(cert.verify_signed_by(pair.public_key()).unwrap());
}
