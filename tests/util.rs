//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use pkivault::cert::Certificate;
use pkivault::cert::params::{CertificateRequest, DistinguishedName, Validity};
use pkivault::key::{GenerateOptions, KeyAlgorithm, KeyPair, KeyPairBuilder};
use pkivault::store::{MemoryStore, SecureStore};

pub fn memory_store() -> Arc<dyn SecureStore> {
    Arc::new(MemoryStore::new())
}

pub fn ec_pair(store: &Arc<dyn SecureStore>, label: &str) -> KeyPair {
    KeyPairBuilder::new(KeyAlgorithm::EllipticCurve { bits: 256 })
        .unwrap()
        .generate(store, label, label.as_bytes(), &GenerateOptions::default())
        .unwrap()
}

pub fn rsa_pair(store: &Arc<dyn SecureStore>, label: &str) -> KeyPair {
    KeyPairBuilder::new(KeyAlgorithm::Rsa { bits: 2048 })
        .unwrap()
        .generate(store, label, label.as_bytes(), &GenerateOptions::default())
        .unwrap()
}

pub fn name(cn: &str) -> DistinguishedName {
    DistinguishedName::builder().common_name(cn).build()
}

pub fn self_signed_ca(cn: &str, key: &KeyPair) -> Certificate {
    let request = CertificateRequest::builder()
        .subject(name(cn))
        .subject_public_key(key.public_key().clone())
        .is_ca(true)
        .build();
    Certificate::new_self_signed(&request, key, Validity::for_days(30).unwrap()).unwrap()
}
