#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::OnceLock;

use pgp::composed::{
    KeyType, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey, SubkeyParamsBuilder,
};
use pgp::ser::Serialize;
use secrecy::SecretString;

use keep::core::errors::Result;
use keep::core::models::key_ring::KeyRing;
use keep::core::traits::key_entity::KeyEntity;
use keep::core::traits::passphrase::{KeyPrompt, PassphraseSource, StrategyKind};

pub const ALICE_PASS: &str = "correct horse battery staple";
pub const BOB_PASS: &str = "bob's own secret";

pub struct Keys {
    pub alice: SignedSecretKey,
    pub bob: SignedSecretKey,
    /// No passphrase protection.
    pub carol: SignedSecretKey,
}

/// Generated once per test binary; RSA key generation is slow.
pub fn keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(|| Keys {
        alice: generate_key("Alice <alice@example.com>", Some(ALICE_PASS)),
        bob: generate_key("Bob <bob@example.com>", Some(BOB_PASS)),
        carol: generate_key("Carol <carol@example.com>", None),
    })
}

fn generate_key(user_id: &str, passphrase: Option<&str>) -> SignedSecretKey {
    let mut rng = rand::thread_rng();
    let subkey = SubkeyParamsBuilder::default()
        .key_type(KeyType::Rsa(2048))
        .passphrase(passphrase.map(str::to_string))
        .can_encrypt(true)
        .build()
        .unwrap();
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::Rsa(2048))
        .can_certify(true)
        .can_sign(true)
        .primary_user_id(user_id.into())
        .passphrase(passphrase.map(str::to_string))
        .subkey(subkey)
        .build()
        .unwrap();
    let secret = params.generate(&mut rng).unwrap();
    let pass = passphrase.unwrap_or_default().to_string();
    secret.sign(&mut rng, || pass.clone()).unwrap()
}

pub fn public(key: &SignedSecretKey) -> SignedPublicKey {
    SignedPublicKey::from(key.clone())
}

pub fn secret_ring(keys: &[&SignedSecretKey]) -> KeyRing<SignedSecretKey> {
    KeyRing::new(keys.iter().map(|k| (*k).clone()).collect())
}

pub fn public_ring(keys: &[&SignedSecretKey]) -> KeyRing<SignedPublicKey> {
    KeyRing::new(keys.iter().map(|k| public(k)).collect())
}

/// Write a binary secret key-ring, keys in the given order.
pub fn write_secret_ring(path: &Path, keys: &[&SignedSecretKey]) {
    let mut file = std::fs::File::create(path).unwrap();
    for key in keys {
        key.to_writer(&mut file).unwrap();
    }
}

/// Write a binary public key-ring holding the public halves of `keys`.
pub fn write_public_ring(path: &Path, keys: &[&SignedSecretKey]) {
    let mut file = std::fs::File::create(path).unwrap();
    for key in keys {
        public(key).to_writer(&mut file).unwrap();
    }
}

pub fn short_id(key: &SignedSecretKey) -> String {
    key.short_id()
}

/// Passphrase source replaying scripted answers, recording every request.
pub struct Scripted {
    answers: VecDeque<&'static str>,
    pub asked: Vec<String>,
    pub rejected: Vec<String>,
}

impl Scripted {
    pub fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Same answer for every key, like the environment override.
    pub fn always(answer: &'static str) -> Self {
        Self::new(&[answer; 8])
    }
}

impl PassphraseSource for Scripted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::InteractivePrompt
    }

    fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>> {
        self.asked.push(key.short_id.clone());
        Ok(self
            .answers
            .pop_front()
            .map(|a| SecretString::from(a.to_string())))
    }

    fn reject(&mut self, key: &KeyPrompt) -> Result<()> {
        self.rejected.push(key.short_id.clone());
        Ok(())
    }
}
