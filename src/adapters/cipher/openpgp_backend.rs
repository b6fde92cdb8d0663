use std::collections::BTreeMap;
use std::io::Cursor;

use pgp::composed::{
    Deserializable, Esk, Message, SignedPublicKey, SignedPublicSubKey, SignedSecretKey,
};
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::packet::LiteralData;
use pgp::types::{KeyId, PublicKeyTrait};
use pgp::ArmorOptions;
use secrecy::ExposeSecret;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::openpgp_keys::{can_decrypt, secret_key_ids, short_key_id};
use crate::core::errors::{KeepError, Result};
use crate::core::models::decoded_message::{DecodedMessage, SignatureStatus, SignerIdentity};
use crate::core::models::key_ring::{KeyRing, UnlockedKey};
use crate::core::services::passphrase_resolver::PassphraseResolver;
use crate::core::traits::cipher::CredentialCipher;
use crate::core::traits::key_entity::KeyEntity;
use crate::core::traits::passphrase::PassphraseSource;

/// Value of the `Version` armor header on every encoded credential.
pub const ARMOR_VERSION: &str = "OpenPGP";

/// Credential codec built on the pure-Rust OpenPGP implementation.
///
/// Messages are ASCII-armored, encrypted with AES-256 in a SEIPD v1
/// container and, when a signer is given, signed with SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenPgpBackend;

impl OpenPgpBackend {
    pub fn new() -> Self {
        Self
    }

    /// Check the signature of a decrypted message.
    ///
    /// The issuer is looked up in `public_ring` first, then among the
    /// public halves of `secret_ring`. A signature that cannot be checked
    /// because its key is unknown is reported, not rejected; one that is
    /// checked and fails is an error.
    fn verify_signature(
        message: &Message,
        secret_ring: &KeyRing<SignedSecretKey>,
        public_ring: &KeyRing<SignedPublicKey>,
    ) -> Result<SignatureStatus> {
        let Message::Signed { signature, .. } = message else {
            return Ok(SignatureStatus::Unsigned);
        };

        let issuers: Vec<KeyId> = signature.issuer().into_iter().cloned().collect();
        let unknown = |short_id: String| -> Result<SignatureStatus> {
            Ok(SignatureStatus::UnknownSigner(SignerIdentity {
                short_id,
                user_id: None,
            }))
        };
        let Some(first_issuer) = issuers.first() else {
            warn!("signature carries no issuer key id");
            return unknown("unknown".into());
        };

        let from_secret: Vec<SignedPublicKey> = secret_ring
            .iter()
            .map(|key| SignedPublicKey::from(key.clone()))
            .collect();

        for key in public_ring.iter().chain(from_secret.iter()) {
            let signer = SignerIdentity {
                short_id: key.short_id(),
                user_id: key.user_id(),
            };
            let outcome = if issuers.contains(&key.key_id()) {
                message.verify(&key.primary_key)
            } else if let Some(sub) = key
                .public_subkeys
                .iter()
                .find(|sub| issuers.contains(&sub.key.key_id()))
            {
                message.verify(&sub.key)
            } else {
                continue;
            };

            return match outcome {
                Ok(()) => {
                    debug!(signer = %signer, "signature verified");
                    Ok(SignatureStatus::Verified(signer))
                }
                Err(e) => Err(KeepError::SignatureInvalid {
                    signer: signer.short_id,
                    detail: e.to_string(),
                }),
            };
        }

        let short_id = short_key_id(first_issuer);
        warn!(signer = %short_id, "signer is in neither key-ring");
        unknown(short_id)
    }
}

/// Key ids named by the message's public-key session keys.
///
/// Empty when any session key hides its recipient (wildcard id or a v6
/// packet), in which case every decryption key is a candidate.
fn recipient_ids(esk: &[Esk]) -> Vec<KeyId> {
    let mut ids = Vec::new();
    for packet in esk {
        let Esk::PublicKeyEncryptedSessionKey(pkesk) = packet else {
            continue;
        };
        match pkesk.id() {
            Ok(id) if !id.is_wildcard() => ids.push(id.clone()),
            _ => return Vec::new(),
        }
    }
    ids
}

fn encryption_subkey(key: &SignedPublicKey) -> Result<&SignedPublicSubKey> {
    key.public_subkeys
        .iter()
        .find(|sub| sub.key.is_encryption_key())
        .ok_or_else(|| KeepError::EncryptionFailed {
            reason: format!("recipient {} has no encryption sub-key", key.short_id()),
        })
}

impl CredentialCipher for OpenPgpBackend {
    type SecretKey = SignedSecretKey;
    type PublicKey = SignedPublicKey;

    fn decrypt(
        &self,
        armored: &[u8],
        secret_ring: &KeyRing<SignedSecretKey>,
        public_ring: &KeyRing<SignedPublicKey>,
        source: &mut dyn PassphraseSource,
    ) -> Result<DecodedMessage> {
        let (message, _headers) = Message::from_armor_single(Cursor::new(armored))
            .map_err(|e| KeepError::ArmorFormat {
                detail: e.to_string(),
            })?;
        let Message::Encrypted { esk, .. } = &message else {
            return Err(KeepError::ArmorFormat {
                detail: "not an encrypted message".into(),
            });
        };

        let recipients = recipient_ids(esk);
        let candidates: Vec<&SignedSecretKey> = secret_ring
            .iter()
            .filter(|key| can_decrypt(key))
            .filter(|key| {
                recipients.is_empty()
                    || secret_key_ids(key).iter().any(|id| recipients.contains(id))
            })
            .collect();
        debug!(
            recipients = recipients.len(),
            candidates = candidates.len(),
            "decrypting credential"
        );

        let resolved = PassphraseResolver.resolve(&candidates, source)?;
        let passphrase = Zeroizing::new(resolved.passphrase.expose_secret().to_string());

        let (decrypted, _) = message
            .decrypt(|| passphrase.to_string(), &[*resolved.key])
            .map_err(|e| KeepError::DecryptionFailed {
                reason: e.to_string(),
            })?;
        let decrypted = if matches!(decrypted, Message::Compressed(_)) {
            decrypted
                .decompress()
                .map_err(|e| KeepError::DecryptionFailed {
                    reason: format!("cannot decompress: {e}"),
                })?
        } else {
            decrypted
        };

        let signature = Self::verify_signature(&decrypted, secret_ring, public_ring)?;

        let clear_text = decrypted
            .get_content()
            .map_err(|e| KeepError::DecryptionFailed {
                reason: e.to_string(),
            })?
            .ok_or_else(|| KeepError::ArmorFormat {
                detail: "message carries no literal data".into(),
            })?;

        Ok(DecodedMessage {
            clear_text: Zeroizing::new(clear_text),
            signature,
        })
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        recipients: &KeyRing<SignedPublicKey>,
        signer: Option<&UnlockedKey<SignedSecretKey>>,
    ) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        let literal = Message::Literal(LiteralData::from_bytes((&[]).into(), plaintext));

        let message = match signer {
            Some(signer) => {
                let passphrase = Zeroizing::new(signer.passphrase().expose_secret().to_string());
                literal
                    .sign(
                        &mut rng,
                        signer.key(),
                        || passphrase.to_string(),
                        HashAlgorithm::SHA2_256,
                    )
                    .map_err(|e| KeepError::EncryptionFailed {
                        reason: format!("signing with {} failed: {e}", signer.key().short_id()),
                    })?
            }
            None => literal,
        };

        let subkeys = recipients
            .iter()
            .map(encryption_subkey)
            .collect::<Result<Vec<_>>>()?;
        let encrypted = message
            .encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES256, subkeys.as_slice())
            .map_err(|e| KeepError::EncryptionFailed {
                reason: e.to_string(),
            })?;

        let mut headers = BTreeMap::new();
        headers.insert("Version".to_string(), vec![ARMOR_VERSION.to_string()]);
        encrypted
            .to_armored_bytes(ArmorOptions {
                headers: Some(&headers),
                include_checksum: true,
            })
            .map_err(|e| KeepError::EncryptionFailed {
                reason: format!("cannot armor message: {e}"),
            })
    }

    fn name(&self) -> &str {
        "openpgp"
    }
}
