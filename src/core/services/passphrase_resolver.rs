use secrecy::SecretString;
use tracing::{debug, warn};

use crate::core::errors::{KeepError, Result};
use crate::core::models::key_ring::{KeyRing, UnlockedKey};
use crate::core::traits::key_entity::Unlockable;
use crate::core::traits::passphrase::{KeyPrompt, PassphraseSource};

/// The candidate that was unlocked and the passphrase that did it.
pub struct Resolved<'a, K> {
    pub key: &'a K,
    pub index: usize,
    pub passphrase: SecretString,
}

/// Finds the passphrase that unlocks one of several candidate keys.
///
/// Candidates are tried in order. Each one is offered to the passphrase
/// source exactly once; a wrong answer lets the source recover (the agent
/// evicts its cached entry) before the next candidate is tried. Running
/// out of candidates is terminal for the calling operation.
pub struct PassphraseResolver;

impl PassphraseResolver {
    /// Resolve a passphrase for the first candidate that accepts one.
    ///
    /// # Errors
    ///
    /// - `DecryptionExhausted` when no candidate could be unlocked,
    ///   including when `candidates` is empty.
    /// - Whatever the source reports when it cannot produce an answer at
    ///   all (unreadable console, broken agent connection).
    pub fn resolve<'a, K: Unlockable>(
        &self,
        candidates: &'a [K],
        source: &mut dyn PassphraseSource,
    ) -> Result<Resolved<'a, K>> {
        debug!(
            candidates = candidates.len(),
            strategy = %source.kind(),
            "resolving passphrase"
        );

        for (index, key) in candidates.iter().enumerate() {
            let prompt = KeyPrompt {
                short_id: key.short_id(),
                fingerprint: key.fingerprint(),
                user_id: key.user_id(),
            };

            if !key.requires_passphrase() {
                debug!(key = %prompt.short_id, "key is not passphrase protected");
                return Ok(Resolved {
                    key,
                    index,
                    passphrase: SecretString::from(String::new()),
                });
            }

            let Some(passphrase) = source.passphrase_for(&prompt)? else {
                debug!(key = %prompt.short_id, "no passphrase offered, trying next key");
                continue;
            };

            if key.unlocks_with(&passphrase) {
                debug!(key = %prompt.short_id, strategy = %source.kind(), "key unlocked");
                return Ok(Resolved {
                    key,
                    index,
                    passphrase,
                });
            }

            warn!(key = %prompt.short_id, strategy = %source.kind(), "passphrase rejected");
            source.reject(&prompt)?;
        }

        Err(KeepError::DecryptionExhausted {
            tried: candidates.len(),
        })
    }

    /// Select the signing key named by `signer_ids` and unlock it.
    ///
    /// Exactly one key of `secret_ring` must match.
    pub fn unlock_signer<K: Unlockable + Clone>(
        &self,
        secret_ring: &KeyRing<K>,
        signer_ids: &str,
        source: &mut dyn PassphraseSource,
    ) -> Result<UnlockedKey<K>> {
        let matching = secret_ring.filter(signer_ids).into_vec();
        if matching.len() != 1 {
            return Err(KeepError::SignerSelection {
                found: matching.len(),
            });
        }

        let resolved = self.resolve(&matching, source)?;
        UnlockedKey::new(resolved.key.clone(), resolved.passphrase)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::core::models::key_ring::tests::FakeKey;
    use crate::core::traits::passphrase::StrategyKind;

    /// Source that replays scripted answers and records every call.
    struct ScriptedSource {
        kind: StrategyKind,
        answers: VecDeque<Option<&'static str>>,
        asked: Vec<String>,
        rejected: Vec<String>,
    }

    impl ScriptedSource {
        fn new(answers: &[Option<&'static str>]) -> Self {
            Self {
                kind: StrategyKind::InteractivePrompt,
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
                rejected: Vec::new(),
            }
        }
    }

    impl PassphraseSource for ScriptedSource {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>> {
            self.asked.push(key.short_id.clone());
            match self.answers.pop_front() {
                Some(answer) => Ok(answer.map(SecretString::from)),
                None => Err(KeepError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "console closed",
                ))),
            }
        }

        fn reject(&mut self, key: &KeyPrompt) -> Result<()> {
            self.rejected.push(key.short_id.clone());
            Ok(())
        }
    }

    /// Fixed answer for every key, like the environment override.
    struct FixedSource(&'static str, usize);

    impl PassphraseSource for FixedSource {
        fn kind(&self) -> StrategyKind {
            StrategyKind::EnvironmentOverride
        }

        fn passphrase_for(&mut self, _key: &KeyPrompt) -> Result<Option<SecretString>> {
            self.1 += 1;
            Ok(Some(SecretString::from(self.0)))
        }
    }

    fn keys() -> Vec<FakeKey> {
        vec![
            FakeKey::new("AAAA0001", "first"),
            FakeKey::new("BBBB0002", "second"),
        ]
    }

    #[test]
    fn stops_at_first_success() {
        let candidates = keys();
        let mut source = ScriptedSource::new(&[Some("first")]);

        let resolved = PassphraseResolver.resolve(&candidates, &mut source).unwrap();

        assert_eq!(resolved.index, 0);
        assert_eq!(resolved.key.id, "AAAA0001");
        assert_eq!(resolved.passphrase.expose_secret(), "first");
        assert_eq!(source.asked, vec!["AAAA0001"]);
        assert!(source.rejected.is_empty());
    }

    #[test]
    fn wrong_passphrase_moves_to_next_candidate() {
        let candidates = keys();
        let mut source = ScriptedSource::new(&[Some("nope"), Some("second")]);

        let resolved = PassphraseResolver.resolve(&candidates, &mut source).unwrap();

        assert_eq!(resolved.index, 1);
        assert_eq!(source.asked, vec!["AAAA0001", "BBBB0002"]);
        assert_eq!(source.rejected, vec!["AAAA0001"]);
    }

    #[test]
    fn no_candidates_is_exhausted_without_prompting() {
        let candidates: Vec<FakeKey> = Vec::new();
        let mut source = ScriptedSource::new(&[]);

        let err = PassphraseResolver
            .resolve(&candidates, &mut source)
            .err()
            .unwrap();

        assert!(matches!(err, KeepError::DecryptionExhausted { tried: 0 }));
        assert!(source.asked.is_empty());
    }

    #[test]
    fn prompts_at_most_once_per_candidate() {
        let candidates = keys();
        let mut source = ScriptedSource::new(&[Some("x"), Some("y"), Some("z")]);

        let err = PassphraseResolver
            .resolve(&candidates, &mut source)
            .err()
            .unwrap();

        assert!(matches!(err, KeepError::DecryptionExhausted { tried: 2 }));
        assert_eq!(source.asked, vec!["AAAA0001", "BBBB0002"]);
        assert_eq!(source.rejected, vec!["AAAA0001", "BBBB0002"]);
    }

    #[test]
    fn declined_candidate_is_skipped_without_rejection() {
        let candidates = keys();
        let mut source = ScriptedSource::new(&[None, Some("second")]);

        let resolved = PassphraseResolver.resolve(&candidates, &mut source).unwrap();

        assert_eq!(resolved.index, 1);
        assert!(source.rejected.is_empty());
    }

    #[test]
    fn unprotected_key_needs_no_passphrase() {
        let candidates = vec![FakeKey::new("AAAA0001", "")];
        let mut source = ScriptedSource::new(&[]);

        let resolved = PassphraseResolver.resolve(&candidates, &mut source).unwrap();

        assert_eq!(resolved.index, 0);
        assert!(source.asked.is_empty());
    }

    #[test]
    fn source_failure_is_propagated() {
        let candidates = keys();
        let mut source = ScriptedSource::new(&[]);

        let err = PassphraseResolver
            .resolve(&candidates, &mut source)
            .err()
            .unwrap();

        assert!(matches!(err, KeepError::Io(_)));
    }

    #[test]
    fn fixed_override_exhausts_instead_of_blocking() {
        let candidates = keys();
        let mut source = FixedSource("x", 0);

        let err = PassphraseResolver
            .resolve(&candidates, &mut source)
            .err()
            .unwrap();

        assert!(matches!(err, KeepError::DecryptionExhausted { tried: 2 }));
        assert_eq!(source.1, 2);
    }

    #[test]
    fn unlock_signer_requires_exactly_one_match() {
        let ring = KeyRing::new(keys());
        let mut source = ScriptedSource::new(&[]);

        let none = PassphraseResolver
            .unlock_signer(&ring, "CCCC0003", &mut source)
            .unwrap_err();
        assert!(matches!(none, KeepError::SignerSelection { found: 0 }));

        let two = PassphraseResolver
            .unlock_signer(&ring, "AAAA0001 BBBB0002", &mut source)
            .unwrap_err();
        assert!(matches!(two, KeepError::SignerSelection { found: 2 }));
        assert!(source.asked.is_empty());
    }

    #[test]
    fn unlock_signer_returns_unlocked_key() {
        let ring = KeyRing::new(keys());
        let mut source = ScriptedSource::new(&[Some("second")]);

        let signer = PassphraseResolver
            .unlock_signer(&ring, "BBBB0002", &mut source)
            .unwrap();

        assert_eq!(signer.key().id, "BBBB0002");
        assert_eq!(signer.passphrase().expose_secret(), "second");
    }

    #[test]
    fn unlock_signer_with_wrong_passphrase_is_exhausted() {
        let ring = KeyRing::new(keys());
        let mut source = ScriptedSource::new(&[Some("wrong")]);

        let err = PassphraseResolver
            .unlock_signer(&ring, "AAAA0001", &mut source)
            .unwrap_err();
        assert!(matches!(err, KeepError::DecryptionExhausted { tried: 1 }));
    }
}
