use secrecy::SecretString;

/// An identity loaded from a key-ring.
///
/// The core matches and reports keys only through this trait, so the
/// OpenPGP engine stays behind `adapters::cipher`.
pub trait KeyEntity {
    /// Short identifier: the last 8 hex digits of the primary key id, uppercase.
    fn short_id(&self) -> String;

    /// Full primary key fingerprint as uppercase hex. Used as the agent cache key.
    fn fingerprint(&self) -> String;

    /// Primary user id, when the key carries one.
    fn user_id(&self) -> Option<String> {
        None
    }
}

/// A key entity with private material that a passphrase may unlock.
pub trait Unlockable: KeyEntity {
    /// Whether the private material is protected at all.
    ///
    /// Unprotected keys are unlocked without asking any passphrase source.
    fn requires_passphrase(&self) -> bool {
        true
    }

    /// Check `passphrase` against the primary key and every sub-key.
    fn unlocks_with(&self, passphrase: &SecretString) -> bool;
}

impl<T: KeyEntity + ?Sized> KeyEntity for &T {
    fn short_id(&self) -> String {
        (**self).short_id()
    }

    fn fingerprint(&self) -> String {
        (**self).fingerprint()
    }

    fn user_id(&self) -> Option<String> {
        (**self).user_id()
    }
}

impl<T: Unlockable + ?Sized> Unlockable for &T {
    fn requires_passphrase(&self) -> bool {
        (**self).requires_passphrase()
    }

    fn unlocks_with(&self, passphrase: &SecretString) -> bool {
        (**self).unlocks_with(passphrase)
    }
}
