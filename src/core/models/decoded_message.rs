use zeroize::Zeroizing;

/// Who signed a credential, as far as the key-rings can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    pub short_id: String,
    pub user_id: Option<String>,
}

impl std::fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.user_id {
            Some(uid) => write!(f, "{} ({})", self.short_id, uid),
            None => write!(f, "{}", self.short_id),
        }
    }
}

/// Outcome of signature processing for a decoded message.
///
/// There is deliberately no "failed" variant: a signature that does not
/// verify makes the decode operation fail instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Unsigned,
    /// Signed, and the signature verifies against a key from the rings.
    Verified(SignerIdentity),
    /// Signed by a key found in neither ring; nothing could be checked.
    UnknownSigner(SignerIdentity),
}

impl SignatureStatus {
    pub fn is_signed(&self) -> bool {
        !matches!(self, Self::Unsigned)
    }

    pub fn signer(&self) -> Option<&SignerIdentity> {
        match self {
            Self::Unsigned => None,
            Self::Verified(signer) | Self::UnknownSigner(signer) => Some(signer),
        }
    }
}

/// Clear text recovered from an encrypted artifact, with its provenance.
pub struct DecodedMessage {
    pub clear_text: Zeroizing<Vec<u8>>,
    pub signature: SignatureStatus,
}

impl std::fmt::Debug for DecodedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedMessage")
            .field("clear_text", &format_args!("[{} bytes]", self.clear_text.len()))
            .field("signature", &self.signature)
            .finish()
    }
}
