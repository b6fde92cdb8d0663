use serde::{Deserialize, Serialize};

/// A named bundle of key-ring paths, account directory and key ids.
///
/// Field names on disk match the `keep.conf` files written by earlier
/// releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Profile {
    pub name: String,
    pub secring_dir: String,
    pub pubring_dir: String,
    pub account_dir: String,
    /// Whitespace-separated short ids of the keys new accounts are encrypted to.
    pub recipient_key_ids: String,
    /// Short id of the key new accounts are signed with; empty disables signing.
    #[serde(rename = "SignerKeyID", default)]
    pub signer_key_id: String,
}

impl Profile {
    pub fn signs(&self) -> bool {
        !self.signer_key_id.trim().is_empty()
    }
}
