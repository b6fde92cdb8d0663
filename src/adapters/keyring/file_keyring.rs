use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pgp::composed::{Deserializable, SignedPublicKey, SignedSecretKey};
use tracing::debug;

use crate::core::errors::{KeepError, Result};
use crate::core::models::key_ring::KeyRing;

/// Read every key entity stored in a binary (non-armored) key-ring file.
///
/// An empty file is an empty ring. A file with content that yields no key
/// at all is reported as malformed rather than silently accepted.
pub fn load_key_ring<K: Deserializable>(path: &Path) -> Result<KeyRing<K>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => KeepError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => KeepError::Io(e),
    })?;

    if file.metadata()?.len() == 0 {
        debug!(path = %path.display(), "key-ring file is empty");
        return Ok(KeyRing::default());
    }

    let parse_error = |detail: String| KeepError::KeyRingParse {
        path: path.to_path_buf(),
        detail,
    };

    let mut entities = Vec::new();
    for entity in K::from_bytes_many(BufReader::new(file)) {
        entities.push(entity.map_err(|e| parse_error(e.to_string()))?);
    }
    if entities.is_empty() {
        return Err(parse_error("no key found".into()));
    }

    debug!(path = %path.display(), keys = entities.len(), "loaded key-ring");
    Ok(KeyRing::new(entities))
}

pub fn load_secret_ring(path: &Path) -> Result<KeyRing<SignedSecretKey>> {
    load_key_ring(path)
}

pub fn load_public_ring(path: &Path) -> Result<KeyRing<SignedPublicKey>> {
    load_key_ring(path)
}
