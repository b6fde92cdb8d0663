use rand::Rng;
use rand::rngs::OsRng;

/// Characters a generated password is drawn from.
///
/// Visually ambiguous characters (g, h, l, I, O) are left out.
pub const PASSWORD_ALPHABET: &[u8] =
    b"abcdefijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ0123456789~-_=+(){}@#&$";

/// Length used when the user answers `gen` at the password prompt.
pub const DEFAULT_PASSWORD_LENGTH: usize = 10;

/// Return a random password of `length` characters from the OS CSPRNG.
pub fn generate_password(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())]))
        .collect()
}
