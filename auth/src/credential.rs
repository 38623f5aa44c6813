//! Password credential derivation and verification.
//!
//! Passwords are never stored. Each account keeps a random salt and the
//! PBKDF2-HMAC-SHA512 digest of the password under that salt:
//!
//! - 16 random salt bytes, hex-encoded; the hex text is the KDF salt input
//! - 100,000 iterations by default
//! - 64-byte derived key, hex-encoded
//! - Constant-time digest comparison on verification

use rand::RngCore;
use sha2::Sha512;

/// Default PBKDF2 iteration count.
pub const KDF_DEFAULT_ITERATIONS: u32 = 100_000;
/// Derived key length in bytes.
pub const KDF_OUTPUT_LENGTH: usize = 64;
/// Random salt length in bytes (before hex encoding).
pub const SALT_LENGTH: usize = 16;

/// Salt and derived hash pair stored on an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Hex-encoded random salt
    pub salt: String,
    /// Hex-encoded PBKDF2-HMAC-SHA512 output
    pub hash: String,
}

/// Derives a credential from a plaintext password.
///
/// When `salt` is `None` a fresh random salt is generated. Passing the salt
/// stored on an account reproduces that account's hash for the same password.
///
/// # Examples
///
/// ```
/// # use auth::credential::hash_credential;
/// let first = hash_credential("hunter2hunter2", None, 1_000);
/// let again = hash_credential("hunter2hunter2", Some(&first.salt), 1_000);
/// assert_eq!(first, again);
/// ```
pub fn hash_credential(password: &str, salt: Option<&str>, iterations: u32) -> Credential {
    let salt = match salt {
        Some(salt) => salt.to_string(),
        None => generate_salt(),
    };

    let mut derived = [0u8; KDF_OUTPUT_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        iterations,
        &mut derived,
    );

    Credential {
        salt,
        hash: hex_encode(&derived),
    }
}

/// Checks a plaintext password against a stored credential.
///
/// Recomputes the digest with the stored salt; the plaintext is never
/// compared directly.
pub fn verify_credential(credential: &Credential, password: &str, iterations: u32) -> bool {
    let candidate = hash_credential(password, Some(&credential.salt), iterations);
    constant_time_compare(&candidate.hash, &credential.hash)
}

/// Generates a cryptographically secure random salt, hex-encoded.
fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rng().fill_bytes(&mut salt);
    hex_encode(&salt)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
