// ============================
// backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! A stored credential is `base64(salt ‖ key)` where `salt` is 16 random
//! bytes and `key` is 32 bytes of PBKDF2-HMAC-SHA256 output. Plaintext is
//! never stored or logged.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, TryRngCore};
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 rounds
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Failures that prevent a credential from being produced at all
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("OS random number generator failed: {0}")]
    Rng(#[from] rand::rand_core::OsError),
}

/// Encoded salt and derived key, safe to persist
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Credential {
    fn from(encoded: String) -> Self {
        Self(encoded)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Password complexity requirements
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl PasswordRequirements {
    /// Human readable policy, used as the rejection message
    pub fn describe(&self) -> String {
        let mut classes = Vec::new();
        if self.require_uppercase {
            classes.push("an uppercase letter");
        }
        if self.require_lowercase {
            classes.push("a lowercase letter");
        }
        if self.require_digit {
            classes.push("a digit");
        }
        if self.require_special {
            classes.push("a special character");
        }

        let mut message = format!("Password must be at least {} characters", self.min_length);
        if !classes.is_empty() {
            message.push_str(" and contain ");
            message.push_str(&classes.join(", "));
        }
        message
    }
}

fn derive_key(plain: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(plain, salt, PBKDF2_ITERATIONS, key.as_mut_slice());
    key
}

/// Well-formed credential that no password matches, for unknown-user logins
///
/// Verifying against it costs exactly one key derivation, the same as a
/// real account, and building it needs none.
static DECOY: LazyLock<Credential> =
    LazyLock::new(|| Credential(STANDARD.encode([0u8; SALT_LEN + KEY_LEN])));

pub fn decoy_credential() -> &'static Credential {
    &DECOY
}

/// Hash a password with a fresh random salt
pub fn hash_password(plain: &str) -> Result<Credential, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt)?;

    let key = derive_key(plain.as_bytes(), &salt);

    let mut packed = Zeroizing::new(Vec::with_capacity(SALT_LEN + KEY_LEN));
    packed.extend_from_slice(&salt);
    packed.extend_from_slice(key.as_slice());
    Ok(Credential(STANDARD.encode(packed.as_slice())))
}

/// Verify a password against a stored credential
///
/// Malformed credentials verify as `false`.
pub fn verify_password(plain: &str, stored: &Credential) -> bool {
    let decoded = match STANDARD.decode(stored.as_str()) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(_) => return false,
    };
    if decoded.len() < SALT_LEN + KEY_LEN {
        return false;
    }

    let (salt, expected) = decoded.split_at(SALT_LEN);
    let candidate = derive_key(plain.as_bytes(), salt);
    constant_time_eq(candidate.as_slice(), expected)
}

/// Compare two byte strings without an early exit on the first difference.
///
/// Only the lengths are compared up front; lengths are not secret here.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String) -> Result<Credential, CredentialError> {
    let hash = hash_password(plain);
    plain.zeroize();
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let credential = hash_password("Sup3rSecret!").unwrap();

        assert!(verify_password("Sup3rSecret!", &credential));
        assert!(!verify_password("Sup3rSecret?", &credential));
        assert!(!verify_password("", &credential));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();

        // Random salt means two different encodings...
        assert_ne!(first, second);
        // ...that both still verify
        assert!(verify_password("same password", &first));
        assert!(verify_password("same password", &second));
    }

    #[test]
    fn test_requirements_describe() {
        assert_eq!(
            PasswordRequirements::default().describe(),
            "Password must be at least 8 characters"
        );
        let strict = PasswordRequirements {
            require_digit: true,
            require_special: true,
            ..PasswordRequirements::default()
        };
        assert_eq!(
            strict.describe(),
            "Password must be at least 8 characters and contain a digit, a special character"
        );
    }

    #[test]
    fn test_decoy_is_well_formed() {
        let raw = STANDARD.decode(decoy_credential().as_str()).unwrap();
        assert_eq!(raw.len(), SALT_LEN + KEY_LEN);
        assert!(!verify_password("", decoy_credential()));
        assert!(!verify_password("Sup3rSecret!", decoy_credential()));
    }

    #[test]
    fn test_credential_layout() {
        let credential = hash_password("layout").unwrap();
        let raw = STANDARD.decode(credential.as_str()).unwrap();
        assert_eq!(raw.len(), SALT_LEN + KEY_LEN);
    }

    #[test]
    fn test_corrupted_credentials_fail_closed() {
        let credential = hash_password("tamper me").unwrap();
        let encoded = credential.as_str();

        // Not base64 at all
        assert!(!verify_password("tamper me", &Credential::from("%%%".to_string())));
        // Empty
        assert!(!verify_password("tamper me", &Credential::from(String::new())));
        // Truncated below salt + key
        let mut raw = STANDARD.decode(encoded).unwrap();
        raw.truncate(SALT_LEN + KEY_LEN - 1);
        let truncated = Credential::from(STANDARD.encode(&raw));
        assert!(!verify_password("tamper me", &truncated));

        // One flipped bit in the key
        let mut raw = STANDARD.decode(encoded).unwrap();
        raw[SALT_LEN + KEY_LEN - 1] ^= 0x01;
        let flipped = Credential::from(STANDARD.encode(&raw));
        assert!(!verify_password("tamper me", &flipped));

        // Trailing garbage makes the key segment too long
        let mut raw = STANDARD.decode(encoded).unwrap();
        raw.push(0);
        let extended = Credential::from(STANDARD.encode(&raw));
        assert!(!verify_password("tamper me", &extended));
    }

    #[test]
    fn test_constant_time_eq() {
        let reference = [0xAAu8; KEY_LEN];

        let mut first_byte = reference;
        first_byte[0] ^= 0xFF;
        let mut last_byte = reference;
        last_byte[KEY_LEN - 1] ^= 0xFF;

        assert!(constant_time_eq(&reference, &reference));
        assert!(!constant_time_eq(&reference, &first_byte));
        assert!(!constant_time_eq(&reference, &last_byte));
        assert!(!constant_time_eq(&reference, &reference[..KEY_LEN - 1]));
        assert!(constant_time_eq(&[], &[]));
    }

    #[test]
    fn test_constant_time_eq_timing_ignores_mismatch_position() {
        use std::hint::black_box;
        use std::time::{Duration, Instant};

        let reference = [0x5Au8; KEY_LEN];
        let mut first_byte = reference;
        first_byte[0] ^= 0x01;
        let mut last_byte = reference;
        last_byte[KEY_LEN - 1] ^= 0x01;

        let time = |candidate: &[u8; KEY_LEN]| {
            let start = Instant::now();
            for _ in 0..20_000 {
                black_box(constant_time_eq(black_box(&reference), black_box(candidate)));
            }
            start.elapsed()
        };

        // Best of several interleaved batches filters scheduler noise
        let mut early = Duration::MAX;
        let mut late = Duration::MAX;
        for _ in 0..15 {
            early = early.min(time(&first_byte));
            late = late.min(time(&last_byte));
        }

        let ratio = early.as_secs_f64() / late.as_secs_f64();
        assert!((0.5..2.0).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn test_hash_password_secure_wipes_input() {
        let mut plain = "wipe-me-please".to_string();
        let credential = hash_password_secure(&mut plain).unwrap();

        assert!(plain.is_empty());
        assert!(verify_password("wipe-me-please", &credential));
    }

    #[test]
    fn test_password_strength_validation() {
        let requirements = PasswordRequirements::default();

        assert!(validate_password_strength("Sup3rSecret!", &requirements));
        assert!(validate_password_strength("lowercase", &requirements));
        // Too short
        assert!(!validate_password_strength("short", &requirements));

        let strict = PasswordRequirements {
            min_length: 10,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        };

        assert!(validate_password_strength("SecureP@ssw0rd", &strict));
        // Missing uppercase
        assert!(!validate_password_strength("securep@ssw0rd", &strict));
        // Missing lowercase
        assert!(!validate_password_strength("SECUREP@SSW0RD", &strict));
        // Missing digit
        assert!(!validate_password_strength("SecureP@ssword", &strict));
        // Missing special character
        assert!(!validate_password_strength("SecurePassw0rd", &strict));
    }
}
