use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("stored password hash is malformed: {e}");
            false
        }
    }
}

/// Well-formed hash with the default parameters. Matches no password.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$IAlsohHvKHR3Bmx6Go7x2g$IZ/b+MrQgKKfm1VahpGCsBUsgeYb9HFZWIuvV70pR9c";

/// Check a login attempt. An unknown user is checked against a dummy hash
/// so it costs the same as a wrong password.
pub fn verify_login(password: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(hash) => verify_password(password, hash),
        None => {
            verify_password(password, DUMMY_HASH);
            false
        }
    }
}

/// Random password of `2 * bytes` hex characters.
pub fn generate_password(bytes: usize) -> String {
    let mut rng = rand::rng();
    let raw: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
    hex::encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_same_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("secret", &hash));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("x", "not-a-phc-string"));
    }

    #[test]
    fn unknown_users_never_log_in() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_login("", None));
        assert!(!verify_login("admin", None));

        let hash = hash_password("s3cret").unwrap();
        assert!(verify_login("s3cret", Some(&hash)));
        assert!(!verify_login("other", Some(&hash)));
    }

    #[test]
    fn generated_passwords_are_hex_and_distinct() {
        let a = generate_password(8);
        let b = generate_password(8);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
