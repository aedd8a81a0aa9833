// utils/password.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

const MAX_PASSWORD_LENGTH: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    EmptyPassword,
    #[error("Password must not be more than {MAX_PASSWORD_LENGTH} characters")]
    ExceededMaxPasswordLength,
    #[error("Error while hashing password")]
    HashingError,
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

pub fn hash(password: impl Into<String>) -> Result<String, PasswordError> {
    let password = password.into();

    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::ExceededMaxPasswordLength);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingError)?
        .to_string();

    Ok(hashed)
}

pub fn compare(password: &str, hashed_password: &str) -> Result<bool, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::ExceededMaxPasswordLength);
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| PasswordError::InvalidHashFormat)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_compare() {
        let hashed = hash("cleaning-crew-123").unwrap();
        assert!(compare("cleaning-crew-123", &hashed).unwrap());
        assert!(!compare("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn test_empty_password_rejected() {
        assert_eq!(hash(""), Err(PasswordError::EmptyPassword));
    }

    #[test]
    fn test_too_long_password_rejected() {
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(hash(long), Err(PasswordError::ExceededMaxPasswordLength));
    }
}
