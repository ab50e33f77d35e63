use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns the PHC string (`$argon2id$v=19$...`) suitable for storage.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

/// Check `password` against a stored PHC hash.
///
/// The comparison inside `argon2` is constant time. A hash that does not
/// parse is reported as a hashing failure rather than a mismatch.
pub fn verify_password(password_hash: &str, password: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(AppError::PasswordMismatch),
        Err(e) => Err(e.into()),
    }
}
