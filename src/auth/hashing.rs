//! Argon2 hashing for client secrets.
//!
//! Only the hash of a client secret is ever stored; verification compares a
//! presented secret against the stored PHC string.

use crate::errors::Error;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Argon2id parameters. Defaults follow the RFC 9106 low-memory
/// recommendation (19 MiB, 2 iterations, 1 lane).
#[derive(Debug, Clone, Copy)]
struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| Error::Internal {
                operation: format!("building argon2 params: {e}"),
            })?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

fn hash_secret_with_params(secret: &str, params: Argon2Params) -> Result<String, Error> {
    let argon2 = params.to_argon2()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| Error::Internal {
            operation: format!("hashing client secret: {e}"),
        })?;
    Ok(hash.to_string())
}

/// Hash a secret with the default cost parameters.
pub fn hash_secret(secret: &str) -> Result<String, Error> {
    hash_secret_with_params(secret, Argon2Params::default())
}

/// Verify a presented secret against a stored PHC hash string.
pub fn verify_secret(secret: &str, stored_hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::Internal {
        operation: format!("parsing stored secret hash: {e}"),
    })?;
    Ok(Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok())
}
