//! Random credential generation for API tokens.

use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Length of generated client ids and client secrets.
pub const CREDENTIAL_LEN: usize = 32;

/// Generate a new client id: 32 random alphanumeric characters.
///
/// Uniqueness is not guaranteed here; the issuance path checks the store and
/// retries on collision.
pub fn generate_client_id() -> String {
    random_alphanumeric(CREDENTIAL_LEN)
}

/// Generate a new client secret: 32 random alphanumeric characters.
///
/// Only the Argon2 hash of this value is ever persisted.
pub fn generate_client_secret() -> String {
    random_alphanumeric(CREDENTIAL_LEN)
}

fn random_alphanumeric(len: usize) -> String {
    thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}
