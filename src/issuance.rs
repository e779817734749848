//! Token issuance: credential generation plus bounded uniqueness retry.
//!
//! A fresh client id is drawn per attempt. Each attempt pre-checks the store
//! to avoid a doomed insert, then relies on the unique constraint to catch
//! the race where another issuance claims the same id between check and
//! insert. Attempts are bounded; with a 62^32 id space exhaustion means
//! something is broken, and a typed failure beats looping forever.

use crate::api::models::tokens::ValidatedTokenCreate;
use crate::auth::hashing;
use crate::crypto;
use crate::db::handlers::tokens::CLIENT_ID_CONSTRAINT;
use crate::db::handlers::{ApiTokens, Repository};
use crate::db::models::tokens::{ApiTokenDBResponse, ApiTokenInsertDBRequest};
use crate::errors::{Error, Result};
use crate::types::{abbrev_uuid, UserId};
use tracing::{debug, instrument, warn};

/// Attempts before issuance gives up with [`Error::IssuanceFailed`].
pub const MAX_CLIENT_ID_ATTEMPTS: u32 = 8;

/// A newly issued token together with its plaintext secret. The secret
/// exists only here and in the vault slot the handler stashes it into.
pub struct IssuedToken {
    pub token: ApiTokenDBResponse,
    pub secret: String,
}

/// Issue a token for `user_id`, retrying client id collisions.
#[instrument(skip(repo, params), fields(user_id = %abbrev_uuid(&user_id), name = %params.name), err)]
pub async fn issue_token(
    repo: &mut ApiTokens<'_>,
    user_id: UserId,
    params: &ValidatedTokenCreate,
) -> Result<IssuedToken> {
    let secret = crypto::generate_client_secret();
    let secret_hash = hashing::hash_secret(&secret)?;

    for attempt in 1..=MAX_CLIENT_ID_ATTEMPTS {
        let client_id = crypto::generate_client_id();

        if repo.client_id_exists(&client_id).await.map_err(Error::Database)? {
            debug!(attempt, "Client id already taken, regenerating");
            continue;
        }

        let request = ApiTokenInsertDBRequest::new(user_id, params, client_id, secret_hash.clone());
        match repo.create(&request).await {
            Ok(token) => return Ok(IssuedToken { token, secret }),
            Err(err) if err.is_unique_violation_on(CLIENT_ID_CONSTRAINT) => {
                warn!(attempt, "Client id collided at insert, regenerating");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::IssuanceFailed {
        attempts: MAX_CLIENT_ID_ATTEMPTS,
    })
}
