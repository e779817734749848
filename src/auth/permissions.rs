//! Capability checks for request handlers.

use crate::api::models::users::CurrentUser;
use crate::errors::{Error, Result};
use crate::types::{Capability, UserId};

/// Whether the user holds the given capability.
pub fn has_capability(user: &CurrentUser, capability: Capability) -> bool {
    user.capabilities.contains(&capability)
}

/// Require a capability, failing with `InsufficientPermissions` otherwise.
pub fn check_capability(user: &CurrentUser, capability: Capability, resource: &str) -> Result<()> {
    if has_capability(user, capability) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: capability,
            resource: resource.to_string(),
        })
    }
}

/// Require either that the caller *is* the target user, or that they hold the
/// given capability. Used for all per-user token routes: users manage their
/// own tokens, admins manage anyone's.
pub fn check_capability_or_current_user(
    user: &CurrentUser,
    capability: Capability,
    target_user_id: UserId,
    resource: &str,
) -> Result<()> {
    if user.id == target_user_id {
        return Ok(());
    }
    check_capability(user, capability, resource)
}
