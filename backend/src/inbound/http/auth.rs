//! Principal resolution used by HTTP handlers.
//!
//! The session only carries a user id. Every request turns it back into a
//! [`Principal`] through the resolver port so role changes and deletions take
//! effect on the next call.

use tracing::debug;

use crate::domain::Principal;

use super::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;

/// Resolve the caller, or `None` for an anonymous or stale session.
pub async fn current_principal(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<Option<Principal>> {
    let Some(user_id) = session.user_id()? else {
        return Ok(None);
    };
    let principal = state.principals.resolve(&user_id).await?;
    if principal.is_none() {
        debug!(%user_id, "session refers to a user that no longer exists");
    }
    Ok(principal)
}
