//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, LoginService, PostCommand, PostQuery, PrincipalResolver,
};
use crate::domain::{AccountService, PostService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub principals: Arc<dyn PrincipalResolver>,
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub posts: Arc<dyn PostCommand>,
    pub posts_query: Arc<dyn PostQuery>,
}

impl HttpState {
    /// Wire every port to the two domain services.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use proofboard::domain::{AccountService, PostService};
    /// use proofboard::inbound::http::state::HttpState;
    ///
    /// fn wire(accounts: AccountService, posts: PostService) -> HttpState {
    ///     HttpState::from_services(Arc::new(accounts), Arc::new(posts))
    /// }
    /// ```
    pub fn from_services(accounts: Arc<AccountService>, posts: Arc<PostService>) -> Self {
        Self {
            login: accounts.clone(),
            principals: accounts.clone(),
            accounts: accounts.clone(),
            accounts_query: accounts,
            posts: posts.clone(),
            posts_query: posts,
        }
    }
}
