//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test as actix_test, web};

use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockLoginService, MockPostCommand, MockPostQuery,
    MockPrincipalResolver,
};
use crate::domain::{Error, Principal, RoleName, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mocked driving ports; unset expectations panic when called.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub principals: MockPrincipalResolver,
    pub accounts: MockAccountCommand,
    pub accounts_query: MockAccountQuery,
    pub posts: MockPostCommand,
    pub posts_query: MockPostQuery,
}

impl MockPorts {
    /// Resolve `user_id` to a principal holding `roles` on every request.
    pub fn signed_in(mut self, user_id: UserId, roles: &[&str]) -> Self {
        let roles: Vec<RoleName> = roles
            .iter()
            .map(|name| RoleName::new(name).expect("fixture role name"))
            .collect();
        self.principals
            .expect_resolve()
            .returning(move |id| {
                Ok((*id == user_id).then(|| Principal::new(user_id, roles.clone())))
            });
        self
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            principals: Arc::new(self.principals),
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            posts: Arc::new(self.posts),
            posts_query: Arc::new(self.posts_query),
        }
    }
}

async fn sign_in(
    session: SessionContext,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(path.into_inner()).map_err(|e| Error::invalid_request(e.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// App with session middleware, the given state and `/api/v1` routes.
///
/// `GET /test/sign-in/{id}` stores an arbitrary user id in the session.
pub fn test_app<F>(
    state: HttpState,
    routes: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route("/test/sign-in/{id}", web::get().to(sign_in))
        .service(web::scope("/api/v1").configure(routes))
}

/// Obtain a session cookie carrying `user_id`.
pub async fn session_cookie(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    user_id: UserId,
) -> Cookie<'static> {
    let request = actix_test::TestRequest::get()
        .uri(&format!("/test/sign-in/{user_id}"))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success(), "sign-in helper failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
