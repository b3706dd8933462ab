//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;
#[cfg(feature = "metrics")]
pub use metrics::prometheus;
pub use state_builders::build_http_state;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::time::Duration;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use proofboard::Trace;
#[cfg(debug_assertions)]
use proofboard::ApiDoc;
use proofboard::inbound::http;
use proofboard::inbound::http::health::{HealthState, live, ready};
use proofboard::inbound::http::session_config::SessionSettings;
use proofboard::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_COOKIE: &str = "session";
const SESSION_TTL_HOURS: i64 = 2;

/// Encrypted cookie session carrying only the user id.
fn session_middleware(settings: &SessionSettings) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), settings.key.clone())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(settings.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(settings.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::hours(SESSION_TTL_HOURS)),
        )
        .build()
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .wrap(session_middleware(&session))
        .configure(http::configure);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the HTTP listener over prepared handler state.
///
/// `health_state` is marked ready once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let http_state = web::Data::new(http_state);
    let probes = health_state.clone();

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(probes.clone(), http_state.clone(), session.clone());
        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());
        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::cookie::{Key, SameSite};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use mockable::DefaultClock;
    use proofboard::domain::{
        AccountService, PostService, RoleName, RolePolicy, resolve_role, seed_roles,
    };
    use proofboard::outbound::memory::in_memory_stores;

    use super::*;

    async fn memory_state() -> HttpState {
        let guest = RoleName::new("guest").expect("guest role name");
        let admin = RoleName::new("admin").expect("admin role name");
        let stores = in_memory_stores();
        seed_roles(stores.roles.as_ref(), &[guest.clone(), admin.clone()])
            .await
            .expect("seed roles");
        let guest_role = resolve_role(stores.roles.as_ref(), &guest)
            .await
            .expect("guest role");
        let policy = RolePolicy::new(guest, admin);
        let accounts = AccountService::new(
            stores.clone(),
            policy.clone(),
            guest_role,
            Arc::new(DefaultClock),
        );
        let posts = PostService::new(stores, policy, Arc::new(DefaultClock));
        HttpState::from_services(Arc::new(accounts), Arc::new(posts))
    }

    #[actix_web::test]
    async fn app_serves_health_and_guards_the_api() {
        let session = SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        };
        let app = actix_test::init_service(build_app(
            web::Data::new(HealthState::new()),
            web::Data::new(memory_state().await),
            session,
        ))
        .await;

        let live_req = actix_test::TestRequest::get().uri("/health/live").to_request();
        let res = actix_test::call_service(&app, live_req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let me = actix_test::TestRequest::get().uri("/api/v1/users/me").to_request();
        let res = actix_test::call_service(&app, me).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
