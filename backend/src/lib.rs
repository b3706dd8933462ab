//! Proofboard backend library.
//!
//! Users publish posts with an image proof, comment on them, like them and
//! vouch for them as validators; they follow each other and hold flat roles.
//! The [`domain`] module owns the records, authorization and multi-record
//! lifecycle; [`inbound`] exposes it over HTTP and [`outbound`] stores it.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
