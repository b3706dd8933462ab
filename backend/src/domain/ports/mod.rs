//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`EntityStore`]) describe what the domain needs from
//! persistence; driving ports ([`PostCommand`], [`PostQuery`],
//! [`AccountCommand`], [`AccountQuery`], [`LoginService`],
//! [`PrincipalResolver`]) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod entity_store;
mod login_service;
mod post_command;
mod post_query;
mod principal_resolver;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::{AccountCommand, ProfileUpdateRequest, RegistrationRequest};
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_query::AccountQuery;
pub use entity_store::{
    Collection, Document, EntityStore, EntityStoreError, EntityStores, Versioned,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use post_command::MockPostCommand;
pub use post_command::PostCommand;
#[cfg(test)]
pub use post_query::MockPostQuery;
pub use post_query::{PostDetail, PostQuery};
#[cfg(test)]
pub use principal_resolver::MockPrincipalResolver;
pub use principal_resolver::PrincipalResolver;
