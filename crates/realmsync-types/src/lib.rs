//! Wire-format representations of identity-server admin-API resources and
//! the desired-state types built from them.
//!
//! Wire structs mirror the admin API's JSON shapes: camelCase fields, every
//! field optional unless the server always sends it, and a flattened
//! overflow map so fields this crate does not model survive a
//! deserialize/patch/serialize round trip untouched.
//!
//! Desired-state types (`DesiredRealm`, `DesiredOrganization`, `FlowCopy`)
//! wrap wire structs by composition and carry the import-only data the wire
//! format has no place for.

pub mod clients;
pub mod components;
pub mod flows;
pub mod groups;
pub mod identity_providers;
pub mod organizations;
pub mod realm;
pub mod roles;
pub mod users;

pub use clients::{
    ClientRepresentation, ClientScopeRepresentation, ProtocolMapperRepresentation,
    ScopeMappingRepresentation,
};
pub use components::ComponentRepresentation;
pub use flows::{
    AuthenticationExecutionInfoRepresentation, AuthenticationFlowRepresentation,
    ExecutionOverride, FlowCopy, FlowOverrideNode, RequiredActionProviderRepresentation,
};
pub use groups::GroupRepresentation;
pub use identity_providers::{
    IdentityProviderMapperRepresentation, IdentityProviderRepresentation,
};
pub use organizations::{
    DesiredOrganization, OrganizationDomain, OrganizationRepresentation,
};
pub use realm::{DesiredRealm, RealmRepresentation};
pub use roles::{CompositesSpec, DesiredRoles, RoleRepresentation};
pub use users::UserRepresentation;
