//! Realm representation and the fully-resolved desired realm.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clients::{
    ClientRepresentation, ClientScopeRepresentation, ScopeMappingRepresentation,
};
use crate::components::ComponentRepresentation;
use crate::flows::{
    AuthenticationFlowRepresentation, FlowCopy, RequiredActionProviderRepresentation,
};
use crate::groups::GroupRepresentation;
use crate::identity_providers::{
    IdentityProviderMapperRepresentation, IdentityProviderRepresentation,
};
use crate::organizations::DesiredOrganization;
use crate::roles::DesiredRoles;
use crate::users::UserRepresentation;

/// Realm as stored by the identity server (scalar settings only; the
/// resource collections live in [`DesiredRealm`] on the declared side and
/// behind their own endpoints on the remote side).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmRepresentation {
    /// Server-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Realm name (natural key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_theme: Option<String>,

    /// Alias of the flow bound as the browser flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_flow: Option<String>,

    /// Alias of the flow bound as the direct-grant flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_grant_flow: Option<String>,

    /// Custom attributes; also carries the stored import checksum and the
    /// persisted declared-state map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Fields not modeled here, preserved verbatim.
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl RealmRepresentation {
    /// The realm name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.realm.as_deref().unwrap_or_default()
    }
}

/// Fully-resolved declared configuration for one realm.
///
/// Immutable during an import pass. Composes the wire-format realm settings
/// with the declared collections per resource type; import-only data lives
/// in the wrapper types, never on wire structs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredRealm {
    /// Scalar realm settings in wire format.
    pub realm: RealmRepresentation,

    #[serde(default)]
    pub roles: DesiredRoles,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<ClientRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_scopes: Vec<ClientScopeRepresentation>,

    /// Realm-level scope mappings for clients and client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope_mappings: Vec<ScopeMappingRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_providers: Vec<IdentityProviderRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_provider_mappers: Vec<IdentityProviderMapperRepresentation>,

    /// Flows declared wholesale (additive; never deleted remotely).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication_flows: Vec<AuthenticationFlowRepresentation>,

    /// Copy-with-override instructions for deriving flows from a model flow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_copies: Vec<FlowCopy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_actions: Vec<RequiredActionProviderRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserRepresentation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<DesiredOrganization>,
}

impl DesiredRealm {
    /// The realm name this configuration targets.
    #[must_use]
    pub fn name(&self) -> &str {
        self.realm.name()
    }
}
