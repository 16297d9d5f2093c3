//! The gateway contract consumed by the reconciliation engine.

use async_trait::async_trait;

use realmsync_types::{
    AuthenticationExecutionInfoRepresentation, AuthenticationFlowRepresentation,
    ClientRepresentation, ClientScopeRepresentation, ComponentRepresentation,
    GroupRepresentation, IdentityProviderMapperRepresentation, IdentityProviderRepresentation,
    OrganizationRepresentation, ProtocolMapperRepresentation, RealmRepresentation,
    RequiredActionProviderRepresentation, RoleRepresentation, UserRepresentation,
};

use crate::error::GatewayResult;

/// Scope a role lives in: the realm itself, or a client identified by its
/// clientId (never the server-assigned id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoleScope {
    Realm,
    Client(String),
}

impl std::fmt::Display for RoleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleScope::Realm => write!(f, "realm"),
            RoleScope::Client(id) => write!(f, "client:{id}"),
        }
    }
}

/// The grantee of realm-level scope mappings, identified by server id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeHolder {
    Client(String),
    ClientScope(String),
}

/// Typed CRUD/list operations against the identity server's administrative
/// API.
///
/// Contract rules the engine relies on:
/// - every `get_*` lookup returns `Ok(None)` when the resource is absent;
///   absence is never an error,
/// - mutating calls fail loudly; there are no implicit retries,
/// - organization operations return `FeatureUnavailable` when the server
///   version lacks them.
#[async_trait]
pub trait AdminGateway: Send + Sync {
    // Realm

    async fn get_realm(&self, realm: &str) -> GatewayResult<Option<RealmRepresentation>>;
    async fn create_realm(&self, rep: &RealmRepresentation) -> GatewayResult<()>;
    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> GatewayResult<()>;

    /// Read one custom attribute from the realm.
    async fn get_realm_attribute(&self, realm: &str, key: &str)
        -> GatewayResult<Option<String>>;

    /// Write one custom attribute on the realm, leaving the rest untouched.
    async fn set_realm_attribute(&self, realm: &str, key: &str, value: &str)
        -> GatewayResult<()>;

    // Roles

    async fn list_roles(&self, realm: &str, scope: &RoleScope)
        -> GatewayResult<Vec<RoleRepresentation>>;
    async fn get_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Option<RoleRepresentation>>;
    async fn create_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()>;
    async fn update_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_role(&self, realm: &str, scope: &RoleScope, name: &str) -> GatewayResult<()>;

    /// List the roles a composite role currently grants.
    async fn get_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Vec<RoleRepresentation>>;
    async fn add_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()>;
    async fn remove_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()>;

    // Clients

    async fn list_clients(&self, realm: &str) -> GatewayResult<Vec<ClientRepresentation>>;
    async fn get_client_by_client_id(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Option<ClientRepresentation>>;
    async fn create_client(&self, realm: &str, rep: &ClientRepresentation) -> GatewayResult<()>;
    async fn update_client(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_client(&self, realm: &str, id: &str) -> GatewayResult<()>;

    /// Protocol mappers under a client.
    async fn list_protocol_mappers(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Vec<ProtocolMapperRepresentation>>;
    async fn create_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()>;
    async fn update_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
    ) -> GatewayResult<()>;

    // Client scopes

    async fn list_client_scopes(&self, realm: &str)
        -> GatewayResult<Vec<ClientScopeRepresentation>>;
    async fn create_client_scope(
        &self,
        realm: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()>;
    async fn update_client_scope(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_client_scope(&self, realm: &str, id: &str) -> GatewayResult<()>;

    // Scope mappings (realm-level roles granted to a client or client scope)

    async fn list_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
    ) -> GatewayResult<Vec<RoleRepresentation>>;
    async fn add_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()>;
    async fn remove_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()>;

    // Groups

    /// Top-level groups with their sub-group trees populated.
    async fn list_groups(&self, realm: &str) -> GatewayResult<Vec<GroupRepresentation>>;
    /// Create a group; `parent_id` is the server id of the parent group, or
    /// `None` for a top-level group.
    async fn create_group(
        &self,
        realm: &str,
        parent_id: Option<&str>,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()>;
    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_group(&self, realm: &str, id: &str) -> GatewayResult<()>;

    // Components

    /// Components directly under `parent_id`, or under the realm when `None`.
    async fn list_components(
        &self,
        realm: &str,
        parent_id: Option<&str>,
    ) -> GatewayResult<Vec<ComponentRepresentation>>;
    async fn create_component(
        &self,
        realm: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()>;
    async fn update_component(
        &self,
        realm: &str,
        id: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_component(&self, realm: &str, id: &str) -> GatewayResult<()>;

    // Identity providers

    async fn list_identity_providers(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>>;
    async fn create_identity_provider(
        &self,
        realm: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()>;
    async fn update_identity_provider(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> GatewayResult<()>;

    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Vec<IdentityProviderMapperRepresentation>>;
    async fn create_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()>;
    async fn update_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> GatewayResult<()>;

    // Authentication flows

    async fn list_flows(&self, realm: &str)
        -> GatewayResult<Vec<AuthenticationFlowRepresentation>>;
    async fn get_flow_by_alias(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Option<AuthenticationFlowRepresentation>>;
    async fn create_flow(
        &self,
        realm: &str,
        rep: &AuthenticationFlowRepresentation,
    ) -> GatewayResult<()>;
    /// Copy the flow `model_alias` under the name `new_alias`.
    async fn copy_flow(&self, realm: &str, model_alias: &str, new_alias: &str)
        -> GatewayResult<()>;

    /// Executions of a flow, in display order (`level` + `index`).
    async fn list_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> GatewayResult<Vec<AuthenticationExecutionInfoRepresentation>>;
    /// Append an execution with the given authenticator provider to the end
    /// of the flow.
    async fn add_execution(&self, realm: &str, flow_alias: &str, provider: &str)
        -> GatewayResult<()>;
    async fn update_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        rep: &AuthenticationExecutionInfoRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_execution(&self, realm: &str, execution_id: &str) -> GatewayResult<()>;
    /// Move an execution one position earlier among its siblings.
    async fn raise_execution_priority(&self, realm: &str, execution_id: &str)
        -> GatewayResult<()>;

    // Required actions

    async fn list_required_actions(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<RequiredActionProviderRepresentation>>;
    async fn register_required_action(
        &self,
        realm: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()>;
    async fn update_required_action(
        &self,
        realm: &str,
        alias: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_required_action(&self, realm: &str, alias: &str) -> GatewayResult<()>;

    // Users

    async fn list_users(&self, realm: &str) -> GatewayResult<Vec<UserRepresentation>>;
    async fn get_user_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> GatewayResult<Option<UserRepresentation>>;
    async fn create_user(&self, realm: &str, rep: &UserRepresentation) -> GatewayResult<()>;
    async fn update_user(&self, realm: &str, id: &str, rep: &UserRepresentation)
        -> GatewayResult<()>;
    async fn delete_user(&self, realm: &str, id: &str) -> GatewayResult<()>;

    // Organizations

    async fn list_organizations(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<OrganizationRepresentation>>;
    async fn create_organization(
        &self,
        realm: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()>;
    async fn update_organization(
        &self,
        realm: &str,
        id: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()>;
    async fn delete_organization(&self, realm: &str, id: &str) -> GatewayResult<()>;

    async fn list_organization_members(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<UserRepresentation>>;
    async fn add_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()>;
    async fn remove_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()>;

    async fn list_organization_identity_providers(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>>;
    async fn add_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()>;
    async fn remove_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()>;
}
