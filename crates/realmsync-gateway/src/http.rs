//! Admin-API HTTP adapter (reqwest-based).
//!
//! Implements [`AdminGateway`] over the identity server's administrative
//! REST API. All "missing on lookup" transport signals are translated into
//! the typed contract here: a 404 on a GET becomes `Ok(None)`, and 404/400
//! on organization endpoints becomes `FeatureUnavailable`, so none of that
//! leaks into the engine as control-flow-by-exception.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use realmsync_types::{
    AuthenticationExecutionInfoRepresentation, AuthenticationFlowRepresentation,
    ClientRepresentation, ClientScopeRepresentation, ComponentRepresentation,
    GroupRepresentation, IdentityProviderMapperRepresentation, IdentityProviderRepresentation,
    OrganizationRepresentation, ProtocolMapperRepresentation, RealmRepresentation,
    RequiredActionProviderRepresentation, RoleRepresentation, UserRepresentation,
};

use crate::error::{GatewayError, GatewayResult};
use crate::traits::{AdminGateway, RoleScope, ScopeHolder};

/// Page size used when listing paginated collections (users).
const LIST_PAGE_SIZE: i64 = 100;

/// HTTP adapter over the identity server's admin API.
///
/// Authentication is a bearer token supplied by the caller; acquiring and
/// refreshing that token is the transport layer's concern, not this
/// adapter's.
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    /// Server base URL without trailing slash, e.g. `https://id.example.com`.
    base_url: String,
    token: String,
    http_client: Client,
}

impl AdminApiClient {
    /// Create a new adapter with its own HTTP client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        tls_verify: bool,
    ) -> GatewayResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!tls_verify)
            .user_agent("realmsync/0.1")
            .build()
            .map_err(|e| GatewayError::invalid_config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(base_url, token, http_client))
    }

    /// Create an adapter with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        http_client: Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/admin/realms{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
    }

    /// GET returning `Ok(None)` on 404.
    async fn get_json_opt<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> GatewayResult<Option<T>> {
        debug!(operation, path, "admin API GET");
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| GatewayError::network(operation, e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::http(operation, status.as_u16(), body));
        }

        let value = response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::serialization(operation, e.to_string()))?;
        Ok(Some(value))
    }

    /// GET where the resource must exist (collection endpoints).
    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str) -> GatewayResult<T> {
        match self.get_json_opt(operation, path).await? {
            Some(value) => Ok(value),
            None => Err(GatewayError::http(operation, 404, "not found")),
        }
    }

    /// Send a mutating request, discarding any response body.
    async fn send_expect_success<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<()> {
        debug!(operation, path, method = %method, "admin API write");
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::network(operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::http(operation, status.as_u16(), body));
        }
        Ok(())
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> GatewayResult<()> {
        self.send_expect_success(operation, Method::POST, path, Some(body))
            .await
    }

    async fn put_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> GatewayResult<()> {
        self.send_expect_success(operation, Method::PUT, path, Some(body))
            .await
    }

    async fn delete(&self, operation: &str, path: &str) -> GatewayResult<()> {
        self.send_expect_success::<()>(operation, Method::DELETE, path, None)
            .await
    }

    /// DELETE carrying a JSON body (composite and scope-mapping removal).
    async fn delete_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> GatewayResult<()> {
        self.send_expect_success(operation, Method::DELETE, path, Some(body))
            .await
    }

    /// Resolve a clientId to the client's server id; missing client is a
    /// genuine failure for the operations that need it.
    async fn require_client_uuid(&self, realm: &str, client_id: &str) -> GatewayResult<String> {
        let client = self
            .get_client_by_client_id(realm, client_id)
            .await?
            .ok_or_else(|| {
                GatewayError::http(
                    "resolve client",
                    404,
                    format!("client '{client_id}' not found in realm '{realm}'"),
                )
            })?;
        client.id.ok_or_else(|| {
            GatewayError::serialization("resolve client", "client response is missing 'id'")
        })
    }

    fn role_base_path(&self, realm: &str, scope: &RoleScope, client_uuid: Option<&str>) -> String {
        match scope {
            RoleScope::Realm => format!("/{realm}/roles"),
            RoleScope::Client(_) => {
                format!("/{realm}/clients/{}/roles", client_uuid.unwrap_or_default())
            }
        }
    }

    async fn scoped_role_path(&self, realm: &str, scope: &RoleScope) -> GatewayResult<String> {
        match scope {
            RoleScope::Realm => Ok(self.role_base_path(realm, scope, None)),
            RoleScope::Client(client_id) => {
                let uuid = self.require_client_uuid(realm, client_id).await?;
                Ok(self.role_base_path(realm, scope, Some(&uuid)))
            }
        }
    }

    fn scope_mapping_path(&self, realm: &str, holder: &ScopeHolder) -> String {
        match holder {
            ScopeHolder::Client(id) => format!("/{realm}/clients/{id}/scope-mappings/realm"),
            ScopeHolder::ClientScope(id) => {
                format!("/{realm}/client-scopes/{id}/scope-mappings/realm")
            }
        }
    }
}

/// Translate not-found/bad-request on organization endpoints into the
/// feature-unavailable signal the orchestrator soft-skips on.
fn map_org_feature<T>(result: GatewayResult<T>) -> GatewayResult<T> {
    match result {
        Err(GatewayError::Http { status, .. }) if status == 404 || status == 400 => {
            Err(GatewayError::feature_unavailable("organizations"))
        }
        other => other,
    }
}

#[async_trait]
impl AdminGateway for AdminApiClient {
    // Realm

    async fn get_realm(&self, realm: &str) -> GatewayResult<Option<RealmRepresentation>> {
        self.get_json_opt("get realm", &format!("/{realm}")).await
    }

    async fn create_realm(&self, rep: &RealmRepresentation) -> GatewayResult<()> {
        // POST /admin/realms creates directly under the collection root.
        debug!(realm = rep.name(), "admin API create realm");
        let response = self
            .http_client
            .post(format!("{}/admin/realms", self.base_url))
            .bearer_auth(&self.token)
            .json(rep)
            .send()
            .await
            .map_err(|e| GatewayError::network("create realm", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::http("create realm", status.as_u16(), body));
        }
        Ok(())
    }

    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> GatewayResult<()> {
        self.put_json("update realm", &format!("/{realm}"), rep).await
    }

    async fn get_realm_attribute(
        &self,
        realm: &str,
        key: &str,
    ) -> GatewayResult<Option<String>> {
        let rep = self.get_realm(realm).await?;
        Ok(rep.and_then(|r| r.attributes.get(key).cloned()))
    }

    async fn set_realm_attribute(&self, realm: &str, key: &str, value: &str) -> GatewayResult<()> {
        let mut rep = self
            .get_realm(realm)
            .await?
            .ok_or_else(|| GatewayError::http("set realm attribute", 404, "realm not found"))?;
        rep.attributes.insert(key.to_string(), value.to_string());
        self.update_realm(realm, &rep).await
    }

    // Roles

    async fn list_roles(
        &self,
        realm: &str,
        scope: &RoleScope,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.get_json("list roles", &path).await
    }

    async fn get_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Option<RoleRepresentation>> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.get_json_opt("get role", &format!("{path}/{name}")).await
    }

    async fn create_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.post_json("create role", &path, rep).await
    }

    async fn update_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.put_json("update role", &format!("{path}/{name}"), rep).await
    }

    async fn delete_role(&self, realm: &str, scope: &RoleScope, name: &str) -> GatewayResult<()> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.delete("delete role", &format!("{path}/{name}")).await
    }

    async fn get_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.get_json("get role composites", &format!("{path}/{name}/composites"))
            .await
    }

    async fn add_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.post_json("add role composites", &format!("{path}/{name}/composites"), targets)
            .await
    }

    async fn remove_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let path = self.scoped_role_path(realm, scope).await?;
        self.delete_json(
            "remove role composites",
            &format!("{path}/{name}/composites"),
            targets,
        )
        .await
    }

    // Clients

    async fn list_clients(&self, realm: &str) -> GatewayResult<Vec<ClientRepresentation>> {
        self.get_json("list clients", &format!("/{realm}/clients")).await
    }

    async fn get_client_by_client_id(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Option<ClientRepresentation>> {
        let matches: Vec<ClientRepresentation> = self
            .get_json(
                "get client",
                &format!("/{realm}/clients?clientId={client_id}"),
            )
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn create_client(&self, realm: &str, rep: &ClientRepresentation) -> GatewayResult<()> {
        self.post_json("create client", &format!("/{realm}/clients"), rep).await
    }

    async fn update_client(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientRepresentation,
    ) -> GatewayResult<()> {
        self.put_json("update client", &format!("/{realm}/clients/{id}"), rep)
            .await
    }

    async fn delete_client(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.delete("delete client", &format!("/{realm}/clients/{id}")).await
    }

    async fn list_protocol_mappers(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Vec<ProtocolMapperRepresentation>> {
        self.get_json(
            "list protocol mappers",
            &format!("/{realm}/clients/{client_id}/protocol-mappers/models"),
        )
        .await
    }

    async fn create_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()> {
        self.post_json(
            "create protocol mapper",
            &format!("/{realm}/clients/{client_id}/protocol-mappers/models"),
            rep,
        )
        .await
    }

    async fn update_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update protocol mapper",
            &format!("/{realm}/clients/{client_id}/protocol-mappers/models/{mapper_id}"),
            rep,
        )
        .await
    }

    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
    ) -> GatewayResult<()> {
        self.delete(
            "delete protocol mapper",
            &format!("/{realm}/clients/{client_id}/protocol-mappers/models/{mapper_id}"),
        )
        .await
    }

    // Client scopes

    async fn list_client_scopes(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<ClientScopeRepresentation>> {
        self.get_json("list client scopes", &format!("/{realm}/client-scopes"))
            .await
    }

    async fn create_client_scope(
        &self,
        realm: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()> {
        self.post_json("create client scope", &format!("/{realm}/client-scopes"), rep)
            .await
    }

    async fn update_client_scope(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update client scope",
            &format!("/{realm}/client-scopes/{id}"),
            rep,
        )
        .await
    }

    async fn delete_client_scope(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.delete("delete client scope", &format!("/{realm}/client-scopes/{id}"))
            .await
    }

    // Scope mappings

    async fn list_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        self.get_json(
            "list scope mappings",
            &self.scope_mapping_path(realm, holder),
        )
        .await
    }

    async fn add_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        self.post_json(
            "add scope mappings",
            &self.scope_mapping_path(realm, holder),
            roles,
        )
        .await
    }

    async fn remove_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        self.delete_json(
            "remove scope mappings",
            &self.scope_mapping_path(realm, holder),
            roles,
        )
        .await
    }

    // Groups

    async fn list_groups(&self, realm: &str) -> GatewayResult<Vec<GroupRepresentation>> {
        self.get_json(
            "list groups",
            &format!("/{realm}/groups?populateHierarchy=true"),
        )
        .await
    }

    async fn create_group(
        &self,
        realm: &str,
        parent_id: Option<&str>,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()> {
        let path = match parent_id {
            Some(parent) => format!("/{realm}/groups/{parent}/children"),
            None => format!("/{realm}/groups"),
        };
        self.post_json("create group", &path, rep).await
    }

    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()> {
        self.put_json("update group", &format!("/{realm}/groups/{id}"), rep).await
    }

    async fn delete_group(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.delete("delete group", &format!("/{realm}/groups/{id}")).await
    }

    // Components

    async fn list_components(
        &self,
        realm: &str,
        parent_id: Option<&str>,
    ) -> GatewayResult<Vec<ComponentRepresentation>> {
        let path = match parent_id {
            Some(parent) => format!("/{realm}/components?parent={parent}"),
            None => format!("/{realm}/components"),
        };
        self.get_json("list components", &path).await
    }

    async fn create_component(
        &self,
        realm: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()> {
        self.post_json("create component", &format!("/{realm}/components"), rep)
            .await
    }

    async fn update_component(
        &self,
        realm: &str,
        id: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()> {
        self.put_json("update component", &format!("/{realm}/components/{id}"), rep)
            .await
    }

    async fn delete_component(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.delete("delete component", &format!("/{realm}/components/{id}")).await
    }

    // Identity providers

    async fn list_identity_providers(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>> {
        self.get_json(
            "list identity providers",
            &format!("/{realm}/identity-provider/instances"),
        )
        .await
    }

    async fn create_identity_provider(
        &self,
        realm: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()> {
        self.post_json(
            "create identity provider",
            &format!("/{realm}/identity-provider/instances"),
            rep,
        )
        .await
    }

    async fn update_identity_provider(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update identity provider",
            &format!("/{realm}/identity-provider/instances/{alias}"),
            rep,
        )
        .await
    }

    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> GatewayResult<()> {
        self.delete(
            "delete identity provider",
            &format!("/{realm}/identity-provider/instances/{alias}"),
        )
        .await
    }

    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Vec<IdentityProviderMapperRepresentation>> {
        self.get_json(
            "list identity provider mappers",
            &format!("/{realm}/identity-provider/instances/{alias}/mappers"),
        )
        .await
    }

    async fn create_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()> {
        self.post_json(
            "create identity provider mapper",
            &format!("/{realm}/identity-provider/instances/{alias}/mappers"),
            rep,
        )
        .await
    }

    async fn update_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update identity provider mapper",
            &format!("/{realm}/identity-provider/instances/{alias}/mappers/{mapper_id}"),
            rep,
        )
        .await
    }

    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> GatewayResult<()> {
        self.delete(
            "delete identity provider mapper",
            &format!("/{realm}/identity-provider/instances/{alias}/mappers/{mapper_id}"),
        )
        .await
    }

    // Authentication flows

    async fn list_flows(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<AuthenticationFlowRepresentation>> {
        self.get_json("list flows", &format!("/{realm}/authentication/flows")).await
    }

    async fn get_flow_by_alias(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Option<AuthenticationFlowRepresentation>> {
        let flows = self.list_flows(realm).await?;
        Ok(flows.into_iter().find(|f| f.alias() == alias))
    }

    async fn create_flow(
        &self,
        realm: &str,
        rep: &AuthenticationFlowRepresentation,
    ) -> GatewayResult<()> {
        self.post_json("create flow", &format!("/{realm}/authentication/flows"), rep)
            .await
    }

    async fn copy_flow(
        &self,
        realm: &str,
        model_alias: &str,
        new_alias: &str,
    ) -> GatewayResult<()> {
        self.post_json(
            "copy flow",
            &format!("/{realm}/authentication/flows/{model_alias}/copy"),
            &serde_json::json!({ "newName": new_alias }),
        )
        .await
    }

    async fn list_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> GatewayResult<Vec<AuthenticationExecutionInfoRepresentation>> {
        self.get_json(
            "list executions",
            &format!("/{realm}/authentication/flows/{flow_alias}/executions"),
        )
        .await
    }

    async fn add_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        provider: &str,
    ) -> GatewayResult<()> {
        self.post_json(
            "add execution",
            &format!("/{realm}/authentication/flows/{flow_alias}/executions/execution"),
            &serde_json::json!({ "provider": provider }),
        )
        .await
    }

    async fn update_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        rep: &AuthenticationExecutionInfoRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update execution",
            &format!("/{realm}/authentication/flows/{flow_alias}/executions"),
            rep,
        )
        .await
    }

    async fn delete_execution(&self, realm: &str, execution_id: &str) -> GatewayResult<()> {
        self.delete(
            "delete execution",
            &format!("/{realm}/authentication/executions/{execution_id}"),
        )
        .await
    }

    async fn raise_execution_priority(
        &self,
        realm: &str,
        execution_id: &str,
    ) -> GatewayResult<()> {
        self.send_expect_success::<()>(
            "raise execution priority",
            Method::POST,
            &format!("/{realm}/authentication/executions/{execution_id}/raise-priority"),
            None,
        )
        .await
    }

    // Required actions

    async fn list_required_actions(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<RequiredActionProviderRepresentation>> {
        self.get_json(
            "list required actions",
            &format!("/{realm}/authentication/required-actions"),
        )
        .await
    }

    async fn register_required_action(
        &self,
        realm: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()> {
        self.post_json(
            "register required action",
            &format!("/{realm}/authentication/register-required-action"),
            rep,
        )
        .await
    }

    async fn update_required_action(
        &self,
        realm: &str,
        alias: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()> {
        self.put_json(
            "update required action",
            &format!("/{realm}/authentication/required-actions/{alias}"),
            rep,
        )
        .await
    }

    async fn delete_required_action(&self, realm: &str, alias: &str) -> GatewayResult<()> {
        self.delete(
            "delete required action",
            &format!("/{realm}/authentication/required-actions/{alias}"),
        )
        .await
    }

    // Users

    async fn list_users(&self, realm: &str) -> GatewayResult<Vec<UserRepresentation>> {
        let mut all_users = Vec::new();
        let mut first: i64 = 0;

        loop {
            let page: Vec<UserRepresentation> = self
                .get_json(
                    "list users",
                    &format!("/{realm}/users?first={first}&max={LIST_PAGE_SIZE}"),
                )
                .await?;

            let fetched = page.len() as i64;
            all_users.extend(page);

            if fetched < LIST_PAGE_SIZE {
                break;
            }
            first += fetched;
        }

        Ok(all_users)
    }

    async fn get_user_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> GatewayResult<Option<UserRepresentation>> {
        let matches: Vec<UserRepresentation> = self
            .get_json(
                "get user",
                &format!("/{realm}/users?username={username}&exact=true"),
            )
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn create_user(&self, realm: &str, rep: &UserRepresentation) -> GatewayResult<()> {
        self.post_json("create user", &format!("/{realm}/users"), rep).await
    }

    async fn update_user(
        &self,
        realm: &str,
        id: &str,
        rep: &UserRepresentation,
    ) -> GatewayResult<()> {
        self.put_json("update user", &format!("/{realm}/users/{id}"), rep).await
    }

    async fn delete_user(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.delete("delete user", &format!("/{realm}/users/{id}")).await
    }

    // Organizations

    async fn list_organizations(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<OrganizationRepresentation>> {
        map_org_feature(
            self.get_json("list organizations", &format!("/{realm}/organizations"))
                .await,
        )
    }

    async fn create_organization(
        &self,
        realm: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.post_json("create organization", &format!("/{realm}/organizations"), rep)
                .await,
        )
    }

    async fn update_organization(
        &self,
        realm: &str,
        id: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.put_json(
                "update organization",
                &format!("/{realm}/organizations/{id}"),
                rep,
            )
            .await,
        )
    }

    async fn delete_organization(&self, realm: &str, id: &str) -> GatewayResult<()> {
        map_org_feature(
            self.delete("delete organization", &format!("/{realm}/organizations/{id}"))
                .await,
        )
    }

    async fn list_organization_members(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<UserRepresentation>> {
        map_org_feature(
            self.get_json(
                "list organization members",
                &format!("/{realm}/organizations/{org_id}/members"),
            )
            .await,
        )
    }

    async fn add_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.post_json(
                "add organization member",
                &format!("/{realm}/organizations/{org_id}/members"),
                &user_id.to_string(),
            )
            .await,
        )
    }

    async fn remove_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.delete(
                "remove organization member",
                &format!("/{realm}/organizations/{org_id}/members/{user_id}"),
            )
            .await,
        )
    }

    async fn list_organization_identity_providers(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>> {
        map_org_feature(
            self.get_json(
                "list organization identity providers",
                &format!("/{realm}/organizations/{org_id}/identity-providers"),
            )
            .await,
        )
    }

    async fn add_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.post_json(
                "add organization identity provider",
                &format!("/{realm}/organizations/{org_id}/identity-providers"),
                &alias.to_string(),
            )
            .await,
        )
    }

    async fn remove_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()> {
        map_org_feature(
            self.delete(
                "remove organization identity provider",
                &format!("/{realm}/organizations/{org_id}/identity-providers/{alias}"),
            )
            .await,
        )
    }
}
