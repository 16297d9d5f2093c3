//! In-memory [`AdminGateway`] for engine tests.
//!
//! Holds one server's worth of realms behind a mutex and records every
//! mutating call in a write log, so tests can assert both the converged
//! state and how many writes it took to get there.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use realmsync_gateway::{AdminGateway, GatewayError, GatewayResult, RoleScope, ScopeHolder};
use realmsync_types::{
    AuthenticationExecutionInfoRepresentation, AuthenticationFlowRepresentation,
    ClientRepresentation, ClientScopeRepresentation, ComponentRepresentation,
    GroupRepresentation, IdentityProviderMapperRepresentation, IdentityProviderRepresentation,
    OrganizationRepresentation, ProtocolMapperRepresentation, RealmRepresentation,
    RequiredActionProviderRepresentation, RoleRepresentation, UserRepresentation,
};

#[derive(Default)]
pub struct RealmState {
    pub realm: RealmRepresentation,
    pub realm_roles: Vec<RoleRepresentation>,
    /// Client roles keyed by clientId.
    pub client_roles: BTreeMap<String, Vec<RoleRepresentation>>,
    /// Composite grants keyed by "<scope>/<role name>".
    pub composites: BTreeMap<String, Vec<RoleRepresentation>>,
    pub clients: Vec<ClientRepresentation>,
    /// Protocol mappers keyed by client server id.
    pub protocol_mappers: BTreeMap<String, Vec<ProtocolMapperRepresentation>>,
    pub client_scopes: Vec<ClientScopeRepresentation>,
    /// Realm-level scope mappings keyed by holder server id.
    pub scope_mappings: BTreeMap<String, Vec<RoleRepresentation>>,
    pub groups: Vec<GroupRepresentation>,
    /// Flat component list; `parent_id == None` means realm-level.
    pub components: Vec<ComponentRepresentation>,
    pub identity_providers: Vec<IdentityProviderRepresentation>,
    /// Mappers keyed by provider alias.
    pub idp_mappers: BTreeMap<String, Vec<IdentityProviderMapperRepresentation>>,
    pub flows: Vec<AuthenticationFlowRepresentation>,
    /// Executions keyed by flow alias.
    pub executions: BTreeMap<String, Vec<AuthenticationExecutionInfoRepresentation>>,
    pub required_actions: Vec<RequiredActionProviderRepresentation>,
    pub users: Vec<UserRepresentation>,
    pub organizations: Vec<OrganizationRepresentation>,
    /// Member user ids keyed by organization id.
    pub org_members: BTreeMap<String, Vec<String>>,
    /// Linked provider aliases keyed by organization id.
    pub org_idps: BTreeMap<String, Vec<String>>,
}

pub struct MockGateway {
    realms: Mutex<BTreeMap<String, RealmState>>,
    writes: Mutex<Vec<String>>,
    next_id: AtomicU64,
    organizations_supported: bool,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            realms: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            organizations_supported: true,
        }
    }

    pub fn without_organizations() -> Self {
        Self {
            organizations_supported: false,
            ..Self::new()
        }
    }

    pub fn next_id(&self) -> String {
        format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Seed or inspect a realm's state directly.
    pub fn with_realm<R>(&self, realm: &str, f: impl FnOnce(&mut RealmState) -> R) -> R {
        let mut realms = self.realms.lock().unwrap();
        let state = realms.entry(realm.to_string()).or_default();
        if state.realm.realm.is_none() {
            state.realm.realm = Some(realm.to_string());
        }
        f(state)
    }

    pub fn realm_exists(&self, realm: &str) -> bool {
        self.realms.lock().unwrap().contains_key(realm)
    }

    pub fn write_log(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_write_log(&self) {
        self.writes.lock().unwrap().clear();
    }

    fn log(&self, entry: String) {
        self.writes.lock().unwrap().push(entry);
    }

    fn read<R>(
        &self,
        realm: &str,
        f: impl FnOnce(&RealmState) -> GatewayResult<R>,
    ) -> GatewayResult<R> {
        let realms = self.realms.lock().unwrap();
        let state = realms
            .get(realm)
            .ok_or_else(|| GatewayError::http("read", 404, format!("realm '{realm}' not found")))?;
        f(state)
    }

    fn write<R>(
        &self,
        realm: &str,
        op: &str,
        f: impl FnOnce(&mut RealmState) -> GatewayResult<R>,
    ) -> GatewayResult<R> {
        let mut realms = self.realms.lock().unwrap();
        let state = realms
            .get_mut(realm)
            .ok_or_else(|| GatewayError::http(op, 404, format!("realm '{realm}' not found")))?;
        let result = f(state)?;
        drop(realms);
        self.log(format!("{realm}:{op}"));
        Ok(result)
    }

    fn composite_key(scope: &RoleScope, name: &str) -> String {
        format!("{scope}/{name}")
    }

    fn roles_for_scope<'s>(
        state: &'s RealmState,
        scope: &RoleScope,
    ) -> GatewayResult<&'s Vec<RoleRepresentation>> {
        match scope {
            RoleScope::Realm => Ok(&state.realm_roles),
            RoleScope::Client(client_id) => state.client_roles.get(client_id).ok_or_else(|| {
                GatewayError::http("roles", 404, format!("client '{client_id}' has no roles"))
            }),
        }
    }

    fn org_guard(&self) -> GatewayResult<()> {
        if self.organizations_supported {
            Ok(())
        } else {
            Err(GatewayError::feature_unavailable("organizations"))
        }
    }
}

/// Build a role with the bookkeeping fields the server would set.
pub fn make_role(id: &str, name: &str) -> RoleRepresentation {
    RoleRepresentation {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl AdminGateway for MockGateway {
    async fn get_realm(&self, realm: &str) -> GatewayResult<Option<RealmRepresentation>> {
        let realms = self.realms.lock().unwrap();
        Ok(realms.get(realm).map(|s| s.realm.clone()))
    }

    async fn create_realm(&self, rep: &RealmRepresentation) -> GatewayResult<()> {
        let name = rep.name().to_string();
        let mut realms = self.realms.lock().unwrap();
        let mut rep = rep.clone();
        rep.id = Some(self.next_id());
        realms.insert(
            name.clone(),
            RealmState {
                realm: rep,
                ..Default::default()
            },
        );
        drop(realms);
        self.log(format!("{name}:create_realm"));
        Ok(())
    }

    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> GatewayResult<()> {
        self.write(realm, "update_realm", |state| {
            state.realm = rep.clone();
            Ok(())
        })
    }

    async fn get_realm_attribute(
        &self,
        realm: &str,
        key: &str,
    ) -> GatewayResult<Option<String>> {
        let realms = self.realms.lock().unwrap();
        Ok(realms
            .get(realm)
            .and_then(|s| s.realm.attributes.get(key).cloned()))
    }

    async fn set_realm_attribute(
        &self,
        realm: &str,
        key: &str,
        value: &str,
    ) -> GatewayResult<()> {
        self.write(realm, "set_realm_attribute", |state| {
            state
                .realm
                .attributes
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn list_roles(
        &self,
        realm: &str,
        scope: &RoleScope,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        self.read(realm, |state| match scope {
            RoleScope::Realm => Ok(state.realm_roles.clone()),
            RoleScope::Client(client_id) => {
                Ok(state.client_roles.get(client_id).cloned().unwrap_or_default())
            }
        })
    }

    async fn get_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Option<RoleRepresentation>> {
        self.read(realm, |state| {
            let roles = match scope {
                RoleScope::Realm => &state.realm_roles,
                RoleScope::Client(client_id) => {
                    match state.client_roles.get(client_id) {
                        Some(roles) => roles,
                        None => return Ok(None),
                    }
                }
            };
            Ok(roles.iter().find(|r| r.name() == name).cloned())
        })
    }

    async fn create_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_role:{scope}:{}", rep.name()), |state| {
            let mut role = rep.clone();
            role.id = Some(id);
            match scope {
                RoleScope::Realm => state.realm_roles.push(role),
                RoleScope::Client(client_id) => {
                    role.client_role = Some(true);
                    role.container_id = state
                        .clients
                        .iter()
                        .find(|c| c.client_id() == client_id)
                        .and_then(|c| c.id.clone());
                    state.client_roles.entry(client_id.clone()).or_default().push(role);
                }
            }
            Ok(())
        })
    }

    async fn update_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        rep: &RoleRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_role:{scope}:{name}"), |state| {
            let roles = match scope {
                RoleScope::Realm => &mut state.realm_roles,
                RoleScope::Client(client_id) => {
                    state.client_roles.entry(client_id.clone()).or_default()
                }
            };
            let role = roles.iter_mut().find(|r| r.name() == name).ok_or_else(|| {
                GatewayError::http("update_role", 404, format!("role '{name}' not found"))
            })?;
            let id = role.id.clone();
            *role = rep.clone();
            role.id = id;
            Ok(())
        })
    }

    async fn delete_role(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("delete_role:{scope}:{name}"), |state| {
            match scope {
                RoleScope::Realm => state.realm_roles.retain(|r| r.name() != name),
                RoleScope::Client(client_id) => {
                    if let Some(roles) = state.client_roles.get_mut(client_id) {
                        roles.retain(|r| r.name() != name);
                    }
                }
            }
            Ok(())
        })
    }

    async fn get_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        let key = Self::composite_key(scope, name);
        self.read(realm, |state| {
            Ok(state.composites.get(&key).cloned().unwrap_or_default())
        })
    }

    async fn add_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let key = Self::composite_key(scope, name);
        self.write(realm, &format!("add_composites:{scope}:{name}"), |state| {
            state
                .composites
                .entry(key)
                .or_default()
                .extend(targets.iter().cloned());
            Ok(())
        })
    }

    async fn remove_role_composites(
        &self,
        realm: &str,
        scope: &RoleScope,
        name: &str,
        targets: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let key = Self::composite_key(scope, name);
        self.write(realm, &format!("remove_composites:{scope}:{name}"), |state| {
            if let Some(grants) = state.composites.get_mut(&key) {
                grants.retain(|g| !targets.iter().any(|t| t.id == g.id || t.name == g.name));
            }
            Ok(())
        })
    }

    async fn list_clients(&self, realm: &str) -> GatewayResult<Vec<ClientRepresentation>> {
        self.read(realm, |state| Ok(state.clients.clone()))
    }

    async fn get_client_by_client_id(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Option<ClientRepresentation>> {
        self.read(realm, |state| {
            Ok(state.clients.iter().find(|c| c.client_id() == client_id).cloned())
        })
    }

    async fn create_client(&self, realm: &str, rep: &ClientRepresentation) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_client:{}", rep.client_id()), |state| {
            let mut client = rep.clone();
            client.id = Some(id.clone());
            let mappers = std::mem::take(&mut client.protocol_mappers)
                .into_iter()
                .enumerate()
                .map(|(i, mut m)| {
                    m.id = Some(format!("{id}-mapper-{i}"));
                    m
                })
                .collect();
            state.protocol_mappers.insert(id.clone(), mappers);
            state.clients.push(client);
            state.client_roles.entry(rep.client_id().to_string()).or_default();
            Ok(())
        })
    }

    async fn update_client(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_client:{}", rep.client_id()), |state| {
            let client = state
                .clients
                .iter_mut()
                .find(|c| c.id.as_deref() == Some(id))
                .ok_or_else(|| {
                    GatewayError::http("update_client", 404, format!("client '{id}' not found"))
                })?;
            let mut updated = rep.clone();
            updated.id = Some(id.to_string());
            updated.protocol_mappers = Vec::new();
            *client = updated;
            Ok(())
        })
    }

    async fn delete_client(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_client:{id}"), |state| {
            if let Some(client) = state.clients.iter().find(|c| c.id.as_deref() == Some(id)) {
                let client_id = client.client_id().to_string();
                state.client_roles.remove(&client_id);
            }
            state.clients.retain(|c| c.id.as_deref() != Some(id));
            state.protocol_mappers.remove(id);
            Ok(())
        })
    }

    async fn list_protocol_mappers(
        &self,
        realm: &str,
        client_id: &str,
    ) -> GatewayResult<Vec<ProtocolMapperRepresentation>> {
        self.read(realm, |state| {
            Ok(state.protocol_mappers.get(client_id).cloned().unwrap_or_default())
        })
    }

    async fn create_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_mapper:{}", rep.name()), |state| {
            let mut mapper = rep.clone();
            mapper.id = Some(id);
            state
                .protocol_mappers
                .entry(client_id.to_string())
                .or_default()
                .push(mapper);
            Ok(())
        })
    }

    async fn update_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
        rep: &ProtocolMapperRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_mapper:{}", rep.name()), |state| {
            let mappers = state.protocol_mappers.entry(client_id.to_string()).or_default();
            let mapper = mappers
                .iter_mut()
                .find(|m| m.id.as_deref() == Some(mapper_id))
                .ok_or_else(|| {
                    GatewayError::http("update_mapper", 404, format!("mapper '{mapper_id}' not found"))
                })?;
            let mut updated = rep.clone();
            updated.id = Some(mapper_id.to_string());
            *mapper = updated;
            Ok(())
        })
    }

    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        client_id: &str,
        mapper_id: &str,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("delete_mapper:{mapper_id}"), |state| {
            if let Some(mappers) = state.protocol_mappers.get_mut(client_id) {
                mappers.retain(|m| m.id.as_deref() != Some(mapper_id));
            }
            Ok(())
        })
    }

    async fn list_client_scopes(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<ClientScopeRepresentation>> {
        self.read(realm, |state| Ok(state.client_scopes.clone()))
    }

    async fn create_client_scope(
        &self,
        realm: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_client_scope:{}", rep.name()), |state| {
            let mut scope = rep.clone();
            scope.id = Some(id);
            state.client_scopes.push(scope);
            Ok(())
        })
    }

    async fn update_client_scope(
        &self,
        realm: &str,
        id: &str,
        rep: &ClientScopeRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_client_scope:{}", rep.name()), |state| {
            let scope = state
                .client_scopes
                .iter_mut()
                .find(|s| s.id.as_deref() == Some(id))
                .ok_or_else(|| {
                    GatewayError::http("update_client_scope", 404, "scope not found")
                })?;
            let mut updated = rep.clone();
            updated.id = Some(id.to_string());
            *scope = updated;
            Ok(())
        })
    }

    async fn delete_client_scope(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_client_scope:{id}"), |state| {
            state.client_scopes.retain(|s| s.id.as_deref() != Some(id));
            Ok(())
        })
    }

    async fn list_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        let key = holder_key(holder);
        self.read(realm, |state| {
            Ok(state.scope_mappings.get(&key).cloned().unwrap_or_default())
        })
    }

    async fn add_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let key = holder_key(holder);
        self.write(realm, &format!("add_scope_mappings:{key}"), |state| {
            state
                .scope_mappings
                .entry(key.clone())
                .or_default()
                .extend(roles.iter().cloned());
            Ok(())
        })
    }

    async fn remove_realm_scope_mappings(
        &self,
        realm: &str,
        holder: &ScopeHolder,
        roles: &[RoleRepresentation],
    ) -> GatewayResult<()> {
        let key = holder_key(holder);
        self.write(realm, &format!("remove_scope_mappings:{key}"), |state| {
            if let Some(granted) = state.scope_mappings.get_mut(&key) {
                granted.retain(|g| !roles.iter().any(|r| r.id == g.id || r.name == g.name));
            }
            Ok(())
        })
    }

    async fn list_groups(&self, realm: &str) -> GatewayResult<Vec<GroupRepresentation>> {
        self.read(realm, |state| Ok(state.groups.clone()))
    }

    async fn create_group(
        &self,
        realm: &str,
        parent_id: Option<&str>,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_group:{}", rep.name()), |state| {
            let mut group = rep.clone();
            group.id = Some(id);
            match parent_id {
                None => {
                    group.path = Some(format!("/{}", group.name()));
                    state.groups.push(group);
                    Ok(())
                }
                Some(parent_id) => {
                    let parent = find_group_mut(&mut state.groups, parent_id).ok_or_else(|| {
                        GatewayError::http("create_group", 404, "parent group not found")
                    })?;
                    group.path = Some(format!(
                        "{}/{}",
                        parent.path.as_deref().unwrap_or_default(),
                        group.name()
                    ));
                    parent.sub_groups.push(group);
                    Ok(())
                }
            }
        })
    }

    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        rep: &GroupRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_group:{}", rep.name()), |state| {
            let group = find_group_mut(&mut state.groups, id)
                .ok_or_else(|| GatewayError::http("update_group", 404, "group not found"))?;
            let (old_id, old_path, children) = (
                group.id.clone(),
                group.path.clone(),
                std::mem::take(&mut group.sub_groups),
            );
            *group = rep.clone();
            group.id = old_id;
            group.path = old_path;
            group.sub_groups = children;
            Ok(())
        })
    }

    async fn delete_group(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_group:{id}"), |state| {
            remove_group(&mut state.groups, id);
            Ok(())
        })
    }

    async fn list_components(
        &self,
        realm: &str,
        parent_id: Option<&str>,
    ) -> GatewayResult<Vec<ComponentRepresentation>> {
        self.read(realm, |state| {
            Ok(state
                .components
                .iter()
                .filter(|c| c.parent_id.as_deref() == parent_id)
                .cloned()
                .collect())
        })
    }

    async fn create_component(
        &self,
        realm: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_component:{}", rep.name()), |state| {
            let mut component = rep.clone();
            component.id = Some(id);
            state.components.push(component);
            Ok(())
        })
    }

    async fn update_component(
        &self,
        realm: &str,
        id: &str,
        rep: &ComponentRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_component:{}", rep.name()), |state| {
            let component = state
                .components
                .iter_mut()
                .find(|c| c.id.as_deref() == Some(id))
                .ok_or_else(|| GatewayError::http("update_component", 404, "component not found"))?;
            let (old_id, old_parent) = (component.id.clone(), component.parent_id.clone());
            *component = rep.clone();
            component.id = old_id;
            component.parent_id = old_parent;
            Ok(())
        })
    }

    async fn delete_component(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_component:{id}"), |state| {
            state
                .components
                .retain(|c| c.id.as_deref() != Some(id) && c.parent_id.as_deref() != Some(id));
            Ok(())
        })
    }

    async fn list_identity_providers(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>> {
        self.read(realm, |state| Ok(state.identity_providers.clone()))
    }

    async fn create_identity_provider(
        &self,
        realm: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_idp:{}", rep.alias()), |state| {
            let mut provider = rep.clone();
            provider.internal_id = Some(id);
            state.identity_providers.push(provider);
            Ok(())
        })
    }

    async fn update_identity_provider(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_idp:{alias}"), |state| {
            let provider = state
                .identity_providers
                .iter_mut()
                .find(|p| p.alias() == alias)
                .ok_or_else(|| GatewayError::http("update_idp", 404, "provider not found"))?;
            let internal_id = provider.internal_id.clone();
            *provider = rep.clone();
            provider.internal_id = internal_id;
            Ok(())
        })
    }

    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_idp:{alias}"), |state| {
            state.identity_providers.retain(|p| p.alias() != alias);
            state.idp_mappers.remove(alias);
            Ok(())
        })
    }

    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Vec<IdentityProviderMapperRepresentation>> {
        self.read(realm, |state| {
            Ok(state.idp_mappers.get(alias).cloned().unwrap_or_default())
        })
    }

    async fn create_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_idp_mapper:{}", rep.name()), |state| {
            let mut mapper = rep.clone();
            mapper.id = Some(id);
            state.idp_mappers.entry(alias.to_string()).or_default().push(mapper);
            Ok(())
        })
    }

    async fn update_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
        rep: &IdentityProviderMapperRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_idp_mapper:{}", rep.name()), |state| {
            let mappers = state.idp_mappers.entry(alias.to_string()).or_default();
            let mapper = mappers
                .iter_mut()
                .find(|m| m.id.as_deref() == Some(mapper_id))
                .ok_or_else(|| GatewayError::http("update_idp_mapper", 404, "mapper not found"))?;
            let mut updated = rep.clone();
            updated.id = Some(mapper_id.to_string());
            *mapper = updated;
            Ok(())
        })
    }

    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("delete_idp_mapper:{mapper_id}"), |state| {
            if let Some(mappers) = state.idp_mappers.get_mut(alias) {
                mappers.retain(|m| m.id.as_deref() != Some(mapper_id));
            }
            Ok(())
        })
    }

    async fn list_flows(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<AuthenticationFlowRepresentation>> {
        self.read(realm, |state| Ok(state.flows.clone()))
    }

    async fn get_flow_by_alias(
        &self,
        realm: &str,
        alias: &str,
    ) -> GatewayResult<Option<AuthenticationFlowRepresentation>> {
        self.read(realm, |state| {
            Ok(state.flows.iter().find(|f| f.alias() == alias).cloned())
        })
    }

    async fn create_flow(
        &self,
        realm: &str,
        rep: &AuthenticationFlowRepresentation,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_flow:{}", rep.alias()), |state| {
            let mut flow = rep.clone();
            flow.id = Some(id);
            state.executions.entry(flow.alias().to_string()).or_default();
            state.flows.push(flow);
            Ok(())
        })
    }

    async fn copy_flow(
        &self,
        realm: &str,
        model_alias: &str,
        new_alias: &str,
    ) -> GatewayResult<()> {
        let flow_id = self.next_id();
        let base = self.next_id.fetch_add(100, Ordering::SeqCst);
        self.write(realm, &format!("copy_flow:{model_alias}->{new_alias}"), |state| {
            let model = state
                .flows
                .iter()
                .find(|f| f.alias() == model_alias)
                .ok_or_else(|| GatewayError::http("copy_flow", 404, "model flow not found"))?;
            let mut copy = model.clone();
            copy.id = Some(flow_id);
            copy.alias = Some(new_alias.to_string());
            copy.built_in = Some(false);
            state.flows.push(copy);

            let executions = state
                .executions
                .get(model_alias)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(i, mut e)| {
                    e.id = Some(format!("id-{}", base + i as u64));
                    e
                })
                .collect();
            state.executions.insert(new_alias.to_string(), executions);
            Ok(())
        })
    }

    async fn list_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> GatewayResult<Vec<AuthenticationExecutionInfoRepresentation>> {
        self.read(realm, |state| {
            Ok(state.executions.get(flow_alias).cloned().unwrap_or_default())
        })
    }

    async fn add_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        provider: &str,
    ) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("add_execution:{flow_alias}:{provider}"), |state| {
            let executions = state.executions.entry(flow_alias.to_string()).or_default();
            let index = executions.iter().map(|e| e.index).max().map_or(0, |i| i + 1);
            executions.push(AuthenticationExecutionInfoRepresentation {
                id: Some(id),
                provider_id: Some(provider.to_string()),
                requirement: Some("DISABLED".to_string()),
                level: 0,
                index,
                ..Default::default()
            });
            Ok(())
        })
    }

    async fn update_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        rep: &AuthenticationExecutionInfoRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_execution:{flow_alias}"), |state| {
            let executions = state.executions.entry(flow_alias.to_string()).or_default();
            let execution = executions
                .iter_mut()
                .find(|e| e.id == rep.id)
                .ok_or_else(|| GatewayError::http("update_execution", 404, "execution not found"))?;
            *execution = rep.clone();
            Ok(())
        })
    }

    async fn delete_execution(&self, realm: &str, execution_id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_execution:{execution_id}"), |state| {
            for executions in state.executions.values_mut() {
                let before = executions.len();
                executions.retain(|e| e.id.as_deref() != Some(execution_id));
                if executions.len() != before {
                    for (i, e) in executions.iter_mut().enumerate() {
                        e.index = i as i32;
                    }
                    break;
                }
            }
            Ok(())
        })
    }

    async fn raise_execution_priority(
        &self,
        realm: &str,
        execution_id: &str,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("raise_execution:{execution_id}"), |state| {
            for executions in state.executions.values_mut() {
                if let Some(pos) = executions
                    .iter()
                    .position(|e| e.id.as_deref() == Some(execution_id))
                {
                    if pos > 0 {
                        executions.swap(pos - 1, pos);
                        for (i, e) in executions.iter_mut().enumerate() {
                            e.index = i as i32;
                        }
                    }
                    return Ok(());
                }
            }
            Err(GatewayError::http("raise_execution", 404, "execution not found"))
        })
    }

    async fn list_required_actions(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<RequiredActionProviderRepresentation>> {
        self.read(realm, |state| Ok(state.required_actions.clone()))
    }

    async fn register_required_action(
        &self,
        realm: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("register_required_action:{}", rep.alias()), |state| {
            state.required_actions.push(rep.clone());
            Ok(())
        })
    }

    async fn update_required_action(
        &self,
        realm: &str,
        alias: &str,
        rep: &RequiredActionProviderRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_required_action:{alias}"), |state| {
            let action = state
                .required_actions
                .iter_mut()
                .find(|a| a.alias() == alias)
                .ok_or_else(|| GatewayError::http("update_required_action", 404, "action not found"))?;
            *action = rep.clone();
            Ok(())
        })
    }

    async fn delete_required_action(&self, realm: &str, alias: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_required_action:{alias}"), |state| {
            state.required_actions.retain(|a| a.alias() != alias);
            Ok(())
        })
    }

    async fn list_users(&self, realm: &str) -> GatewayResult<Vec<UserRepresentation>> {
        self.read(realm, |state| Ok(state.users.clone()))
    }

    async fn get_user_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> GatewayResult<Option<UserRepresentation>> {
        self.read(realm, |state| {
            Ok(state.users.iter().find(|u| u.username() == username).cloned())
        })
    }

    async fn create_user(&self, realm: &str, rep: &UserRepresentation) -> GatewayResult<()> {
        let id = self.next_id();
        self.write(realm, &format!("create_user:{}", rep.username()), |state| {
            let mut user = rep.clone();
            user.id = Some(id);
            state.users.push(user);
            Ok(())
        })
    }

    async fn update_user(
        &self,
        realm: &str,
        id: &str,
        rep: &UserRepresentation,
    ) -> GatewayResult<()> {
        self.write(realm, &format!("update_user:{}", rep.username()), |state| {
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id.as_deref() == Some(id))
                .ok_or_else(|| GatewayError::http("update_user", 404, "user not found"))?;
            let mut updated = rep.clone();
            updated.id = Some(id.to_string());
            *user = updated;
            Ok(())
        })
    }

    async fn delete_user(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.write(realm, &format!("delete_user:{id}"), |state| {
            state.users.retain(|u| u.id.as_deref() != Some(id));
            Ok(())
        })
    }

    async fn list_organizations(
        &self,
        realm: &str,
    ) -> GatewayResult<Vec<OrganizationRepresentation>> {
        self.org_guard()?;
        self.read(realm, |state| Ok(state.organizations.clone()))
    }

    async fn create_organization(
        &self,
        realm: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        let id = self.next_id();
        self.write(realm, &format!("create_org:{}", rep.name()), |state| {
            let mut org = rep.clone();
            org.id = Some(id);
            state.organizations.push(org);
            Ok(())
        })
    }

    async fn update_organization(
        &self,
        realm: &str,
        id: &str,
        rep: &OrganizationRepresentation,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("update_org:{}", rep.name()), |state| {
            let org = state
                .organizations
                .iter_mut()
                .find(|o| o.id.as_deref() == Some(id))
                .ok_or_else(|| GatewayError::http("update_org", 404, "organization not found"))?;
            let mut updated = rep.clone();
            updated.id = Some(id.to_string());
            *org = updated;
            Ok(())
        })
    }

    async fn delete_organization(&self, realm: &str, id: &str) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("delete_org:{id}"), |state| {
            state.organizations.retain(|o| o.id.as_deref() != Some(id));
            state.org_members.remove(id);
            state.org_idps.remove(id);
            Ok(())
        })
    }

    async fn list_organization_members(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<UserRepresentation>> {
        self.org_guard()?;
        self.read(realm, |state| {
            let member_ids = state.org_members.get(org_id).cloned().unwrap_or_default();
            Ok(state
                .users
                .iter()
                .filter(|u| u.id.as_ref().is_some_and(|id| member_ids.contains(id)))
                .cloned()
                .collect())
        })
    }

    async fn add_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("add_org_member:{org_id}:{user_id}"), |state| {
            state
                .org_members
                .entry(org_id.to_string())
                .or_default()
                .push(user_id.to_string());
            Ok(())
        })
    }

    async fn remove_organization_member(
        &self,
        realm: &str,
        org_id: &str,
        user_id: &str,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("remove_org_member:{org_id}:{user_id}"), |state| {
            if let Some(members) = state.org_members.get_mut(org_id) {
                members.retain(|m| m != user_id);
            }
            Ok(())
        })
    }

    async fn list_organization_identity_providers(
        &self,
        realm: &str,
        org_id: &str,
    ) -> GatewayResult<Vec<IdentityProviderRepresentation>> {
        self.org_guard()?;
        self.read(realm, |state| {
            let aliases = state.org_idps.get(org_id).cloned().unwrap_or_default();
            Ok(state
                .identity_providers
                .iter()
                .filter(|p| aliases.iter().any(|a| a == p.alias()))
                .cloned()
                .collect())
        })
    }

    async fn add_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("add_org_idp:{org_id}:{alias}"), |state| {
            state
                .org_idps
                .entry(org_id.to_string())
                .or_default()
                .push(alias.to_string());
            Ok(())
        })
    }

    async fn remove_organization_identity_provider(
        &self,
        realm: &str,
        org_id: &str,
        alias: &str,
    ) -> GatewayResult<()> {
        self.org_guard()?;
        self.write(realm, &format!("remove_org_idp:{org_id}:{alias}"), |state| {
            if let Some(aliases) = state.org_idps.get_mut(org_id) {
                aliases.retain(|a| a != alias);
            }
            Ok(())
        })
    }
}

fn holder_key(holder: &ScopeHolder) -> String {
    match holder {
        ScopeHolder::Client(id) => format!("client:{id}"),
        ScopeHolder::ClientScope(id) => format!("client-scope:{id}"),
    }
}

fn find_group_mut<'g>(
    groups: &'g mut [GroupRepresentation],
    id: &str,
) -> Option<&'g mut GroupRepresentation> {
    for group in groups {
        if group.id.as_deref() == Some(id) {
            return Some(group);
        }
        if let Some(found) = find_group_mut(&mut group.sub_groups, id) {
            return Some(found);
        }
    }
    None
}

fn remove_group(groups: &mut Vec<GroupRepresentation>, id: &str) {
    groups.retain(|g| g.id.as_deref() != Some(id));
    for group in groups {
        remove_group(&mut group.sub_groups, id);
    }
}
