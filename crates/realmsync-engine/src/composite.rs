//! Composite role reconciliation.
//!
//! A composite role grants other roles. The owner may be realm-level or
//! client-level, and each target may be realm-level or client-level, giving
//! four owner/target combinations. All four go through the same path: the
//! owner is addressed by a [`RoleScope`], targets are split per axis, the
//! remote grant set is diffed against the declared one, and stale grants
//! are removed before missing ones are added.
//!
//! Client-axis diffing walks the union of clientIds seen on either side, so
//! grants into a client that the declaration dropped entirely still get
//! pruned.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use realmsync_gateway::{AdminGateway, RoleScope};
use realmsync_types::{CompositesSpec, RoleRepresentation};

use crate::error::{ImportError, ImportResult};

/// Reconciles one owner role's grant set.
pub struct CompositeResolver<'a> {
    gateway: &'a Arc<dyn AdminGateway>,
    realm: &'a str,
    /// Server client id -> clientId, for classifying fetched grants.
    client_ids_by_uuid: &'a BTreeMap<String, String>,
}

impl<'a> CompositeResolver<'a> {
    #[must_use]
    pub fn new(
        gateway: &'a Arc<dyn AdminGateway>,
        realm: &'a str,
        client_ids_by_uuid: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            gateway,
            realm,
            client_ids_by_uuid,
        }
    }

    /// Converge the owner's grants on the declared spec. Returns whether any
    /// remote mutation was performed.
    pub async fn reconcile(
        &self,
        owner_scope: &RoleScope,
        owner_name: &str,
        desired: &CompositesSpec,
    ) -> ImportResult<bool> {
        let existing = self
            .gateway
            .get_role_composites(self.realm, owner_scope, owner_name)
            .await?;

        let mut existing_realm: BTreeMap<String, RoleRepresentation> = BTreeMap::new();
        let mut existing_client: BTreeMap<String, BTreeMap<String, RoleRepresentation>> =
            BTreeMap::new();

        for grant in existing {
            let name = grant.name().to_string();
            if grant.client_role == Some(true) {
                let Some(container) = grant.container_id.as_deref() else {
                    warn!(
                        realm = %self.realm,
                        owner = %owner_name,
                        target = %name,
                        "client-level grant has no container id, leaving it alone"
                    );
                    continue;
                };
                let Some(client_id) = self.client_ids_by_uuid.get(container) else {
                    warn!(
                        realm = %self.realm,
                        owner = %owner_name,
                        target = %name,
                        container = %container,
                        "client-level grant points at an unknown client, leaving it alone"
                    );
                    continue;
                };
                existing_client
                    .entry(client_id.clone())
                    .or_default()
                    .insert(name, grant);
            } else {
                existing_realm.insert(name, grant);
            }
        }

        let mut to_remove: Vec<RoleRepresentation> = Vec::new();
        let mut to_add: Vec<RoleRepresentation> = Vec::new();

        // Realm axis.
        for (name, grant) in &existing_realm {
            if !desired.realm.contains(name) {
                to_remove.push(grant.clone());
            }
        }
        for name in &desired.realm {
            if !existing_realm.contains_key(name) {
                to_add.push(self.resolve_target(&RoleScope::Realm, name).await?);
            }
        }

        // Client axis, over the union of clientIds on both sides. Owned keys,
        // since the loop drains `existing_client`.
        let client_ids: BTreeSet<String> = existing_client
            .keys()
            .chain(desired.client.keys())
            .cloned()
            .collect();
        let empty = BTreeSet::new();
        for client_id in &client_ids {
            let declared = desired.client.get(client_id).unwrap_or(&empty);
            let present = existing_client.remove(client_id).unwrap_or_default();

            for (name, grant) in &present {
                if !declared.contains(name) {
                    to_remove.push(grant.clone());
                }
            }
            for name in declared {
                if !present.contains_key(name) {
                    let scope = RoleScope::Client(client_id.clone());
                    to_add.push(self.resolve_target(&scope, name).await?);
                }
            }
        }

        if to_remove.is_empty() && to_add.is_empty() {
            return Ok(false);
        }

        debug!(
            realm = %self.realm,
            owner = %owner_name,
            scope = %owner_scope,
            removed = to_remove.len(),
            added = to_add.len(),
            "reconciling composite grants"
        );

        // Remove before add: a rename shows up as one of each, and removing
        // first keeps the grant set from transiently holding both.
        if !to_remove.is_empty() {
            self.gateway
                .remove_role_composites(self.realm, owner_scope, owner_name, &to_remove)
                .await?;
        }
        if !to_add.is_empty() {
            self.gateway
                .add_role_composites(self.realm, owner_scope, owner_name, &to_add)
                .await?;
        }

        Ok(true)
    }

    /// Fetch a grant target with its server id; a dangling reference is a
    /// declaration mistake and aborts the realm.
    async fn resolve_target(
        &self,
        scope: &RoleScope,
        name: &str,
    ) -> ImportResult<RoleRepresentation> {
        self.gateway
            .get_role(self.realm, scope, name)
            .await?
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "composite target role '{name}' ({scope}) does not exist in realm '{}'",
                    self.realm
                ))
            })
    }
}
