//! Realm-level scope-mapping import: roles granted to clients and client
//! scopes, reconciled per grantee.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use realmsync_gateway::{RoleScope, ScopeHolder};
use realmsync_types::{RoleRepresentation, ScopeMappingRepresentation};

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;

pub(crate) fn validate(desired: &[ScopeMappingRepresentation]) -> ImportResult<()> {
    for mapping in desired {
        if mapping.grantee_key().is_empty() {
            return Err(ImportError::validation(
                "scope mapping declares neither a client nor a client scope",
            ));
        }
    }
    let keys: Vec<String> = desired.iter().map(|m| m.grantee_key()).collect();
    ensure_unique("scope mapping grantee", keys.iter().map(String::as_str))
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[ScopeMappingRepresentation],
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();
    for mapping in desired {
        let holder = resolve_holder(ctx, mapping).await?;
        counters.merge(reconcile_grantee(ctx, mapping, &holder).await?);
    }
    Ok(counters)
}

/// Translate the grantee's natural key into the server-id holder the
/// gateway addresses mappings by.
async fn resolve_holder(
    ctx: &ImportContext<'_>,
    mapping: &ScopeMappingRepresentation,
) -> ImportResult<ScopeHolder> {
    if let Some(client_id) = &mapping.client {
        let client = ctx
            .gateway
            .get_client_by_client_id(ctx.realm, client_id)
            .await?
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "scope mapping references unknown client '{client_id}'"
                ))
            })?;
        let id = client.id.ok_or_else(|| {
            ImportError::processing(format!("client '{client_id}' has no server id"))
        })?;
        return Ok(ScopeHolder::Client(id));
    }

    let scope_name = mapping.client_scope.as_deref().unwrap_or_default();
    let scopes = ctx.gateway.list_client_scopes(ctx.realm).await?;
    let scope = scopes
        .into_iter()
        .find(|s| s.name() == scope_name)
        .ok_or_else(|| {
            ImportError::processing(format!(
                "scope mapping references unknown client scope '{scope_name}'"
            ))
        })?;
    let id = scope.id.ok_or_else(|| {
        ImportError::processing(format!("client scope '{scope_name}' has no server id"))
    })?;
    Ok(ScopeHolder::ClientScope(id))
}

async fn reconcile_grantee(
    ctx: &ImportContext<'_>,
    mapping: &ScopeMappingRepresentation,
    holder: &ScopeHolder,
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let existing = ctx.gateway.list_realm_scope_mappings(ctx.realm, holder).await?;
    let existing_names: BTreeSet<&str> = existing.iter().map(RoleRepresentation::name).collect();
    let declared: BTreeSet<&str> = mapping.roles.iter().map(String::as_str).collect();

    let mut to_add: Vec<RoleRepresentation> = Vec::new();
    for name in &declared {
        if !existing_names.contains(name) {
            let role = ctx
                .gateway
                .get_role(ctx.realm, &RoleScope::Realm, name)
                .await?
                .ok_or_else(|| {
                    ImportError::processing(format!(
                        "scope mapping for '{}' references unknown role '{name}'",
                        mapping.grantee_key()
                    ))
                })?;
            to_add.push(role);
        }
    }

    if ctx.managed.scope_mapping.deletes_undeclared() {
        let to_remove: Vec<RoleRepresentation> = existing
            .iter()
            .filter(|r| !declared.contains(r.name()))
            .cloned()
            .collect();
        if !to_remove.is_empty() {
            debug!(
                realm = %ctx.realm,
                grantee = %mapping.grantee_key(),
                removed = to_remove.len(),
                "removing undeclared scope mappings"
            );
            match ctx
                .gateway
                .remove_realm_scope_mappings(ctx.realm, holder, &to_remove)
                .await
            {
                Ok(()) => counters.deleted += to_remove.len() as u32,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    grantee = %mapping.grantee_key(),
                    %error,
                    "failed to remove scope mappings, leaving them in place"
                ),
            }
        }
    }

    if to_add.is_empty() {
        counters.unchanged += 1;
    } else {
        debug!(
            realm = %ctx.realm,
            grantee = %mapping.grantee_key(),
            added = to_add.len(),
            "granting scope mappings"
        );
        ctx.gateway
            .add_realm_scope_mappings(ctx.realm, holder, &to_add)
            .await?;
        counters.created += to_add.len() as u32;
    }

    Ok(counters)
}
