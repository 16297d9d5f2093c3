//! Role import: realm-level and client-level roles, plus composite grant
//! resolution once all roles exist.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use realmsync_gateway::RoleScope;
use realmsync_types::{DesiredRoles, RoleRepresentation};

use crate::composite::CompositeResolver;
use crate::error::ImportResult;
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::{sub_type_key, type_key};

/// Server-managed fields, plus the composite declaration, which is not wire
/// format and is applied by the resolver after all roles exist.
const IGNORED: &[&str] = &["id", "containerId", "clientRole", "composite", "composites"];

pub(crate) fn validate(desired: &DesiredRoles) -> ImportResult<()> {
    ensure_unique("realm role", desired.realm.iter().map(RoleRepresentation::name))?;
    for (client_id, roles) in &desired.client {
        ensure_unique(
            &format!("role of client '{client_id}'"),
            roles.iter().map(RoleRepresentation::name),
        )?;
    }
    Ok(())
}

pub async fn import(ctx: &ImportContext<'_>, desired: &DesiredRoles) -> ImportResult<ImportCounters> {
    let mut counters = reconcile_scope(ctx, &RoleScope::Realm, &desired.realm).await?;
    for (client_id, roles) in &desired.client {
        let scope = RoleScope::Client(client_id.clone());
        counters.merge(reconcile_scope(ctx, &scope, roles).await?);
    }
    Ok(counters)
}

async fn reconcile_scope(
    ctx: &ImportContext<'_>,
    scope: &RoleScope,
    desired: &[RoleRepresentation],
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_roles(ctx.realm, scope).await?;
    let remote_by_name: BTreeMap<&str, &RoleRepresentation> =
        remote.iter().map(|r| (r.name(), r)).collect();

    let state_key = match scope {
        RoleScope::Realm => type_key("role"),
        RoleScope::Client(client_id) => sub_type_key("role", client_id),
    };
    ctx.tracker
        .record(&state_key, desired.iter().map(RoleRepresentation::name));

    for role in desired {
        let wire = wire_form(role);
        match remote_by_name.get(role.name()) {
            None => {
                debug!(realm = %ctx.realm, scope = %scope, role = %role.name(), "creating role");
                ctx.gateway.create_role(ctx.realm, scope, &wire).await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx.canon.resource_needs_update(*existing, &wire, IGNORED)? {
                    debug!(realm = %ctx.realm, scope = %scope, role = %role.name(), "updating role");
                    let merged = ctx.canon.patch_resource(*existing, &wire, IGNORED)?;
                    ctx.gateway
                        .update_role(ctx.realm, scope, role.name(), &merged)
                        .await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.role.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|r| (r.name(), ())).collect();
        for role in &remote {
            if declared.contains_key(role.name()) {
                continue;
            }
            debug!(realm = %ctx.realm, scope = %scope, role = %role.name(), "deleting undeclared role");
            match ctx.gateway.delete_role(ctx.realm, scope, role.name()).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    scope = %scope,
                    role = %role.name(),
                    %error,
                    "failed to delete role, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}

/// Converge every declared role's composite grants. Runs after the role and
/// client steps, so every referenced role and client already exists.
pub async fn resolve_composites(
    ctx: &ImportContext<'_>,
    desired: &DesiredRoles,
) -> ImportResult<ImportCounters> {
    let clients = ctx.gateway.list_clients(ctx.realm).await?;
    let client_ids_by_uuid: BTreeMap<String, String> = clients
        .iter()
        .filter_map(|c| {
            let uuid = c.id.clone()?;
            Some((uuid, c.client_id().to_string()))
        })
        .collect();
    let resolver = CompositeResolver::new(ctx.gateway, ctx.realm, &client_ids_by_uuid);

    let mut counters = ImportCounters::default();
    for role in &desired.realm {
        if let Some(spec) = &role.composites {
            if resolver.reconcile(&RoleScope::Realm, role.name(), spec).await? {
                counters.updated += 1;
            } else {
                counters.unchanged += 1;
            }
        }
    }
    for (client_id, roles) in &desired.client {
        let scope = RoleScope::Client(client_id.clone());
        for role in roles {
            if let Some(spec) = &role.composites {
                if resolver.reconcile(&scope, role.name(), spec).await? {
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }
    Ok(counters)
}

/// The wire form sent to the server: no composites declaration, no
/// server-assigned id.
fn wire_form(role: &RoleRepresentation) -> RoleRepresentation {
    let mut wire = role.clone();
    wire.id = None;
    wire.composites = None;
    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_strips_composites_and_id() {
        let role = RoleRepresentation {
            id: Some("uuid".to_string()),
            name: Some("ops".to_string()),
            composites: Some(realmsync_types::CompositesSpec::default()),
            ..Default::default()
        };

        let wire = wire_form(&role);
        assert!(wire.id.is_none());
        assert!(wire.composites.is_none());
        assert_eq!(wire.name(), "ops");
    }
}
