//! Component import: storage providers, key providers and their nested
//! sub-components.
//!
//! The natural key is (providerType, name) within the parent scope. A plain
//! listing cannot tell a component we declared last run from one the server
//! or an admin created, so the FULL purge only deletes components whose
//! name appears in the previous run's state record. Without a record the
//! purge degrades to never-delete.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use realmsync_types::ComponentRepresentation;

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::{sub_type_key, type_key};

const IGNORED: &[&str] = &["id", "parentId", "subComponents"];

pub(crate) fn validate(desired: &[ComponentRepresentation]) -> ImportResult<()> {
    validate_level(None, desired)
}

fn validate_level(
    parent_name: Option<&str>,
    desired: &[ComponentRepresentation],
) -> ImportResult<()> {
    let scope_name = parent_name.map_or_else(
        || "component".to_string(),
        |p| format!("sub-component of '{p}'"),
    );
    ensure_unique(&scope_name, desired.iter().map(ComponentRepresentation::name))?;

    for component in desired {
        validate_level(Some(component.name()), &component.sub_components)?;
    }
    Ok(())
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[ComponentRepresentation],
) -> ImportResult<ImportCounters> {
    let remote = ctx.gateway.list_components(ctx.realm, None).await?;
    let mut counters = ImportCounters::default();
    reconcile_level(ctx, None, None, desired, &remote, &mut counters).await?;
    Ok(counters)
}

/// Natural key within the parent scope.
fn component_key(component: &ComponentRepresentation) -> (String, String) {
    (
        component.provider_type.clone().unwrap_or_default(),
        component.name().to_string(),
    )
}

/// Reconcile the components directly under one parent. `parent` is
/// `(server id, name)`; `None` for realm-level components.
fn reconcile_level<'b>(
    ctx: &'b ImportContext<'_>,
    parent_id: Option<&'b str>,
    parent_name: Option<&'b str>,
    desired: &'b [ComponentRepresentation],
    remote_level: &'b [ComponentRepresentation],
    counters: &'b mut ImportCounters,
) -> Pin<Box<dyn Future<Output = ImportResult<()>> + Send + 'b>> {
    Box::pin(async move {
        let state_key = match parent_name {
            None => type_key("component"),
            Some(parent) => sub_type_key("component", parent),
        };
        ctx.tracker
            .record(&state_key, desired.iter().map(ComponentRepresentation::name));

        let remote_by_key: BTreeMap<(String, String), &ComponentRepresentation> = remote_level
            .iter()
            .map(|c| (component_key(c), c))
            .collect();

        for component in desired {
            let id = match remote_by_key.get(&component_key(component)) {
                None => {
                    debug!(
                        realm = %ctx.realm,
                        component = %component.name(),
                        provider_type = component.provider_type.as_deref().unwrap_or_default(),
                        "creating component"
                    );
                    let mut wire = wire_form(component);
                    wire.parent_id = parent_id.map(ToString::to_string);
                    ctx.gateway.create_component(ctx.realm, &wire).await?;
                    counters.created += 1;

                    if component.sub_components.is_empty() {
                        continue;
                    }
                    // Re-list to learn the created component's id.
                    let refreshed = ctx.gateway.list_components(ctx.realm, parent_id).await?;
                    refreshed
                        .iter()
                        .find(|c| component_key(c) == component_key(component))
                        .and_then(|c| c.id.clone())
                        .ok_or_else(|| {
                            ImportError::processing(format!(
                                "created component '{}' not found on re-list",
                                component.name()
                            ))
                        })?
                }
                Some(existing) => {
                    let id = existing.id.clone().ok_or_else(|| {
                        ImportError::processing(format!(
                            "component '{}' has no server id",
                            component.name()
                        ))
                    })?;
                    if ctx.canon.resource_needs_update(*existing, component, IGNORED)? {
                        debug!(
                            realm = %ctx.realm,
                            component = %component.name(),
                            "updating component"
                        );
                        let merged = ctx.canon.patch_resource(*existing, component, IGNORED)?;
                        ctx.gateway.update_component(ctx.realm, &id, &merged).await?;
                        counters.updated += 1;
                    } else {
                        counters.unchanged += 1;
                    }
                    id
                }
            };

            let children = ctx.gateway.list_components(ctx.realm, Some(&id)).await?;
            reconcile_level(
                ctx,
                Some(&id),
                Some(component.name()),
                &component.sub_components,
                &children,
                counters,
            )
            .await?;
        }

        if ctx.managed.component.deletes_undeclared() {
            purge_level(ctx, &state_key, desired, remote_level, counters).await;
        }

        Ok(())
    })
}

/// Delete remote components the previous run declared and this run dropped.
async fn purge_level(
    ctx: &ImportContext<'_>,
    state_key: &str,
    desired: &[ComponentRepresentation],
    remote_level: &[ComponentRepresentation],
    counters: &mut ImportCounters,
) {
    let previously_declared = ctx.previous.names(state_key);
    if previously_declared.is_empty() {
        return;
    }

    let declared: BTreeMap<&str, ()> = desired.iter().map(|c| (c.name(), ())).collect();
    for component in remote_level {
        if declared.contains_key(component.name()) {
            continue;
        }
        if !previously_declared.iter().any(|n| n == component.name()) {
            continue;
        }
        let Some(id) = component.id.as_deref() else {
            continue;
        };
        debug!(
            realm = %ctx.realm,
            component = %component.name(),
            "deleting previously declared component"
        );
        match ctx.gateway.delete_component(ctx.realm, id).await {
            Ok(()) => counters.deleted += 1,
            Err(error) => warn!(
                realm = %ctx.realm,
                component = %component.name(),
                %error,
                "failed to delete component, leaving it in place"
            ),
        }
    }
}

fn wire_form(component: &ComponentRepresentation) -> ComponentRepresentation {
    let mut wire = component.clone();
    wire.id = None;
    wire.sub_components = Vec::new();
    wire
}
