//! Client-scope import, matched by scope name.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use realmsync_types::ClientScopeRepresentation;

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

const IGNORED: &[&str] = &["id", "protocolMappers.id"];

pub(crate) fn validate(desired: &[ClientScopeRepresentation]) -> ImportResult<()> {
    ensure_unique("client scope", desired.iter().map(ClientScopeRepresentation::name))
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[ClientScopeRepresentation],
) -> ImportResult<ImportCounters> {
    ctx.tracker.record(
        &type_key("client-scope"),
        desired.iter().map(ClientScopeRepresentation::name),
    );

    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_client_scopes(ctx.realm).await?;
    let remote_by_name: BTreeMap<&str, &ClientScopeRepresentation> =
        remote.iter().map(|s| (s.name(), s)).collect();

    for scope in desired {
        match remote_by_name.get(scope.name()) {
            None => {
                debug!(realm = %ctx.realm, scope = %scope.name(), "creating client scope");
                ctx.gateway.create_client_scope(ctx.realm, scope).await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx.canon.resource_needs_update(*existing, scope, IGNORED)? {
                    let id = existing.id.as_deref().ok_or_else(|| {
                        ImportError::processing(format!(
                            "client scope '{}' has no server id",
                            scope.name()
                        ))
                    })?;
                    debug!(realm = %ctx.realm, scope = %scope.name(), "updating client scope");
                    let merged = ctx.canon.patch_resource(*existing, scope, IGNORED)?;
                    ctx.gateway.update_client_scope(ctx.realm, id, &merged).await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.client_scope.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|s| (s.name(), ())).collect();
        for scope in &remote {
            if declared.contains_key(scope.name()) {
                continue;
            }
            let Some(id) = scope.id.as_deref() else {
                continue;
            };
            debug!(realm = %ctx.realm, scope = %scope.name(), "deleting undeclared client scope");
            match ctx.gateway.delete_client_scope(ctx.realm, id).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    scope = %scope.name(),
                    %error,
                    "failed to delete client scope, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}
