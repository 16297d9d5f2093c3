//! Required-action import.
//!
//! Every server ships a stock set of required actions, so the remote
//! listing alone cannot say which ones we own. The FULL purge only
//! deregisters actions the previous run's state record names.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use realmsync_types::RequiredActionProviderRepresentation;

use crate::error::ImportResult;
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

const IGNORED: &[&str] = &[];

pub(crate) fn validate(desired: &[RequiredActionProviderRepresentation]) -> ImportResult<()> {
    ensure_unique(
        "required action",
        desired.iter().map(RequiredActionProviderRepresentation::alias),
    )
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[RequiredActionProviderRepresentation],
) -> ImportResult<ImportCounters> {
    let state_key = type_key("required-action");
    ctx.tracker.record(
        &state_key,
        desired.iter().map(RequiredActionProviderRepresentation::alias),
    );

    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_required_actions(ctx.realm).await?;
    let remote_by_alias: BTreeMap<&str, &RequiredActionProviderRepresentation> =
        remote.iter().map(|a| (a.alias(), a)).collect();

    for action in desired {
        match remote_by_alias.get(action.alias()) {
            None => {
                debug!(realm = %ctx.realm, alias = %action.alias(), "registering required action");
                ctx.gateway.register_required_action(ctx.realm, action).await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx.canon.resource_needs_update(*existing, action, IGNORED)? {
                    debug!(realm = %ctx.realm, alias = %action.alias(), "updating required action");
                    let merged = ctx.canon.patch_resource(*existing, action, IGNORED)?;
                    ctx.gateway
                        .update_required_action(ctx.realm, action.alias(), &merged)
                        .await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.required_action.deletes_undeclared() {
        let previously_declared = ctx.previous.names(&state_key);
        let declared: BTreeMap<&str, ()> = desired.iter().map(|a| (a.alias(), ())).collect();
        for action in &remote {
            if declared.contains_key(action.alias()) {
                continue;
            }
            if !previously_declared.iter().any(|n| n == action.alias()) {
                continue;
            }
            debug!(
                realm = %ctx.realm,
                alias = %action.alias(),
                "deleting previously declared required action"
            );
            match ctx.gateway.delete_required_action(ctx.realm, action.alias()).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    alias = %action.alias(),
                    %error,
                    "failed to delete required action, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}
