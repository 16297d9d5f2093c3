//! User import, matched by username. Defaults to `NoDelete`: undeclared
//! accounts are kept unless the operator opts into full management.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use realmsync_types::UserRepresentation;

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

const IGNORED: &[&str] = &["id"];

pub(crate) fn validate(desired: &[UserRepresentation]) -> ImportResult<()> {
    ensure_unique("user", desired.iter().map(UserRepresentation::username))
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[UserRepresentation],
) -> ImportResult<ImportCounters> {
    ctx.tracker
        .record(&type_key("user"), desired.iter().map(UserRepresentation::username));

    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_users(ctx.realm).await?;
    let remote_by_username: BTreeMap<&str, &UserRepresentation> =
        remote.iter().map(|u| (u.username(), u)).collect();

    for user in desired {
        match remote_by_username.get(user.username()) {
            None => {
                debug!(realm = %ctx.realm, username = %user.username(), "creating user");
                ctx.gateway.create_user(ctx.realm, user).await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx.canon.resource_needs_update(*existing, user, IGNORED)? {
                    let id = existing.id.as_deref().ok_or_else(|| {
                        ImportError::processing(format!(
                            "user '{}' has no server id",
                            user.username()
                        ))
                    })?;
                    debug!(realm = %ctx.realm, username = %user.username(), "updating user");
                    let merged = ctx.canon.patch_resource(*existing, user, IGNORED)?;
                    ctx.gateway.update_user(ctx.realm, id, &merged).await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.user.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|u| (u.username(), ())).collect();
        for user in &remote {
            if declared.contains_key(user.username()) {
                continue;
            }
            let Some(id) = user.id.as_deref() else {
                continue;
            };
            debug!(realm = %ctx.realm, username = %user.username(), "deleting undeclared user");
            match ctx.gateway.delete_user(ctx.realm, id).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    username = %user.username(),
                    %error,
                    "failed to delete user, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}
