//! Realm settings import: ensure the realm exists, then converge its scalar
//! settings.

use tracing::{debug, info};

use realmsync_types::RealmRepresentation;

use crate::error::ImportResult;
use crate::import::ImportContext;
use crate::report::ImportCounters;

/// The server id is never declared. The checksum and state attributes need
/// no ignore entry: the declared side never carries them, so the attribute
/// merge keeps the stored values as-is.
const IGNORED: &[&str] = &["id"];

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &RealmRepresentation,
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    match ctx.gateway.get_realm(ctx.realm).await? {
        None => {
            info!(realm = %ctx.realm, "creating realm");
            ctx.gateway.create_realm(desired).await?;
            counters.created += 1;
        }
        Some(existing) => {
            if ctx.canon.resource_needs_update(&existing, desired, IGNORED)? {
                debug!(realm = %ctx.realm, "updating realm settings");
                let merged = ctx.canon.patch_resource(&existing, desired, IGNORED)?;
                ctx.gateway.update_realm(ctx.realm, &merged).await?;
                counters.updated += 1;
            } else {
                counters.unchanged += 1;
            }
        }
    }

    Ok(counters)
}
