//! Authentication flow import: additive creation of declared flows, then
//! copy-with-override derivation. Flows are never deleted.

use tracing::{debug, info};

use realmsync_types::{AuthenticationFlowRepresentation, FlowCopy};

use crate::error::ImportResult;
use crate::flows::FlowImporter;
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;

pub(crate) fn validate(
    desired: &[AuthenticationFlowRepresentation],
    copies: &[FlowCopy],
) -> ImportResult<()> {
    ensure_unique(
        "authentication flow",
        desired.iter().map(AuthenticationFlowRepresentation::alias),
    )?;
    ensure_unique("flow copy", copies.iter().map(|c| c.alias.as_str()))
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[AuthenticationFlowRepresentation],
    copies: &[FlowCopy],
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    for flow in desired {
        if ctx
            .gateway
            .get_flow_by_alias(ctx.realm, flow.alias())
            .await?
            .is_some()
        {
            info!(realm = %ctx.realm, alias = %flow.alias(), "flow already exists, skipping");
            counters.unchanged += 1;
            continue;
        }
        debug!(realm = %ctx.realm, alias = %flow.alias(), "creating flow");
        ctx.gateway.create_flow(ctx.realm, flow).await?;
        counters.created += 1;
    }

    let importer = FlowImporter::new(ctx.gateway, ctx.realm);
    counters.merge(importer.import_copies(copies).await?);

    Ok(counters)
}
