//! Client import, with protocol mappers reconciled as children.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use realmsync_types::{ClientRepresentation, ProtocolMapperRepresentation};

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

/// Protocol mappers are reconciled per child, not patched through the
/// parent.
const IGNORED: &[&str] = &["id", "protocolMappers"];

const MAPPER_IGNORED: &[&str] = &["id"];

pub(crate) fn validate(desired: &[ClientRepresentation]) -> ImportResult<()> {
    ensure_unique("client", desired.iter().map(ClientRepresentation::client_id))?;
    for client in desired {
        ensure_unique(
            &format!("protocol mapper of client '{}'", client.client_id()),
            client
                .protocol_mappers
                .iter()
                .map(ProtocolMapperRepresentation::name),
        )?;
    }
    Ok(())
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[ClientRepresentation],
) -> ImportResult<ImportCounters> {
    ctx.tracker
        .record(&type_key("client"), desired.iter().map(ClientRepresentation::client_id));

    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_clients(ctx.realm).await?;
    let remote_by_client_id: BTreeMap<&str, &ClientRepresentation> =
        remote.iter().map(|c| (c.client_id(), c)).collect();

    for client in desired {
        match remote_by_client_id.get(client.client_id()) {
            None => {
                debug!(realm = %ctx.realm, client = %client.client_id(), "creating client");
                // The create payload carries the declared mappers inline.
                ctx.gateway.create_client(ctx.realm, client).await?;
                counters.created += 1;
            }
            Some(existing) => {
                let id = existing.id.as_deref().ok_or_else(|| {
                    ImportError::processing(format!(
                        "client '{}' has no server id",
                        client.client_id()
                    ))
                })?;

                if ctx.canon.resource_needs_update(*existing, client, IGNORED)? {
                    debug!(realm = %ctx.realm, client = %client.client_id(), "updating client");
                    let merged = ctx.canon.patch_resource(*existing, client, IGNORED)?;
                    ctx.gateway.update_client(ctx.realm, id, &merged).await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }

                counters.merge(
                    reconcile_mappers(ctx, client.client_id(), id, &client.protocol_mappers)
                        .await?,
                );
            }
        }
    }

    if ctx.managed.client.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|c| (c.client_id(), ())).collect();
        for client in &remote {
            if declared.contains_key(client.client_id()) {
                continue;
            }
            let Some(id) = client.id.as_deref() else {
                continue;
            };
            debug!(realm = %ctx.realm, client = %client.client_id(), "deleting undeclared client");
            match ctx.gateway.delete_client(ctx.realm, id).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    client = %client.client_id(),
                    %error,
                    "failed to delete client, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}

/// Protocol mappers under one client, matched by mapper name.
async fn reconcile_mappers(
    ctx: &ImportContext<'_>,
    client_id: &str,
    client_uuid: &str,
    desired: &[ProtocolMapperRepresentation],
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_protocol_mappers(ctx.realm, client_uuid).await?;
    let remote_by_name: BTreeMap<&str, &ProtocolMapperRepresentation> =
        remote.iter().map(|m| (m.name(), m)).collect();

    for mapper in desired {
        match remote_by_name.get(mapper.name()) {
            None => {
                debug!(
                    realm = %ctx.realm,
                    client = %client_id,
                    mapper = %mapper.name(),
                    "creating protocol mapper"
                );
                ctx.gateway
                    .create_protocol_mapper(ctx.realm, client_uuid, mapper)
                    .await?;
                counters.created += 1;
            }
            Some(existing) => {
                let mapper_id = existing.id.as_deref().ok_or_else(|| {
                    ImportError::processing(format!(
                        "protocol mapper '{}' of client '{client_id}' has no server id",
                        mapper.name()
                    ))
                })?;
                if ctx
                    .canon
                    .resource_needs_update(*existing, mapper, MAPPER_IGNORED)?
                {
                    debug!(
                        realm = %ctx.realm,
                        client = %client_id,
                        mapper = %mapper.name(),
                        "updating protocol mapper"
                    );
                    let merged = ctx.canon.patch_resource(*existing, mapper, MAPPER_IGNORED)?;
                    ctx.gateway
                        .update_protocol_mapper(ctx.realm, client_uuid, mapper_id, &merged)
                        .await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    let declared: BTreeMap<&str, ()> = desired.iter().map(|m| (m.name(), ())).collect();
    for mapper in &remote {
        if declared.contains_key(mapper.name()) {
            continue;
        }
        let Some(mapper_id) = mapper.id.as_deref() else {
            continue;
        };
        debug!(
            realm = %ctx.realm,
            client = %client_id,
            mapper = %mapper.name(),
            "deleting undeclared protocol mapper"
        );
        match ctx
            .gateway
            .delete_protocol_mapper(ctx.realm, client_uuid, mapper_id)
            .await
        {
            Ok(()) => counters.deleted += 1,
            Err(error) => warn!(
                realm = %ctx.realm,
                client = %client_id,
                mapper = %mapper.name(),
                %error,
                "failed to delete protocol mapper, leaving it in place"
            ),
        }
    }

    Ok(counters)
}
