//! Identity-provider import, with mappers reconciled under each provider
//! alias.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use realmsync_types::{IdentityProviderMapperRepresentation, IdentityProviderRepresentation};

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

const IGNORED: &[&str] = &["internalId"];

const MAPPER_IGNORED: &[&str] = &["id"];

pub(crate) fn validate(
    desired: &[IdentityProviderRepresentation],
    desired_mappers: &[IdentityProviderMapperRepresentation],
) -> ImportResult<()> {
    ensure_unique(
        "identity provider",
        desired.iter().map(IdentityProviderRepresentation::alias),
    )?;

    let declared: BTreeSet<&str> = desired
        .iter()
        .map(IdentityProviderRepresentation::alias)
        .collect();
    let mut names_by_alias: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for mapper in desired_mappers {
        let alias = mapper.identity_provider_alias.as_deref().ok_or_else(|| {
            ImportError::validation(format!(
                "identity provider mapper '{}' names no provider alias",
                mapper.name()
            ))
        })?;
        if !declared.contains(alias) {
            return Err(ImportError::validation(format!(
                "identity provider mapper references undeclared provider '{alias}'"
            )));
        }
        names_by_alias.entry(alias).or_default().push(mapper.name());
    }
    for (alias, names) in names_by_alias {
        ensure_unique(&format!("mapper of identity provider '{alias}'"), names)?;
    }
    Ok(())
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[IdentityProviderRepresentation],
    desired_mappers: &[IdentityProviderMapperRepresentation],
) -> ImportResult<ImportCounters> {
    ctx.tracker.record(
        &type_key("identity-provider"),
        desired.iter().map(IdentityProviderRepresentation::alias),
    );

    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_identity_providers(ctx.realm).await?;
    let remote_by_alias: BTreeMap<&str, &IdentityProviderRepresentation> =
        remote.iter().map(|p| (p.alias(), p)).collect();

    for provider in desired {
        match remote_by_alias.get(provider.alias()) {
            None => {
                debug!(realm = %ctx.realm, alias = %provider.alias(), "creating identity provider");
                ctx.gateway.create_identity_provider(ctx.realm, provider).await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx.canon.resource_needs_update(*existing, provider, IGNORED)? {
                    debug!(realm = %ctx.realm, alias = %provider.alias(), "updating identity provider");
                    let merged = ctx.canon.patch_resource(*existing, provider, IGNORED)?;
                    ctx.gateway
                        .update_identity_provider(ctx.realm, provider.alias(), &merged)
                        .await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.identity_provider.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|p| (p.alias(), ())).collect();
        for provider in &remote {
            if declared.contains_key(provider.alias()) {
                continue;
            }
            debug!(realm = %ctx.realm, alias = %provider.alias(), "deleting undeclared identity provider");
            match ctx
                .gateway
                .delete_identity_provider(ctx.realm, provider.alias())
                .await
            {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    alias = %provider.alias(),
                    %error,
                    "failed to delete identity provider, leaving it in place"
                ),
            }
        }
    }

    counters.merge(reconcile_mappers(ctx, desired, desired_mappers).await?);
    Ok(counters)
}

/// Mappers are declared flat, each naming its provider alias; they are
/// grouped and reconciled per provider.
async fn reconcile_mappers(
    ctx: &ImportContext<'_>,
    providers: &[IdentityProviderRepresentation],
    desired: &[IdentityProviderMapperRepresentation],
) -> ImportResult<ImportCounters> {
    let mut by_alias: BTreeMap<&str, Vec<&IdentityProviderMapperRepresentation>> = BTreeMap::new();
    for mapper in desired {
        let alias = mapper.identity_provider_alias.as_deref().ok_or_else(|| {
            ImportError::validation(format!(
                "identity provider mapper '{}' names no provider alias",
                mapper.name()
            ))
        })?;
        by_alias.entry(alias).or_default().push(mapper);
    }

    let mut counters = ImportCounters::default();

    // Purge walks every declared provider, including those with no declared
    // mappers left. Mappers naming an undeclared provider were rejected
    // before the pass started.
    for provider in providers {
        let declared = by_alias.remove(provider.alias()).unwrap_or_default();
        counters.merge(reconcile_provider_mappers(ctx, provider.alias(), &declared).await?);
    }

    Ok(counters)
}

async fn reconcile_provider_mappers(
    ctx: &ImportContext<'_>,
    alias: &str,
    desired: &[&IdentityProviderMapperRepresentation],
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let remote = ctx.gateway.list_identity_provider_mappers(ctx.realm, alias).await?;
    let remote_by_name: BTreeMap<&str, &IdentityProviderMapperRepresentation> =
        remote.iter().map(|m| (m.name(), m)).collect();

    for mapper in desired {
        match remote_by_name.get(mapper.name()) {
            None => {
                debug!(
                    realm = %ctx.realm,
                    provider = %alias,
                    mapper = %mapper.name(),
                    "creating identity provider mapper"
                );
                ctx.gateway
                    .create_identity_provider_mapper(ctx.realm, alias, mapper)
                    .await?;
                counters.created += 1;
            }
            Some(existing) => {
                if ctx
                    .canon
                    .resource_needs_update(*existing, *mapper, MAPPER_IGNORED)?
                {
                    let id = existing.id.as_deref().ok_or_else(|| {
                        ImportError::processing(format!(
                            "identity provider mapper '{}' has no server id",
                            mapper.name()
                        ))
                    })?;
                    debug!(
                        realm = %ctx.realm,
                        provider = %alias,
                        mapper = %mapper.name(),
                        "updating identity provider mapper"
                    );
                    let merged = ctx.canon.patch_resource(*existing, *mapper, MAPPER_IGNORED)?;
                    ctx.gateway
                        .update_identity_provider_mapper(ctx.realm, alias, id, &merged)
                        .await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
            }
        }
    }

    if ctx.managed.identity_provider_mapper.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|m| (m.name(), ())).collect();
        for mapper in &remote {
            if declared.contains_key(mapper.name()) {
                continue;
            }
            let Some(id) = mapper.id.as_deref() else {
                continue;
            };
            debug!(
                realm = %ctx.realm,
                provider = %alias,
                mapper = %mapper.name(),
                "deleting undeclared identity provider mapper"
            );
            match ctx
                .gateway
                .delete_identity_provider_mapper(ctx.realm, alias, id)
                .await
            {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    provider = %alias,
                    mapper = %mapper.name(),
                    %error,
                    "failed to delete identity provider mapper, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}
