//! Organization import: the organization itself, its membership, and its
//! linked identity providers.
//!
//! Servers without the organizations feature answer these endpoints with
//! not-found/bad-request; the gateway maps that to `FeatureUnavailable` and
//! the whole step soft-skips.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use realmsync_types::{DesiredOrganization, OrganizationRepresentation};

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

const IGNORED: &[&str] = &["id"];

pub(crate) fn validate(desired: &[DesiredOrganization]) -> ImportResult<()> {
    ensure_unique("organization", desired.iter().map(DesiredOrganization::name))
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[DesiredOrganization],
) -> ImportResult<ImportCounters> {
    let remote = match ctx.gateway.list_organizations(ctx.realm).await {
        Ok(remote) => remote,
        Err(error) if error.is_feature_unavailable() => {
            if desired.is_empty() {
                return Ok(ImportCounters::default());
            }
            info!(
                realm = %ctx.realm,
                "server lacks the organizations feature, skipping declared organizations"
            );
            return Ok(ImportCounters::default());
        }
        Err(error) => return Err(error.into()),
    };

    ctx.tracker
        .record(&type_key("organization"), desired.iter().map(DesiredOrganization::name));

    let mut counters = ImportCounters::default();
    let remote_by_name: BTreeMap<&str, &OrganizationRepresentation> =
        remote.iter().map(|o| (o.name(), o)).collect();

    for org in desired {
        let id = match remote_by_name.get(org.name()) {
            None => {
                debug!(realm = %ctx.realm, organization = %org.name(), "creating organization");
                ctx.gateway
                    .create_organization(ctx.realm, &org.organization)
                    .await?;
                counters.created += 1;

                let refreshed = ctx.gateway.list_organizations(ctx.realm).await?;
                refreshed
                    .into_iter()
                    .find(|o| o.name() == org.name())
                    .and_then(|o| o.id)
                    .ok_or_else(|| {
                        ImportError::processing(format!(
                            "created organization '{}' not found on re-list",
                            org.name()
                        ))
                    })?
            }
            Some(existing) => {
                let id = existing.id.clone().ok_or_else(|| {
                    ImportError::processing(format!(
                        "organization '{}' has no server id",
                        org.name()
                    ))
                })?;
                if ctx
                    .canon
                    .resource_needs_update(*existing, &org.organization, IGNORED)?
                {
                    debug!(realm = %ctx.realm, organization = %org.name(), "updating organization");
                    let merged = ctx
                        .canon
                        .patch_resource(*existing, &org.organization, IGNORED)?;
                    ctx.gateway.update_organization(ctx.realm, &id, &merged).await?;
                    counters.updated += 1;
                } else {
                    counters.unchanged += 1;
                }
                id
            }
        };

        counters.merge(reconcile_members(ctx, org, &id).await?);
        counters.merge(reconcile_identity_providers(ctx, org, &id).await?);
    }

    if ctx.managed.organization.deletes_undeclared() {
        let declared: BTreeMap<&str, ()> = desired.iter().map(|o| (o.name(), ())).collect();
        for org in &remote {
            if declared.contains_key(org.name()) {
                continue;
            }
            let Some(id) = org.id.as_deref() else {
                continue;
            };
            debug!(realm = %ctx.realm, organization = %org.name(), "deleting undeclared organization");
            match ctx.gateway.delete_organization(ctx.realm, id).await {
                Ok(()) => counters.deleted += 1,
                Err(error) => warn!(
                    realm = %ctx.realm,
                    organization = %org.name(),
                    %error,
                    "failed to delete organization, leaving it in place"
                ),
            }
        }
    }

    Ok(counters)
}

/// Membership is declared as usernames; the gateway addresses members by
/// user id.
async fn reconcile_members(
    ctx: &ImportContext<'_>,
    org: &DesiredOrganization,
    org_id: &str,
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let members = ctx.gateway.list_organization_members(ctx.realm, org_id).await?;
    let member_usernames: BTreeSet<&str> = members.iter().map(|m| m.username()).collect();
    let declared: BTreeSet<&str> = org.members.iter().map(String::as_str).collect();

    for username in &declared {
        if member_usernames.contains(username) {
            continue;
        }
        let user = ctx
            .gateway
            .get_user_by_username(ctx.realm, username)
            .await?
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "organization '{}' declares unknown member '{username}'",
                    org.name()
                ))
            })?;
        let user_id = user.id.ok_or_else(|| {
            ImportError::processing(format!("user '{username}' has no server id"))
        })?;
        debug!(
            realm = %ctx.realm,
            organization = %org.name(),
            username = %username,
            "adding organization member"
        );
        ctx.gateway
            .add_organization_member(ctx.realm, org_id, &user_id)
            .await?;
        counters.created += 1;
    }

    for member in &members {
        if declared.contains(member.username()) {
            continue;
        }
        let Some(user_id) = member.id.as_deref() else {
            continue;
        };
        debug!(
            realm = %ctx.realm,
            organization = %org.name(),
            username = %member.username(),
            "removing undeclared organization member"
        );
        match ctx
            .gateway
            .remove_organization_member(ctx.realm, org_id, user_id)
            .await
        {
            Ok(()) => counters.deleted += 1,
            Err(error) => warn!(
                realm = %ctx.realm,
                organization = %org.name(),
                username = %member.username(),
                %error,
                "failed to remove organization member, leaving them in place"
            ),
        }
    }

    Ok(counters)
}

async fn reconcile_identity_providers(
    ctx: &ImportContext<'_>,
    org: &DesiredOrganization,
    org_id: &str,
) -> ImportResult<ImportCounters> {
    let mut counters = ImportCounters::default();

    let linked = ctx
        .gateway
        .list_organization_identity_providers(ctx.realm, org_id)
        .await?;
    let linked_aliases: BTreeSet<&str> = linked.iter().map(|p| p.alias()).collect();
    let declared: BTreeSet<&str> = org.identity_providers.iter().map(String::as_str).collect();

    for alias in &declared {
        if linked_aliases.contains(alias) {
            continue;
        }
        debug!(
            realm = %ctx.realm,
            organization = %org.name(),
            alias = %alias,
            "linking identity provider to organization"
        );
        ctx.gateway
            .add_organization_identity_provider(ctx.realm, org_id, alias)
            .await?;
        counters.created += 1;
    }

    for provider in &linked {
        if declared.contains(provider.alias()) {
            continue;
        }
        debug!(
            realm = %ctx.realm,
            organization = %org.name(),
            alias = %provider.alias(),
            "unlinking identity provider from organization"
        );
        match ctx
            .gateway
            .remove_organization_identity_provider(ctx.realm, org_id, provider.alias())
            .await
        {
            Ok(()) => counters.deleted += 1,
            Err(error) => warn!(
                realm = %ctx.realm,
                organization = %org.name(),
                alias = %provider.alias(),
                %error,
                "failed to unlink identity provider, leaving it in place"
            ),
        }
    }

    Ok(counters)
}
