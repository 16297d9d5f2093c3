//! Group import: hierarchical, matched by name within each parent.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use realmsync_types::GroupRepresentation;

use crate::error::{ImportError, ImportResult};
use crate::import::{ensure_unique, ImportContext};
use crate::report::ImportCounters;
use crate::state::type_key;

/// `path` and the sub-group tree are server-derived; children are
/// reconciled per level.
const IGNORED: &[&str] = &["id", "path", "subGroups"];

pub(crate) fn validate(desired: &[GroupRepresentation]) -> ImportResult<()> {
    validate_level(&[], desired)
}

/// Names must be unique among siblings; the same name may recur at
/// different depths.
fn validate_level(segments: &[String], desired: &[GroupRepresentation]) -> ImportResult<()> {
    let level_name = if segments.is_empty() {
        "top-level group".to_string()
    } else {
        format!("group under '/{}'", segments.join("/"))
    };
    ensure_unique(&level_name, desired.iter().map(GroupRepresentation::name))?;

    for group in desired {
        let mut child_segments = segments.to_vec();
        child_segments.push(group.name().to_string());
        validate_level(&child_segments, &group.sub_groups)?;
    }
    Ok(())
}

pub async fn import(
    ctx: &ImportContext<'_>,
    desired: &[GroupRepresentation],
) -> ImportResult<ImportCounters> {
    ctx.tracker
        .record(&type_key("group"), desired.iter().map(GroupRepresentation::name));

    let remote = ctx.gateway.list_groups(ctx.realm).await?;
    let mut counters = ImportCounters::default();
    reconcile_level(ctx, &[], None, desired, &remote, &mut counters).await?;
    Ok(counters)
}

/// Reconcile one level of the tree. `segments` is the name path of the
/// parent, `parent_id` its server id (`None` at the root).
fn reconcile_level<'b>(
    ctx: &'b ImportContext<'_>,
    segments: &'b [String],
    parent_id: Option<&'b str>,
    desired: &'b [GroupRepresentation],
    remote_level: &'b [GroupRepresentation],
    counters: &'b mut ImportCounters,
) -> Pin<Box<dyn Future<Output = ImportResult<()>> + Send + 'b>> {
    Box::pin(async move {
        let remote_by_name: BTreeMap<&str, &GroupRepresentation> =
            remote_level.iter().map(|g| (g.name(), g)).collect();

        for group in desired {
            let mut child_segments = segments.to_vec();
            child_segments.push(group.name().to_string());

            match remote_by_name.get(group.name()) {
                None => {
                    debug!(
                        realm = %ctx.realm,
                        group = %child_segments.join("/"),
                        "creating group"
                    );
                    ctx.gateway
                        .create_group(ctx.realm, parent_id, &wire_form(group))
                        .await?;
                    counters.created += 1;

                    if !group.sub_groups.is_empty() {
                        // The new group's id is only known after a re-list.
                        let tree = ctx.gateway.list_groups(ctx.realm).await?;
                        let created = find_by_path(&tree, &child_segments).ok_or_else(|| {
                            ImportError::processing(format!(
                                "created group '/{}' not found on re-list",
                                child_segments.join("/")
                            ))
                        })?;
                        let created_id = created.id.clone().ok_or_else(|| {
                            ImportError::processing(format!(
                                "group '/{}' has no server id",
                                child_segments.join("/")
                            ))
                        })?;
                        reconcile_level(
                            ctx,
                            &child_segments,
                            Some(&created_id),
                            &group.sub_groups,
                            &[],
                            counters,
                        )
                        .await?;
                    }
                }
                Some(existing) => {
                    let id = existing.id.clone().ok_or_else(|| {
                        ImportError::processing(format!(
                            "group '/{}' has no server id",
                            child_segments.join("/")
                        ))
                    })?;

                    if ctx.canon.resource_needs_update(*existing, group, IGNORED)? {
                        debug!(
                            realm = %ctx.realm,
                            group = %child_segments.join("/"),
                            "updating group"
                        );
                        let merged = ctx.canon.patch_resource(*existing, group, IGNORED)?;
                        ctx.gateway.update_group(ctx.realm, &id, &merged).await?;
                        counters.updated += 1;
                    } else {
                        counters.unchanged += 1;
                    }

                    reconcile_level(
                        ctx,
                        &child_segments,
                        Some(&id),
                        &group.sub_groups,
                        &existing.sub_groups,
                        counters,
                    )
                    .await?;
                }
            }
        }

        if ctx.managed.group.deletes_undeclared() {
            let declared: BTreeMap<&str, ()> =
                desired.iter().map(|g| (g.name(), ())).collect();
            for group in remote_level {
                if declared.contains_key(group.name()) {
                    continue;
                }
                let Some(id) = group.id.as_deref() else {
                    continue;
                };
                debug!(realm = %ctx.realm, group = %group.name(), "deleting undeclared group");
                match ctx.gateway.delete_group(ctx.realm, id).await {
                    Ok(()) => counters.deleted += 1,
                    Err(error) => warn!(
                        realm = %ctx.realm,
                        group = %group.name(),
                        %error,
                        "failed to delete group, leaving it in place"
                    ),
                }
            }
        }

        Ok(())
    })
}

/// Walk the fetched tree down a name path.
fn find_by_path<'g>(
    tree: &'g [GroupRepresentation],
    segments: &[String],
) -> Option<&'g GroupRepresentation> {
    let (head, rest) = segments.split_first()?;
    let node = tree.iter().find(|g| g.name() == head)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_by_path(&node.sub_groups, rest)
    }
}

/// Scalar part sent to the server; children go through their own calls.
fn wire_form(group: &GroupRepresentation) -> GroupRepresentation {
    let mut wire = group.clone();
    wire.id = None;
    wire.path = None;
    wire.sub_groups = Vec::new();
    wire
}
