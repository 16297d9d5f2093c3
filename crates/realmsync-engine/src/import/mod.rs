//! Per-resource import services.
//!
//! One module per resource type, all following the same lifecycle: list the
//! remote set in the parent scope, match by natural key (never by server
//! id), create what is absent, patch-compare what is present and write only
//! on difference, recurse into children, then purge undeclared leftovers
//! when the type's [`ManagedPolicy`](crate::config::ManagedPolicy) is
//! `Full`. Purge deletes soft-fail per item: a resource that refuses to die
//! is logged and left in place, it never aborts the realm.

use std::collections::BTreeSet;
use std::sync::Arc;

use realmsync_gateway::AdminGateway;
use realmsync_types::DesiredRealm;

use crate::config::ManagedConfig;
use crate::error::{ImportError, ImportResult};
use crate::normalize::Canonicalizer;
use crate::state::StateTracker;

pub mod auth_flows;
pub mod client_scopes;
pub mod clients;
pub mod components;
pub mod groups;
pub mod identity_providers;
pub mod organizations;
pub mod realm;
pub mod required_actions;
pub mod roles;
pub mod scope_mappings;
pub mod users;

/// Shared context for one realm's import pass.
pub struct ImportContext<'a> {
    pub gateway: &'a Arc<dyn AdminGateway>,
    /// Realm name (natural key, not server id).
    pub realm: &'a str,
    pub managed: &'a ManagedConfig,
    pub canon: &'a Canonicalizer,
    /// Names declared by this run, persisted at the end of the pass.
    pub tracker: &'a StateTracker,
    /// Names declared by the previous run, consulted during purges.
    pub previous: &'a StateTracker,
}

/// Validate one realm's declaration before any remote call. Duplicate
/// natural keys and structurally malformed entries fail the realm here,
/// while nothing has been mutated yet.
pub(crate) fn validate(desired: &DesiredRealm) -> ImportResult<()> {
    roles::validate(&desired.roles)?;
    clients::validate(&desired.clients)?;
    client_scopes::validate(&desired.client_scopes)?;
    scope_mappings::validate(&desired.scope_mappings)?;
    groups::validate(&desired.groups)?;
    components::validate(&desired.components)?;
    identity_providers::validate(
        &desired.identity_providers,
        &desired.identity_provider_mappers,
    )?;
    auth_flows::validate(&desired.authentication_flows, &desired.flow_copies)?;
    required_actions::validate(&desired.required_actions)?;
    users::validate(&desired.users)?;
    organizations::validate(&desired.organizations)?;
    Ok(())
}

/// Duplicate natural keys in the declared set are a validation error.
pub(crate) fn ensure_unique<'x, I>(what: &str, names: I) -> ImportResult<()>
where
    I: IntoIterator<Item = &'x str>,
{
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ImportError::validation(format!(
                "duplicate {what} '{name}' in declared configuration"
            )));
        }
    }
    Ok(())
}
