//! Run orchestration: per-realm step sequencing and bounded cross-realm
//! parallelism.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use realmsync_gateway::AdminGateway;
use realmsync_types::DesiredRealm;

use crate::checksum::{ChecksumService, CHECKSUM_ATTRIBUTE};
use crate::config::{ChecksumChangedPolicy, ImportConfig};
use crate::error::{ImportError, ImportResult};
use crate::import::{self, ensure_unique, ImportContext};
use crate::normalize::Canonicalizer;
use crate::report::{ImportCounters, RealmOutcome, RealmStatus, RunSummary};
use crate::state::{RemoteStateStore, StateTracker};

/// Reconciles declared realms against the remote server.
pub struct RealmImporter {
    gateway: Arc<dyn AdminGateway>,
    config: ImportConfig,
}

impl RealmImporter {
    pub fn new(gateway: Arc<dyn AdminGateway>, config: ImportConfig) -> ImportResult<Self> {
        if config.parallelism == 0 {
            return Err(ImportError::validation("parallelism must be at least 1"));
        }
        // Surface a malformed encryption key before any realm work starts.
        RemoteStateStore::new(&config.state)?;
        Ok(Self { gateway, config })
    }

    /// Reconcile every declared realm. Realms run under a bounded worker
    /// pool; one realm's failure never stops the others. The summary keeps
    /// the declared order.
    pub async fn run(&self, desired: Vec<DesiredRealm>) -> ImportResult<RunSummary> {
        ensure_unique("realm", desired.iter().map(DesiredRealm::name))?;
        for realm in &desired {
            if realm.name().is_empty() {
                return Err(ImportError::validation("declared realm has no name"));
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let mut tasks = JoinSet::new();

        for (position, realm) in desired.into_iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let config = self.config.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Holder tasks outlive the semaphore, so acquire cannot fail.
                let _permit = semaphore.acquire_owned().await;
                let name = realm.name().to_string();
                let outcome = match import_realm(&gateway, &config, &realm).await {
                    Ok((status, counters)) => RealmOutcome {
                        realm: name,
                        status,
                        counters,
                    },
                    Err(err) => {
                        error!(realm = %name, error = %err, "realm import failed");
                        RealmOutcome {
                            realm: name,
                            status: RealmStatus::Failed {
                                error: err.to_string(),
                            },
                            counters: ImportCounters::default(),
                        }
                    }
                };
                (position, outcome)
            });
        }

        let mut outcomes: Vec<Option<RealmOutcome>> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (position, outcome) = joined
                .map_err(|e| ImportError::processing(format!("realm worker panicked: {e}")))?;
            if outcomes.len() <= position {
                outcomes.resize_with(position + 1, || None);
            }
            outcomes[position] = Some(outcome);
        }

        Ok(RunSummary {
            realms: outcomes.into_iter().flatten().collect(),
        })
    }
}

/// One realm's pass: checksum gate, then the fixed step sequence, then
/// state and checksum persistence.
#[instrument(skip_all, fields(realm = %desired.name()))]
async fn import_realm(
    gateway: &Arc<dyn AdminGateway>,
    config: &ImportConfig,
    desired: &DesiredRealm,
) -> ImportResult<(RealmStatus, ImportCounters)> {
    let name = desired.name();

    // All natural-key and structural validation happens up front, so a
    // malformed declaration fails the realm before anything is written.
    import::validate(desired)?;

    let checksums = ChecksumService::new();
    let digest = checksums.realm_digest(desired)?;

    if config.checksum.enabled {
        let stored = gateway.get_realm_attribute(name, CHECKSUM_ATTRIBUTE).await?;
        match stored.as_deref() {
            Some(stored) if stored == digest => {
                if !config.checksum.force {
                    info!(realm = %name, "configuration unchanged, skipping realm");
                    return Ok((RealmStatus::Skipped, ImportCounters::default()));
                }
                info!(realm = %name, "configuration unchanged but force is set, reconciling");
            }
            Some(_) => match config.checksum.changed_policy {
                ChecksumChangedPolicy::Continue => {}
                ChecksumChangedPolicy::Skip => {
                    warn!(realm = %name, "configuration changed and policy is skip");
                    return Ok((RealmStatus::Skipped, ImportCounters::default()));
                }
                ChecksumChangedPolicy::Fail => {
                    return Err(ImportError::ChecksumChanged {
                        realm: name.to_string(),
                    });
                }
            },
            None => {}
        }
    }

    let store = RemoteStateStore::new(&config.state)?;
    let previous = store.load(gateway, name).await?;
    let tracker = StateTracker::new();
    let canon = Canonicalizer::new();

    let ctx = ImportContext {
        gateway,
        realm: name,
        managed: &config.managed,
        canon: &canon,
        tracker: &tracker,
        previous: &previous,
    };

    let mut counters = import::realm::import(&ctx, &desired.realm).await?;
    counters.merge(import::client_scopes::import(&ctx, &desired.client_scopes).await?);
    counters.merge(import::clients::import(&ctx, &desired.clients).await?);
    counters.merge(import::roles::import(&ctx, &desired.roles).await?);
    counters.merge(import::roles::resolve_composites(&ctx, &desired.roles).await?);
    counters.merge(import::groups::import(&ctx, &desired.groups).await?);
    counters.merge(import::components::import(&ctx, &desired.components).await?);
    counters.merge(
        import::identity_providers::import(
            &ctx,
            &desired.identity_providers,
            &desired.identity_provider_mappers,
        )
        .await?,
    );
    counters.merge(
        import::auth_flows::import(&ctx, &desired.authentication_flows, &desired.flow_copies)
            .await?,
    );
    counters.merge(import::required_actions::import(&ctx, &desired.required_actions).await?);
    counters.merge(import::scope_mappings::import(&ctx, &desired.scope_mappings).await?);
    counters.merge(import::users::import(&ctx, &desired.users).await?);
    counters.merge(import::organizations::import(&ctx, &desired.organizations).await?);

    store.save(gateway, name, &tracker).await?;

    if config.checksum.enabled {
        gateway
            .set_realm_attribute(name, CHECKSUM_ATTRIBUTE, &digest)
            .await?;
    }

    info!(
        realm = %name,
        created = counters.created,
        updated = counters.updated,
        unchanged = counters.unchanged,
        deleted = counters.deleted,
        "realm reconciled"
    );
    Ok((RealmStatus::Imported, counters))
}
