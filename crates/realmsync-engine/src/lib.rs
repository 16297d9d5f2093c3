//! Declarative reconciliation engine for identity-server realm
//! configuration.
//!
//! The engine takes fully-resolved [`DesiredRealm`](realmsync_types::DesiredRealm)
//! values and converges the remote server on them through an
//! [`AdminGateway`](realmsync_gateway::AdminGateway): create what is absent,
//! patch what drifted, skip what matches, and delete what the declaration
//! dropped, per resource type and configurable deletion policy.

pub mod checksum;
pub mod composite;
pub mod config;
pub mod error;
pub mod flows;
pub mod import;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod state;

pub use checksum::{ChecksumService, CHECKSUM_ATTRIBUTE};
pub use config::{
    ChecksumChangedPolicy, ChecksumConfig, ImportConfig, ManagedConfig, ManagedPolicy,
    StateConfig,
};
pub use error::{ImportError, ImportResult};
pub use normalize::Canonicalizer;
pub use orchestrator::RealmImporter;
pub use report::{ImportCounters, RealmOutcome, RealmStatus, RunSummary};
pub use state::{RemoteStateStore, StateTracker, STATE_ATTRIBUTE};
