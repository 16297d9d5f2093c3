//! Import configuration.

use serde::{Deserialize, Serialize};

/// Deletion behavior when reconciling a resource type's remote set against
/// the declared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedPolicy {
    /// Delete remote resources absent from the declared configuration.
    Full,
    /// Leave undeclared remote resources alone.
    NoDelete,
}

impl ManagedPolicy {
    /// Whether undeclared remote resources get purged.
    #[must_use]
    pub fn deletes_undeclared(&self) -> bool {
        matches!(self, ManagedPolicy::Full)
    }

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedPolicy::Full => "full",
            ManagedPolicy::NoDelete => "no_delete",
        }
    }
}

impl std::fmt::Display for ManagedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ManagedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ManagedPolicy::Full),
            "no_delete" | "no-delete" => Ok(ManagedPolicy::NoDelete),
            _ => Err(format!("Unknown managed policy: {s}")),
        }
    }
}

/// What to do when the stored checksum differs from the computed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumChangedPolicy {
    /// Reconcile and store the new checksum (default).
    Continue,
    /// Log and skip the realm.
    Skip,
    /// Fail the whole process.
    Fail,
}

impl std::fmt::Display for ChecksumChangedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChecksumChangedPolicy::Continue => "continue",
            ChecksumChangedPolicy::Skip => "skip",
            ChecksumChangedPolicy::Fail => "fail",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ChecksumChangedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(ChecksumChangedPolicy::Continue),
            "skip" => Ok(ChecksumChangedPolicy::Skip),
            "fail" => Ok(ChecksumChangedPolicy::Fail),
            _ => Err(format!("Unknown checksum policy: {s}")),
        }
    }
}

/// Per-resource-type managed deletion policies.
///
/// Users default to `NoDelete`; everything else defaults to `Full`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedConfig {
    #[serde(default = "default_full")]
    pub role: ManagedPolicy,
    #[serde(default = "default_full")]
    pub client: ManagedPolicy,
    #[serde(default = "default_full")]
    pub client_scope: ManagedPolicy,
    #[serde(default = "default_full")]
    pub scope_mapping: ManagedPolicy,
    #[serde(default = "default_full")]
    pub group: ManagedPolicy,
    #[serde(default = "default_full")]
    pub component: ManagedPolicy,
    #[serde(default = "default_full")]
    pub identity_provider: ManagedPolicy,
    #[serde(default = "default_full")]
    pub identity_provider_mapper: ManagedPolicy,
    #[serde(default = "default_full")]
    pub required_action: ManagedPolicy,
    #[serde(default = "default_no_delete")]
    pub user: ManagedPolicy,
    #[serde(default = "default_full")]
    pub organization: ManagedPolicy,
}

fn default_full() -> ManagedPolicy {
    ManagedPolicy::Full
}

fn default_no_delete() -> ManagedPolicy {
    ManagedPolicy::NoDelete
}

impl Default for ManagedConfig {
    fn default() -> Self {
        Self {
            role: ManagedPolicy::Full,
            client: ManagedPolicy::Full,
            client_scope: ManagedPolicy::Full,
            scope_mapping: ManagedPolicy::Full,
            group: ManagedPolicy::Full,
            component: ManagedPolicy::Full,
            identity_provider: ManagedPolicy::Full,
            identity_provider_mapper: ManagedPolicy::Full,
            required_action: ManagedPolicy::Full,
            user: ManagedPolicy::NoDelete,
            organization: ManagedPolicy::Full,
        }
    }
}

/// Checksum-gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Whether the whole-realm skip optimization is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Reconcile even when the stored checksum matches.
    #[serde(default)]
    pub force: bool,
    /// Behavior when the stored checksum differs from the computed one.
    #[serde(default = "default_changed_policy")]
    pub changed_policy: ChecksumChangedPolicy,
}

fn default_true() -> bool {
    true
}

fn default_changed_policy() -> ChecksumChangedPolicy {
    ChecksumChangedPolicy::Continue
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force: false,
            changed_policy: ChecksumChangedPolicy::Continue,
        }
    }
}

/// Cross-run state persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Persist declared identifiers onto the realm's custom attributes.
    #[serde(default)]
    pub enabled: bool,
    /// Hex-encoded 256-bit key; when set, persisted state is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
}

/// Configuration for one import run. Cloned per pass; immutable while a
/// pass is executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum realms reconciled concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    #[serde(default)]
    pub managed: ManagedConfig,

    #[serde(default)]
    pub checksum: ChecksumConfig,

    #[serde(default)]
    pub state: StateConfig,
}

fn default_parallelism() -> usize {
    1
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            managed: ManagedConfig::default(),
            checksum: ChecksumConfig::default(),
            state: StateConfig::default(),
        }
    }
}
