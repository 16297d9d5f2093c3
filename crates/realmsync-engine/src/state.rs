//! Cross-run state tracking.
//!
//! A run records the names it declared for each managed resource type; the
//! record is persisted onto the realm as a custom attribute. The next run
//! reads it back to distinguish "previously declared, now dropped" (purge)
//! from "never managed by us" (leave alone) for resource types whose remote
//! listing cannot carry an ownership marker: required actions, components,
//! and sub-components.
//!
//! Without a persisted record those purges degrade to never-delete.

use std::collections::BTreeMap;
use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use dashmap::DashMap;
use tracing::warn;

use realmsync_gateway::AdminGateway;

use crate::config::StateConfig;
use crate::error::{ImportError, ImportResult};

/// Realm attribute holding the persisted state record.
pub const STATE_ATTRIBUTE: &str = "realmsync.state";

/// Length of AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// Length of GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// Length of GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

/// State key for a top-level resource type.
#[must_use]
pub fn type_key(resource: &str) -> String {
    resource.to_string()
}

/// State key for resources nested under a named parent.
///
/// The parent name is embedded verbatim, so a parent whose name contains
/// `-` can collide with another type/parent pair. The format is kept for
/// compatibility with records written by earlier runs.
#[must_use]
pub fn sub_type_key(resource: &str, parent_name: &str) -> String {
    format!("sub-{resource}-{parent_name}")
}

/// In-memory per-realm tracker. Steps append the names they declared;
/// the orchestrator persists the snapshot at the end of the pass.
#[derive(Debug, Default)]
pub struct StateTracker {
    entries: DashMap<String, Vec<String>>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Rebuild a tracker from a persisted record.
    #[must_use]
    pub fn from_record(record: BTreeMap<String, Vec<String>>) -> Self {
        let entries = DashMap::new();
        for (key, names) in record {
            entries.insert(key, names);
        }
        Self { entries }
    }

    /// Append declared names under a key. Appends from concurrent steps
    /// interleave without loss; duplicates are dropped.
    pub fn record<I>(&self, key: &str, names: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        for name in names {
            let name = name.into();
            if !entry.contains(&name) {
                entry.push(name);
            }
        }
    }

    /// Names recorded under a key (empty when the key is absent).
    #[must_use]
    pub fn names(&self, key: &str) -> Vec<String> {
        self.entries
            .get(key)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Stable snapshot for persistence.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// AES-256-GCM over the serialized state record.
#[derive(Clone)]
pub struct StateEncryption {
    key: [u8; KEY_LENGTH],
}

impl StateEncryption {
    /// Build from a hex-encoded 256-bit key.
    pub fn from_hex(hex_key: &str) -> ImportResult<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| ImportError::validation(format!("invalid state encryption key: {e}")))?;
        if bytes.len() != KEY_LENGTH {
            return Err(ImportError::validation(format!(
                "state encryption key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Encrypt and base64-encode. Output layout: base64(nonce || ciphertext),
    /// the authentication tag is appended by AES-GCM.
    pub fn encrypt(&self, plaintext: &[u8]) -> ImportResult<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ImportError::processing(format!("failed to create cipher: {e}")))?;

        use rand::rngs::OsRng;
        use rand::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| ImportError::processing(format!("state encryption failed: {e}")))?;

        let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(result))
    }

    /// Decode base64 and decrypt.
    pub fn decrypt(&self, encoded: &str) -> ImportResult<Vec<u8>> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| ImportError::processing(format!("stored state is not base64: {e}")))?;
        if bytes.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(ImportError::processing("stored state is too short"));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ImportError::processing(format!("failed to create cipher: {e}")))?;

        let (nonce_bytes, encrypted) = bytes.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher
            .decrypt(nonce, encrypted)
            .map_err(|e| ImportError::processing(format!("state decryption failed: {e}")))
    }
}

impl std::fmt::Debug for StateEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateEncryption")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Persists the state record onto the realm's custom attributes.
#[derive(Debug, Clone)]
pub struct RemoteStateStore {
    enabled: bool,
    encryption: Option<StateEncryption>,
}

impl RemoteStateStore {
    pub fn new(config: &StateConfig) -> ImportResult<Self> {
        let encryption = match &config.encryption_key {
            Some(hex_key) => Some(StateEncryption::from_hex(hex_key)?),
            None => None,
        };
        Ok(Self {
            enabled: config.enabled,
            encryption,
        })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Load the previous run's record. An unreadable record is treated as
    /// absent: affected purges degrade to never-delete rather than aborting
    /// the realm.
    pub async fn load(
        &self,
        gateway: &Arc<dyn AdminGateway>,
        realm: &str,
    ) -> ImportResult<StateTracker> {
        if !self.enabled {
            return Ok(StateTracker::new());
        }

        let Some(stored) = gateway.get_realm_attribute(realm, STATE_ATTRIBUTE).await? else {
            return Ok(StateTracker::new());
        };

        let plaintext = match &self.encryption {
            Some(encryption) => match encryption.decrypt(&stored) {
                Ok(plaintext) => plaintext,
                Err(error) => {
                    warn!(realm = %realm, %error, "stored state is unreadable, starting fresh");
                    return Ok(StateTracker::new());
                }
            },
            None => stored.into_bytes(),
        };

        match serde_json::from_slice::<BTreeMap<String, Vec<String>>>(&plaintext) {
            Ok(record) => Ok(StateTracker::from_record(record)),
            Err(error) => {
                warn!(realm = %realm, %error, "stored state does not parse, starting fresh");
                Ok(StateTracker::new())
            }
        }
    }

    /// Persist this run's record.
    pub async fn save(
        &self,
        gateway: &Arc<dyn AdminGateway>,
        realm: &str,
        tracker: &StateTracker,
    ) -> ImportResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let record = tracker.snapshot();
        let plaintext = serde_json::to_vec(&record)
            .map_err(|e| ImportError::processing(format!("cannot serialize state: {e}")))?;

        let value = match &self.encryption {
            Some(encryption) => encryption.encrypt(&plaintext)?,
            None => String::from_utf8(plaintext)
                .map_err(|e| ImportError::processing(format!("state is not UTF-8: {e}")))?,
        };

        gateway
            .set_realm_attribute(realm, STATE_ATTRIBUTE, &value)
            .await?;
        Ok(())
    }
}
