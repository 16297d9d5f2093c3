//! Authentication flow derivation.
//!
//! A flow copy instruction derives a new flow from a model flow: copy the
//! model under a new alias, then walk the declared override tree and swap
//! authenticator providers while keeping each execution's position and
//! requirement. Derivation is additive: an existing alias is never
//! re-reconciled, and flows are never deleted here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use realmsync_gateway::AdminGateway;
use realmsync_types::{ExecutionOverride, FlowCopy, FlowOverrideNode};

use crate::error::{ImportError, ImportResult};
use crate::report::ImportCounters;

/// Applies flow copy instructions to one realm.
pub struct FlowImporter<'a> {
    gateway: &'a Arc<dyn AdminGateway>,
    realm: &'a str,
}

impl<'a> FlowImporter<'a> {
    #[must_use]
    pub fn new(gateway: &'a Arc<dyn AdminGateway>, realm: &'a str) -> Self {
        Self { gateway, realm }
    }

    pub async fn import_copies(&self, copies: &[FlowCopy]) -> ImportResult<ImportCounters> {
        let mut counters = ImportCounters::default();
        for copy in copies {
            if self.import_copy(copy).await? {
                counters.created += 1;
            } else {
                counters.unchanged += 1;
            }
        }
        Ok(counters)
    }

    /// Returns whether the flow was created.
    async fn import_copy(&self, copy: &FlowCopy) -> ImportResult<bool> {
        if self
            .gateway
            .get_flow_by_alias(self.realm, &copy.alias)
            .await?
            .is_some()
        {
            info!(realm = %self.realm, alias = %copy.alias, "flow already exists, skipping");
            self.apply_bindings(copy).await?;
            return Ok(false);
        }

        if self
            .gateway
            .get_flow_by_alias(self.realm, &copy.model_alias)
            .await?
            .is_none()
        {
            warn!(
                realm = %self.realm,
                alias = %copy.alias,
                model = %copy.model_alias,
                "model flow does not exist, skipping copy"
            );
            return Ok(false);
        }

        debug!(
            realm = %self.realm,
            alias = %copy.alias,
            model = %copy.model_alias,
            "copying flow"
        );
        self.gateway
            .copy_flow(self.realm, &copy.model_alias, &copy.alias)
            .await?;

        self.walk_overrides(&copy.alias, &copy.overrides).await?;
        self.apply_bindings(copy).await?;
        Ok(true)
    }

    fn walk_overrides<'b>(
        &'b self,
        flow_alias: &'b str,
        node: &'b FlowOverrideNode,
    ) -> Pin<Box<dyn Future<Output = ImportResult<()>> + Send + 'b>> {
        Box::pin(async move {
            for swap in &node.executions {
                self.swap_execution(flow_alias, swap).await?;
            }
            for (sub_alias, sub_node) in &node.sub_flows {
                self.walk_overrides(sub_alias, sub_node).await?;
            }
            Ok(())
        })
    }

    /// Replace one execution's authenticator provider, preserving its
    /// requirement and its position among siblings.
    async fn swap_execution(
        &self,
        flow_alias: &str,
        swap: &ExecutionOverride,
    ) -> ImportResult<()> {
        let executions = self.gateway.list_executions(self.realm, flow_alias).await?;
        let original = executions
            .iter()
            .find(|e| e.level == 0 && e.provider_id.as_deref() == Some(swap.model_provider.as_str()))
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "flow '{flow_alias}' has no execution with provider '{}'",
                    swap.model_provider
                ))
            })?;
        let original_id = original.id.as_deref().ok_or_else(|| {
            ImportError::processing(format!(
                "execution '{}' in flow '{flow_alias}' has no id",
                swap.model_provider
            ))
        })?;
        let original_index = original.index;
        let original_requirement = original.requirement.clone();

        self.gateway.delete_execution(self.realm, original_id).await?;
        self.gateway
            .add_execution(self.realm, flow_alias, &swap.provider)
            .await?;

        // The new execution lands at the end of the flow.
        let executions = self.gateway.list_executions(self.realm, flow_alias).await?;
        let added = executions
            .iter()
            .filter(|e| e.level == 0 && e.provider_id.as_deref() == Some(swap.provider.as_str()))
            .max_by_key(|e| e.index)
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "added execution '{}' not found in flow '{flow_alias}'",
                    swap.provider
                ))
            })?;
        let added_id = added.id.as_deref().ok_or_else(|| {
            ImportError::processing(format!(
                "added execution '{}' in flow '{flow_alias}' has no id",
                swap.provider
            ))
        })?;

        if original_requirement.is_some() && added.requirement != original_requirement {
            let mut updated = added.clone();
            updated.requirement = original_requirement;
            self.gateway
                .update_execution(self.realm, flow_alias, &updated)
                .await?;
        }

        // Replay the original position. Only raising is available, so the
        // declared order must never need a lowering move.
        let distance = added.index - original_index;
        if distance < 0 {
            return Err(ImportError::processing(format!(
                "cannot lower priority of execution '{}' in flow '{flow_alias}'",
                swap.provider
            )));
        }
        for _ in 0..distance {
            self.gateway
                .raise_execution_priority(self.realm, added_id)
                .await?;
        }

        debug!(
            realm = %self.realm,
            flow = %flow_alias,
            from = %swap.model_provider,
            to = %swap.provider,
            moved = distance,
            "swapped execution provider"
        );
        Ok(())
    }

    /// Bind the derived flow as the realm's browser and/or direct-grant
    /// flow. Idempotent: writes only when a binding actually changes.
    async fn apply_bindings(&self, copy: &FlowCopy) -> ImportResult<()> {
        if !copy.bind_browser_flow && !copy.bind_direct_grant_flow {
            return Ok(());
        }

        let mut realm = self
            .gateway
            .get_realm(self.realm)
            .await?
            .ok_or_else(|| {
                ImportError::processing(format!(
                    "realm '{}' vanished while binding flows",
                    self.realm
                ))
            })?;

        let mut changed = false;
        if copy.bind_browser_flow && realm.browser_flow.as_deref() != Some(copy.alias.as_str()) {
            realm.browser_flow = Some(copy.alias.clone());
            changed = true;
        }
        if copy.bind_direct_grant_flow
            && realm.direct_grant_flow.as_deref() != Some(copy.alias.as_str())
        {
            realm.direct_grant_flow = Some(copy.alias.clone());
            changed = true;
        }

        if changed {
            debug!(realm = %self.realm, alias = %copy.alias, "updating flow bindings");
            self.gateway.update_realm(self.realm, &realm).await?;
        }
        Ok(())
    }
}
