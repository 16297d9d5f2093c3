//! Authentication flows, executions, flow-copy instructions and required
//! actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A top-level or nested authentication flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationFlowRepresentation {
    /// Server-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Flow alias (natural key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_level: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_in: Option<bool>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl AuthenticationFlowRepresentation {
    /// The flow alias, or empty string if not set.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }
}

/// One execution as reported by the flow's execution listing.
///
/// `index` is the position among siblings at `level`; the raise-priority
/// operation moves an execution one index earlier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExecutionInfoRepresentation {
    /// Server-assigned execution id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Sub-flow alias when this entry is a flow rather than an authenticator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Authenticator provider id for leaf executions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_flow: Option<bool>,

    #[serde(default)]
    pub level: i32,

    #[serde(default)]
    pub index: i32,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// Instruction to derive a new flow by copying a model flow and swapping
/// some of its executions' providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowCopy {
    /// Alias of the flow to create.
    pub alias: String,

    /// Alias of the model flow to copy from.
    pub model_alias: String,

    /// Override tree rooted at the copied flow.
    #[serde(default)]
    pub overrides: FlowOverrideNode,

    /// Bind the new flow as the realm's browser flow.
    #[serde(default)]
    pub bind_browser_flow: bool,

    /// Bind the new flow as the realm's direct-grant flow.
    #[serde(default)]
    pub bind_direct_grant_flow: bool,
}

/// One node of the declared execution-override tree: leaf provider swaps at
/// this level plus overrides inside named sub-flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOverrideNode {
    /// Provider swaps among this node's direct executions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executions: Vec<ExecutionOverride>,

    /// Overrides inside sub-flows, keyed by the sub-flow's alias as it
    /// appears in the copied flow.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_flows: BTreeMap<String, FlowOverrideNode>,
}

impl FlowOverrideNode {
    /// True when the node declares nothing at any depth.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executions.is_empty() && self.sub_flows.values().all(FlowOverrideNode::is_empty)
    }
}

/// Swap the execution whose current provider is `model_provider` for one
/// using `provider`, keeping the original position and requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOverride {
    /// Provider id of the execution in the model flow.
    pub model_provider: String,

    /// Provider id to use instead.
    pub provider: String,
}

/// A required action registered on the realm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredActionProviderRepresentation {
    /// Action alias (natural key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_action: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl RequiredActionProviderRepresentation {
    /// The action alias, or empty string if not set.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }
}
