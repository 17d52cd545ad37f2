//! Wire types of the host-agnostic interactive surface.
//!
//! A host lists per-directive actions, invokes one by echoing its payload
//! back, applies the returned text edits itself, and re-requests actions
//! afterwards (line numbers may have shifted). Positions are 0-based;
//! columns are byte offsets within the line.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: u32 = 1;

/// Action label for a directive with no recorded result
pub const LABEL_EVALUATE: &str = "Evaluate";
/// Action label for a directive with a recorded result
pub const LABEL_REFRESH: &str = "Refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Identifies one directive group well enough to re-locate it later.
///
/// Opaque to the host: it must be echoed back unmodified on invoke. The
/// exact marker text guards against acting on a stale snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActionPayload {
    pub file: String,
    /// 0-based line of the marker comment
    pub marker_line: u32,
    /// Exact source text of the marker comment
    pub marker_text: String,
}

/// One actionable affordance anchored at a marker's range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub range: Range,
    pub label: String,
    pub payload: ActionPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// Result of invoking an action: edits keyed by file path, plus a signal
/// that cached actions are stale and must be re-requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InvokeResult {
    pub edits: BTreeMap<String, Vec<TextEdit>>,
    pub refresh_actions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

/// Requests the service accepts, one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    ListActions { file: String },
    Invoke { payload: ActionPayload },
}

/// Responses the service emits, one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Response {
    Actions { actions: Vec<Action> },
    Invoked(InvokeResult),
    Error { error: ErrorEnvelope },
}

impl Response {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error {
            error: ErrorEnvelope {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
