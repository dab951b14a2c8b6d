//! Live-reload message protocol.
//!
//! Two kinds of text frames travel over the WebSocket:
//!
//! - control frames, tagged by `type`: `connected`, `reload`
//! - publish frames, untagged `{ action, path, moduleName, locale? }`, one per
//!   filesystem event seen by the locale or scenario watcher

use serde::{Deserialize, Serialize};

use crate::actor::fs::WatchEvent;

/// Control message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },
}

impl HotReloadMessage {
    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

// =============================================================================
// Publish messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishAction {
    #[serde(rename = "locale:add")]
    LocaleAdd,
    #[serde(rename = "locale:change")]
    LocaleChange,
    #[serde(rename = "locale:remove")]
    LocaleRemove,
    #[serde(rename = "parrot:add")]
    ParrotAdd,
    #[serde(rename = "parrot:change")]
    ParrotChange,
    #[serde(rename = "parrot:remove")]
    ParrotRemove,
}

impl PublishAction {
    /// Locale action for a path event; `None` for `Ready`/`Error`.
    pub fn locale(event: &WatchEvent) -> Option<Self> {
        match event {
            WatchEvent::Add(_) => Some(Self::LocaleAdd),
            WatchEvent::Change(_) => Some(Self::LocaleChange),
            WatchEvent::Remove(_) => Some(Self::LocaleRemove),
            WatchEvent::Ready | WatchEvent::Error(_) => None,
        }
    }

    /// Scenario action for a path event; `None` for `Ready`/`Error`.
    pub fn parrot(event: &WatchEvent) -> Option<Self> {
        match event {
            WatchEvent::Add(_) => Some(Self::ParrotAdd),
            WatchEvent::Change(_) => Some(Self::ParrotChange),
            WatchEvent::Remove(_) => Some(Self::ParrotRemove),
            WatchEvent::Ready | WatchEvent::Error(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocaleAdd => "locale:add",
            Self::LocaleChange => "locale:change",
            Self::LocaleRemove => "locale:remove",
            Self::ParrotAdd => "parrot:add",
            Self::ParrotChange => "parrot:change",
            Self::ParrotRemove => "parrot:remove",
        }
    }
}

/// Change notification for a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishMessage {
    pub action: PublishAction,
    pub path: String,
    pub module_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl PublishMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
