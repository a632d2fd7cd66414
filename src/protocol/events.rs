//! Typed event table.
//!
//! # Events
//!
//! | Module | Events |
//! |--------|--------|
//! | `browsingContext` | context lifecycle, navigation, user prompts |
//! | `log` | `entryAdded` |
//! | `network` | `beforeRequestSent`, `fetchError`, `responseStarted`, `responseCompleted` |
//! | `script` | `message`, `realmCreated`, `realmDestroyed` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::BrowsingContext;
use crate::schema::EventSpec;

use super::{browsing_context, log, network, script};

// ============================================================================
// EventContext
// ============================================================================

/// Extracts the browsing context an event payload belongs to.
pub trait EventContext {
    /// Returns the context, or `None` for context-free payloads.
    fn browsing_context(&self) -> Option<&BrowsingContext>;
}

impl EventContext for browsing_context::Info {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        Some(&self.context)
    }
}

impl EventContext for browsing_context::NavigationInfo {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        Some(&self.context)
    }
}

impl EventContext for browsing_context::UserPromptClosedParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        Some(&self.context)
    }
}

impl EventContext for browsing_context::UserPromptOpenedParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        Some(&self.context)
    }
}

impl EventContext for log::Entry {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.context()
    }
}

impl EventContext for network::BeforeRequestSentParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.base.context.as_ref()
    }
}

impl EventContext for network::FetchErrorParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.base.context.as_ref()
    }
}

impl EventContext for network::ResponseParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.base.context.as_ref()
    }
}

impl EventContext for script::MessageParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.source.context.as_ref()
    }
}

impl EventContext for script::RealmInfo {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        self.context()
    }
}

impl EventContext for script::RealmDestroyedParameters {
    fn browsing_context(&self) -> Option<&BrowsingContext> {
        None
    }
}

// ============================================================================
// Event Table
// ============================================================================

macro_rules! define_events {
    ($(
        $(#[$meta:meta])*
        $variant:ident($params:ty) = $method:literal, $params_schema:literal;
    )*) => {
        /// Params of any known event, tagged by method.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "method", content = "params")]
        pub enum EventData {
            $(
                $(#[$meta])*
                #[serde(rename = $method)]
                $variant($params),
            )*
        }

        impl EventData {
            /// Returns the wire method.
            #[must_use]
            pub fn method(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $method,)*
                }
            }
        }

        impl EventContext for EventData {
            fn browsing_context(&self) -> Option<&BrowsingContext> {
                match self {
                    $(Self::$variant(params) => params.browsing_context(),)*
                }
            }
        }

        /// Method and params schema of every event.
        pub static EVENT_SPECS: &[EventSpec] = &[
            $(
                EventSpec {
                    method: $method,
                    params: $params_schema,
                },
            )*
        ];
    };
}

define_events! {
    ContextCreated(browsing_context::Info)
        = "browsingContext.contextCreated", "BrowsingContext.Info";
    ContextDestroyed(browsing_context::Info)
        = "browsingContext.contextDestroyed", "BrowsingContext.Info";
    DomContentLoaded(browsing_context::NavigationInfo)
        = "browsingContext.domContentLoaded", "BrowsingContext.NavigationInfo";
    DownloadWillBegin(browsing_context::NavigationInfo)
        = "browsingContext.downloadWillBegin", "BrowsingContext.NavigationInfo";
    FragmentNavigated(browsing_context::NavigationInfo)
        = "browsingContext.fragmentNavigated", "BrowsingContext.NavigationInfo";
    Load(browsing_context::NavigationInfo)
        = "browsingContext.load", "BrowsingContext.NavigationInfo";
    NavigationAborted(browsing_context::NavigationInfo)
        = "browsingContext.navigationAborted", "BrowsingContext.NavigationInfo";
    NavigationFailed(browsing_context::NavigationInfo)
        = "browsingContext.navigationFailed", "BrowsingContext.NavigationInfo";
    NavigationStarted(browsing_context::NavigationInfo)
        = "browsingContext.navigationStarted", "BrowsingContext.NavigationInfo";
    UserPromptClosed(browsing_context::UserPromptClosedParameters)
        = "browsingContext.userPromptClosed", "BrowsingContext.UserPromptClosedParameters";
    UserPromptOpened(browsing_context::UserPromptOpenedParameters)
        = "browsingContext.userPromptOpened", "BrowsingContext.UserPromptOpenedParameters";

    /// Console call or uncaught error.
    EntryAdded(log::Entry) = "log.entryAdded", "Log.Entry";

    BeforeRequestSent(network::BeforeRequestSentParameters)
        = "network.beforeRequestSent", "Network.BeforeRequestSentParameters";
    FetchError(network::FetchErrorParameters)
        = "network.fetchError", "Network.FetchErrorParameters";
    ResponseCompleted(network::ResponseParameters)
        = "network.responseCompleted", "Network.ResponseCompletedParameters";
    ResponseStarted(network::ResponseParameters)
        = "network.responseStarted", "Network.ResponseStartedParameters";

    /// Value posted to a channel.
    Message(script::MessageParameters) = "script.message", "Script.MessageParameters";
    RealmCreated(script::RealmInfo) = "script.realmCreated", "Script.RealmInfo";
    RealmDestroyed(script::RealmDestroyedParameters)
        = "script.realmDestroyed", "Script.RealmDestroyedParameters";
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_data_decodes_by_method() {
        let data: EventData = serde_json::from_value(json!({
            "method": "browsingContext.load",
            "params": {"context": "c1", "navigation": "n1", "timestamp": 10, "url": "about:blank"}
        }))
        .expect("decode");
        assert_eq!(data.method(), "browsingContext.load");
        assert_eq!(data.browsing_context().map(BrowsingContext::as_str), Some("c1"));
    }

    #[test]
    fn test_realm_destroyed_has_no_context() {
        let data: EventData = serde_json::from_value(json!({
            "method": "script.realmDestroyed",
            "params": {"realm": "r1"}
        }))
        .expect("decode");
        assert!(matches!(data, EventData::RealmDestroyed(_)));
        assert_eq!(data.browsing_context(), None);
    }

    #[test]
    fn test_event_table_size() {
        assert_eq!(EVENT_SPECS.len(), 19);
        assert!(EVENT_SPECS.iter().all(|spec| spec.method.contains('.')));
    }
}
