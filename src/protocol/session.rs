//! `session` namespace: status, capabilities and event subscriptions.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::BrowsingContext;

use super::{EmptyParams, Extensible};

// ============================================================================
// Commands
// ============================================================================

/// `session.status` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub EmptyParams);

/// `session.end` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct End(pub EmptyParams);

/// `session.subscribe` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subscribe(pub SubscriptionRequest);

/// `session.unsubscribe` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unsubscribe(pub SubscriptionRequest);

/// `session.new` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewParameters {
    /// Requested capabilities.
    pub capabilities: CapabilitiesRequest,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Capabilities negotiation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
    /// Capabilities every match must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_match: Option<CapabilityRequest>,
    /// Alternatives tried in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_match: Option<Vec<CapabilityRequest>>,
}

/// One set of requested capabilities. Vendor keys live in `extensible`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_insecure_certs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfiguration>,
    /// Extension capabilities such as `moz:firefoxOptions`.
    #[serde(flatten)]
    pub extensible: Extensible,
}

/// Proxy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Pac,
    Direct,
    Autodetect,
    System,
    Manual,
}

/// Proxy settings, shared by requests and negotiated capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<ProxyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_autoconfig_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ftp_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socks_proxy: Option<String>,
    /// SOCKS protocol version, 0 to 255.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socks_version: Option<u8>,
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Events (or whole modules) to (un)subscribe, optionally per context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Event names such as `log.entryAdded`, or module names such as `log`.
    pub events: Vec<String>,
    /// Limits the subscription to these contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContext>>,
}

impl SubscriptionRequest {
    /// Subscribes to `events` globally.
    #[must_use]
    pub fn new<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            contexts: None,
        }
    }

    /// Limits the request to the given contexts.
    #[must_use]
    pub fn with_contexts(mut self, contexts: Vec<BrowsingContext>) -> Self {
        self.contexts = Some(contexts);
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// `session.status` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// Whether a new session can be created.
    pub ready: bool,
    /// Implementation-defined status message.
    pub message: String,
}

/// `session.new` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub session_id: String,
    pub capabilities: NegotiatedCapabilities,
}

/// Capabilities granted by the remote end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiatedCapabilities {
    pub accept_insecure_certs: bool,
    pub browser_name: String,
    pub browser_version: String,
    pub platform_name: String,
    pub proxy: ProxyConfiguration,
    pub set_window_rect: bool,
    #[serde(flatten)]
    pub extensible: Extensible,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_capability_request_keeps_vendor_keys() {
        let json = json!({
            "browserName": "firefox",
            "moz:firefoxOptions": {"args": ["-headless"]}
        });
        let request: CapabilityRequest = serde_json::from_value(json.clone()).expect("decode");
        assert_eq!(request.browser_name.as_deref(), Some("firefox"));
        assert!(request.extensible.contains_key("moz:firefoxOptions"));
        assert_eq!(serde_json::to_value(&request).expect("encode"), json);
    }

    #[test]
    fn test_subscription_request_builder() {
        let request = SubscriptionRequest::new(["log.entryAdded"])
            .with_contexts(vec![BrowsingContext::new("ctx")]);
        assert_eq!(
            serde_json::to_value(Subscribe(request)).expect("encode"),
            json!({"events": ["log.entryAdded"], "contexts": ["ctx"]})
        );
    }

    #[test]
    fn test_status_params_are_empty_object() {
        assert_eq!(serde_json::to_value(Status::default()).expect("encode"), json!({}));
    }
}
