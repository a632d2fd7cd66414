//! `network` namespace. The remote end only reports; there are no commands.

use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContext, Navigation, Request};

use super::script::StackTrace;

/// Fields common to every network event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseParameters {
    pub context: Option<BrowsingContext>,
    pub navigation: Option<Navigation>,
    pub redirect_count: u64,
    pub request: RequestData,
    pub timestamp: u64,
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Raw bytes when `value` is not valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<Vec<f64>>,
    pub domain: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
    pub size: u64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

/// Fetch timing, in milliseconds relative to `timeOrigin`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTimingInfo {
    pub time_origin: f64,
    pub request_time: f64,
    pub redirect_start: f64,
    pub redirect_end: f64,
    pub fetch_start: f64,
    pub dns_start: f64,
    pub dns_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub tls_start: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<Vec<f64>>,
}

/// What caused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorType {
    Parser,
    Script,
    Preflight,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiator {
    #[serde(rename = "type")]
    pub initiator_type: InitiatorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub request: Request,
    pub url: String,
    pub method: String,
    pub headers: Vec<Header>,
    pub cookies: Vec<Cookie>,
    pub headers_size: u64,
    pub body_size: Option<u64>,
    pub timings: FetchTimingInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContent {
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub url: String,
    pub protocol: String,
    pub status: u64,
    pub status_text: String,
    pub from_cache: bool,
    pub headers: Vec<Header>,
    pub mime_type: String,
    pub bytes_received: u64,
    pub headers_size: Option<u64>,
    pub body_size: Option<u64>,
    pub content: ResponseContent,
}

/// `network.beforeRequestSent` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeRequestSentParameters {
    #[serde(flatten)]
    pub base: BaseParameters,
    pub initiator: Initiator,
}

/// `network.fetchError` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchErrorParameters {
    #[serde(flatten)]
    pub base: BaseParameters,
    pub error_text: String,
}

/// `network.responseStarted` and `network.responseCompleted` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(flatten)]
    pub base: BaseParameters,
    pub response: ResponseData,
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    fn base() -> Value {
        json!({
            "context": null,
            "navigation": null,
            "redirectCount": 0,
            "request": {
                "request": "req-1",
                "url": "https://example.com/",
                "method": "GET",
                "headers": [{"name": "accept", "value": "*/*"}],
                "cookies": [],
                "headersSize": 12,
                "bodySize": null,
                "timings": {
                    "timeOrigin": 0, "requestTime": 1, "redirectStart": 0,
                    "redirectEnd": 0, "fetchStart": 1, "dnsStart": 1, "dnsEnd": 2,
                    "connectStart": 2, "connectEnd": 3, "tlsStart": 2,
                    "requestStart": 3, "responseStart": 4, "responseEnd": 5
                }
            },
            "timestamp": 1700
        })
    }

    #[test]
    fn test_fetch_error_flattens_base() {
        let mut json = base();
        json["errorText"] = json!("NS_ERROR_UNKNOWN_HOST");
        let params: FetchErrorParameters = serde_json::from_value(json).expect("decode");
        assert_eq!(params.error_text, "NS_ERROR_UNKNOWN_HOST");
        assert_eq!(params.base.context, None);
        assert_eq!(params.base.request.request.as_str(), "req-1");
        assert_eq!(params.base.request.body_size, None);
    }
}
