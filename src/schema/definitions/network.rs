//! `Network` namespace. Events only; there are no network commands yet.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    Field, boolean, list, merge, nullable, number, object, one_of, optional, reference, required,
    string,
};

fn base_parameters() -> Vec<Field> {
    vec![
        required("context", nullable(reference("BrowsingContext.BrowsingContext"))),
        required("navigation", nullable(reference("BrowsingContext.Navigation"))),
        required("redirectCount", reference("JsUint")),
        required("request", reference("Network.RequestData")),
        required("timestamp", reference("JsUint")),
    ]
}

pub(super) fn install(builder: &mut RegistryBuilder) {
    let timings = [
        "timeOrigin",
        "requestTime",
        "redirectStart",
        "redirectEnd",
        "fetchStart",
        "dnsStart",
        "dnsEnd",
        "connectStart",
        "connectEnd",
        "tlsStart",
        "requestStart",
        "responseStart",
        "responseEnd",
    ]
    .into_iter()
    .map(|name| required(name, number()))
    .collect();

    builder
        .define("Network.Request", string())
        .define("Network.FetchTimingInfo", object(timings))
        .define(
            "Network.Cookie",
            object(vec![
                required("name", string()),
                optional("value", string()),
                optional("binaryValue", list(number())),
                required("domain", string()),
                required("path", string()),
                optional("expires", reference("JsUint")),
                required("size", reference("JsUint")),
                required("httpOnly", boolean()),
                required("secure", boolean()),
                required("sameSite", one_of(&["strict", "lax", "none"])),
            ]),
        )
        .define(
            "Network.Header",
            object(vec![
                required("name", string()),
                optional("value", string()),
                optional("binaryValue", list(number())),
            ]),
        )
        .define(
            "Network.Initiator",
            object(vec![
                required("type", one_of(&["parser", "script", "preflight", "other"])),
                optional("columnNumber", reference("JsUint")),
                optional("lineNumber", reference("JsUint")),
                optional("stackTrace", reference("Script.StackTrace")),
                optional("request", reference("Network.Request")),
            ]),
        )
        .define(
            "Network.RequestData",
            object(vec![
                required("request", reference("Network.Request")),
                required("url", string()),
                required("method", string()),
                required("headers", list(reference("Network.Header"))),
                required("cookies", list(reference("Network.Cookie"))),
                required("headersSize", reference("JsUint")),
                required("bodySize", nullable(reference("JsUint"))),
                required("timings", reference("Network.FetchTimingInfo")),
            ]),
        )
        .define(
            "Network.ResponseContent",
            object(vec![required("size", reference("JsUint"))]),
        )
        .define(
            "Network.ResponseData",
            object(vec![
                required("url", string()),
                required("protocol", string()),
                required("status", reference("JsUint")),
                required("statusText", string()),
                required("fromCache", boolean()),
                required("headers", list(reference("Network.Header"))),
                required("mimeType", string()),
                required("bytesReceived", reference("JsUint")),
                required("headersSize", nullable(reference("JsUint"))),
                required("bodySize", nullable(reference("JsUint"))),
                required("content", reference("Network.ResponseContent")),
            ]),
        )
        .define(
            "Network.BeforeRequestSentParameters",
            object(merge(vec![
                base_parameters(),
                vec![required("initiator", reference("Network.Initiator"))],
            ])),
        )
        .define(
            "Network.FetchErrorParameters",
            object(merge(vec![
                base_parameters(),
                vec![required("errorText", string())],
            ])),
        )
        .define(
            "Network.ResponseStartedParameters",
            object(merge(vec![
                base_parameters(),
                vec![required("response", reference("Network.ResponseData"))],
            ])),
        )
        .define(
            "Network.ResponseCompletedParameters",
            object(merge(vec![
                base_parameters(),
                vec![required("response", reference("Network.ResponseData"))],
            ])),
        );
}
