//! `Session` namespace: capabilities, proxy configuration and subscriptions.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    boolean, extensible, integer_in, list, object, one_of, optional, reference, required, string,
};

const PROXY_TYPES: &[&str] = &["pac", "direct", "autodetect", "system", "manual"];

pub(super) fn install(builder: &mut RegistryBuilder) {
    builder
        .define(
            "Session.ProxyConfiguration",
            object(vec![
                optional("proxyType", one_of(PROXY_TYPES)),
                optional("proxyAutoconfigUrl", string()),
                optional("ftpProxy", string()),
                optional("httpProxy", string()),
                optional("noProxy", list(string())),
                optional("sslProxy", string()),
                optional("socksProxy", string()),
                optional("socksVersion", integer_in(0, 255)),
            ]),
        )
        .define(
            "Session.CapabilityRequest",
            extensible(vec![
                optional("acceptInsecureCerts", boolean()),
                optional("browserName", string()),
                optional("browserVersion", string()),
                optional("platformName", string()),
                optional("proxy", reference("Session.ProxyConfiguration")),
            ]),
        )
        .define(
            "Session.CapabilitiesRequest",
            object(vec![
                optional("alwaysMatch", reference("Session.CapabilityRequest")),
                optional("firstMatch", list(reference("Session.CapabilityRequest"))),
            ]),
        )
        .define(
            "Session.NewParameters",
            object(vec![required(
                "capabilities",
                reference("Session.CapabilitiesRequest"),
            )]),
        )
        .define(
            "Session.SubscriptionRequest",
            object(vec![
                required("events", list(string())),
                optional(
                    "contexts",
                    list(reference("BrowsingContext.BrowsingContext")),
                ),
            ]),
        )
        .define(
            "Session.StatusResult",
            object(vec![
                required("ready", boolean()),
                required("message", string()),
            ]),
        )
        .define(
            "Session.NewResult",
            object(vec![
                required("sessionId", string()),
                required(
                    "capabilities",
                    extensible(vec![
                        required("acceptInsecureCerts", boolean()),
                        required("browserName", string()),
                        required("browserVersion", string()),
                        required("platformName", string()),
                        required("proxy", reference("Session.ProxyConfiguration")),
                        required("setWindowRect", boolean()),
                    ]),
                ),
            ]),
        );
}
