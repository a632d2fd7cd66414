//! Static schema definitions, one module per protocol namespace.
//!
//! Type names follow the wire schema (`Namespace.Type`). Top-level envelope
//! types carry no namespace prefix.
//!
//! | Module | Namespace |
//! |--------|-----------|
//! | [`session`] | `Session` |
//! | [`browsing_context`] | `BrowsingContext` |
//! | [`network`] | `Network` |
//! | [`script`] | `Script` |
//! | [`input`] | `Input` |
//! | [`log`] | `Log` |
//!
//! `browser.close` only takes `EmptyParams`, so `Browser` has no module.

// ============================================================================
// Submodules
// ============================================================================

pub mod browsing_context;
pub mod input;
pub mod log;
pub mod network;
pub mod script;
pub mod session;

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::commands::COMMAND_SPECS;
use crate::protocol::error::ERROR_CODES;
use crate::protocol::events::EVENT_SPECS;

use super::registry::RegistryBuilder;
use super::{
    choice, extensible, js_int, js_uint, literal, nullable, object, one_of, optional,
    reference, required, string, tagged,
};

// ============================================================================
// Install
// ============================================================================

/// Defines every built-in type, command and event.
pub fn install(builder: &mut RegistryBuilder) {
    install_common(builder);
    install_envelopes(builder);
    session::install(builder);
    browsing_context::install(builder);
    network::install(builder);
    script::install(builder);
    input::install(builder);
    log::install(builder);
}

fn install_common(builder: &mut RegistryBuilder) {
    builder
        .define("Extensible", extensible(vec![]))
        .define("EmptyParams", extensible(vec![]))
        .define("EmptyResult", extensible(vec![]))
        .define("JsInt", js_int())
        .define("JsUint", js_uint())
        .define("ErrorCode", one_of(&ERROR_CODES));
}

fn install_envelopes(builder: &mut RegistryBuilder) {
    let command_variants = COMMAND_SPECS
        .iter()
        .map(|spec| {
            extensible(vec![
                required("id", reference("JsUint")),
                required("method", literal(spec.method)),
                required("params", reference(spec.params)),
            ])
        })
        .collect();
    let command_data = COMMAND_SPECS
        .iter()
        .map(|spec| {
            object(vec![
                required("method", literal(spec.method)),
                required("params", reference(spec.params)),
            ])
        })
        .collect();

    let event_variants = EVENT_SPECS
        .iter()
        .map(|spec| {
            extensible(vec![
                required("method", literal(spec.method)),
                required("params", reference(spec.params)),
            ])
        })
        .collect();
    let event_data = EVENT_SPECS
        .iter()
        .map(|spec| {
            object(vec![
                required("method", literal(spec.method)),
                required("params", reference(spec.params)),
            ])
        })
        .collect();

    builder
        .define("Command", tagged("method", command_variants))
        .define("CommandData", tagged("method", command_data))
        .define("Event", tagged("method", event_variants))
        .define("EventData", tagged("method", event_data))
        .define(
            "CommandResponse",
            extensible(vec![
                required("id", reference("JsUint")),
                required("result", reference("ResultData")),
            ]),
        )
        .define(
            "ErrorResponse",
            extensible(vec![
                required("id", nullable(reference("JsUint"))),
                required("error", reference("ErrorCode")),
                required("message", string()),
                optional("stacktrace", string()),
            ]),
        )
        // Tried in order; the open `EmptyResult` must stay last.
        .define(
            "ResultData",
            choice(vec![
                reference("BrowsingContext.CaptureScreenshotResult"),
                reference("BrowsingContext.CreateResult"),
                reference("BrowsingContext.GetTreeResult"),
                reference("BrowsingContext.NavigateResult"),
                reference("BrowsingContext.PrintResult"),
                reference("Script.AddPreloadScriptResult"),
                reference("Script.EvaluateResult"),
                reference("Script.GetRealmsResult"),
                reference("Session.NewResult"),
                reference("Session.StatusResult"),
                reference("EmptyResult"),
            ]),
        );

    for spec in COMMAND_SPECS {
        builder.command(*spec);
    }
    for spec in EVENT_SPECS {
        builder.event(*spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use crate::schema::SchemaNode;

    #[test]
    fn test_every_command_has_envelope_variant() {
        let registry = SchemaRegistry::builtin().expect("registry");
        let SchemaNode::Union(command) = registry.resolve("Command").expect("Command") else {
            panic!("Command should be a union");
        };
        for spec in COMMAND_SPECS {
            assert!(command.select(spec.method).is_some(), "{}", spec.method);
        }
        assert!(command.select("session.bogus").is_none());
    }

    #[test]
    fn test_every_event_has_envelope_variant() {
        let registry = SchemaRegistry::builtin().expect("registry");
        let SchemaNode::Union(event) = registry.resolve("Event").expect("Event") else {
            panic!("Event should be a union");
        };
        assert_eq!(event.tags().len(), EVENT_SPECS.len());
        assert!(event.select("script.realmDestroyed").is_some());
        assert!(event.select("script.message").is_some());
    }

    #[test]
    fn test_js_int_bounds() {
        let registry = SchemaRegistry::builtin().expect("registry");
        assert_eq!(registry.resolve("JsInt").expect("JsInt"), &js_int());
    }
}
