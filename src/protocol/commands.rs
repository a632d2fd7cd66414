//! Typed command table.
//!
//! One macro invocation defines, for every command:
//!
//! - a [`CommandData`] variant (`method` + `params`),
//! - a [`CommandType`] impl tying the params type to its result type,
//! - an entry in [`COMMAND_SPECS`], which the schema registry reads to
//!   build the `Command` envelope union.
//!
//! # Commands
//!
//! | Module | Commands |
//! |--------|----------|
//! | `session` | `status`, `new`, `end`, `subscribe`, `unsubscribe` |
//! | `browser` | `close` |
//! | `browsingContext` | `captureScreenshot`, `close`, `create`, `getTree`, `handleUserPrompt`, `navigate`, `print`, `reload`, `setViewport` |
//! | `script` | `addPreloadScript`, `callFunction`, `disown`, `evaluate`, `getRealms`, `removePreloadScript` |
//! | `input` | `performActions`, `releaseActions` |

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::schema::CommandSpec;

use super::EmptyResult;
use super::{browser, browsing_context, input, script, session};

// ============================================================================
// CommandType
// ============================================================================

/// Params type of a single command.
///
/// Sending a value of this type resolves to [`CommandType::Result`].
pub trait CommandType: Serialize + Into<CommandData> {
    /// Wire method, e.g. `browsingContext.navigate`.
    const METHOD: &'static str;

    /// Registry name of the result schema.
    const RESULT_SCHEMA: &'static str;

    /// Decoded result type.
    type Result: DeserializeOwned;
}

// ============================================================================
// Command Table
// ============================================================================

macro_rules! define_commands {
    ($(
        $(#[$meta:meta])*
        $variant:ident($params:ty) = $method:literal, $params_schema:literal
            => $result:ty, $result_schema:literal;
    )*) => {
        /// Params of any known command, tagged by method.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "method", content = "params")]
        pub enum CommandData {
            $(
                $(#[$meta])*
                #[serde(rename = $method)]
                $variant($params),
            )*
        }

        impl CommandData {
            /// Returns the wire method.
            #[must_use]
            pub fn method(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $method,)*
                }
            }
        }

        $(
            impl CommandType for $params {
                const METHOD: &'static str = $method;
                const RESULT_SCHEMA: &'static str = $result_schema;
                type Result = $result;
            }

            impl From<$params> for CommandData {
                fn from(params: $params) -> Self {
                    Self::$variant(params)
                }
            }
        )*

        /// Method, params schema and result schema of every command.
        pub static COMMAND_SPECS: &[CommandSpec] = &[
            $(
                CommandSpec {
                    method: $method,
                    params: $params_schema,
                    result: $result_schema,
                },
            )*
        ];
    };
}

define_commands! {
    /// Readiness of the remote end.
    SessionStatus(session::Status) = "session.status", "EmptyParams"
        => session::StatusResult, "Session.StatusResult";
    /// Capability negotiation.
    SessionNew(session::NewParameters) = "session.new", "Session.NewParameters"
        => session::NewResult, "Session.NewResult";
    SessionEnd(session::End) = "session.end", "EmptyParams"
        => EmptyResult, "EmptyResult";
    SessionSubscribe(session::Subscribe) = "session.subscribe", "Session.SubscriptionRequest"
        => EmptyResult, "EmptyResult";
    SessionUnsubscribe(session::Unsubscribe) = "session.unsubscribe", "Session.SubscriptionRequest"
        => EmptyResult, "EmptyResult";

    BrowserClose(browser::Close) = "browser.close", "EmptyParams"
        => EmptyResult, "EmptyResult";

    CaptureScreenshot(browsing_context::CaptureScreenshotParameters)
        = "browsingContext.captureScreenshot", "BrowsingContext.CaptureScreenshotParameters"
        => browsing_context::CaptureScreenshotResult, "BrowsingContext.CaptureScreenshotResult";
    CloseContext(browsing_context::CloseParameters)
        = "browsingContext.close", "BrowsingContext.CloseParameters"
        => EmptyResult, "EmptyResult";
    CreateContext(browsing_context::CreateParameters)
        = "browsingContext.create", "BrowsingContext.CreateParameters"
        => browsing_context::CreateResult, "BrowsingContext.CreateResult";
    GetTree(browsing_context::GetTreeParameters)
        = "browsingContext.getTree", "BrowsingContext.GetTreeParameters"
        => browsing_context::GetTreeResult, "BrowsingContext.GetTreeResult";
    HandleUserPrompt(browsing_context::HandleUserPromptParameters)
        = "browsingContext.handleUserPrompt", "BrowsingContext.HandleUserPromptParameters"
        => EmptyResult, "EmptyResult";
    Navigate(browsing_context::NavigateParameters)
        = "browsingContext.navigate", "BrowsingContext.NavigateParameters"
        => browsing_context::NavigateResult, "BrowsingContext.NavigateResult";
    Print(browsing_context::PrintParameters)
        = "browsingContext.print", "BrowsingContext.PrintParameters"
        => browsing_context::PrintResult, "BrowsingContext.PrintResult";
    Reload(browsing_context::ReloadParameters)
        = "browsingContext.reload", "BrowsingContext.ReloadParameters"
        => EmptyResult, "EmptyResult";
    SetViewport(browsing_context::SetViewportParameters)
        = "browsingContext.setViewport", "BrowsingContext.SetViewportParameters"
        => EmptyResult, "EmptyResult";

    AddPreloadScript(script::AddPreloadScriptParameters)
        = "script.addPreloadScript", "Script.AddPreloadScriptParameters"
        => script::AddPreloadScriptResult, "Script.AddPreloadScriptResult";
    CallFunction(script::CallFunctionParameters)
        = "script.callFunction", "Script.CallFunctionParameters"
        => script::EvaluateResult, "Script.EvaluateResult";
    Disown(script::DisownParameters)
        = "script.disown", "Script.DisownParameters"
        => EmptyResult, "EmptyResult";
    Evaluate(script::EvaluateParameters)
        = "script.evaluate", "Script.EvaluateParameters"
        => script::EvaluateResult, "Script.EvaluateResult";
    GetRealms(script::GetRealmsParameters)
        = "script.getRealms", "Script.GetRealmsParameters"
        => script::GetRealmsResult, "Script.GetRealmsResult";
    RemovePreloadScript(script::RemovePreloadScriptParameters)
        = "script.removePreloadScript", "Script.RemovePreloadScriptParameters"
        => EmptyResult, "EmptyResult";

    PerformActions(input::PerformActionsParameters)
        = "input.performActions", "Input.PerformActionsParameters"
        => EmptyResult, "EmptyResult";
    ReleaseActions(input::ReleaseActionsParameters)
        = "input.releaseActions", "Input.ReleaseActionsParameters"
        => EmptyResult, "EmptyResult";
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::BrowsingContext;

    #[test]
    fn test_command_data_wire_shape() {
        let data: CommandData = browsing_context::NavigateParameters::new(
            BrowsingContext::new("c"),
            "https://example.com",
        )
        .into();
        assert_eq!(data.method(), "browsingContext.navigate");
        assert_eq!(
            serde_json::to_value(&data).expect("encode"),
            json!({
                "method": "browsingContext.navigate",
                "params": {"context": "c", "url": "https://example.com"}
            })
        );
    }

    #[test]
    fn test_command_data_decodes_by_method() {
        let data: CommandData =
            serde_json::from_value(json!({"method": "session.status", "params": {}}))
                .expect("decode");
        assert!(matches!(data, CommandData::SessionStatus(_)));
    }

    #[test]
    fn test_specs_are_unique_and_consistent() {
        let mut methods: Vec<_> = COMMAND_SPECS.iter().map(|spec| spec.method).collect();
        methods.sort_unstable();
        methods.dedup();
        assert_eq!(methods.len(), COMMAND_SPECS.len());
        assert_eq!(COMMAND_SPECS.len(), 23);

        let evaluate = COMMAND_SPECS
            .iter()
            .find(|spec| spec.method == script::EvaluateParameters::METHOD)
            .expect("evaluate spec");
        assert_eq!(evaluate.result, script::EvaluateParameters::RESULT_SCHEMA);
    }
}
