//! `BrowsingContext` namespace.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    boolean, choice, js_uint, list, nullable, number_in, number_min, object, one_of, optional,
    reference, required, string,
};

const CONTEXT: &str = "BrowsingContext.BrowsingContext";
const NAVIGATION: &str = "BrowsingContext.Navigation";

pub(super) fn install(builder: &mut RegistryBuilder) {
    install_types(builder);
    install_parameters(builder);
    install_results(builder);
    install_events(builder);
}

fn install_types(builder: &mut RegistryBuilder) {
    builder
        .define(CONTEXT, string())
        .define(NAVIGATION, string())
        .define(
            "BrowsingContext.ReadinessState",
            one_of(&["none", "interactive", "complete"]),
        )
        .define("BrowsingContext.CreateType", one_of(&["tab", "window"]))
        .define(
            "BrowsingContext.Info",
            object(vec![
                required("context", reference(CONTEXT)),
                required("url", string()),
                required("children", nullable(reference("BrowsingContext.InfoList"))),
                optional("parent", nullable(reference(CONTEXT))),
            ]),
        )
        .define(
            "BrowsingContext.InfoList",
            list(reference("BrowsingContext.Info")),
        )
        .define(
            "BrowsingContext.NavigationInfo",
            object(vec![
                required("context", reference(CONTEXT)),
                required("navigation", nullable(reference(NAVIGATION))),
                required("timestamp", reference("JsUint")),
                required("url", string()),
            ]),
        )
        .define(
            "BrowsingContext.Viewport",
            object(vec![
                required("width", reference("JsUint")),
                required("height", reference("JsUint")),
            ]),
        );
}

fn install_parameters(builder: &mut RegistryBuilder) {
    let context_only = || object(vec![required("context", reference(CONTEXT))]);

    builder
        .define("BrowsingContext.CaptureScreenshotParameters", context_only())
        .define("BrowsingContext.CloseParameters", context_only())
        .define(
            "BrowsingContext.CreateParameters",
            object(vec![
                required("type", reference("BrowsingContext.CreateType")),
                optional("referenceContext", reference(CONTEXT)),
            ]),
        )
        .define(
            "BrowsingContext.GetTreeParameters",
            object(vec![
                optional("maxDepth", reference("JsUint")),
                optional("root", reference(CONTEXT)),
            ]),
        )
        .define(
            "BrowsingContext.HandleUserPromptParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                optional("accept", boolean()),
                optional("userText", string()),
            ]),
        )
        .define(
            "BrowsingContext.NavigateParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                required("url", string()),
                optional("wait", reference("BrowsingContext.ReadinessState")),
            ]),
        )
        .define(
            "BrowsingContext.PrintParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                optional("background", boolean()),
                optional("margin", reference("BrowsingContext.PrintMarginParameters")),
                optional("orientation", one_of(&["portrait", "landscape"])),
                optional("page", reference("BrowsingContext.PrintPageParameters")),
                optional("pageRanges", list(choice(vec![js_uint(), string()]))),
                optional("scale", number_in(0.1, 2.0)),
                optional("shrinkToFit", boolean()),
            ]),
        )
        .define(
            "BrowsingContext.PrintMarginParameters",
            object(vec![
                optional("bottom", number_min(0.0)),
                optional("left", number_min(0.0)),
                optional("right", number_min(0.0)),
                optional("top", number_min(0.0)),
            ]),
        )
        .define(
            "BrowsingContext.PrintPageParameters",
            object(vec![
                optional("height", number_min(0.0)),
                optional("width", number_min(0.0)),
            ]),
        )
        .define(
            "BrowsingContext.ReloadParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                optional("ignoreCache", boolean()),
                optional("wait", reference("BrowsingContext.ReadinessState")),
            ]),
        )
        .define(
            "BrowsingContext.SetViewportParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                required("viewport", nullable(reference("BrowsingContext.Viewport"))),
            ]),
        );
}

fn install_results(builder: &mut RegistryBuilder) {
    builder
        .define(
            "BrowsingContext.CaptureScreenshotResult",
            object(vec![required("data", string())]),
        )
        .define(
            "BrowsingContext.CreateResult",
            object(vec![required("context", reference(CONTEXT))]),
        )
        .define(
            "BrowsingContext.GetTreeResult",
            object(vec![required(
                "contexts",
                reference("BrowsingContext.InfoList"),
            )]),
        )
        .define(
            "BrowsingContext.NavigateResult",
            object(vec![
                required("navigation", nullable(reference(NAVIGATION))),
                required("url", string()),
            ]),
        )
        .define(
            "BrowsingContext.PrintResult",
            object(vec![required("data", string())]),
        );
}

fn install_events(builder: &mut RegistryBuilder) {
    builder
        .define(
            "BrowsingContext.UserPromptClosedParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                required("accepted", boolean()),
                optional("userText", string()),
            ]),
        )
        .define(
            "BrowsingContext.UserPromptOpenedParameters",
            object(vec![
                required("context", reference(CONTEXT)),
                required(
                    "type",
                    one_of(&["alert", "confirm", "prompt", "beforeunload"]),
                ),
                required("message", string()),
            ]),
        );
}
