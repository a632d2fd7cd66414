//! `Input` namespace: action sources for `input.performActions`.
//!
//! Pointer actions accept either tilt or angle properties. Both groups are
//! optional, so they are merged into one set of optional fields.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    Field, SchemaNode, choice, list, literal, merge, number, number_in, object, one_of, optional,
    reference, required, string, tagged,
};

fn typed(tag: &'static str, fields: Vec<Field>) -> SchemaNode {
    object(merge(vec![vec![required("type", literal(tag))], fields]))
}

fn source(tag: &'static str, action: &'static str, extra: Vec<Field>) -> SchemaNode {
    typed(
        tag,
        merge(vec![
            vec![required("id", string())],
            extra,
            vec![required("actions", list(reference(action)))],
        ]),
    )
}

fn pointer_common() -> Vec<Field> {
    vec![
        optional("width", reference("JsUint")),
        optional("height", reference("JsUint")),
        optional("pressure", number()),
        optional("tangentialPressure", number()),
        optional("twist", number_in(0.0, 359.0)),
        optional("tiltX", number_in(-90.0, 90.0)),
        optional("tiltY", number_in(-90.0, 90.0)),
        optional("altitudeAngle", number()),
        optional("azimuthAngle", number()),
    ]
}

pub(super) fn install(builder: &mut RegistryBuilder) {
    builder
        .define(
            "Input.ElementOrigin",
            typed(
                "element",
                vec![required("element", reference("Script.SharedReference"))],
            ),
        )
        .define(
            "Input.Origin",
            choice(vec![
                one_of(&["viewport", "pointer"]),
                reference("Input.ElementOrigin"),
            ]),
        )
        .define("Input.PointerType", one_of(&["mouse", "pen", "touch"]))
        .define(
            "Input.PointerParameters",
            object(vec![optional("pointerType", reference("Input.PointerType"))]),
        )
        .define(
            "Input.PauseAction",
            typed("pause", vec![optional("duration", reference("JsUint"))]),
        )
        .define(
            "Input.KeyDownAction",
            typed("keyDown", vec![required("value", string())]),
        )
        .define(
            "Input.KeyUpAction",
            typed("keyUp", vec![required("value", string())]),
        )
        .define(
            "Input.PointerDownAction",
            typed(
                "pointerDown",
                merge(vec![
                    vec![required("button", reference("JsUint"))],
                    pointer_common(),
                ]),
            ),
        )
        .define(
            "Input.PointerUpAction",
            typed(
                "pointerUp",
                merge(vec![
                    vec![required("button", reference("JsUint"))],
                    pointer_common(),
                ]),
            ),
        )
        .define(
            "Input.PointerMoveAction",
            typed(
                "pointerMove",
                merge(vec![
                    vec![
                        required("x", reference("JsInt")),
                        required("y", reference("JsInt")),
                        optional("duration", reference("JsUint")),
                        optional("origin", reference("Input.Origin")),
                    ],
                    pointer_common(),
                ]),
            ),
        )
        .define(
            "Input.WheelScrollAction",
            typed(
                "scroll",
                vec![
                    required("x", reference("JsInt")),
                    required("y", reference("JsInt")),
                    required("deltaX", reference("JsInt")),
                    required("deltaY", reference("JsInt")),
                    optional("duration", reference("JsUint")),
                    optional("origin", reference("Input.Origin")),
                ],
            ),
        )
        .define(
            "Input.NoneSourceAction",
            tagged("type", vec![reference("Input.PauseAction")]),
        )
        .define(
            "Input.KeySourceAction",
            tagged(
                "type",
                vec![
                    reference("Input.PauseAction"),
                    reference("Input.KeyDownAction"),
                    reference("Input.KeyUpAction"),
                ],
            ),
        )
        .define(
            "Input.PointerSourceAction",
            tagged(
                "type",
                vec![
                    reference("Input.PauseAction"),
                    reference("Input.PointerDownAction"),
                    reference("Input.PointerUpAction"),
                    reference("Input.PointerMoveAction"),
                ],
            ),
        )
        .define(
            "Input.WheelSourceAction",
            tagged(
                "type",
                vec![
                    reference("Input.PauseAction"),
                    reference("Input.WheelScrollAction"),
                ],
            ),
        )
        .define(
            "Input.NoneSourceActions",
            source("none", "Input.NoneSourceAction", vec![]),
        )
        .define(
            "Input.KeySourceActions",
            source("key", "Input.KeySourceAction", vec![]),
        )
        .define(
            "Input.PointerSourceActions",
            source(
                "pointer",
                "Input.PointerSourceAction",
                vec![optional("parameters", reference("Input.PointerParameters"))],
            ),
        )
        .define(
            "Input.WheelSourceActions",
            source("wheel", "Input.WheelSourceAction", vec![]),
        )
        .define(
            "Input.SourceActions",
            tagged(
                "type",
                vec![
                    reference("Input.NoneSourceActions"),
                    reference("Input.KeySourceActions"),
                    reference("Input.PointerSourceActions"),
                    reference("Input.WheelSourceActions"),
                ],
            ),
        )
        .define(
            "Input.PerformActionsParameters",
            object(vec![
                required("context", reference("BrowsingContext.BrowsingContext")),
                required("actions", list(reference("Input.SourceActions"))),
            ]),
        )
        .define(
            "Input.ReleaseActionsParameters",
            object(vec![required(
                "context",
                reference("BrowsingContext.BrowsingContext"),
            )]),
        );
}
