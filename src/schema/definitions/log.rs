//! `Log` namespace.
//!
//! `Log.GenericLogEntry` types its discriminant as a plain string and
//! becomes the fallback of the `Log.Entry` table.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    Field, SchemaNode, list, literal, merge, nullable, object, one_of, optional, reference,
    required, string, tagged,
};

fn entry(extra: Vec<Field>) -> SchemaNode {
    object(merge(vec![
        vec![
            required("level", reference("Log.Level")),
            required("source", reference("Script.Source")),
            required("text", nullable(string())),
            required("timestamp", reference("JsUint")),
            optional("stackTrace", reference("Script.StackTrace")),
        ],
        extra,
    ]))
}

pub(super) fn install(builder: &mut RegistryBuilder) {
    builder
        .define("Log.Level", one_of(&["debug", "info", "warn", "error"]))
        .define(
            "Log.GenericLogEntry",
            entry(vec![required("type", string())]),
        )
        .define(
            "Log.ConsoleLogEntry",
            entry(vec![
                required("type", literal("console")),
                required("method", string()),
                required("args", list(reference("Script.RemoteValue"))),
            ]),
        )
        .define(
            "Log.JavascriptLogEntry",
            entry(vec![required("type", literal("javascript"))]),
        )
        .define(
            "Log.Entry",
            tagged(
                "type",
                vec![
                    reference("Log.GenericLogEntry"),
                    reference("Log.ConsoleLogEntry"),
                    reference("Log.JavascriptLogEntry"),
                ],
            ),
        );
}
