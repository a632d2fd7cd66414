//! `Script` namespace: local and remote values, realms, targets and the
//! script commands.
//!
//! `Script.RemoteValue` and `Script.LocalValue` both embed
//! `Script.PrimitiveProtocolValue`; the registry flattens it into their
//! discriminant tables.

use crate::schema::registry::RegistryBuilder;
use crate::schema::{
    Field, SchemaNode, boolean, choice, extensible, list, literal, map_of, merge, nullable, number,
    object, one_of, optional, reference, required, string, tagged, tuple,
};

const CONTEXT: &str = "BrowsingContext.BrowsingContext";

const REALM_TYPES: &[&str] = &[
    "window",
    "dedicated-worker",
    "shared-worker",
    "service-worker",
    "worker",
    "paint-worklet",
    "audio-worklet",
    "worklet",
];

/// `handle` and `internalId` shared by every non-primitive remote value.
fn remote_handle() -> Vec<Field> {
    vec![
        optional("handle", reference("Script.Handle")),
        optional("internalId", reference("Script.InternalId")),
    ]
}

fn typed(tag: &'static str, fields: Vec<Field>) -> SchemaNode {
    object(merge(vec![vec![required("type", literal(tag))], fields]))
}

fn base_realm_info(tag: &'static str, extra: Vec<Field>) -> SchemaNode {
    object(merge(vec![
        vec![
            required("realm", reference("Script.Realm")),
            required("origin", string()),
            required("type", literal(tag)),
        ],
        extra,
    ]))
}

pub(super) fn install(builder: &mut RegistryBuilder) {
    install_identifiers(builder);
    install_primitives(builder);
    install_local_values(builder);
    install_remote_values(builder);
    install_realms(builder);
    install_commands(builder);
}

fn install_identifiers(builder: &mut RegistryBuilder) {
    builder
        .define("Script.Channel", string())
        .define("Script.Handle", string())
        .define("Script.PreloadScript", string())
        .define("Script.Realm", string())
        .define("Script.SharedId", string())
        .define("Script.InternalId", reference("JsUint"))
        .define("Script.ResultOwnership", one_of(&["root", "none"]))
        .define("Script.RealmType", one_of(REALM_TYPES))
        .define(
            "Script.SerializationOptions",
            object(vec![
                optional("maxDomDepth", nullable(reference("JsUint"))),
                optional("maxObjectDepth", nullable(reference("JsUint"))),
                optional("includeShadowTree", one_of(&["none", "open", "all"])),
            ]),
        )
        .define(
            "Script.StackFrame",
            object(vec![
                required("columnNumber", reference("JsUint")),
                required("functionName", string()),
                required("lineNumber", reference("JsUint")),
                required("url", string()),
            ]),
        )
        .define(
            "Script.StackTrace",
            object(vec![required("callFrames", list(reference("Script.StackFrame")))]),
        )
        .define(
            "Script.Source",
            object(vec![
                required("realm", reference("Script.Realm")),
                optional("context", reference(CONTEXT)),
            ]),
        );
}

fn install_primitives(builder: &mut RegistryBuilder) {
    builder
        .define(
            "Script.SpecialNumber",
            one_of(&["NaN", "-0", "Infinity", "-Infinity"]),
        )
        .define("Script.UndefinedValue", typed("undefined", vec![]))
        .define("Script.NullValue", typed("null", vec![]))
        .define(
            "Script.StringValue",
            typed("string", vec![required("value", string())]),
        )
        .define(
            "Script.NumberValue",
            typed(
                "number",
                vec![required(
                    "value",
                    choice(vec![reference("Script.SpecialNumber"), number()]),
                )],
            ),
        )
        .define(
            "Script.BooleanValue",
            typed("boolean", vec![required("value", boolean())]),
        )
        .define(
            "Script.BigIntValue",
            typed("bigint", vec![required("value", string())]),
        )
        .define(
            "Script.PrimitiveProtocolValue",
            tagged(
                "type",
                vec![
                    reference("Script.UndefinedValue"),
                    reference("Script.NullValue"),
                    reference("Script.StringValue"),
                    reference("Script.NumberValue"),
                    reference("Script.BooleanValue"),
                    reference("Script.BigIntValue"),
                ],
            ),
        );
}

fn install_local_values(builder: &mut RegistryBuilder) {
    builder
        .define("Script.ListLocalValue", list(reference("Script.LocalValue")))
        .define(
            "Script.MappingLocalValue",
            list(tuple(vec![
                choice(vec![reference("Script.LocalValue"), string()]),
                reference("Script.LocalValue"),
            ])),
        )
        .define(
            "Script.ArrayLocalValue",
            typed("array", vec![required("value", reference("Script.ListLocalValue"))]),
        )
        .define(
            "Script.DateLocalValue",
            typed("date", vec![required("value", string())]),
        )
        .define(
            "Script.MapLocalValue",
            typed("map", vec![required("value", reference("Script.MappingLocalValue"))]),
        )
        .define(
            "Script.ObjectLocalValue",
            typed(
                "object",
                vec![required("value", reference("Script.MappingLocalValue"))],
            ),
        )
        .define(
            "Script.RegExpValue",
            object(vec![
                required("pattern", string()),
                optional("flags", string()),
            ]),
        )
        .define(
            "Script.RegExpLocalValue",
            typed("regexp", vec![required("value", reference("Script.RegExpValue"))]),
        )
        .define(
            "Script.SetLocalValue",
            typed("set", vec![required("value", reference("Script.ListLocalValue"))]),
        )
        .define(
            "Script.LocalValue",
            tagged(
                "type",
                vec![
                    reference("Script.PrimitiveProtocolValue"),
                    reference("Script.ArrayLocalValue"),
                    reference("Script.DateLocalValue"),
                    reference("Script.MapLocalValue"),
                    reference("Script.ObjectLocalValue"),
                    reference("Script.RegExpLocalValue"),
                    reference("Script.SetLocalValue"),
                ],
            ),
        )
        .define(
            "Script.ChannelProperties",
            object(vec![
                required("channel", reference("Script.Channel")),
                optional("serializationOptions", reference("Script.SerializationOptions")),
                optional("ownership", reference("Script.ResultOwnership")),
            ]),
        )
        .define(
            "Script.ChannelValue",
            typed("channel", vec![required("value", reference("Script.ChannelProperties"))]),
        )
        .define(
            "Script.SharedReference",
            extensible(vec![
                required("sharedId", reference("Script.SharedId")),
                optional("handle", reference("Script.Handle")),
            ]),
        )
        .define(
            "Script.RemoteObjectReference",
            extensible(vec![
                required("handle", reference("Script.Handle")),
                optional("sharedId", reference("Script.SharedId")),
            ]),
        )
        .define(
            "Script.RemoteReference",
            choice(vec![
                reference("Script.SharedReference"),
                reference("Script.RemoteObjectReference"),
            ]),
        )
        // Tagged values first; references carry no `type`.
        .define(
            "Script.ArgumentValue",
            choice(vec![
                tagged(
                    "type",
                    vec![reference("Script.LocalValue"), reference("Script.ChannelValue")],
                ),
                reference("Script.RemoteReference"),
            ]),
        );
}

fn install_remote_values(builder: &mut RegistryBuilder) {
    let list_value = || optional("value", reference("Script.ListRemoteValue"));
    let mapping_value = || optional("value", reference("Script.MappingRemoteValue"));

    builder
        .define("Script.ListRemoteValue", list(reference("Script.RemoteValue")))
        .define(
            "Script.MappingRemoteValue",
            list(tuple(vec![
                choice(vec![reference("Script.RemoteValue"), string()]),
                reference("Script.RemoteValue"),
            ])),
        );

    let handle_only = [
        ("Script.SymbolRemoteValue", "symbol"),
        ("Script.FunctionRemoteValue", "function"),
        ("Script.WeakMapRemoteValue", "weakmap"),
        ("Script.WeakSetRemoteValue", "weakset"),
        ("Script.IteratorRemoteValue", "iterator"),
        ("Script.GeneratorRemoteValue", "generator"),
        ("Script.ErrorRemoteValue", "error"),
        ("Script.ProxyRemoteValue", "proxy"),
        ("Script.PromiseRemoteValue", "promise"),
        ("Script.TypedArrayRemoteValue", "typedarray"),
        ("Script.ArrayBufferRemoteValue", "arraybuffer"),
    ];
    for (name, tag) in handle_only {
        builder.define(name, typed(tag, remote_handle()));
    }

    builder
        .define(
            "Script.ArrayRemoteValue",
            typed("array", merge(vec![remote_handle(), vec![list_value()]])),
        )
        .define(
            "Script.ObjectRemoteValue",
            typed("object", merge(vec![remote_handle(), vec![mapping_value()]])),
        )
        .define(
            "Script.RegExpRemoteValue",
            typed(
                "regexp",
                merge(vec![
                    remote_handle(),
                    vec![required("value", reference("Script.RegExpValue"))],
                ]),
            ),
        )
        .define(
            "Script.DateRemoteValue",
            typed(
                "date",
                merge(vec![remote_handle(), vec![required("value", string())]]),
            ),
        )
        .define(
            "Script.MapRemoteValue",
            typed("map", merge(vec![remote_handle(), vec![mapping_value()]])),
        )
        .define(
            "Script.SetRemoteValue",
            typed("set", merge(vec![remote_handle(), vec![list_value()]])),
        )
        .define(
            "Script.NodeListRemoteValue",
            typed("nodelist", merge(vec![remote_handle(), vec![list_value()]])),
        )
        .define(
            "Script.HtmlCollectionRemoteValue",
            typed(
                "htmlcollection",
                merge(vec![remote_handle(), vec![list_value()]]),
            ),
        )
        .define(
            "Script.NodeRemoteValue",
            typed(
                "node",
                merge(vec![
                    vec![optional("sharedId", reference("Script.SharedId"))],
                    remote_handle(),
                    vec![optional("value", reference("Script.NodeProperties"))],
                ]),
            ),
        )
        .define(
            "Script.NodeProperties",
            object(vec![
                required("nodeType", reference("JsUint")),
                required("childNodeCount", reference("JsUint")),
                optional("attributes", map_of(string())),
                optional("children", list(reference("Script.NodeRemoteValue"))),
                optional("localName", string()),
                optional("mode", one_of(&["open", "closed"])),
                optional("namespaceURI", string()),
                optional("nodeValue", string()),
                optional("shadowRoot", nullable(reference("Script.NodeRemoteValue"))),
            ]),
        )
        .define(
            "Script.WindowProxyProperties",
            object(vec![required("context", reference(CONTEXT))]),
        )
        .define(
            "Script.WindowProxyRemoteValue",
            typed(
                "window",
                merge(vec![
                    vec![required("value", reference("Script.WindowProxyProperties"))],
                    remote_handle(),
                ]),
            ),
        )
        .define(
            "Script.RemoteValue",
            tagged(
                "type",
                vec![
                    reference("Script.PrimitiveProtocolValue"),
                    reference("Script.SymbolRemoteValue"),
                    reference("Script.ArrayRemoteValue"),
                    reference("Script.ObjectRemoteValue"),
                    reference("Script.FunctionRemoteValue"),
                    reference("Script.RegExpRemoteValue"),
                    reference("Script.DateRemoteValue"),
                    reference("Script.MapRemoteValue"),
                    reference("Script.SetRemoteValue"),
                    reference("Script.WeakMapRemoteValue"),
                    reference("Script.WeakSetRemoteValue"),
                    reference("Script.IteratorRemoteValue"),
                    reference("Script.GeneratorRemoteValue"),
                    reference("Script.ErrorRemoteValue"),
                    reference("Script.ProxyRemoteValue"),
                    reference("Script.PromiseRemoteValue"),
                    reference("Script.TypedArrayRemoteValue"),
                    reference("Script.ArrayBufferRemoteValue"),
                    reference("Script.NodeListRemoteValue"),
                    reference("Script.HtmlCollectionRemoteValue"),
                    reference("Script.NodeRemoteValue"),
                    reference("Script.WindowProxyRemoteValue"),
                ],
            ),
        );
}

fn install_realms(builder: &mut RegistryBuilder) {
    builder
        .define(
            "Script.WindowRealmInfo",
            base_realm_info(
                "window",
                vec![
                    required("context", reference(CONTEXT)),
                    optional("sandbox", string()),
                ],
            ),
        )
        .define(
            "Script.DedicatedWorkerRealmInfo",
            base_realm_info("dedicated-worker", vec![]),
        )
        .define(
            "Script.SharedWorkerRealmInfo",
            base_realm_info("shared-worker", vec![]),
        )
        .define(
            "Script.ServiceWorkerRealmInfo",
            base_realm_info("service-worker", vec![]),
        )
        .define("Script.WorkerRealmInfo", base_realm_info("worker", vec![]))
        .define(
            "Script.PaintWorkletRealmInfo",
            base_realm_info("paint-worklet", vec![]),
        )
        .define(
            "Script.AudioWorkletRealmInfo",
            base_realm_info("audio-worklet", vec![]),
        )
        .define("Script.WorkletRealmInfo", base_realm_info("worklet", vec![]))
        .define(
            "Script.RealmInfo",
            tagged(
                "type",
                vec![
                    reference("Script.WindowRealmInfo"),
                    reference("Script.DedicatedWorkerRealmInfo"),
                    reference("Script.SharedWorkerRealmInfo"),
                    reference("Script.ServiceWorkerRealmInfo"),
                    reference("Script.WorkerRealmInfo"),
                    reference("Script.PaintWorkletRealmInfo"),
                    reference("Script.AudioWorkletRealmInfo"),
                    reference("Script.WorkletRealmInfo"),
                ],
            ),
        )
        .define(
            "Script.RealmDestroyedParameters",
            object(vec![required("realm", reference("Script.Realm"))]),
        )
        .define(
            "Script.MessageParameters",
            object(vec![
                required("channel", reference("Script.Channel")),
                required("data", reference("Script.RemoteValue")),
                required("source", reference("Script.Source")),
            ]),
        );
}

fn install_commands(builder: &mut RegistryBuilder) {
    builder
        .define(
            "Script.RealmTarget",
            object(vec![required("realm", reference("Script.Realm"))]),
        )
        .define(
            "Script.ContextTarget",
            object(vec![
                required("context", reference(CONTEXT)),
                optional("sandbox", string()),
            ]),
        )
        .define(
            "Script.Target",
            choice(vec![
                reference("Script.RealmTarget"),
                reference("Script.ContextTarget"),
            ]),
        )
        .define(
            "Script.AddPreloadScriptParameters",
            object(vec![
                required("functionDeclaration", string()),
                optional("arguments", list(reference("Script.ChannelValue"))),
                optional("sandbox", string()),
            ]),
        )
        .define(
            "Script.DisownParameters",
            object(vec![
                required("handles", list(reference("Script.Handle"))),
                required("target", reference("Script.Target")),
            ]),
        )
        .define(
            "Script.CallFunctionParameters",
            object(vec![
                required("functionDeclaration", string()),
                required("awaitPromise", boolean()),
                required("target", reference("Script.Target")),
                optional("arguments", list(reference("Script.ArgumentValue"))),
                optional("resultOwnership", reference("Script.ResultOwnership")),
                optional("serializationOptions", reference("Script.SerializationOptions")),
                optional("this", reference("Script.ArgumentValue")),
            ]),
        )
        .define(
            "Script.EvaluateParameters",
            object(vec![
                required("expression", string()),
                required("target", reference("Script.Target")),
                required("awaitPromise", boolean()),
                optional("resultOwnership", reference("Script.ResultOwnership")),
                optional("serializationOptions", reference("Script.SerializationOptions")),
            ]),
        )
        .define(
            "Script.GetRealmsParameters",
            object(vec![
                optional("context", reference(CONTEXT)),
                optional("type", reference("Script.RealmType")),
            ]),
        )
        .define(
            "Script.RemovePreloadScriptParameters",
            object(vec![required("script", reference("Script.PreloadScript"))]),
        )
        .define(
            "Script.AddPreloadScriptResult",
            object(vec![required("script", reference("Script.PreloadScript"))]),
        )
        .define(
            "Script.GetRealmsResult",
            object(vec![required("realms", list(reference("Script.RealmInfo")))]),
        )
        .define(
            "Script.ExceptionDetails",
            object(vec![
                required("columnNumber", reference("JsUint")),
                required("exception", reference("Script.RemoteValue")),
                required("lineNumber", reference("JsUint")),
                required("stackTrace", reference("Script.StackTrace")),
                required("text", string()),
            ]),
        )
        .define(
            "Script.EvaluateResultSuccess",
            typed(
                "success",
                vec![
                    required("result", reference("Script.RemoteValue")),
                    required("realm", reference("Script.Realm")),
                ],
            ),
        )
        .define(
            "Script.EvaluateResultException",
            typed(
                "exception",
                vec![
                    required("exceptionDetails", reference("Script.ExceptionDetails")),
                    required("realm", reference("Script.Realm")),
                ],
            ),
        )
        .define(
            "Script.EvaluateResult",
            tagged(
                "type",
                vec![
                    reference("Script.EvaluateResultSuccess"),
                    reference("Script.EvaluateResultException"),
                ],
            ),
        );
}
