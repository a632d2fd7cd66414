//! Schema-checked conversion between wire JSON and typed values.
//!
//! | Direction | Steps |
//! |-----------|-------|
//! | Decode | validate → `serde_path_to_error` deserialize |
//! | Encode | serialize → validate (self-check) |
//!
//! A value that passes validation but fails to deserialize means the typed
//! model and the schema disagree. That is reported as [`Error::Decode`], never
//! as a protocol error.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{SchemaNode, SchemaRegistry};
use crate::validator::Validator;

// ============================================================================
// Codec
// ============================================================================

/// Validating encoder/decoder over a schema registry.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'r> {
    validator: Validator<'r>,
}

impl<'r> Codec<'r> {
    /// Creates a codec over `registry`.
    #[inline]
    #[must_use]
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            validator: Validator::new(registry),
        }
    }

    /// Returns the validator used for checks.
    #[inline]
    #[must_use]
    pub fn validator(&self) -> Validator<'r> {
        self.validator
    }

    /// Validates `value` against `schema`, then decodes it.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the value violates the schema
    /// - [`Error::Decode`] if the typed model rejects a valid value
    pub fn decode<T: DeserializeOwned>(&self, value: Value, schema: &SchemaNode) -> Result<T> {
        self.validator.validate(&value, schema).into_result()?;
        Self::decode_validated(value)
    }

    /// Validates `value` against the named type, then decodes it.
    ///
    /// # Errors
    ///
    /// As [`Codec::decode`], plus [`Error::UnknownType`].
    pub fn decode_type<T: DeserializeOwned>(&self, value: Value, name: &str) -> Result<T> {
        let schema = self.validator.registry().resolve(name)?;
        self.decode(value, schema)
    }

    /// Decodes a value that already passed validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] with the path of the rejected field.
    pub fn decode_validated<T: DeserializeOwned>(value: Value) -> Result<T> {
        serde_path_to_error::deserialize(value).map_err(Error::decode)
    }

    /// Serializes `value` and checks the result against `schema`.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if serialization fails
    /// - [`Error::Validation`] if the output violates the schema
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T, schema: &SchemaNode) -> Result<Value> {
        let json = serde_json::to_value(value)?;
        self.validator.validate(&json, schema).into_result()?;
        Ok(json)
    }

    /// Serializes `value` and checks it against the named type.
    ///
    /// # Errors
    ///
    /// As [`Codec::encode`], plus [`Error::UnknownType`].
    pub fn encode_type<T: Serialize + ?Sized>(&self, value: &T, name: &str) -> Result<Value> {
        let schema = self.validator.registry().resolve(name)?;
        self.encode(value, schema)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::{BrowsingContext, Realm};
    use crate::protocol::browsing_context::{GetTreeResult, Info};
    use crate::protocol::input::{
        PerformActionsParameters, PointerButtonAction, PointerSourceAction, PointerSourceActions,
        SourceActions,
    };
    use crate::protocol::log::Entry;
    use crate::protocol::script::{
        EvaluateResult, EvaluateResultSuccess, JsNumber, RemoteValue, SpecialNumber,
    };
    use crate::protocol::session::{CapabilityRequest, NewResult, StatusResult};
    use crate::validator::Reason;

    fn registry() -> &'static SchemaRegistry {
        SchemaRegistry::global().expect("registry")
    }

    #[test]
    fn test_decode_status_result() {
        let codec = Codec::new(registry());
        let status: StatusResult = codec
            .decode_type(json!({"ready": true, "message": "ok"}), "Session.StatusResult")
            .expect("decode");
        assert_eq!(
            status,
            StatusResult {
                ready: true,
                message: "ok".into()
            }
        );
    }

    #[test]
    fn test_decode_rejects_before_deserializing() {
        let codec = Codec::new(registry());
        let err = codec
            .decode_type::<StatusResult>(json!({"ready": "yes", "message": "ok"}), "Session.StatusResult")
            .expect_err("ready must be boolean");
        let Error::Validation(violation) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violation.path.to_string(), "ready");
        assert!(matches!(violation.reason, Reason::TypeMismatch { .. }));
    }

    #[test]
    fn test_new_result_round_trip_keeps_vendor_capabilities() {
        let codec = Codec::new(registry());
        let json = json!({
            "sessionId": "s-1",
            "capabilities": {
                "acceptInsecureCerts": false,
                "browserName": "firefox",
                "browserVersion": "140.0",
                "platformName": "linux",
                "proxy": {},
                "setWindowRect": true,
                "moz:profile": "/tmp/p",
                "userAgent": "Mozilla/5.0"
            }
        });
        let result: NewResult = codec.decode_type(json.clone(), "Session.NewResult").expect("decode");
        assert_eq!(result.capabilities.extensible.len(), 2);

        let encoded = codec.encode_type(&result, "Session.NewResult").expect("encode");
        assert_eq!(encoded, json);
        let back: NewResult = codec.decode_type(encoded, "Session.NewResult").expect("decode");
        assert_eq!(back, result);
    }

    #[test]
    fn test_special_number_round_trip() {
        let codec = Codec::new(registry());
        let value = RemoteValue::Number {
            value: JsNumber::Special(SpecialNumber::NegativeInfinity),
        };
        let encoded = codec.encode_type(&value, "Script.RemoteValue").expect("encode");
        assert_eq!(encoded, json!({"type": "number", "value": "-Infinity"}));
        let back: RemoteValue = codec.decode_type(encoded, "Script.RemoteValue").expect("decode");
        assert_eq!(back, value);
    }

    #[test]
    fn test_evaluate_result_round_trip() {
        let codec = Codec::new(registry());
        let result = EvaluateResult::Success(EvaluateResultSuccess {
            result: RemoteValue::String {
                value: "hi".into(),
            },
            realm: Realm::new("r1"),
        });
        let encoded = codec.encode_type(&result, "Script.EvaluateResult").expect("encode");
        let back: EvaluateResult =
            codec.decode_type(encoded, "Script.EvaluateResult").expect("decode");
        assert_eq!(back, result);
    }

    #[test]
    fn test_get_tree_round_trip() {
        let codec = Codec::new(registry());
        let tree = GetTreeResult {
            contexts: vec![Info {
                context: BrowsingContext::new("top"),
                url: "https://example.com/".into(),
                children: Some(vec![Info {
                    context: BrowsingContext::new("frame"),
                    url: "about:blank".into(),
                    children: None,
                    parent: Some(Some(BrowsingContext::new("top"))),
                }]),
                parent: Some(None),
            }],
        };
        let encoded = codec
            .encode_type(&tree, "BrowsingContext.GetTreeResult")
            .expect("encode");
        let back: GetTreeResult = codec
            .decode_type(encoded, "BrowsingContext.GetTreeResult")
            .expect("decode");
        assert_eq!(back, tree);
    }

    #[test]
    fn test_encode_self_check_catches_out_of_range_tilt() {
        let codec = Codec::new(registry());
        let mut down = PointerButtonAction::default();
        down.common.tilt_x = Some(120.0);
        let params = PerformActionsParameters {
            context: BrowsingContext::new("c"),
            actions: vec![SourceActions::Pointer(PointerSourceActions {
                id: "mouse".into(),
                parameters: None,
                actions: vec![PointerSourceAction::PointerDown(down)],
            })],
        };
        let err = codec
            .encode_type(&params, "Input.PerformActionsParameters")
            .expect_err("tiltX out of range");
        let Error::Validation(violation) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violation.path.to_string(), "actions[0].actions[0].tiltX");
    }

    #[test]
    fn test_capability_request_extension_order_is_stable() {
        let codec = Codec::new(registry());
        let json = json!({"browserName": "firefox", "z:last": 1, "a:first": 2});
        let request: CapabilityRequest = codec
            .decode_type(json.clone(), "Session.CapabilityRequest")
            .expect("decode");
        let keys: Vec<_> = request.extensible.keys().cloned().collect();
        assert_eq!(keys, ["z:last", "a:first"]);
        let encoded = codec
            .encode_type(&request, "Session.CapabilityRequest")
            .expect("encode");
        let encoded_keys: Vec<_> = encoded
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect();
        assert_eq!(encoded_keys, ["browserName", "z:last", "a:first"]);
    }

    #[test]
    fn test_javascript_log_entry_decodes() {
        let codec = Codec::new(registry());
        let entry: Entry = codec
            .decode_type(
                json!({
                    "level": "error",
                    "source": {"realm": "r1"},
                    "text": "boom",
                    "timestamp": 12345,
                    "type": "javascript"
                }),
                "Log.Entry",
            )
            .expect("decode");
        assert!(matches!(entry, Entry::Javascript(_)));
        assert_eq!(entry.text(), Some("boom"));
    }
}

#[cfg(test)]
mod proptests {
    use std::fmt::Debug;

    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    use super::*;
    use crate::identifiers::{BrowsingContext, Channel, Handle, MAX_SAFE_INTEGER, SharedId};
    use crate::protocol::Extensible;
    use crate::protocol::browsing_context::{GetTreeResult, Info};
    use crate::protocol::script::{
        ArgumentValue, ChannelValue, DateRemoteValue, IncludeShadowTree, JsNumber,
        ListRemoteValue, LocalValue, MappingEntry, MappingKey, MappingRemoteValue, NodeProperties,
        NodeRemoteValue, RegExpRemoteValue, RegExpValue, RemoteHandle, RemoteObject,
        RemoteObjectReference, RemoteReference, RemoteValue, ResultOwnership, SerializationOptions,
        ShadowRootMode, SharedReference, SpecialNumber, WindowProxyProperties,
        WindowProxyRemoteValue,
    };
    use crate::protocol::session::CapabilityRequest;

    /// Encodes, decodes and re-encodes `value`, returning the first encoding.
    fn round_trip<T>(value: &T, schema: &str) -> std::result::Result<Value, TestCaseError>
    where
        T: Serialize + DeserializeOwned + PartialEq + Debug,
    {
        let codec = Codec::new(SchemaRegistry::global().expect("registry"));
        let encoded = codec
            .encode_type(value, schema)
            .map_err(|err| TestCaseError::fail(format!("encode: {err}")))?;
        let back: T = codec
            .decode_type(encoded.clone(), schema)
            .map_err(|err| TestCaseError::fail(format!("decode: {err}")))?;
        prop_assert_eq!(&back, value);

        let again = codec
            .encode_type(&back, schema)
            .map_err(|err| TestCaseError::fail(format!("re-encode: {err}")))?;
        prop_assert_eq!(encoded.to_string(), again.to_string());
        Ok(encoded)
    }

    // ========================================================================
    // Strategies
    // ========================================================================

    fn js_number() -> impl Strategy<Value = JsNumber> {
        prop_oneof![
            any::<i64>().prop_map(JsNumber::from),
            // Dyadic fractions survive the default float parser bit for bit.
            (-(1i64 << 20)..(1i64 << 20), 0..=8i32)
                .prop_map(|(mantissa, shift)| JsNumber::from_f64(mantissa as f64 / f64::from(1 << shift))),
            Just(JsNumber::from_f64(-0.0)),
            Just(JsNumber::from_f64(f64::NAN)),
            prop_oneof![
                Just(SpecialNumber::NaN),
                Just(SpecialNumber::NegativeZero),
                Just(SpecialNumber::Infinity),
                Just(SpecialNumber::NegativeInfinity),
            ]
            .prop_map(JsNumber::Special),
        ]
    }

    fn extensions() -> impl Strategy<Value = Extensible> {
        let value = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z ]{0,6}".prop_map(Value::from),
        ];
        prop::collection::vec(("[a-z]{1,5}:[a-z]{1,5}", value), 0..5)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    fn remote_handle() -> impl Strategy<Value = RemoteHandle> {
        (
            proptest::option::of("[a-z0-9-]{1,8}"),
            proptest::option::of(0..=MAX_SAFE_INTEGER),
        )
            .prop_map(|(handle, internal_id)| RemoteHandle {
                handle: handle.map(Handle::new),
                internal_id,
            })
    }

    fn regexp() -> impl Strategy<Value = RegExpValue> {
        ("[a-z.*+]{0,6}", proptest::option::of("[gimsuy]{0,3}"))
            .prop_map(|(pattern, flags)| RegExpValue { pattern, flags })
    }

    fn node_leaf() -> impl Strategy<Value = NodeRemoteValue> {
        (proptest::option::of("[a-z0-9]{1,8}"), remote_handle()).prop_map(|(shared_id, handle)| {
            NodeRemoteValue {
                shared_id: shared_id.map(SharedId::new),
                handle,
                value: None,
            }
        })
    }

    fn shadow_root() -> impl Strategy<Value = Option<Option<Box<RemoteValue>>>> {
        prop_oneof![
            Just(None),
            Just(Some(None)),
            node_leaf().prop_map(|node| Some(Some(Box::new(RemoteValue::Node(node))))),
        ]
    }

    fn node() -> impl Strategy<Value = RemoteValue> {
        (
            node_leaf(),
            1..=12u64,
            proptest::option::of(prop::collection::btree_map("[a-z]{1,5}", "[a-z ]{0,5}", 0..3)),
            proptest::option::of(prop::collection::vec(node_leaf().prop_map(RemoteValue::Node), 0..3)),
            proptest::option::of(prop_oneof![Just(ShadowRootMode::Open), Just(ShadowRootMode::Closed)]),
            shadow_root(),
        )
            .prop_map(|(mut node, node_type, attributes, children, mode, shadow_root)| {
                node.value = Some(NodeProperties {
                    node_type,
                    child_node_count: children.as_ref().map_or(0, |c| c.len() as u64),
                    attributes,
                    children,
                    local_name: Some("div".into()),
                    mode,
                    namespace_uri: None,
                    node_value: None,
                    shadow_root,
                });
                RemoteValue::Node(node)
            })
    }

    fn remote_leaf() -> impl Strategy<Value = RemoteValue> {
        prop_oneof![
            Just(RemoteValue::Undefined),
            Just(RemoteValue::Null),
            any::<String>().prop_map(|value| RemoteValue::String { value }),
            js_number().prop_map(|value| RemoteValue::Number { value }),
            any::<bool>().prop_map(|value| RemoteValue::Boolean { value }),
            "-?[0-9]{1,20}".prop_map(|value| RemoteValue::BigInt { value }),
            remote_handle().prop_map(|handle| RemoteValue::Symbol(RemoteObject { handle })),
            remote_handle().prop_map(|handle| RemoteValue::Promise(RemoteObject { handle })),
            (remote_handle(), regexp())
                .prop_map(|(handle, value)| RemoteValue::RegExp(RegExpRemoteValue { handle, value })),
            (remote_handle(), "[0-9T:Z-]{1,20}")
                .prop_map(|(handle, value)| RemoteValue::Date(DateRemoteValue { handle, value })),
            (remote_handle(), "[a-z0-9]{1,8}").prop_map(|(handle, context)| {
                RemoteValue::Window(WindowProxyRemoteValue {
                    value: WindowProxyProperties {
                        context: BrowsingContext::new(context),
                    },
                    handle,
                })
            }),
            node(),
        ]
    }

    fn remote_value() -> impl Strategy<Value = RemoteValue> {
        remote_leaf().prop_recursive(3, 24, 4, |inner| {
            let entries = prop::collection::vec(
                (
                    prop_oneof![
                        "[a-z]{1,6}".prop_map(MappingKey::Text),
                        inner.clone().prop_map(MappingKey::Value),
                    ],
                    inner.clone(),
                )
                    .prop_map(|(key, value)| MappingEntry(key, value)),
                0..4,
            )
            .boxed();
            let items = prop::collection::vec(inner, 0..4).boxed();
            prop_oneof![
                (remote_handle(), proptest::option::of(items.clone()))
                    .prop_map(|(handle, value)| RemoteValue::Array(ListRemoteValue { handle, value })),
                (remote_handle(), proptest::option::of(items))
                    .prop_map(|(handle, value)| RemoteValue::NodeList(ListRemoteValue { handle, value })),
                (remote_handle(), proptest::option::of(entries.clone()))
                    .prop_map(|(handle, value)| RemoteValue::Object(MappingRemoteValue { handle, value })),
                (remote_handle(), proptest::option::of(entries))
                    .prop_map(|(handle, value)| RemoteValue::Map(MappingRemoteValue { handle, value })),
            ]
        })
    }

    fn local_value() -> impl Strategy<Value = LocalValue> {
        let leaf = prop_oneof![
            Just(LocalValue::Undefined),
            Just(LocalValue::Null),
            any::<String>().prop_map(|value| LocalValue::String { value }),
            js_number().prop_map(|value| LocalValue::Number { value }),
            any::<bool>().prop_map(|value| LocalValue::Boolean { value }),
            "-?[0-9]{1,20}".prop_map(|value| LocalValue::BigInt { value }),
            "[0-9T:Z-]{1,20}".prop_map(|value| LocalValue::Date { value }),
            regexp().prop_map(|value| LocalValue::RegExp { value }),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            let entries = prop::collection::vec(
                (
                    prop_oneof![
                        "[a-z]{1,6}".prop_map(MappingKey::Text),
                        inner.clone().prop_map(MappingKey::Value),
                    ],
                    inner.clone(),
                )
                    .prop_map(|(key, value)| MappingEntry(key, value)),
                0..4,
            )
            .boxed();
            let items = prop::collection::vec(inner, 0..4).boxed();
            prop_oneof![
                items.clone().prop_map(|value| LocalValue::Array { value }),
                items.prop_map(|value| LocalValue::Set { value }),
                entries.clone().prop_map(|value| LocalValue::Map { value }),
                entries.prop_map(|value| LocalValue::Object { value }),
            ]
        })
    }

    fn nullable_limit() -> impl Strategy<Value = Option<Option<u64>>> {
        prop_oneof![
            Just(None),
            Just(Some(None)),
            (0..=MAX_SAFE_INTEGER).prop_map(|limit| Some(Some(limit))),
        ]
    }

    fn serialization_options() -> impl Strategy<Value = SerializationOptions> {
        (
            nullable_limit(),
            nullable_limit(),
            proptest::option::of(prop_oneof![
                Just(IncludeShadowTree::None),
                Just(IncludeShadowTree::Open),
                Just(IncludeShadowTree::All),
            ]),
        )
            .prop_map(|(max_dom_depth, max_object_depth, include_shadow_tree)| {
                SerializationOptions {
                    max_dom_depth,
                    max_object_depth,
                    include_shadow_tree,
                }
            })
    }

    fn argument_value() -> impl Strategy<Value = ArgumentValue> {
        let channel = (
            "[a-z0-9]{1,8}",
            proptest::option::of(serialization_options()),
            proptest::option::of(prop_oneof![Just(ResultOwnership::Root), Just(ResultOwnership::None)]),
        )
            .prop_map(|(channel, serialization_options, ownership)| {
                let mut value = ChannelValue::new(Channel::new(channel));
                value.value.serialization_options = serialization_options;
                value.value.ownership = ownership;
                ArgumentValue::Channel(value)
            });
        let shared = ("[a-z0-9]{1,8}", proptest::option::of("[a-z0-9]{1,8}"), extensions()).prop_map(
            |(shared_id, handle, extensible)| {
                ArgumentValue::Reference(RemoteReference::Shared(SharedReference {
                    shared_id: SharedId::new(shared_id),
                    handle: handle.map(Handle::new),
                    extensible,
                }))
            },
        );
        // With a sharedId the same wire shape decodes as a shared reference.
        let object = ("[a-z0-9]{1,8}", extensions()).prop_map(|(handle, extensible)| {
            ArgumentValue::Reference(RemoteReference::Object(RemoteObjectReference {
                handle: Handle::new(handle),
                shared_id: None,
                extensible,
            }))
        });
        prop_oneof![local_value().prop_map(ArgumentValue::Local), channel, shared, object]
    }

    fn parent() -> impl Strategy<Value = Option<Option<BrowsingContext>>> {
        prop_oneof![
            Just(None),
            Just(Some(None)),
            "[a-z0-9]{1,8}".prop_map(|context| Some(Some(BrowsingContext::new(context)))),
        ]
    }

    fn context_info() -> impl Strategy<Value = Info> {
        let leaf = ("[a-z0-9]{1,8}", "[a-z:/.]{0,12}", parent()).prop_map(|(context, url, parent)| Info {
            context: BrowsingContext::new(context),
            url,
            children: None,
            parent,
        });
        (
            "[a-z0-9]{1,8}",
            "[a-z:/.]{0,12}",
            parent(),
            proptest::option::of(prop::collection::vec(leaf, 0..3)),
        )
            .prop_map(|(context, url, parent, children)| Info {
                context: BrowsingContext::new(context),
                url,
                children,
                parent,
            })
    }

    // ========================================================================
    // Properties
    // ========================================================================

    proptest! {
        #[test]
        fn remote_values_round_trip(value in remote_value()) {
            round_trip(&value, "Script.RemoteValue")?;
        }

        #[test]
        fn local_values_round_trip(value in local_value()) {
            round_trip(&value, "Script.LocalValue")?;
        }

        #[test]
        fn argument_values_round_trip(value in argument_value()) {
            round_trip(&value, "Script.ArgumentValue")?;
        }

        #[test]
        fn nullable_fields_round_trip(contexts in prop::collection::vec(context_info(), 0..4)) {
            round_trip(&GetTreeResult { contexts }, "BrowsingContext.GetTreeResult")?;
        }

        #[test]
        fn extension_keys_keep_insertion_order(extensible in extensions()) {
            let request = CapabilityRequest {
                browser_name: Some("firefox".into()),
                extensible: extensible.clone(),
                ..CapabilityRequest::default()
            };
            let encoded = round_trip(&request, "Session.CapabilityRequest")?;

            let expected: Vec<&String> = extensible.keys().collect();
            let object = encoded.as_object().expect("object");
            let encoded_keys: Vec<&String> = object.keys().filter(|key| key.contains(':')).collect();
            prop_assert_eq!(encoded_keys, expected);
        }
    }
}
