//! `script` namespace: local and remote values, realms and evaluation.
//!
//! # Value Model
//!
//! | Type | Direction | Notes |
//! |------|-----------|-------|
//! | [`LocalValue`] | Local → Remote | Serialized JavaScript value |
//! | [`RemoteValue`] | Remote → Local | 27 `type` tags, non-primitives carry a handle |
//! | [`ArgumentValue`] | Local → Remote | Local value, channel or remote reference |
//!
//! Untagged enums here try their alternatives in the same order the
//! validator tries them.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::identifiers::{BrowsingContext, Channel, Handle, PreloadScript, Realm, SharedId};

use super::{Extensible, nullable, tag_literal};

// ============================================================================
// Shared Types
// ============================================================================

/// Who owns the handles of returned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOwnership {
    Root,
    None,
}

/// Shadow tree serialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeShadowTree {
    None,
    Open,
    All,
}

/// Limits for serializing remote values.
///
/// `Some(None)` sends an explicit `null`, meaning no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub max_dom_depth: Option<Option<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub max_object_depth: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_shadow_tree: Option<IncludeShadowTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub column_number: u64,
    pub function_name: String,
    pub line_number: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    pub call_frames: Vec<StackFrame>,
}

/// Realm (and context, for window realms) a value or message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub realm: Realm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContext>,
}

// ============================================================================
// Numbers
// ============================================================================

/// Numbers JSON cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialNumber {
    NaN,
    #[serde(rename = "-0")]
    NegativeZero,
    Infinity,
    #[serde(rename = "-Infinity")]
    NegativeInfinity,
}

/// Value of a `number` primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsNumber {
    Special(SpecialNumber),
    Finite(Number),
}

impl JsNumber {
    /// Converts an `f64`, mapping non-finite values and `-0` to their
    /// special forms.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::Special(SpecialNumber::NaN);
        }
        if value == 0.0 && value.is_sign_negative() {
            return Self::Special(SpecialNumber::NegativeZero);
        }
        if value.is_infinite() {
            return Self::Special(if value > 0.0 {
                SpecialNumber::Infinity
            } else {
                SpecialNumber::NegativeInfinity
            });
        }
        match Number::from_f64(value) {
            Some(number) => Self::Finite(number),
            None => Self::Special(SpecialNumber::NaN),
        }
    }

    /// Returns the value as an `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Special(SpecialNumber::NaN) => f64::NAN,
            Self::Special(SpecialNumber::NegativeZero) => -0.0,
            Self::Special(SpecialNumber::Infinity) => f64::INFINITY,
            Self::Special(SpecialNumber::NegativeInfinity) => f64::NEG_INFINITY,
            Self::Finite(number) => number.as_f64().unwrap_or(f64::NAN),
        }
    }
}

impl From<i64> for JsNumber {
    fn from(value: i64) -> Self {
        Self::Finite(value.into())
    }
}

// ============================================================================
// Mappings
// ============================================================================

/// Key of a map or object entry: a property name or a serialized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingKey<T> {
    Text(String),
    Value(T),
}

/// `[key, value]` pair of a map or object value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry<T>(pub MappingKey<T>, pub T);

/// `pattern` and `flags` of a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegExpValue {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

// ============================================================================
// Local Values
// ============================================================================

/// Value serialized by the local end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocalValue {
    Undefined,
    Null,
    String { value: String },
    Number { value: JsNumber },
    Boolean { value: bool },
    BigInt { value: String },
    Array { value: Vec<LocalValue> },
    Date { value: String },
    Map { value: Vec<MappingEntry<LocalValue>> },
    Object { value: Vec<MappingEntry<LocalValue>> },
    RegExp { value: RegExpValue },
    Set { value: Vec<LocalValue> },
}

impl LocalValue {
    /// Shorthand for a string primitive.
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    /// Shorthand for a number primitive.
    #[inline]
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Number {
            value: JsNumber::from_f64(value),
        }
    }
}

tag_literal!(
    /// `type` of a [`ChannelValue`].
    ChannelTag => "channel"
);

/// Channel over which the remote end posts `script.message` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProperties {
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<ResultOwnership>,
}

/// Argument creating a message channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelValue {
    #[serde(rename = "type")]
    pub kind: ChannelTag,
    pub value: ChannelProperties,
}

impl ChannelValue {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            kind: ChannelTag::Tag,
            value: ChannelProperties {
                channel,
                serialization_options: None,
                ownership: None,
            },
        }
    }
}

/// Reference to a DOM node by shared id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedReference {
    pub shared_id: SharedId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    #[serde(flatten)]
    pub extensible: Extensible,
}

/// Reference to a remote object by handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObjectReference {
    pub handle: Handle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<SharedId>,
    #[serde(flatten)]
    pub extensible: Extensible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteReference {
    Shared(SharedReference),
    Object(RemoteObjectReference),
}

/// Argument of `script.callFunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Local(LocalValue),
    Channel(ChannelValue),
    Reference(RemoteReference),
}

impl From<LocalValue> for ArgumentValue {
    fn from(value: LocalValue) -> Self {
        Self::Local(value)
    }
}

// ============================================================================
// Remote Values
// ============================================================================

/// Handle and internal id of a non-primitive remote value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHandle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<u64>,
}

/// Remote value serialized without contents (functions, promises, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    #[serde(flatten)]
    pub handle: RemoteHandle,
}

/// Array-like remote value; `value` is absent past `maxObjectDepth`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRemoteValue {
    #[serde(flatten)]
    pub handle: RemoteHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<RemoteValue>>,
}

/// Map-like remote value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRemoteValue {
    #[serde(flatten)]
    pub handle: RemoteHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<MappingEntry<RemoteValue>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegExpRemoteValue {
    #[serde(flatten)]
    pub handle: RemoteHandle,
    pub value: RegExpValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRemoteValue {
    #[serde(flatten)]
    pub handle: RemoteHandle,
    pub value: String,
}

/// Shadow root mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
    Open,
    Closed,
}

/// Serialized DOM node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub node_type: u64,
    pub child_node_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Always `node` values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RemoteValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ShadowRootMode>,
    #[serde(rename = "namespaceURI", skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub shadow_root: Option<Option<Box<RemoteValue>>>,
}

impl NodeProperties {
    /// Iterates the serialized child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &NodeRemoteValue> {
        self.children
            .iter()
            .flatten()
            .filter_map(RemoteValue::as_node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRemoteValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<SharedId>,
    #[serde(flatten)]
    pub handle: RemoteHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProxyProperties {
    pub context: BrowsingContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProxyRemoteValue {
    pub value: WindowProxyProperties,
    #[serde(flatten)]
    pub handle: RemoteHandle,
}

/// Value serialized by the remote end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteValue {
    Undefined,
    Null,
    String { value: String },
    Number { value: JsNumber },
    Boolean { value: bool },
    BigInt { value: String },
    Symbol(RemoteObject),
    Array(ListRemoteValue),
    Object(MappingRemoteValue),
    Function(RemoteObject),
    RegExp(RegExpRemoteValue),
    Date(DateRemoteValue),
    Map(MappingRemoteValue),
    Set(ListRemoteValue),
    WeakMap(RemoteObject),
    WeakSet(RemoteObject),
    Iterator(RemoteObject),
    Generator(RemoteObject),
    Error(RemoteObject),
    Proxy(RemoteObject),
    Promise(RemoteObject),
    TypedArray(RemoteObject),
    ArrayBuffer(RemoteObject),
    NodeList(ListRemoteValue),
    HtmlCollection(ListRemoteValue),
    Node(NodeRemoteValue),
    Window(WindowProxyRemoteValue),
}

impl RemoteValue {
    /// Returns the handle keeping the value alive, if any.
    #[must_use]
    pub fn handle(&self) -> Option<&Handle> {
        let handle = match self {
            Self::Undefined
            | Self::Null
            | Self::String { .. }
            | Self::Number { .. }
            | Self::Boolean { .. }
            | Self::BigInt { .. } => return None,
            Self::Symbol(v)
            | Self::Function(v)
            | Self::WeakMap(v)
            | Self::WeakSet(v)
            | Self::Iterator(v)
            | Self::Generator(v)
            | Self::Error(v)
            | Self::Proxy(v)
            | Self::Promise(v)
            | Self::TypedArray(v)
            | Self::ArrayBuffer(v) => &v.handle,
            Self::Array(v) | Self::Set(v) | Self::NodeList(v) | Self::HtmlCollection(v) => {
                &v.handle
            }
            Self::Object(v) | Self::Map(v) => &v.handle,
            Self::RegExp(v) => &v.handle,
            Self::Date(v) => &v.handle,
            Self::Node(v) => &v.handle,
            Self::Window(v) => &v.handle,
        };
        handle.handle.as_ref()
    }

    /// Returns the node payload for `node` values.
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeRemoteValue> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the string payload for `string` values.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// Realms
// ============================================================================

/// Kind of realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmType {
    Window,
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
    Worker,
    PaintWorklet,
    AudioWorklet,
    Worklet,
}

/// Fields common to every realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRealmInfo {
    pub realm: Realm,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRealmInfo {
    #[serde(flatten)]
    pub base: BaseRealmInfo,
    pub context: BrowsingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

/// Realm description; also the params of `script.realmCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RealmInfo {
    Window(WindowRealmInfo),
    DedicatedWorker(BaseRealmInfo),
    SharedWorker(BaseRealmInfo),
    ServiceWorker(BaseRealmInfo),
    Worker(BaseRealmInfo),
    PaintWorklet(BaseRealmInfo),
    AudioWorklet(BaseRealmInfo),
    Worklet(BaseRealmInfo),
}

impl RealmInfo {
    #[must_use]
    pub fn base(&self) -> &BaseRealmInfo {
        match self {
            Self::Window(info) => &info.base,
            Self::DedicatedWorker(base)
            | Self::SharedWorker(base)
            | Self::ServiceWorker(base)
            | Self::Worker(base)
            | Self::PaintWorklet(base)
            | Self::AudioWorklet(base)
            | Self::Worklet(base) => base,
        }
    }

    #[inline]
    #[must_use]
    pub fn realm(&self) -> &Realm {
        &self.base().realm
    }

    /// Returns the owning context of window realms.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&BrowsingContext> {
        match self {
            Self::Window(info) => Some(&info.context),
            _ => None,
        }
    }
}

/// `script.realmDestroyed` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmDestroyedParameters {
    pub realm: Realm,
}

/// `script.message` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParameters {
    pub channel: Channel,
    pub data: RemoteValue,
    pub source: Source,
}

// ============================================================================
// Command Parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmTarget {
    pub realm: Realm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTarget {
    pub context: BrowsingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

/// Where to run a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Realm(RealmTarget),
    Context(ContextTarget),
}

impl Target {
    /// Targets the default realm of `context`.
    #[must_use]
    pub fn context(context: BrowsingContext) -> Self {
        Self::Context(ContextTarget {
            context,
            sandbox: None,
        })
    }

    #[must_use]
    pub fn realm(realm: Realm) -> Self {
        Self::Realm(RealmTarget { realm })
    }
}

/// `script.addPreloadScript` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPreloadScriptParameters {
    pub function_declaration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<ChannelValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

/// `script.disown` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisownParameters {
    pub handles: Vec<Handle>,
    pub target: Target,
}

/// `script.callFunction` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionParameters {
    pub function_declaration: String,
    pub await_promise: bool,
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<ArgumentValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this: Option<ArgumentValue>,
}

/// `script.evaluate` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParameters {
    pub expression: String,
    pub target: Target,
    pub await_promise: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
}

impl EvaluateParameters {
    /// Evaluates `expression` in `target` without awaiting promises.
    #[must_use]
    pub fn new(expression: impl Into<String>, target: Target) -> Self {
        Self {
            expression: expression.into(),
            target,
            await_promise: false,
            result_ownership: None,
            serialization_options: None,
        }
    }
}

/// `script.getRealms` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRealmsParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContext>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub realm_type: Option<RealmType>,
}

/// `script.removePreloadScript` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePreloadScriptParameters {
    pub script: PreloadScript,
}

// ============================================================================
// Results
// ============================================================================

/// `script.addPreloadScript` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPreloadScriptResult {
    pub script: PreloadScript,
}

/// `script.getRealms` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRealmsResult {
    pub realms: Vec<RealmInfo>,
}

/// Thrown exception of a failed evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    pub column_number: u64,
    pub exception: RemoteValue,
    pub line_number: u64,
    pub stack_trace: StackTrace,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateResultSuccess {
    pub result: RemoteValue,
    pub realm: Realm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResultException {
    pub exception_details: ExceptionDetails,
    pub realm: Realm,
}

/// Result of `script.evaluate` and `script.callFunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvaluateResult {
    Success(EvaluateResultSuccess),
    Exception(EvaluateResultException),
}

impl EvaluateResult {
    #[must_use]
    pub fn realm(&self) -> &Realm {
        match self {
            Self::Success(success) => &success.realm,
            Self::Exception(exception) => &exception.realm,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_special_numbers() {
        let value: RemoteValue =
            serde_json::from_value(json!({"type": "number", "value": "-0"})).expect("decode");
        let RemoteValue::Number { value } = value else {
            panic!("expected number");
        };
        assert_eq!(value, JsNumber::Special(SpecialNumber::NegativeZero));
        assert!(value.as_f64().is_sign_negative());

        assert!(JsNumber::from_f64(f64::NAN).as_f64().is_nan());
        assert_eq!(
            JsNumber::from_f64(f64::NEG_INFINITY),
            JsNumber::Special(SpecialNumber::NegativeInfinity)
        );
        assert_eq!(JsNumber::from_f64(1.5).as_f64(), 1.5);
        assert_eq!(serde_json::to_value(JsNumber::from(3)).expect("encode"), json!(3));
    }

    #[test]
    fn test_node_with_children() {
        let json = json!({
            "type": "node",
            "sharedId": "n-1",
            "value": {
                "nodeType": 1,
                "childNodeCount": 1,
                "localName": "div",
                "namespaceURI": "http://www.w3.org/1999/xhtml",
                "attributes": {"id": "main"},
                "children": [{"type": "node", "sharedId": "n-2"}],
                "shadowRoot": null
            }
        });
        let value: RemoteValue = serde_json::from_value(json.clone()).expect("decode");
        let node = value.as_node().expect("node");
        let props = node.value.as_ref().expect("properties");
        assert_eq!(props.shadow_root, Some(None));
        let children: Vec<_> = props.child_nodes().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].shared_id.as_ref().map(SharedId::as_str), Some("n-2"));
        assert_eq!(serde_json::to_value(&value).expect("encode"), json);
    }

    #[test]
    fn test_remote_value_handle() {
        let value: RemoteValue = serde_json::from_value(
            json!({"type": "promise", "handle": "h-1", "internalId": 4}),
        )
        .expect("decode");
        assert_eq!(value.handle().map(Handle::as_str), Some("h-1"));

        let value: RemoteValue =
            serde_json::from_value(json!({"type": "string", "value": "x"})).expect("decode");
        assert_eq!(value.handle(), None);
        assert_eq!(value.as_str(), Some("x"));
    }

    #[test]
    fn test_local_object_mapping() {
        let value = LocalValue::Object {
            value: vec![
                MappingEntry(MappingKey::Text("a".into()), LocalValue::number(1.0)),
                MappingEntry(
                    MappingKey::Value(LocalValue::string("k")),
                    LocalValue::Null,
                ),
            ],
        };
        let json = serde_json::to_value(&value).expect("encode");
        assert_eq!(
            json,
            json!({"type": "object", "value": [
                ["a", {"type": "number", "value": 1.0}],
                [{"type": "string", "value": "k"}, {"type": "null"}]
            ]})
        );
        let back: LocalValue = serde_json::from_value(json).expect("decode");
        assert_eq!(back, value);
    }

    #[test]
    fn test_argument_value_alternatives() {
        let local: ArgumentValue =
            serde_json::from_value(json!({"type": "undefined"})).expect("decode");
        assert!(matches!(local, ArgumentValue::Local(LocalValue::Undefined)));

        let channel: ArgumentValue =
            serde_json::from_value(json!({"type": "channel", "value": {"channel": "c"}}))
                .expect("decode");
        assert!(matches!(channel, ArgumentValue::Channel(_)));

        let shared: ArgumentValue =
            serde_json::from_value(json!({"sharedId": "s"})).expect("decode");
        assert!(matches!(
            shared,
            ArgumentValue::Reference(RemoteReference::Shared(_))
        ));

        let object: ArgumentValue =
            serde_json::from_value(json!({"handle": "h"})).expect("decode");
        assert!(matches!(
            object,
            ArgumentValue::Reference(RemoteReference::Object(_))
        ));
    }

    #[test]
    fn test_target_alternatives() {
        let realm: Target = serde_json::from_value(json!({"realm": "r"})).expect("decode");
        assert_eq!(realm, Target::realm(Realm::new("r")));
        let context: Target =
            serde_json::from_value(json!({"context": "c"})).expect("decode");
        assert_eq!(context, Target::context(BrowsingContext::new("c")));
    }

    #[test]
    fn test_realm_info() {
        let window: RealmInfo = serde_json::from_value(json!({
            "type": "window", "realm": "r1", "origin": "null", "context": "c1"
        }))
        .expect("decode");
        assert_eq!(window.realm().as_str(), "r1");
        assert_eq!(window.context().map(BrowsingContext::as_str), Some("c1"));

        let worker: RealmInfo = serde_json::from_value(json!({
            "type": "dedicated-worker", "realm": "r2", "origin": "https://a"
        }))
        .expect("decode");
        assert!(matches!(worker, RealmInfo::DedicatedWorker(_)));
        assert_eq!(worker.context(), None);
    }

    #[test]
    fn test_evaluate_exception() {
        let json = json!({
            "type": "exception",
            "realm": "r1",
            "exceptionDetails": {
                "columnNumber": 0,
                "lineNumber": 1,
                "text": "ReferenceError: x is not defined",
                "exception": {"type": "error", "handle": "h"},
                "stackTrace": {"callFrames": []}
            }
        });
        let result: EvaluateResult = serde_json::from_value(json).expect("decode");
        let EvaluateResult::Exception(exception) = &result else {
            panic!("expected exception");
        };
        assert_eq!(exception.exception_details.line_number, 1);
        assert_eq!(result.realm().as_str(), "r1");
    }

    #[test]
    fn test_serialization_options_null_limit() {
        let options = SerializationOptions {
            max_dom_depth: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&options).expect("encode"),
            json!({"maxDomDepth": null})
        );
    }
}
