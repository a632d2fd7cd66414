//! Structural validation of untyped JSON against schema nodes.
//!
//! Validation is a single deterministic pass over the value:
//!
//! - Tagged unions read the discriminant once and select the variant with a
//!   single table lookup. Variants are never retried.
//! - Untagged choices pick the first alternative whose cheap shape test
//!   (JSON kind, required keys, literal fields) matches, then validate only
//!   that alternative.
//! - The first structural error ends validation and is reported with its
//!   dotted path, e.g. `result.socksVersion` or `params.actions[0].x`.
//!
//! Extensible objects accept undeclared keys without inspecting them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::error::Result;
use crate::schema::{IntegerBounds, NumberBounds, ObjectNode, SchemaNode, SchemaRegistry, TaggedUnion};

// ============================================================================
// Path
// ============================================================================

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

/// Location of a value inside a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    /// Empty path (the message root).
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path consisting of a single key.
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self(vec![Segment::Key(name.into())])
    }

    /// Returns `true` for the root path.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments from the root.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Appends a key and returns the extended path.
    #[must_use]
    pub fn join(mut self, name: impl Into<String>) -> Self {
        self.0.push(Segment::Key(name.into()));
        self
    }

    fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Violation
// ============================================================================

/// Why a value failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reason {
    /// JSON kind differs from the schema.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Description of the expected shape.
        expected: String,
        /// JSON kind found.
        found: &'static str,
    },

    /// Number outside its declared bounds.
    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Offending value.
        value: String,
        /// Lower bound.
        min: String,
        /// Upper bound.
        max: String,
    },

    /// Integer field holds a fractional or float-encoded number.
    #[error("{value} is not an integer")]
    NotInteger {
        /// Offending value.
        value: String,
    },

    /// Number is not finite.
    #[error("number is not finite")]
    NonFinite,

    /// Required key is absent.
    #[error("missing required field")]
    MissingField,

    /// Key not declared by a closed object.
    #[error("unexpected field")]
    UnexpectedField,

    /// String differs from the expected literal(s).
    #[error("expected {expected}, found \"{found}\"")]
    LiteralMismatch {
        /// Expected literal(s).
        expected: String,
        /// String found.
        found: String,
    },

    /// Discriminant names no variant of the union.
    #[error("unknown discriminant \"{value}\"")]
    UnknownDiscriminant {
        /// Discriminant found.
        value: String,
        /// Known discriminants.
        known: Vec<&'static str>,
    },

    /// Tuple has the wrong number of elements.
    #[error("expected {expected} elements, found {found}")]
    ArityMismatch {
        /// Declared arity.
        expected: usize,
        /// Elements found.
        found: usize,
    },

    /// Sequence has fewer elements than required.
    #[error("expected at least {min} elements, found {found}")]
    TooShort {
        /// Minimum length.
        min: usize,
        /// Elements found.
        found: usize,
    },

    /// No alternative of an untagged choice fits the value.
    #[error("no alternative of {expected} matches")]
    NoMatchingAlternative {
        /// Description of the alternatives.
        expected: String,
    },

    /// Schema references an unregistered type.
    #[error("unknown schema type {name}")]
    UnknownType {
        /// Unresolved name.
        name: String,
    },
}

/// First structural error found in a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at {path}")]
pub struct Violation {
    /// Location of the error.
    pub path: Path,
    /// What is wrong.
    pub reason: Reason,
}

impl Violation {
    fn at(path: &Path, reason: Reason) -> Self {
        Self {
            path: path.clone(),
            reason,
        }
    }
}

/// Outcome of [`Validator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Value conforms.
    Valid,
    /// Value does not conform.
    Invalid(Violation),
}

impl ValidationResult {
    /// Returns `true` if the value conforms.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the violation, if any.
    #[inline]
    #[must_use]
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Valid => None,
            Self::Invalid(violation) => Some(violation),
        }
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] if the value did not conform.
    pub fn into_result(self) -> StdResult<(), Violation> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(violation) => Err(violation),
        }
    }
}

impl From<StdResult<(), Violation>> for ValidationResult {
    fn from(result: StdResult<(), Violation>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(violation) => Self::Invalid(violation),
        }
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Validates JSON values against nodes of a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Validator<'r> {
    /// Creates a validator over `registry`.
    #[inline]
    #[must_use]
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry used to resolve references.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Validates `value` against `schema`, reporting paths from the root.
    #[must_use]
    pub fn validate(&self, value: &Value, schema: &SchemaNode) -> ValidationResult {
        self.validate_at(value, schema, Path::root())
    }

    /// Validates `value` against `schema`, reporting paths below `base`.
    #[must_use]
    pub fn validate_at(&self, value: &Value, schema: &SchemaNode, base: Path) -> ValidationResult {
        let mut path = base;
        self.check(value, schema, &mut path).into()
    }

    /// Validates `value` against the named type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`](crate::Error::UnknownType) if the name
    /// is not registered.
    pub fn validate_type(&self, value: &Value, name: &str) -> Result<ValidationResult> {
        let node = self.registry.resolve(name)?;
        Ok(self.validate(value, node))
    }

    fn check(&self, value: &Value, node: &SchemaNode, path: &mut Path) -> StdResult<(), Violation> {
        match node {
            SchemaNode::Any => Ok(()),
            SchemaNode::Null => expect_kind(value.is_null(), node, value, path),
            SchemaNode::Boolean => expect_kind(value.is_boolean(), node, value, path),
            SchemaNode::String => expect_kind(value.is_string(), node, value, path),
            SchemaNode::Literal(expected) => check_literal(value, node, &[*expected], path),
            SchemaNode::Enum(expected) => check_literal(value, node, expected, path),
            SchemaNode::Number(bounds) => check_number(value, *bounds, path),
            SchemaNode::Integer(bounds) => check_integer(value, *bounds, path),
            SchemaNode::List(list) => {
                let items = as_array(value, node, path)?;
                if items.len() < list.min_len {
                    return Err(Violation::at(
                        path,
                        Reason::TooShort {
                            min: list.min_len,
                            found: items.len(),
                        },
                    ));
                }
                for (index, item) in items.iter().enumerate() {
                    self.check_child(item, &list.item, path, Segment::Index(index))?;
                }
                Ok(())
            }
            SchemaNode::Tuple(elements) => {
                let items = as_array(value, node, path)?;
                if items.len() != elements.len() {
                    return Err(Violation::at(
                        path,
                        Reason::ArityMismatch {
                            expected: elements.len(),
                            found: items.len(),
                        },
                    ));
                }
                for (index, (item, element)) in items.iter().zip(elements).enumerate() {
                    self.check_child(item, element, path, Segment::Index(index))?;
                }
                Ok(())
            }
            SchemaNode::Map(inner) => {
                let map = as_object(value, node, path)?;
                for (key, item) in map {
                    self.check_child(item, inner, path, Segment::Key(key.clone()))?;
                }
                Ok(())
            }
            SchemaNode::Object(object) => self.check_object(value, node, object, path),
            SchemaNode::Union(union) => self.check_union(value, node, union, path),
            SchemaNode::Choice(alternatives) => {
                match alternatives.iter().find(|alt| self.shape_matches(value, alt)) {
                    Some(alternative) => self.check(value, alternative, path),
                    None => Err(Violation::at(
                        path,
                        Reason::NoMatchingAlternative {
                            expected: node.describe(),
                        },
                    )),
                }
            }
            SchemaNode::Nullable(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    self.check(value, inner, path)
                }
            }
            SchemaNode::Ref(name) => match self.registry.resolve(name) {
                Ok(target) => self.check(value, target, path),
                Err(_) => Err(Violation::at(
                    path,
                    Reason::UnknownType {
                        name: (*name).to_string(),
                    },
                )),
            },
        }
    }

    fn check_child(
        &self,
        value: &Value,
        node: &SchemaNode,
        path: &mut Path,
        segment: Segment,
    ) -> StdResult<(), Violation> {
        path.push(segment);
        let outcome = self.check(value, node, path);
        path.pop();
        outcome
    }

    fn check_object(
        &self,
        value: &Value,
        node: &SchemaNode,
        object: &ObjectNode,
        path: &mut Path,
    ) -> StdResult<(), Violation> {
        let map = as_object(value, node, path)?;

        for field in &object.fields {
            match map.get(field.name) {
                Some(item) => {
                    self.check_child(item, &field.node, path, Segment::Key(field.name.to_string()))?;
                }
                None if field.required => {
                    path.push(Segment::Key(field.name.to_string()));
                    let violation = Violation::at(path, Reason::MissingField);
                    path.pop();
                    return Err(violation);
                }
                None => {}
            }
        }

        if !object.extensible
            && let Some(key) = map.keys().find(|key| object.field(key).is_none())
        {
            path.push(Segment::Key(key.clone()));
            let violation = Violation::at(path, Reason::UnexpectedField);
            path.pop();
            return Err(violation);
        }

        Ok(())
    }

    fn check_union(
        &self,
        value: &Value,
        node: &SchemaNode,
        union: &TaggedUnion,
        path: &mut Path,
    ) -> StdResult<(), Violation> {
        let map = as_object(value, node, path)?;

        path.push(Segment::Key(union.discriminant.to_string()));
        let selected = match map.get(union.discriminant) {
            None => Err(Violation::at(path, Reason::MissingField)),
            Some(Value::String(tag)) => union.select(tag).ok_or_else(|| {
                Violation::at(
                    path,
                    Reason::UnknownDiscriminant {
                        value: tag.clone(),
                        known: union.tags(),
                    },
                )
            }),
            Some(other) => Err(Violation::at(
                path,
                Reason::TypeMismatch {
                    expected: "string".to_string(),
                    found: kind(other),
                },
            )),
        };
        path.pop();

        self.check(value, selected?, path)
    }

    /// Cheap shape test used to pick an alternative of a choice.
    fn shape_matches(&self, value: &Value, node: &SchemaNode) -> bool {
        match node {
            SchemaNode::Any => true,
            SchemaNode::Null => value.is_null(),
            SchemaNode::Boolean => value.is_boolean(),
            SchemaNode::String => value.is_string(),
            SchemaNode::Literal(expected) => value.as_str() == Some(*expected),
            SchemaNode::Enum(expected) => value.as_str().is_some_and(|s| expected.contains(&s)),
            SchemaNode::Number(_) | SchemaNode::Integer(_) => value.is_number(),
            SchemaNode::List(_) | SchemaNode::Tuple(_) => value.is_array(),
            SchemaNode::Map(_) => value.is_object(),
            SchemaNode::Object(object) => value
                .as_object()
                .is_some_and(|map| object_shape_matches(map, object)),
            SchemaNode::Union(union) => value
                .as_object()
                .and_then(|map| map.get(union.discriminant))
                .and_then(Value::as_str)
                .is_some_and(|tag| union.select(tag).is_some()),
            SchemaNode::Choice(alternatives) => {
                alternatives.iter().any(|alt| self.shape_matches(value, alt))
            }
            SchemaNode::Nullable(inner) => value.is_null() || self.shape_matches(value, inner),
            SchemaNode::Ref(name) => self
                .registry
                .resolve(name)
                .is_ok_and(|target| self.shape_matches(value, target)),
        }
    }
}

// ============================================================================
// Leaf Checks
// ============================================================================

fn object_shape_matches(map: &Map<String, Value>, object: &ObjectNode) -> bool {
    let fields_fit = object.fields.iter().all(|field| match map.get(field.name) {
        None => !field.required,
        Some(item) => match &field.node {
            SchemaNode::Literal(expected) => item.as_str() == Some(*expected),
            _ => true,
        },
    });
    fields_fit && (object.extensible || map.keys().all(|key| object.field(key).is_some()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(node: &SchemaNode, value: &Value, path: &Path) -> Violation {
    Violation::at(
        path,
        Reason::TypeMismatch {
            expected: node.describe(),
            found: kind(value),
        },
    )
}

fn expect_kind(ok: bool, node: &SchemaNode, value: &Value, path: &Path) -> StdResult<(), Violation> {
    if ok { Ok(()) } else { Err(mismatch(node, value, path)) }
}

fn as_array<'v>(
    value: &'v Value,
    node: &SchemaNode,
    path: &Path,
) -> StdResult<&'v Vec<Value>, Violation> {
    value.as_array().ok_or_else(|| mismatch(node, value, path))
}

fn as_object<'v>(
    value: &'v Value,
    node: &SchemaNode,
    path: &Path,
) -> StdResult<&'v Map<String, Value>, Violation> {
    value.as_object().ok_or_else(|| mismatch(node, value, path))
}

fn check_literal(
    value: &Value,
    node: &SchemaNode,
    expected: &[&str],
    path: &Path,
) -> StdResult<(), Violation> {
    match value.as_str() {
        Some(found) if expected.contains(&found) => Ok(()),
        Some(found) => Err(Violation::at(
            path,
            Reason::LiteralMismatch {
                expected: node.describe(),
                found: found.to_string(),
            },
        )),
        None => Err(mismatch(node, value, path)),
    }
}

fn check_number(value: &Value, bounds: NumberBounds, path: &Path) -> StdResult<(), Violation> {
    let Some(number) = value.as_f64() else {
        return Err(mismatch(&SchemaNode::Number(bounds), value, path));
    };
    if !number.is_finite() {
        return Err(Violation::at(path, Reason::NonFinite));
    }
    let below = bounds.min.is_some_and(|min| number < min);
    let above = bounds.max.is_some_and(|max| number > max);
    if below || above {
        let show = |bound: Option<f64>, open: &str| bound.map_or(open.to_string(), |b| b.to_string());
        return Err(Violation::at(
            path,
            Reason::OutOfRange {
                value: value.to_string(),
                min: show(bounds.min, "-inf"),
                max: show(bounds.max, "inf"),
            },
        ));
    }
    Ok(())
}

/// Integers must be written as JSON integers: `2.0` and `1e3` parse as
/// floats and are reported as [`Reason::NotInteger`].
fn check_integer(value: &Value, bounds: IntegerBounds, path: &Path) -> StdResult<(), Violation> {
    let Value::Number(number) = value else {
        return Err(mismatch(&SchemaNode::Integer(bounds), value, path));
    };
    if !in_integer_range(number, bounds).ok_or_else(|| integer_form_violation(number, path))? {
        return Err(Violation::at(
            path,
            Reason::OutOfRange {
                value: number.to_string(),
                min: bounds.min.to_string(),
                max: bounds.max.to_string(),
            },
        ));
    }
    Ok(())
}

/// `None` if the number is not integral.
fn in_integer_range(number: &Number, bounds: IntegerBounds) -> Option<bool> {
    if let Some(signed) = number.as_i64() {
        let above_min = signed >= bounds.min;
        let below_max = u64::try_from(signed).map_or(true, |unsigned| unsigned <= bounds.max);
        return Some(above_min && below_max);
    }
    // Only values above i64::MAX reach this branch.
    number.as_u64().map(|unsigned| unsigned <= bounds.max)
}

fn integer_form_violation(number: &Number, path: &Path) -> Violation {
    match number.as_f64() {
        Some(float) if !float.is_finite() => Violation::at(path, Reason::NonFinite),
        _ => Violation::at(
            path,
            Reason::NotInteger {
                value: number.to_string(),
            },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::MAX_SAFE_INTEGER;
    use crate::schema::{js_int, js_uint, reference};

    fn registry() -> &'static SchemaRegistry {
        SchemaRegistry::global().expect("registry")
    }

    fn validate_type(value: Value, name: &str) -> ValidationResult {
        Validator::new(registry())
            .validate_type(&value, name)
            .expect("known type")
    }

    fn violation_path(result: &ValidationResult) -> String {
        result.violation().expect("should be invalid").path.to_string()
    }

    #[test]
    fn test_js_uint_bounds() {
        let validator = Validator::new(registry());
        let node = js_uint();

        assert!(validator.validate(&json!(0), &node).is_valid());
        assert!(validator.validate(&json!(9_007_199_254_740_991_u64), &node).is_valid());

        for rejected in [json!(-1), json!(9_007_199_254_740_992_u64), json!(1.5), json!(2.0)] {
            assert!(!validator.validate(&rejected, &node).is_valid(), "{rejected}");
        }
    }

    #[test]
    fn test_non_integer_reason() {
        let result = Validator::new(registry()).validate(&json!(1.5), &js_uint());
        let violation = result.violation().expect("invalid");
        assert!(matches!(violation.reason, Reason::NotInteger { .. }));
        assert!(violation.path.is_root());
    }

    #[test]
    fn test_float_spelled_integers_rejected() {
        let validator = Validator::new(registry());
        for raw in ["2.0", "1e3", "-0.0"] {
            let value: Value = serde_json::from_str(raw).expect("number");
            let result = validator.validate(&value, &js_uint());
            assert!(
                matches!(result.violation().map(|v| &v.reason), Some(Reason::NotInteger { .. })),
                "{raw} should not count as an integer"
            );
        }
        assert!(validator.validate(&json!(2), &js_int()).is_valid());
    }

    #[test]
    fn test_status_result() {
        let valid = validate_type(json!({"ready": true, "message": "ok"}), "Session.StatusResult");
        assert!(valid.is_valid());

        let missing = validate_type(json!({"ready": true}), "Session.StatusResult");
        assert_eq!(violation_path(&missing), "message");
        assert_eq!(
            missing.violation().map(|v| v.reason.clone()),
            Some(Reason::MissingField)
        );
    }

    #[test]
    fn test_closed_object_rejects_unknown_keys() {
        let result = validate_type(
            json!({"ready": true, "message": "ok", "extra": 1}),
            "Session.StatusResult",
        );
        assert_eq!(violation_path(&result), "extra");
    }

    #[test]
    fn test_extensible_object_keeps_unknown_keys() {
        let result = validate_type(
            json!({"browserName": "firefox", "moz:debuggerAddress": true}),
            "Session.CapabilityRequest",
        );
        assert!(result.is_valid());
    }

    #[test]
    fn test_socks_version_range() {
        let validator = Validator::new(registry());
        let proxy = registry().resolve("Session.ProxyConfiguration").expect("type");

        let result = validator.validate_at(&json!({"socksVersion": 300}), proxy, Path::key("result"));
        let violation = result.violation().expect("invalid");
        assert_eq!(violation.path.to_string(), "result.socksVersion");
        assert!(matches!(violation.reason, Reason::OutOfRange { .. }));

        assert!(validator.validate(&json!({"socksVersion": 5}), proxy).is_valid());
    }

    #[test]
    fn test_remote_value_selects_node_variant() {
        let node = json!({
            "type": "node",
            "sharedId": "s1",
            "value": {"nodeType": 1, "childNodeCount": 0, "localName": "div"}
        });
        assert!(validate_type(node, "Script.RemoteValue").is_valid());

        // An array value would satisfy `ArrayRemoteValue`, but the tag decides.
        let result = validate_type(json!({"type": "node", "value": []}), "Script.RemoteValue");
        assert_eq!(violation_path(&result), "value");
    }

    #[test]
    fn test_unknown_discriminant_path() {
        let result = validate_type(json!({"type": "bogus"}), "Script.RemoteValue");
        let violation = result.violation().expect("invalid");
        assert_eq!(violation.path.to_string(), "type");
        let Reason::UnknownDiscriminant { known, .. } = &violation.reason else {
            panic!("unexpected reason {:?}", violation.reason);
        };
        assert_eq!(known.len(), 27);
    }

    #[test]
    fn test_special_numbers() {
        for value in [json!("NaN"), json!("-0"), json!("Infinity"), json!("-Infinity"), json!(4.5)] {
            let result = validate_type(json!({"type": "number", "value": value}), "Script.RemoteValue");
            assert!(result.is_valid());
        }
        let result = validate_type(json!({"type": "number", "value": "nan"}), "Script.RemoteValue");
        assert_eq!(violation_path(&result), "value");
    }

    #[test]
    fn test_nested_action_path() {
        let params = json!({
            "context": "ctx",
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "actions": [
                    {"type": "pointerMove", "x": 1, "y": 2},
                    {"type": "pointerMove", "x": 1.5, "y": 2}
                ]
            }]
        });
        let result = validate_type(params, "Input.PerformActionsParameters");
        assert_eq!(violation_path(&result), "actions[0].actions[1].x");
    }

    #[test]
    fn test_origin_choice() {
        let base = |origin: Value| {
            json!({"type": "scroll", "x": 0, "y": 0, "deltaX": 0, "deltaY": 5, "origin": origin})
        };
        assert!(validate_type(base(json!("viewport")), "Input.WheelScrollAction").is_valid());
        assert!(
            validate_type(
                base(json!({"type": "element", "element": {"sharedId": "n1"}})),
                "Input.WheelScrollAction"
            )
            .is_valid()
        );

        let result = validate_type(base(json!("window")), "Input.WheelScrollAction");
        let violation = result.violation().expect("invalid");
        assert_eq!(violation.path.to_string(), "origin");
        assert!(matches!(violation.reason, Reason::NoMatchingAlternative { .. }));
    }

    #[test]
    fn test_argument_value_choice() {
        let call = |argument: Value| {
            json!({
                "functionDeclaration": "(x) => x",
                "awaitPromise": false,
                "target": {"realm": "r1"},
                "arguments": [argument]
            })
        };
        for argument in [
            json!({"type": "string", "value": "a"}),
            json!({"type": "channel", "value": {"channel": "c1"}}),
            json!({"handle": "h1"}),
            json!({"sharedId": "n1", "vendor:extra": 1}),
            json!({"type": "map", "value": [["k", {"type": "null"}]]}),
        ] {
            let result = validate_type(call(argument.clone()), "Script.CallFunctionParameters");
            assert!(result.is_valid(), "{argument}: {result:?}");
        }
    }

    #[test]
    fn test_target_choice() {
        let params = |target: Value| json!({"expression": "1", "target": target, "awaitPromise": true});
        assert!(validate_type(params(json!({"context": "c1", "sandbox": "s"})), "Script.EvaluateParameters").is_valid());
        let result = validate_type(params(json!({"realm": "r", "context": "c"})), "Script.EvaluateParameters");
        assert_eq!(violation_path(&result), "target");
    }

    #[test]
    fn test_generic_log_entry_fallback() {
        let entry = json!({
            "type": "custom",
            "level": "info",
            "source": {"realm": "r1"},
            "text": null,
            "timestamp": 1
        });
        assert!(validate_type(entry, "Log.Entry").is_valid());
    }

    #[test]
    fn test_tuple_arity() {
        let result = validate_type(
            json!({"type": "object", "value": [["a"]]}),
            "Script.LocalValue",
        );
        let violation = result.violation().expect("invalid");
        assert_eq!(violation.path.to_string(), "value[0]");
        assert_eq!(violation.reason, Reason::ArityMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_number_bounds() {
        let params = |scale: Value| json!({"context": "c", "scale": scale});
        assert!(validate_type(params(json!(1)), "BrowsingContext.PrintParameters").is_valid());
        let result = validate_type(params(json!(2.5)), "BrowsingContext.PrintParameters");
        assert_eq!(violation_path(&result), "scale");
    }

    #[test]
    fn test_unknown_type_name() {
        let err = Validator::new(registry())
            .validate_type(&json!({}), "Nope")
            .unwrap_err();
        assert!(matches!(err, crate::Error::UnknownType { .. }));
    }

    #[test]
    fn test_reference_to_js_uint() {
        let validator = Validator::new(registry());
        let node = reference("Script.InternalId");
        assert!(validator.validate(&json!(MAX_SAFE_INTEGER), &node).is_valid());
        assert!(!validator.validate(&json!(-3), &node).is_valid());
    }

    #[test]
    fn test_path_display() {
        let mut path = Path::key("params");
        path.push(Segment::Key("actions".into()));
        path.push(Segment::Index(0));
        path.push(Segment::Key("x".into()));
        assert_eq!(path.to_string(), "params.actions[0].x");
        assert_eq!(Path::root().to_string(), "<root>");
    }
}
