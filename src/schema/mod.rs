//! Schema node model and registry.
//!
//! Every message and value shape of the protocol is described by a
//! [`SchemaNode`] tree. Named nodes live in the [`SchemaRegistry`] and refer to
//! each other by name ([`SchemaNode::Ref`]), so namespaces never duplicate
//! each other's structure.
//!
//! # Node Kinds
//!
//! | Node | JSON | Notes |
//! |------|------|-------|
//! | `Any` | anything | opaque |
//! | `Null`, `Boolean`, `String` | primitive | |
//! | `Literal`, `Enum` | string | fixed value(s) |
//! | `Number` | number | finite, optional bounds |
//! | `Integer` | number | integral, inclusive bounds (`JsInt`, `JsUint`) |
//! | `List`, `Tuple` | array | homogeneous / fixed arity |
//! | `Map` | object | homogeneous string-keyed |
//! | `Object` | object | declared fields, closed or extensible |
//! | `Union` | object | tag-discriminated, lookup table |
//! | `Choice` | any | untagged alternatives, picked by shape |
//! | `Nullable` | null or inner | |
//! | `Ref` | - | named node in the registry |

// ============================================================================
// Submodules
// ============================================================================

/// Static namespace definitions.
pub mod definitions;

/// Process-wide registry of named nodes.
pub mod registry;

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::identifiers::{MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::{CommandSpec, EventSpec, SchemaRegistry};

// ============================================================================
// SchemaNode
// ============================================================================

/// A node of the protocol schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Any JSON value.
    Any,
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Boolean,
    /// JSON string.
    String,
    /// A single string value.
    Literal(&'static str),
    /// One of a closed set of string values.
    Enum(&'static [&'static str]),
    /// Finite number with optional inclusive bounds.
    Number(NumberBounds),
    /// Integral number with inclusive bounds.
    Integer(IntegerBounds),
    /// Homogeneous sequence.
    List(Box<ListNode>),
    /// Fixed-size heterogeneous sequence.
    Tuple(Vec<SchemaNode>),
    /// String-keyed mapping with homogeneous values.
    Map(Box<SchemaNode>),
    /// Object with declared fields.
    Object(ObjectNode),
    /// Tag-discriminated union.
    Union(TaggedUnion),
    /// Untagged alternatives.
    Choice(Vec<SchemaNode>),
    /// `null` or the inner node.
    Nullable(Box<SchemaNode>),
    /// Named node resolved through the registry.
    Ref(&'static str),
}

impl SchemaNode {
    /// Short human-readable description used in violation messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::String => "string".to_string(),
            Self::Literal(value) => format!("\"{value}\""),
            Self::Enum(values) => values
                .iter()
                .map(|v| format!("\"{v}\""))
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Number(_) => "number".to_string(),
            Self::Integer(_) => "integer".to_string(),
            Self::List(_) | Self::Tuple(_) => "array".to_string(),
            Self::Map(_) | Self::Object(_) | Self::Union(_) => "object".to_string(),
            Self::Choice(alternatives) => alternatives
                .iter()
                .map(Self::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Nullable(inner) => format!("{} | null", inner.describe()),
            Self::Ref(name) => (*name).to_string(),
        }
    }
}

// ============================================================================
// Bounds
// ============================================================================

/// Inclusive bounds of a [`SchemaNode::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberBounds {
    /// Lower bound, if any.
    pub min: Option<f64>,
    /// Upper bound, if any.
    pub max: Option<f64>,
}

/// Inclusive bounds of a [`SchemaNode::Integer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    /// Lower bound.
    pub min: i64,
    /// Upper bound.
    pub max: u64,
}

impl IntegerBounds {
    /// `JsInt` range.
    pub const JS_INT: Self = Self {
        min: MIN_SAFE_INTEGER,
        max: MAX_SAFE_INTEGER,
    };

    /// `JsUint` range.
    pub const JS_UINT: Self = Self {
        min: 0,
        max: MAX_SAFE_INTEGER,
    };
}

// ============================================================================
// Composite Nodes
// ============================================================================

/// Element schema and length constraint of a [`SchemaNode::List`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListNode {
    /// Schema of every element.
    pub item: SchemaNode,
    /// Minimum number of elements.
    pub min_len: usize,
}

/// Declared field of an [`ObjectNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// JSON key.
    pub name: &'static str,
    /// Value schema.
    pub node: SchemaNode,
    /// Whether the key must be present.
    pub required: bool,
}

/// Object with declared fields.
///
/// Extensible objects accept undeclared keys without inspecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    /// Declared fields in declaration order.
    pub fields: Vec<Field>,
    /// Whether undeclared keys are accepted.
    pub extensible: bool,
}

impl ObjectNode {
    /// Looks up a declared field by key.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Union discriminated by a single string field.
///
/// The discriminant table is filled once when the registry is built.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedUnion {
    /// Discriminant key, e.g. `type` or `method`.
    pub discriminant: &'static str,
    /// Candidate variants in declaration order.
    pub variants: Vec<SchemaNode>,
    pub(crate) table: FxHashMap<&'static str, SchemaNode>,
    pub(crate) fallback: Option<Box<SchemaNode>>,
}

impl TaggedUnion {
    /// Selects the variant for a discriminant value.
    ///
    /// Falls back to the open variant (discriminant typed as plain string)
    /// when no literal matches.
    #[must_use]
    pub fn select(&self, tag: &str) -> Option<&SchemaNode> {
        self.table.get(tag).or(self.fallback.as_deref())
    }

    /// Returns every discriminant literal known to this union.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.table.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Returns `true` if the registry has computed the discriminant table.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.table.is_empty() || self.fallback.is_some()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Any JSON value.
#[inline]
#[must_use]
pub fn any() -> SchemaNode {
    SchemaNode::Any
}

/// JSON `null`.
#[inline]
#[must_use]
pub fn null() -> SchemaNode {
    SchemaNode::Null
}

/// JSON boolean.
#[inline]
#[must_use]
pub fn boolean() -> SchemaNode {
    SchemaNode::Boolean
}

/// JSON string.
#[inline]
#[must_use]
pub fn string() -> SchemaNode {
    SchemaNode::String
}

/// Fixed string value.
#[inline]
#[must_use]
pub fn literal(value: &'static str) -> SchemaNode {
    SchemaNode::Literal(value)
}

/// One of a closed set of strings.
#[inline]
#[must_use]
pub fn one_of(values: &'static [&'static str]) -> SchemaNode {
    SchemaNode::Enum(values)
}

/// Unbounded finite number.
#[inline]
#[must_use]
pub fn number() -> SchemaNode {
    SchemaNode::Number(NumberBounds::default())
}

/// Finite number within `[min, max]`.
#[inline]
#[must_use]
pub fn number_in(min: f64, max: f64) -> SchemaNode {
    SchemaNode::Number(NumberBounds {
        min: Some(min),
        max: Some(max),
    })
}

/// Finite number `>= min`.
#[inline]
#[must_use]
pub fn number_min(min: f64) -> SchemaNode {
    SchemaNode::Number(NumberBounds {
        min: Some(min),
        max: None,
    })
}

/// Integer within `[min, max]`.
///
/// Only JSON integers match; `2.0` and `1e3` are rejected.
#[inline]
#[must_use]
pub fn integer_in(min: i64, max: u64) -> SchemaNode {
    SchemaNode::Integer(IntegerBounds { min, max })
}

/// `JsInt`.
#[inline]
#[must_use]
pub fn js_int() -> SchemaNode {
    SchemaNode::Integer(IntegerBounds::JS_INT)
}

/// `JsUint`.
#[inline]
#[must_use]
pub fn js_uint() -> SchemaNode {
    SchemaNode::Integer(IntegerBounds::JS_UINT)
}

/// Possibly empty homogeneous sequence.
#[inline]
#[must_use]
pub fn list(item: SchemaNode) -> SchemaNode {
    SchemaNode::List(Box::new(ListNode { item, min_len: 0 }))
}

/// Homogeneous sequence with at least one element.
#[inline]
#[must_use]
pub fn non_empty_list(item: SchemaNode) -> SchemaNode {
    SchemaNode::List(Box::new(ListNode { item, min_len: 1 }))
}

/// Fixed-size sequence.
#[inline]
#[must_use]
pub fn tuple(items: Vec<SchemaNode>) -> SchemaNode {
    SchemaNode::Tuple(items)
}

/// String-keyed mapping with homogeneous values.
#[inline]
#[must_use]
pub fn map_of(value: SchemaNode) -> SchemaNode {
    SchemaNode::Map(Box::new(value))
}

/// Closed object.
#[inline]
#[must_use]
pub fn object(fields: Vec<Field>) -> SchemaNode {
    SchemaNode::Object(ObjectNode {
        fields,
        extensible: false,
    })
}

/// Object accepting undeclared keys.
#[inline]
#[must_use]
pub fn extensible(fields: Vec<Field>) -> SchemaNode {
    SchemaNode::Object(ObjectNode {
        fields,
        extensible: true,
    })
}

/// Tag-discriminated union over `variants`.
#[inline]
#[must_use]
pub fn tagged(discriminant: &'static str, variants: Vec<SchemaNode>) -> SchemaNode {
    SchemaNode::Union(TaggedUnion {
        discriminant,
        variants,
        table: FxHashMap::default(),
        fallback: None,
    })
}

/// Untagged alternatives, tried in order by shape.
#[inline]
#[must_use]
pub fn choice(alternatives: Vec<SchemaNode>) -> SchemaNode {
    SchemaNode::Choice(alternatives)
}

/// `null` or `inner`.
#[inline]
#[must_use]
pub fn nullable(inner: SchemaNode) -> SchemaNode {
    SchemaNode::Nullable(Box::new(inner))
}

/// Named node.
#[inline]
#[must_use]
pub fn reference(name: &'static str) -> SchemaNode {
    SchemaNode::Ref(name)
}

/// Required field.
#[inline]
#[must_use]
pub fn required(name: &'static str, node: SchemaNode) -> Field {
    Field {
        name,
        node,
        required: true,
    }
}

/// Optional field.
#[inline]
#[must_use]
pub fn optional(name: &'static str, node: SchemaNode) -> Field {
    Field {
        name,
        node,
        required: false,
    }
}

/// Concatenates field groups (schema intersection `A & B`).
#[must_use]
pub fn merge(groups: Vec<Vec<Field>>) -> Vec<Field> {
    groups.into_iter().flatten().collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(nullable(string()).describe(), "string | null");
        assert_eq!(one_of(&["a", "b"]).describe(), "\"a\" | \"b\"");
        assert_eq!(reference("Script.Realm").describe(), "Script.Realm");
    }

    #[test]
    fn test_object_field_lookup() {
        let SchemaNode::Object(node) = object(vec![
            required("url", string()),
            optional("wait", string()),
        ]) else {
            panic!("expected object");
        };

        assert!(node.field("url").is_some_and(|f| f.required));
        assert!(node.field("wait").is_some_and(|f| !f.required));
        assert!(node.field("missing").is_none());
    }

    #[test]
    fn test_merge_keeps_order() {
        let fields = merge(vec![
            vec![required("realm", string())],
            vec![required("type", literal("window"))],
        ]);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["realm", "type"]);
    }

    #[test]
    fn test_unindexed_union_selects_nothing() {
        let SchemaNode::Union(union) = tagged("type", vec![reference("A")]) else {
            panic!("expected union");
        };
        assert!(!union.is_indexed());
        assert!(union.select("a").is_none());
    }
}
