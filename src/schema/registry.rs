//! Process-wide registry of named schema nodes.
//!
//! The registry is built once from the static namespace definitions and is
//! immutable afterwards, so concurrent validation never races with mutation.
//!
//! # Build Steps
//!
//! 1. Every namespace module defines its named nodes and command/event specs
//! 2. Every [`SchemaNode::Ref`] is checked to resolve
//! 3. Every tagged union gets its discriminant table (nested unions sharing
//!    the discriminant are flattened into the outer table)

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};

use super::definitions;
use super::{ObjectNode, SchemaNode, TaggedUnion};

// ============================================================================
// Constants
// ============================================================================

/// Root type of messages received by the remote end.
pub const COMMAND_ROOT: &str = "Command";

/// Root type of successful command responses.
pub const COMMAND_RESPONSE_ROOT: &str = "CommandResponse";

/// Root type of error responses.
pub const ERROR_RESPONSE_ROOT: &str = "ErrorResponse";

/// Root type of events.
pub const EVENT_ROOT: &str = "Event";

/// Maximum depth when following references or nested unions.
const MAX_REF_DEPTH: usize = 32;

// ============================================================================
// Global Registry
// ============================================================================

static GLOBAL: LazyLock<StdResult<SchemaRegistry, String>> = LazyLock::new(|| {
    SchemaRegistry::builtin().map_err(|e| e.to_string())
});

// ============================================================================
// Specs
// ============================================================================

/// Wire method of a command with its params and result schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Method string, e.g. `session.status`.
    pub method: &'static str,
    /// Registry name of the params schema.
    pub params: &'static str,
    /// Registry name of the result schema.
    pub result: &'static str,
}

/// Wire method of an event with its params schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    /// Method string, e.g. `log.entryAdded`.
    pub method: &'static str,
    /// Registry name of the params schema.
    pub params: &'static str,
}

// ============================================================================
// SchemaRegistry
// ============================================================================

/// Immutable collection of named schema nodes.
#[derive(Debug)]
pub struct SchemaRegistry {
    types: FxHashMap<&'static str, SchemaNode>,
    commands: FxHashMap<&'static str, CommandSpec>,
    events: FxHashMap<&'static str, EventSpec>,
}

impl SchemaRegistry {
    /// Returns the process-wide registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the built-in definitions are inconsistent.
    pub fn global() -> Result<&'static Self> {
        GLOBAL.as_ref().map_err(|message| Error::schema(message.clone()))
    }

    /// Builds a private registry from the built-in definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] or [`Error::UnknownType`] if the definitions
    /// are inconsistent.
    pub fn builtin() -> Result<Self> {
        let mut builder = RegistryBuilder::default();
        definitions::install(&mut builder);
        builder.finish()
    }

    /// Resolves a type name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if the name is not registered.
    pub fn resolve(&self, name: &str) -> Result<&SchemaNode> {
        self.types.get(name).ok_or_else(|| Error::unknown_type(name))
    }

    /// Follows references until a structural node is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] for dangling references and
    /// [`Error::Schema`] for reference cycles.
    pub fn resolve_node<'a>(&'a self, node: &'a SchemaNode) -> Result<&'a SchemaNode> {
        let mut current = node;
        for _ in 0..MAX_REF_DEPTH {
            match current {
                SchemaNode::Ref(name) => current = self.resolve(name)?,
                other => return Ok(other),
            }
        }
        Err(Error::schema(format!(
            "reference chain too deep at {}",
            node.describe()
        )))
    }

    /// Returns `true` if the name is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of named types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a command by method.
    #[inline]
    #[must_use]
    pub fn command(&self, method: &str) -> Option<&CommandSpec> {
        self.commands.get(method)
    }

    /// Looks up an event by method.
    #[inline]
    #[must_use]
    pub fn event(&self, method: &str) -> Option<&EventSpec> {
        self.events.get(method)
    }

    /// Iterates all command specs.
    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Iterates all event specs.
    pub fn events(&self) -> impl Iterator<Item = &EventSpec> {
        self.events.values()
    }
}

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Collects definitions before the registry is sealed.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: FxHashMap<&'static str, SchemaNode>,
    commands: Vec<CommandSpec>,
    events: Vec<EventSpec>,
    duplicates: Vec<&'static str>,
}

impl RegistryBuilder {
    /// Defines a named node.
    pub fn define(&mut self, name: &'static str, node: SchemaNode) -> &mut Self {
        if self.types.insert(name, node).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Registers a command spec.
    pub fn command(&mut self, spec: CommandSpec) -> &mut Self {
        self.commands.push(spec);
        self
    }

    /// Registers an event spec.
    pub fn event(&mut self, spec: EventSpec) -> &mut Self {
        self.events.push(spec);
        self
    }

    /// Command specs registered so far, in registration order.
    #[must_use]
    pub fn command_specs(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Event specs registered so far, in registration order.
    #[must_use]
    pub fn event_specs(&self) -> &[EventSpec] {
        &self.events
    }

    /// Checks references, indexes unions and seals the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for duplicate names, duplicate discriminant
    /// literals or malformed unions, and [`Error::UnknownType`] for dangling
    /// references.
    pub fn finish(self) -> Result<SchemaRegistry> {
        if let Some(name) = self.duplicates.first() {
            return Err(Error::schema(format!("type {name} defined twice")));
        }

        let mut commands = FxHashMap::default();
        for spec in &self.commands {
            for name in [spec.params, spec.result] {
                if !self.types.contains_key(name) {
                    return Err(Error::unknown_type(name));
                }
            }
            if commands.insert(spec.method, *spec).is_some() {
                return Err(Error::schema(format!("command {} defined twice", spec.method)));
            }
        }

        let mut events = FxHashMap::default();
        for spec in &self.events {
            if !self.types.contains_key(spec.params) {
                return Err(Error::unknown_type(spec.params));
            }
            if events.insert(spec.method, *spec).is_some() {
                return Err(Error::schema(format!("event {} defined twice", spec.method)));
            }
        }

        for node in self.types.values() {
            check_refs(node, &self.types)?;
        }

        let snapshot = self.types.clone();
        let mut types = self.types;
        for (name, node) in &mut types {
            index_unions(name, node, &snapshot)?;
        }

        debug!(
            types = types.len(),
            commands = commands.len(),
            events = events.len(),
            "Schema registry built"
        );

        Ok(SchemaRegistry {
            types,
            commands,
            events,
        })
    }
}

// ============================================================================
// Build Passes
// ============================================================================

type TypeMap = FxHashMap<&'static str, SchemaNode>;

/// Fails on the first reference that does not resolve.
fn check_refs(node: &SchemaNode, types: &TypeMap) -> Result<()> {
    match node {
        SchemaNode::Ref(name) => {
            if types.contains_key(name) {
                Ok(())
            } else {
                Err(Error::unknown_type(*name))
            }
        }
        SchemaNode::List(list) => check_refs(&list.item, types),
        SchemaNode::Map(value) | SchemaNode::Nullable(value) => check_refs(value, types),
        SchemaNode::Tuple(items) | SchemaNode::Choice(items) => {
            items.iter().try_for_each(|item| check_refs(item, types))
        }
        SchemaNode::Object(object) => object
            .fields
            .iter()
            .try_for_each(|field| check_refs(&field.node, types)),
        SchemaNode::Union(union) => union
            .variants
            .iter()
            .try_for_each(|variant| check_refs(variant, types)),
        _ => Ok(()),
    }
}

/// Computes discriminant tables for every union reachable inside `node`.
fn index_unions(owner: &str, node: &mut SchemaNode, snapshot: &TypeMap) -> Result<()> {
    match node {
        SchemaNode::Union(union) => {
            build_table(owner, union, snapshot)?;
            for variant in &mut union.variants {
                index_unions(owner, variant, snapshot)?;
            }
            Ok(())
        }
        SchemaNode::List(list) => index_unions(owner, &mut list.item, snapshot),
        SchemaNode::Map(value) | SchemaNode::Nullable(value) => {
            index_unions(owner, value, snapshot)
        }
        SchemaNode::Tuple(items) | SchemaNode::Choice(items) => items
            .iter_mut()
            .try_for_each(|item| index_unions(owner, item, snapshot)),
        SchemaNode::Object(object) => object
            .fields
            .iter_mut()
            .try_for_each(|field| index_unions(owner, &mut field.node, snapshot)),
        _ => Ok(()),
    }
}

fn build_table(owner: &str, union: &mut TaggedUnion, snapshot: &TypeMap) -> Result<()> {
    let mut table = FxHashMap::default();
    let mut fallback = None;
    for variant in &union.variants {
        collect_variant(
            owner,
            union.discriminant,
            variant,
            snapshot,
            &mut table,
            &mut fallback,
            0,
        )?;
    }
    union.table = table;
    union.fallback = fallback.map(Box::new);
    Ok(())
}

fn collect_variant(
    owner: &str,
    discriminant: &'static str,
    variant: &SchemaNode,
    snapshot: &TypeMap,
    table: &mut FxHashMap<&'static str, SchemaNode>,
    fallback: &mut Option<SchemaNode>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_REF_DEPTH {
        return Err(Error::schema(format!("union {owner} nests too deeply")));
    }

    let target = match variant {
        SchemaNode::Ref(name) => snapshot.get(name).ok_or_else(|| Error::unknown_type(*name))?,
        other => other,
    };

    match target {
        SchemaNode::Union(inner) if inner.discriminant == discriminant => {
            for nested in &inner.variants {
                collect_variant(
                    owner,
                    discriminant,
                    nested,
                    snapshot,
                    table,
                    fallback,
                    depth + 1,
                )?;
            }
            Ok(())
        }
        SchemaNode::Object(object) => {
            insert_variant(owner, discriminant, object, variant, table, fallback)
        }
        other => Err(Error::schema(format!(
            "union {owner}: variant {} is not an object",
            other.describe()
        ))),
    }
}

fn insert_variant(
    owner: &str,
    discriminant: &'static str,
    object: &ObjectNode,
    variant: &SchemaNode,
    table: &mut FxHashMap<&'static str, SchemaNode>,
    fallback: &mut Option<SchemaNode>,
) -> Result<()> {
    let field = object
        .field(discriminant)
        .filter(|field| field.required)
        .ok_or_else(|| {
            Error::schema(format!(
                "union {owner}: variant {} lacks required `{discriminant}`",
                variant.describe()
            ))
        })?;

    let tags: &[&'static str] = match &field.node {
        SchemaNode::Literal(tag) => std::slice::from_ref(tag),
        SchemaNode::Enum(tags) => tags,
        SchemaNode::String => {
            if fallback.replace(variant.clone()).is_some() {
                return Err(Error::schema(format!(
                    "union {owner}: more than one open variant"
                )));
            }
            return Ok(());
        }
        other => {
            return Err(Error::schema(format!(
                "union {owner}: `{discriminant}` must be a literal, found {}",
                other.describe()
            )));
        }
    };

    for tag in tags {
        if table.insert(*tag, variant.clone()).is_some() {
            return Err(Error::schema(format!(
                "union {owner}: duplicate discriminant \"{tag}\""
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
