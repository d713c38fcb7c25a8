//! # Schema Nodes
//!
//! Closed model of a validator schema graph. Every node kind the
//! validation library exposes maps onto exactly one [`SchemaNode`]
//! variant; kinds that cannot be traversed safely (functions, lazily
//! evaluated self-references, promises, brands) are grouped under
//! [`SchemaNode::Unsupported`] and are never expanded.
//!
//! Embedded functions (default thunks, custom check predicates, lazy
//! getters) are modelled as `Arc<dyn Fn>` so a graph stays cheaply
//! cloneable and `Send + Sync` once built.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::TypeName;

/// A custom validation predicate attached to a check.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Producer of a default value, evaluated when a descriptor is compiled.
pub type Thunk = Arc<dyn Fn() -> Value + Send + Sync>;

/// Getter of a lazily evaluated schema. Never invoked by this crate.
pub type LazyGetter = Arc<dyn Fn() -> SchemaNode + Send + Sync>;

// ── Scalars ─────────────────────────────────────────────────────────

/// Scalar (leaf) schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    NaN,
    BigInt,
    Boolean,
    Date,
    Symbol,
    Undefined,
    Null,
    Any,
    Unknown,
    Never,
    Void,
}

impl ScalarKind {
    /// Descriptor tag for this scalar kind.
    pub fn type_name(self) -> TypeName {
        match self {
            Self::String => TypeName::String,
            Self::Number => TypeName::Number,
            Self::NaN => TypeName::NaN,
            Self::BigInt => TypeName::BigInt,
            Self::Boolean => TypeName::Boolean,
            Self::Date => TypeName::Date,
            Self::Symbol => TypeName::Symbol,
            Self::Undefined => TypeName::Undefined,
            Self::Null => TypeName::Null,
            Self::Any => TypeName::Any,
            Self::Unknown => TypeName::Unknown,
            Self::Never => TypeName::Never,
            Self::Void => TypeName::Void,
        }
    }

    /// Whether validators of this kind carry a `checks` list.
    pub fn has_checks(self) -> bool {
        matches!(self, Self::String | Self::Number | Self::BigInt | Self::Date)
    }

    /// Whether validators of this kind carry a `coerce` flag.
    pub fn has_coerce(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::BigInt | Self::Boolean | Self::Date
        )
    }
}

/// One declared constraint on a scalar (min/max length, pattern, range, ...).
#[derive(Clone)]
pub struct Check {
    /// Constraint kind, e.g. `"min"`, `"regex"`, `"email"`.
    pub kind: String,
    /// Constraint parameters (`value`, `inclusive`, `regex`, ...).
    pub params: Map<String, Value>,
    /// Failure message declared by the schema author.
    pub message: Option<String>,
    /// Custom predicate. Dropped when the check is compiled.
    pub predicate: Option<Predicate>,
}

impl Check {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Map::new(),
            message: None,
            predicate: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("message", &self.message)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A scalar schema with its optional constraint list and coercion flag.
///
/// `checks` and `coerce` are `None` when the underlying validator does not
/// carry the field at all, which keeps field presence faithful.
#[derive(Debug, Clone)]
pub struct ScalarNode {
    pub kind: ScalarKind,
    pub checks: Option<Vec<Check>>,
    pub coerce: Option<bool>,
}

impl ScalarNode {
    /// A scalar with the fields its kind normally carries, empty and uncoerced.
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            checks: kind.has_checks().then(Vec::new),
            coerce: kind.has_coerce().then_some(false),
        }
    }
}

// ── Containers ──────────────────────────────────────────────────────

/// A length or size bound with its failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBound {
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LengthBound {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub element: Box<SchemaNode>,
    pub exact_length: Option<LengthBound>,
    pub min_length: Option<LengthBound>,
    pub max_length: Option<LengthBound>,
}

/// Policy for keys not declared in an object's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    Strip,
    Strict,
    Passthrough,
}

#[derive(Debug, Clone)]
pub struct ObjectNode {
    /// Field name → schema, in declaration order.
    pub shape: IndexMap<String, SchemaNode>,
    pub unknown_keys: Option<UnknownKeys>,
    pub catchall: Option<Box<SchemaNode>>,
}

#[derive(Debug, Clone)]
pub struct UnionNode {
    pub options: Vec<SchemaNode>,
    /// Discriminator key for discriminated unions.
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TupleNode {
    pub items: Vec<SchemaNode>,
    pub rest: Option<Box<SchemaNode>>,
}

#[derive(Debug, Clone)]
pub struct SetNode {
    pub value_type: Box<SchemaNode>,
    pub min_size: Option<LengthBound>,
    pub max_size: Option<LengthBound>,
}

/// What produced an effects wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Refinement,
    Transform,
    Preprocess,
}

/// The default value of a `Default` node.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Thunk(Thunk),
}

impl DefaultValue {
    /// Produce the concrete value, invoking the thunk if there is one.
    pub fn evaluate(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Thunk(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Thunk(_) => f.write_str("Thunk(<fn>)"),
        }
    }
}

// ── Unsupported ─────────────────────────────────────────────────────

/// A lazily evaluated schema. The getter is kept for completeness but is
/// never called, so self-referential graphs stay finite.
#[derive(Clone, Default)]
pub struct LazySchema {
    getter: Option<LazyGetter>,
}

impl LazySchema {
    pub fn new(getter: LazyGetter) -> Self {
        Self {
            getter: Some(getter),
        }
    }

    /// A lazy node whose getter is not available (decoded from the wire).
    pub fn opaque() -> Self {
        Self { getter: None }
    }

    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.has_getter() {
            "LazySchema(<fn>)"
        } else {
            "LazySchema(opaque)"
        })
    }
}

/// Node kinds that are never traversed.
#[derive(Debug, Clone)]
pub enum UnsupportedNode {
    Function,
    Lazy(LazySchema),
    Promise,
    Branded,
    /// A kind name this model does not know.
    Unrecognized(String),
    /// A known kind whose wire form could not be decoded; holds the kind
    /// name as given.
    Malformed(String),
}

impl UnsupportedNode {
    /// Name of the source kind, used in diagnostics.
    pub fn label(&self) -> &str {
        match self {
            Self::Function => "ZodFunction",
            Self::Lazy(_) => "ZodLazy",
            Self::Promise => "ZodPromise",
            Self::Branded => "ZodBranded",
            Self::Unrecognized(name) | Self::Malformed(name) => name,
        }
    }
}

// ── SchemaNode ──────────────────────────────────────────────────────

/// A node in a validator schema graph.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Scalar(ScalarNode),
    Array(ArrayNode),
    Object(ObjectNode),
    Union(UnionNode),
    Intersection {
        left: Box<SchemaNode>,
        right: Box<SchemaNode>,
    },
    Tuple(TupleNode),
    Record {
        key_type: Box<SchemaNode>,
        value_type: Box<SchemaNode>,
    },
    Map {
        key_type: Box<SchemaNode>,
        value_type: Box<SchemaNode>,
    },
    Set(SetNode),
    Literal(Value),
    Enum(Vec<Value>),
    NativeEnum(Value),
    Effects {
        schema: Box<SchemaNode>,
        effect: EffectKind,
    },
    Optional(Box<SchemaNode>),
    Nullable(Box<SchemaNode>),
    Catch(Box<SchemaNode>),
    Readonly(Box<SchemaNode>),
    Default {
        inner: Box<SchemaNode>,
        default: DefaultValue,
    },
    Pipeline {
        input: Box<SchemaNode>,
        output: Box<SchemaNode>,
    },
    Unsupported(UnsupportedNode),
}

impl SchemaNode {
    /// Descriptor tag of this node.
    pub fn type_name(&self) -> TypeName {
        match self {
            Self::Scalar(s) => s.kind.type_name(),
            Self::Array(_) => TypeName::Array,
            Self::Object(_) => TypeName::Object,
            Self::Union(u) if u.discriminator.is_some() => TypeName::DiscriminatedUnion,
            Self::Union(_) => TypeName::Union,
            Self::Intersection { .. } => TypeName::Intersection,
            Self::Tuple(_) => TypeName::Tuple,
            Self::Record { .. } => TypeName::Record,
            Self::Map { .. } => TypeName::Map,
            Self::Set(_) => TypeName::Set,
            Self::Literal(_) => TypeName::Literal,
            Self::Enum(_) => TypeName::Enum,
            Self::NativeEnum(_) => TypeName::NativeEnum,
            Self::Effects { .. } => TypeName::Effects,
            Self::Optional(_) => TypeName::Optional,
            Self::Nullable(_) => TypeName::Nullable,
            Self::Catch(_) => TypeName::Catch,
            Self::Readonly(_) => TypeName::Readonly,
            Self::Default { .. } => TypeName::Default,
            Self::Pipeline { .. } => TypeName::Pipeline,
            Self::Unsupported(_) => TypeName::Unsupported,
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarNode::new(kind))
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    /// Synthetic node for "accepts no input".
    pub fn never() -> Self {
        Self::scalar(ScalarKind::Never)
    }

    /// Synthetic node for "a schema exists but cannot be introspected".
    pub fn unknown() -> Self {
        Self::scalar(ScalarKind::Unknown)
    }

    /// A strip-mode object without catchall.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        Self::Object(ObjectNode {
            shape: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            unknown_keys: Some(UnknownKeys::Strip),
            catchall: None,
        })
    }

    pub fn array(element: SchemaNode) -> Self {
        Self::Array(ArrayNode {
            element: Box::new(element),
            exact_length: None,
            min_length: None,
            max_length: None,
        })
    }

    pub fn union(options: Vec<SchemaNode>) -> Self {
        Self::Union(UnionNode {
            options,
            discriminator: None,
        })
    }

    pub fn lazy(getter: impl Fn() -> SchemaNode + Send + Sync + 'static) -> Self {
        Self::Unsupported(UnsupportedNode::Lazy(LazySchema::new(Arc::new(getter))))
    }

    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    pub fn with_default(self, default: DefaultValue) -> Self {
        Self::Default {
            inner: Box::new(self),
            default,
        }
    }

    /// Add a check to a scalar node; other kinds are returned unchanged.
    pub fn with_check(mut self, check: Check) -> Self {
        if let Self::Scalar(scalar) = &mut self {
            scalar.checks.get_or_insert_with(Vec::new).push(check);
        }
        self
    }
}
