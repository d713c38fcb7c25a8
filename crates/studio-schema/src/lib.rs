//! # studio-schema: Schema Descriptor Compiler
//!
//! Models a validator schema graph as a closed sum type ([`SchemaNode`]) and
//! compiles it into a JSON-safe [`SchemaDescriptor`] tree that a generic
//! client can render as an input form or a type summary.
//!
//! ## Guarantees
//!
//! - **Total.** [`compile`] handles every variant; kinds that cannot be
//!   traversed (functions, lazy self-references, promises, brands, unknown
//!   wire kinds) become `StudioUnsupportedType` leaves.
//! - **Terminating.** Lazy getters are never invoked, so self-referential
//!   graphs compile in one bounded pass without cycle detection.
//! - **Faithful.** Field presence in a descriptor mirrors field presence in
//!   its source node; object shapes keep declaration order.
//! - **Static.** Default thunks are evaluated once at compile time and
//!   custom check predicates are dropped.
//! - **Deterministic.** The same graph always compiles to identical JSON.
//!
//! ## Modules
//!
//! - [`node`]: the schema graph model.
//! - [`descriptor`]: the serializable projection.
//! - [`compile`]: the compiler and its degradation report.
//! - [`merge`]: the object-merge operator used for chained inputs.
//! - [`wire`]: defensive decoding of schema nodes from loader output.

pub mod compile;
pub mod descriptor;
pub mod merge;
pub mod node;
pub mod wire;

pub use compile::{compile, compile_with_report, CompileReport, Degradation};
pub use descriptor::{CheckDescriptor, SchemaDescriptor, TypeName};
pub use merge::{merge_objects, MergeError};
pub use node::{
    ArrayNode, Check, DefaultValue, EffectKind, LazySchema, LengthBound, ObjectNode, ScalarKind,
    ScalarNode, SchemaNode, SetNode, TupleNode, UnionNode, UnknownKeys, UnsupportedNode,
};
pub use wire::{WireDecode, WireError};
