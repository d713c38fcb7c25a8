//! # Object Merge
//!
//! Folds a chain of object schemas into one, the way chained `.input()`
//! calls combine on the server: later fields override earlier ones on key
//! collision, an overridden key keeps the position of its first
//! occurrence, and the unknown-keys policy and catchall come from the
//! later schema.
//!
//! Merging is only defined for object schemas. Any other kind in the chain
//! is reported as [`MergeError::NonObject`] rather than guessed at.

use thiserror::Error;

use crate::descriptor::TypeName;
use crate::node::SchemaNode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// Nothing to merge.
    #[error("cannot merge an empty schema chain")]
    Empty,

    /// A chain entry is not an object schema.
    #[error("schema #{index} in the chain is {type_name}; only ZodObject schemas can be merged")]
    NonObject { index: usize, type_name: TypeName },
}

/// Merge object schemas left to right.
pub fn merge_objects<'a, I>(schemas: I) -> Result<SchemaNode, MergeError>
where
    I: IntoIterator<Item = &'a SchemaNode>,
{
    let mut iter = schemas.into_iter().enumerate();
    let (_, first) = iter.next().ok_or(MergeError::Empty)?;
    let mut merged = match first {
        SchemaNode::Object(object) => object.clone(),
        other => {
            return Err(MergeError::NonObject {
                index: 0,
                type_name: other.type_name(),
            })
        }
    };

    for (index, schema) in iter {
        let SchemaNode::Object(next) = schema else {
            return Err(MergeError::NonObject {
                index,
                type_name: schema.type_name(),
            });
        };
        for (key, field) in &next.shape {
            merged.shape.insert(key.clone(), field.clone());
        }
        merged.unknown_keys = next.unknown_keys;
        merged.catchall = next.catchall.clone();
    }

    Ok(SchemaNode::Object(merged))
}
