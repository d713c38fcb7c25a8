//! Wire transformers: how values are encoded on the way to and from the
//! remote endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The data transformer a router was configured with.
///
/// `Superjson` wraps every payload as `{"json": ...}`. Only the plain JSON
/// subset is produced here, so the `meta` side channel is never emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireTransformer {
    #[default]
    Identity,
    Superjson,
}

impl WireTransformer {
    /// Look up a transformer by its configured name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "identity" | "default" => Some(Self::Identity),
            "superjson" => Some(Self::Superjson),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Superjson => "superjson",
        }
    }

    /// Encode an outgoing value.
    pub fn serialize(self, value: Value) -> Value {
        match self {
            Self::Identity => value,
            Self::Superjson => {
                let mut envelope = Map::new();
                envelope.insert("json".into(), value);
                Value::Object(envelope)
            }
        }
    }

    /// Decode an incoming value. A superjson payload without a `json`
    /// member is returned as-is.
    pub fn deserialize(self, value: Value) -> Value {
        match (self, value) {
            (Self::Superjson, Value::Object(mut envelope)) if envelope.contains_key("json") => {
                envelope.remove("json").unwrap_or(Value::Null)
            }
            (_, value) => value,
        }
    }
}

impl fmt::Display for WireTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
