//! Module export tables and their manifest rendering.

use indexmap::IndexMap;
use serde_json::Value;

/// Export name to opaque exported value, in declaration order.
pub type ModuleExportTable = IndexMap<String, Value>;

/// Parse an export manifest: a JSON5 object whose keys are export names.
///
/// JSON5 is a superset of JSON, so `.json`, `.json5` and `.jsonc` manifests
/// all go through here.
pub fn parse_manifest(text: &str) -> Result<ModuleExportTable, json5::Error> {
    json5::from_str(text)
}
