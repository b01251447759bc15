mod memory;
mod tree;

pub use memory::MemoryIndex;
pub use tree::AnnotatedTree;

use annex_index::Document;
use serde_json::Value;

/// Builds a [`Document`] from a JSON object literal.
pub fn document(value: Value) -> Document {
	match value {
		Value::Object(map) => map,
		other => panic!("Document literal must be a JSON object, got {other}."),
	}
}
