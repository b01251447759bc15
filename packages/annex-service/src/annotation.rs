use std::{
	fs,
	path::{Path, PathBuf},
};

use serde_json::{Map, Value};

/// Reserved file name of annotation files.
pub const ANNOTATION_FILE_NAME: &str = "metadata_annotation.yaml";

/// Operator-supplied metadata, kept as an opaque ordered tree.
pub type Metadata = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
	#[error("Failed to read annotation file at {path:?}.")]
	Read { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse annotation file at {path:?}.")]
	Parse { path: PathBuf, source: serde_yaml::Error },
	#[error("Annotation file at {path:?} must contain a mapping, found {found}.")]
	NotMapping { path: PathBuf, found: &'static str },
	#[error("Annotation file at {path:?} cannot be represented as JSON.")]
	Convert { path: PathBuf, source: serde_json::Error },
}

/// Reads an annotation file.
///
/// Returns `Ok(None)` when the file holds no payload: an empty or comment-only document, an
/// explicit `null`, or an empty mapping.
pub fn read_annotation(path: &Path) -> Result<Option<Metadata>, AnnotationError> {
	let raw = fs::read_to_string(path)
		.map_err(|err| AnnotationError::Read { path: path.to_path_buf(), source: err })?;

	if raw.trim().is_empty() {
		return Ok(None);
	}

	let yaml: serde_yaml::Value = serde_yaml::from_str(&raw)
		.map_err(|err| AnnotationError::Parse { path: path.to_path_buf(), source: err })?;

	match &yaml {
		serde_yaml::Value::Null => return Ok(None),
		serde_yaml::Value::Mapping(mapping) if mapping.is_empty() => return Ok(None),
		serde_yaml::Value::Mapping(_) => {},
		other => {
			return Err(AnnotationError::NotMapping {
				path: path.to_path_buf(),
				found: yaml_kind(other),
			});
		},
	}

	match serde_json::to_value(yaml)
		.map_err(|err| AnnotationError::Convert { path: path.to_path_buf(), source: err })?
	{
		Value::Object(metadata) => Ok(Some(metadata)),
		_ => Err(AnnotationError::NotMapping { path: path.to_path_buf(), found: "a tagged value" }),
	}
}

/// Loads an annotation file for reconciliation.
///
/// Never fails: unreadable or malformed files are logged and treated like empty ones.
pub fn load_annotation(path: &Path) -> Option<Metadata> {
	match read_annotation(path) {
		Ok(Some(metadata)) => Some(metadata),
		Ok(None) => {
			tracing::info!(path = %path.display(), "Annotation file is empty; nothing to apply.");

			None
		},
		Err(err) => {
			tracing::error!(path = %path.display(), error = %err, "Failed to load annotation file.");

			None
		},
	}
}

pub fn is_annotation_file(path: &Path) -> bool {
	path.file_name().is_some_and(|name| name == ANNOTATION_FILE_NAME)
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
	match value {
		serde_yaml::Value::Null => "null",
		serde_yaml::Value::Bool(_) => "a boolean",
		serde_yaml::Value::Number(_) => "a number",
		serde_yaml::Value::String(_) => "a string",
		serde_yaml::Value::Sequence(_) => "a sequence",
		serde_yaml::Value::Mapping(_) => "a mapping",
		serde_yaml::Value::Tagged(_) => "a tagged value",
	}
}
