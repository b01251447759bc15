use serde_json::Value;

use annex_index::{IndexClient, Result};

use crate::{annotation::Metadata, resolver::ResolvedDocument};

/// Field of an index document that annotation metadata replaces.
pub const METADATA_FIELD: &str = "metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
	/// The document was rewritten with the new metadata.
	Updated,
	/// The stored metadata already matched; nothing was written.
	Unchanged,
	/// The document disappeared between resolution and apply.
	Missing,
}

/// Replaces the `metadata` field of a resolved document and writes the body back.
///
/// Every other field is left as stored. Concurrent writers are not ordered: the last write to land
/// in the index wins.
pub async fn apply_metadata(
	index: &dyn IndexClient,
	index_name: &str,
	resolved: ResolvedDocument,
	metadata: &Metadata,
) -> Result<ApplyOutcome> {
	let ResolvedDocument { id, source } = resolved;
	let source = match source {
		Some(source) => Some(source),
		None => index.get(index_name, &id).await?,
	};
	let Some(mut document) = source else {
		return Ok(ApplyOutcome::Missing);
	};

	if let Some(Value::Object(current)) = document.get(METADATA_FIELD)
		&& current == metadata
	{
		return Ok(ApplyOutcome::Unchanged);
	}

	document.insert(METADATA_FIELD.to_string(), Value::Object(metadata.clone()));
	index.index(index_name, &id, &document).await?;

	Ok(ApplyOutcome::Updated)
}
