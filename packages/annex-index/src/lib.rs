pub mod elasticsearch;

mod error;

pub use elasticsearch::ElasticsearchClient;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin};

use serde_json::{Map, Value};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A document body as stored by the index. Key order is preserved.
pub type Document = Map<String, Value>;

/// Exact-phrase match of `phrase` against a single `field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseQuery {
	pub field: String,
	pub phrase: String,
}

/// Identity of a matching document. Bodies are not returned; callers `get` what they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
	pub id: String,
}

/// The subset of index operations the reconciler consumes.
///
/// `get` answers `Ok(None)` for a well-formed "no such document" reply and reserves `Err` for
/// transport or protocol failures. `search` returns hits in the index's relevance order.
/// `index` overwrites the document stored under `id`.
pub trait IndexClient
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, index: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Document>>>;

	fn search<'a>(
		&'a self,
		index: &'a str,
		query: &'a PhraseQuery,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;

	fn index<'a>(
		&'a self,
		index: &'a str,
		id: &'a str,
		document: &'a Document,
	) -> BoxFuture<'a, Result<()>>;
}
