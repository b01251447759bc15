//! Mapping from a file path (relative to the watch root) to the index document it was ingested as.

use annex_config::{Resolver as ResolverConfig, ResolverStrategy};
use annex_index::{BoxFuture, Document, IndexClient, PhraseQuery, Result};

/// Identity of a located document, plus its body when the lookup already fetched it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
	pub id: String,
	pub source: Option<Document>,
}

/// Locates the index document for a candidate file.
///
/// `Ok(None)` means the index answered and holds no such document. `Err` is reserved for
/// transport or protocol failures. Neither aborts a reconciliation pass.
pub trait IdentityResolver
where
	Self: Send + Sync,
{
	fn strategy(&self) -> ResolverStrategy;

	fn resolve<'a>(
		&'a self,
		index: &'a dyn IndexClient,
		index_name: &'a str,
		relative_path: &'a str,
	) -> BoxFuture<'a, Result<Option<ResolvedDocument>>>;
}

/// The document id is the relative path itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectIdResolver;
impl IdentityResolver for DirectIdResolver {
	fn strategy(&self) -> ResolverStrategy {
		ResolverStrategy::DirectId
	}

	fn resolve<'a>(
		&'a self,
		index: &'a dyn IndexClient,
		index_name: &'a str,
		relative_path: &'a str,
	) -> BoxFuture<'a, Result<Option<ResolvedDocument>>> {
		Box::pin(async move {
			let source = index.get(index_name, relative_path).await?;

			Ok(source.map(|source| ResolvedDocument {
				id: relative_path.to_string(),
				source: Some(source),
			}))
		})
	}
}

/// The document id is unknown; search for the document whose stored location matches.
///
/// The searched location is `url_prefix` followed by the relative path, so the prefix stands in
/// for the watch root as the ingestion pipeline saw it.
#[derive(Debug, Clone)]
pub struct UrlSearchResolver {
	field: String,
	url_prefix: String,
}
impl UrlSearchResolver {
	pub fn new(field: impl Into<String>, url_prefix: impl Into<String>) -> Self {
		Self { field: field.into(), url_prefix: url_prefix.into() }
	}

	pub fn location_for(&self, relative_path: &str) -> String {
		format!("{}{relative_path}", self.url_prefix)
	}
}
impl IdentityResolver for UrlSearchResolver {
	fn strategy(&self) -> ResolverStrategy {
		ResolverStrategy::UrlSearch
	}

	fn resolve<'a>(
		&'a self,
		index: &'a dyn IndexClient,
		index_name: &'a str,
		relative_path: &'a str,
	) -> BoxFuture<'a, Result<Option<ResolvedDocument>>> {
		Box::pin(async move {
			let query =
				PhraseQuery { field: self.field.clone(), phrase: self.location_for(relative_path) };
			let hits = index.search(index_name, &query).await?;

			// Search hits may lag behind realtime gets, so the body is fetched again on apply.
			Ok(hits.into_iter().next().map(|hit| ResolvedDocument { id: hit.id, source: None }))
		})
	}
}

pub fn resolver_for(cfg: &ResolverConfig) -> Box<dyn IdentityResolver> {
	match cfg.strategy {
		ResolverStrategy::DirectId => Box::new(DirectIdResolver),
		ResolverStrategy::UrlSearch =>
			Box::new(UrlSearchResolver::new(cfg.search_field.clone(), cfg.url_prefix.clone())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn search_location_replaces_the_root_with_the_prefix() {
		let resolver = UrlSearchResolver::new("path.real", "/tmp/es/");

		assert_eq!(resolver.location_for("a/report.csv"), "/tmp/es/a/report.csv");
	}

	#[test]
	fn configuration_selects_the_strategy() {
		let mut cfg = ResolverConfig::default();

		assert_eq!(resolver_for(&cfg).strategy(), ResolverStrategy::DirectId);

		cfg.strategy = ResolverStrategy::UrlSearch;

		assert_eq!(resolver_for(&cfg).strategy(), ResolverStrategy::UrlSearch);
	}
}
