use std::{
	collections::{BTreeMap, HashSet},
	sync::Mutex,
};

use serde_json::Value;

use annex_index::{BoxFuture, Document, Error, IndexClient, PhraseQuery, Result, SearchHit};

/// In-process stand-in for the search index.
///
/// Documents are kept per index and ordered by id, which doubles as the search relevance order.
/// Individual ids can be made to fail on `get` or `index` to exercise error isolation.
#[derive(Default)]
pub struct MemoryIndex {
	state: Mutex<State>,
}

#[derive(Default)]
struct State {
	documents: BTreeMap<String, BTreeMap<String, Document>>,
	writes: Vec<(String, String)>,
	gets: usize,
	searches: usize,
	failing_gets: HashSet<String>,
	failing_writes: HashSet<String>,
	failing_searches: bool,
}

impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, index: &str, id: &str, document: Document) {
		self.with_state(|state| {
			state
				.documents
				.entry(index.to_string())
				.or_default()
				.insert(id.to_string(), document);
		});
	}

	pub fn document(&self, index: &str, id: &str) -> Option<Document> {
		self.with_state(|state| {
			state.documents.get(index).and_then(|documents| documents.get(id)).cloned()
		})
	}

	pub fn len(&self, index: &str) -> usize {
		self.with_state(|state| state.documents.get(index).map(BTreeMap::len).unwrap_or(0))
	}

	pub fn is_empty(&self, index: &str) -> bool {
		self.len(index) == 0
	}

	/// `(index, id)` pairs of every successful write, in call order.
	pub fn writes(&self) -> Vec<(String, String)> {
		self.with_state(|state| state.writes.clone())
	}

	pub fn write_count(&self) -> usize {
		self.with_state(|state| state.writes.len())
	}

	pub fn get_count(&self) -> usize {
		self.with_state(|state| state.gets)
	}

	pub fn search_count(&self) -> usize {
		self.with_state(|state| state.searches)
	}

	pub fn fail_get(&self, id: &str) {
		self.with_state(|state| {
			state.failing_gets.insert(id.to_string());
		});
	}

	pub fn fail_write(&self, id: &str) {
		self.with_state(|state| {
			state.failing_writes.insert(id.to_string());
		});
	}

	pub fn fail_searches(&self) {
		self.with_state(|state| state.failing_searches = true);
	}

	fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
		let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());

		f(&mut state)
	}
}
impl IndexClient for MemoryIndex {
	fn get<'a>(&'a self, index: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Document>>> {
		let result: Result<Option<Document>> = self.with_state(|state| {
			state.gets += 1;

			if state.failing_gets.contains(id) {
				return Err(injected_failure("get", id));
			}

			Ok(state.documents.get(index).and_then(|documents| documents.get(id)).cloned())
		});

		Box::pin(async move { result })
	}

	fn search<'a>(
		&'a self,
		index: &'a str,
		query: &'a PhraseQuery,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		let result: Result<Vec<SearchHit>> = self.with_state(|state| {
			state.searches += 1;

			if state.failing_searches {
				return Err(injected_failure("search", &query.phrase));
			}

			let hits: Vec<SearchHit> = state
				.documents
				.get(index)
				.into_iter()
				.flatten()
				.filter(|(_, document)| {
					field_value(document, &query.field).and_then(Value::as_str)
						== Some(query.phrase.as_str())
				})
				.map(|(id, _)| SearchHit { id: id.clone() })
				.collect();

			Ok(hits)
		});

		Box::pin(async move { result })
	}

	fn index<'a>(
		&'a self,
		index: &'a str,
		id: &'a str,
		document: &'a Document,
	) -> BoxFuture<'a, Result<()>> {
		let result: Result<()> = self.with_state(|state| {
			if state.failing_writes.contains(id) {
				return Err(injected_failure("index", id));
			}

			state
				.documents
				.entry(index.to_string())
				.or_default()
				.insert(id.to_string(), document.clone());
			state.writes.push((index.to_string(), id.to_string()));

			Ok(())
		});

		Box::pin(async move { result })
	}
}

/// Resolves a dotted field path such as `path.real` inside a document.
fn field_value<'a>(document: &'a Document, field: &str) -> Option<&'a Value> {
	let mut parts = field.split('.');
	let mut current = document.get(parts.next()?)?;

	for part in parts {
		current = current.get(part)?;
	}

	Some(current)
}

fn injected_failure(operation: &str, key: &str) -> Error {
	Error::UnexpectedStatus { status: 500, body: format!("injected {operation} failure for {key}") }
}
