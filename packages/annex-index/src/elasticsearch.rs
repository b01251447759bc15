use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Map, Value};

use crate::{BoxFuture, Document, Error, IndexClient, PhraseQuery, Result, SearchHit};

const SEARCH_HIT_LIMIT: u32 = 1;
const MAX_ERROR_BODY_CHARS: usize = 1_024;

pub struct ElasticsearchClient {
	client: Client,
	base: Url,
	username: String,
	password: String,
}
impl ElasticsearchClient {
	pub fn new(cfg: &annex_config::Index) -> Result<Self> {
		let base = Url::parse(&cfg.host).map_err(|err| Error::InvalidConfig {
			message: format!("index.host {:?} is not a valid URL: {err}.", cfg.host),
		})?;

		if base.cannot_be_a_base() {
			return Err(Error::InvalidConfig {
				message: format!("index.host {:?} cannot carry a path.", cfg.host),
			});
		}

		let client = Client::builder().danger_accept_invalid_certs(!cfg.verify_certs).build()?;

		Ok(Self { client, base, username: cfg.username.clone(), password: cfg.password.clone() })
	}

	/// Joins `segments` onto the base URL, percent-encoding each one (ids may contain `/`).
	pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| Error::InvalidConfig {
				message: format!("index.host {} cannot carry a path.", self.base),
			})?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
		request.basic_auth(&self.username, Some(&self.password))
	}

	async fn get_document(&self, index: &str, id: &str) -> Result<Option<Document>> {
		let url = self.endpoint(&[index, "_doc", id])?;
		let response = self.authorized(self.client.get(url)).send().await?;
		let (status, body) = read_body(response).await?;

		parse_get_response(status, &body)
	}

	async fn search_documents(&self, index: &str, query: &PhraseQuery) -> Result<Vec<SearchHit>> {
		let url = self.endpoint(&[index, "_search"])?;
		let mut phrase = Map::new();

		phrase.insert(query.field.clone(), Value::String(query.phrase.clone()));

		let body = serde_json::json!({
			"size": SEARCH_HIT_LIMIT,
			"_source": false,
			"query": { "match_phrase": phrase },
		});
		let response = self.authorized(self.client.post(url)).json(&body).send().await?;
		let (status, body) = read_body(response).await?;

		if !status.is_success() {
			return Err(unexpected_status(status, &body));
		}

		parse_search_response(&serde_json::from_str(&body)?)
	}

	async fn put_document(&self, index: &str, id: &str, document: &Document) -> Result<()> {
		let url = self.endpoint(&[index, "_doc", id])?;
		let response = self.authorized(self.client.put(url)).json(document).send().await?;
		let (status, body) = read_body(response).await?;

		if !status.is_success() {
			return Err(unexpected_status(status, &body));
		}

		Ok(())
	}
}
impl IndexClient for ElasticsearchClient {
	fn get<'a>(&'a self, index: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Document>>> {
		Box::pin(self.get_document(index, id))
	}

	fn search<'a>(
		&'a self,
		index: &'a str,
		query: &'a PhraseQuery,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(self.search_documents(index, query))
	}

	fn index<'a>(
		&'a self,
		index: &'a str,
		id: &'a str,
		document: &'a Document,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.put_document(index, id, document))
	}
}

async fn read_body(response: Response) -> Result<(StatusCode, String)> {
	let status = response.status();
	let body = response.text().await?;

	Ok((status, body))
}

fn unexpected_status(status: StatusCode, body: &str) -> Error {
	Error::UnexpectedStatus { status: status.as_u16(), body: truncate(body) }
}

fn truncate(body: &str) -> String {
	match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
		Some((cut, _)) => format!("{}...", &body[..cut]),
		None => body.to_string(),
	}
}

/// A 404 is only "not found" when the body says `found: false`; a missing index also answers 404
/// and is reported as an error.
fn parse_get_response(status: StatusCode, body: &str) -> Result<Option<Document>> {
	let json = serde_json::from_str::<Value>(body).ok();
	let found = json.as_ref().and_then(|json| json.get("found")).and_then(Value::as_bool);

	match (status, found) {
		(StatusCode::NOT_FOUND, Some(false)) => Ok(None),
		(status, Some(false)) if status.is_success() => Ok(None),
		(status, Some(true)) if status.is_success() => {
			let source = json
				.and_then(|mut json| json.get_mut("_source").map(Value::take))
				.ok_or_else(|| Error::InvalidResponse {
					message: "Get response is missing _source.".to_string(),
				})?;

			match source {
				Value::Object(document) => Ok(Some(document)),
				_ => Err(Error::InvalidResponse {
					message: "Get response _source must be an object.".to_string(),
				}),
			}
		},
		(status, _) => Err(unexpected_status(status, body)),
	}
}

fn parse_search_response(json: &Value) -> Result<Vec<SearchHit>> {
	let hits = json
		.get("hits")
		.and_then(|hits| hits.get("hits"))
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Search response is missing hits.hits array.".to_string(),
		})?;
	let mut out = Vec::with_capacity(hits.len());

	for hit in hits {
		let id = hit.get("_id").and_then(Value::as_str).ok_or_else(|| Error::InvalidResponse {
			message: "Search hit is missing _id.".to_string(),
		})?;
		out.push(SearchHit { id: id.to_string() });
	}

	Ok(out)
}
