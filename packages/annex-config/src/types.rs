use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub index: Index,
	pub watch: Watch,
	#[serde(default)]
	pub resolver: Resolver,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: default_log_level() }
	}
}

#[derive(Clone, Deserialize)]
pub struct Index {
	/// Base URL of the Elasticsearch node, e.g. "https://elasticsearch:9200".
	pub host: String,
	pub username: String,
	pub password: String,
	/// Name of the index holding the documents to annotate.
	pub name: String,
	#[serde(default)]
	pub verify_certs: bool,
}
impl fmt::Debug for Index {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Index")
			.field("host", &self.host)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("name", &self.name)
			.field("verify_certs", &self.verify_certs)
			.finish()
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Watch {
	pub root: PathBuf,
	#[serde(default = "default_scan_interval_secs")]
	pub scan_interval_secs: u64,
}
impl Watch {
	pub fn scan_interval(&self) -> Duration {
		Duration::from_secs(self.scan_interval_secs)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resolver {
	#[serde(default)]
	pub strategy: ResolverStrategy,
	/// Field holding the source location of a document. Only used by `url_search`.
	#[serde(default = "default_search_field")]
	pub search_field: String,
	/// Replaces the watch root when building the searched location. Only used by `url_search`.
	#[serde(default = "default_url_prefix")]
	pub url_prefix: String,
}
impl Default for Resolver {
	fn default() -> Self {
		Self {
			strategy: ResolverStrategy::default(),
			search_field: default_search_field(),
			url_prefix: default_url_prefix(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
	/// The document id is the file path relative to the watch root.
	#[default]
	DirectId,
	/// The document id is discovered by an exact-phrase search on its stored location.
	UrlSearch,
}
impl ResolverStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::DirectId => "direct_id",
			Self::UrlSearch => "url_search",
		}
	}
}
impl FromStr for ResolverStrategy {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"direct_id" => Ok(Self::DirectId),
			"url_search" => Ok(Self::UrlSearch),
			other => Err(format!("expected direct_id or url_search, got {other:?}.")),
		}
	}
}
impl fmt::Display for ResolverStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub(crate) fn default_log_level() -> String {
	"info".to_string()
}

pub(crate) fn default_scan_interval_secs() -> u64 {
	DEFAULT_SCAN_INTERVAL_SECS
}

pub(crate) fn default_search_field() -> String {
	"path.real".to_string()
}

pub(crate) fn default_url_prefix() -> String {
	"/tmp/es/".to_string()
}
