use std::{env, path::PathBuf};

use crate::{
	Config, Error, Index, Resolver, ResolverStrategy, Result, Service, Watch,
	types::{default_log_level, default_scan_interval_secs, default_search_field, default_url_prefix},
};

pub const ELASTIC_HOST: &str = "ELASTIC_HOST";
pub const ELASTIC_USERNAME: &str = "ELASTIC_USERNAME";
pub const ELASTIC_PASSWORD: &str = "ELASTIC_PASSWORD";
pub const ELASTIC_INDEX: &str = "ELASTIC_INDEX";
pub const ELASTIC_VERIFY_CERTS: &str = "ELASTIC_VERIFY_CERTS";
pub const WATCH_PATH: &str = "WATCH_PATH";
pub const SCAN_INTERVAL_SECONDS: &str = "SCAN_INTERVAL_SECONDS";
pub const RESOLVER_STRATEGY: &str = "RESOLVER_STRATEGY";
pub const SEARCH_FIELD: &str = "SEARCH_FIELD";
pub const URL_PREFIX: &str = "URL_PREFIX";
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Builds the configuration from the process environment.
pub fn from_env() -> Result<Config> {
	from_lookup(|key| env::var(key).ok())
}

/// Builds the configuration from an arbitrary key/value source.
///
/// Blank values count as unset.
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
	let require = |key: &'static str| get(key).ok_or(Error::Missing { key });

	let index = Index {
		host: require(ELASTIC_HOST)?,
		username: require(ELASTIC_USERNAME)?,
		password: require(ELASTIC_PASSWORD)?,
		name: require(ELASTIC_INDEX)?,
		verify_certs: match get(ELASTIC_VERIFY_CERTS) {
			Some(raw) => parse_bool(ELASTIC_VERIFY_CERTS, &raw)?,
			None => false,
		},
	};
	let watch = Watch {
		root: PathBuf::from(require(WATCH_PATH)?),
		scan_interval_secs: match get(SCAN_INTERVAL_SECONDS) {
			Some(raw) => raw.trim().parse().map_err(|_| Error::Invalid {
				key: SCAN_INTERVAL_SECONDS,
				message: format!("expected a whole number of seconds, got {raw:?}."),
			})?,
			None => default_scan_interval_secs(),
		},
	};
	let resolver = Resolver {
		strategy: match get(RESOLVER_STRATEGY) {
			Some(raw) => raw
				.parse::<ResolverStrategy>()
				.map_err(|message| Error::Invalid { key: RESOLVER_STRATEGY, message })?,
			None => ResolverStrategy::default(),
		},
		search_field: get(SEARCH_FIELD).unwrap_or_else(default_search_field),
		url_prefix: get(URL_PREFIX).unwrap_or_else(default_url_prefix),
	};
	let service = Service { log_level: get(LOG_LEVEL).unwrap_or_else(default_log_level) };
	let mut cfg = Config { service, index, watch, resolver };

	crate::normalize(&mut cfg);
	crate::validate(&cfg)?;

	Ok(cfg)
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(Error::Invalid { key, message: format!("expected a boolean, got {raw:?}.") }),
	}
}
