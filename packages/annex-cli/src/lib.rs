use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

use annex_config::{DEFAULT_SCAN_INTERVAL_SECS, Resolver, ResolverStrategy, Service, env};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Green.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Yellow.on_default())
}

/// `--help` footer listing the environment settings read when no config file is given.
pub fn env_help() -> String {
	let resolver = Resolver::default();
	let service = Service::default();
	let rows = [
		(env::ELASTIC_HOST, "required".to_string()),
		(env::ELASTIC_USERNAME, "required".to_string()),
		(env::ELASTIC_PASSWORD, "required".to_string()),
		(env::ELASTIC_INDEX, "required".to_string()),
		(env::ELASTIC_VERIFY_CERTS, "default false".to_string()),
		(env::WATCH_PATH, "required".to_string()),
		(env::SCAN_INTERVAL_SECONDS, format!("default {DEFAULT_SCAN_INTERVAL_SECS}")),
		(
			env::RESOLVER_STRATEGY,
			format!(
				"default {} (or {})",
				ResolverStrategy::DirectId,
				ResolverStrategy::UrlSearch
			),
		),
		(env::SEARCH_FIELD, format!("default {}", resolver.search_field)),
		(env::URL_PREFIX, format!("default {}", resolver.url_prefix)),
		(env::LOG_LEVEL, format!("default {}", service.log_level)),
	];
	let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
	let mut help = String::from("Environment (read when --config is omitted, .env honoured):\n");

	for (key, note) in rows {
		help.push_str(&format!("  {key:<width$}  {note}\n"));
	}

	help
}
