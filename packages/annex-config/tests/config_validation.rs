use std::{
	collections::HashMap,
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use toml::Value;

use annex_config::{Config, Error, ResolverStrategy};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with(section: &str, key: &str, value: Option<Value>) -> String {
	let mut value_root: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value_root.as_table_mut().expect("Sample config must be a table.");
	let table = root
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Sample config must include [{section}]."));

	match value {
		Some(value) => {
			table.insert(key.to_string(), value);
		},
		None => {
			table.remove(key);
		},
	}

	toml::to_string(&value_root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("annex_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> annex_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = annex_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn base_env() -> HashMap<&'static str, String> {
	HashMap::from([
		("ELASTIC_HOST", "http://elasticsearch:9200".to_string()),
		("ELASTIC_USERNAME", "elastic".to_string()),
		("ELASTIC_PASSWORD", "secret".to_string()),
		("ELASTIC_INDEX", "test".to_string()),
		("WATCH_PATH", "/tmp/es".to_string()),
	])
}

fn from_map(vars: &HashMap<&'static str, String>) -> annex_config::Result<Config> {
	annex_config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.index.name, "documents");
	assert_eq!(cfg.watch.scan_interval(), Duration::from_secs(60));
	assert_eq!(cfg.resolver.strategy, ResolverStrategy::DirectId);
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let mut value: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	root.remove("service");
	root.remove("resolver");
	root.get_mut("watch")
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [watch].")
		.remove("scan_interval_secs");

	let cfg = load_payload(toml::to_string(&value).expect("Failed to render config."))
		.expect("Config without optional sections must load.");

	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.watch.scan_interval_secs, 60);
	assert_eq!(cfg.resolver.strategy, ResolverStrategy::DirectId);
	assert_eq!(cfg.resolver.search_field, "path.real");
	assert_eq!(cfg.resolver.url_prefix, "/tmp/es/");
}

#[test]
fn missing_password_is_a_parse_error() {
	let err = load_payload(sample_toml_with("index", "password", None))
		.expect_err("Expected missing password to fail.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn blank_password_is_rejected() {
	let err = load_payload(sample_toml_with(
		"index",
		"password",
		Some(Value::String("  ".to_string())),
	))
	.expect_err("Expected blank password to fail.");

	assert!(
		err.to_string().contains("index.password must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn scan_interval_must_be_positive() {
	let err =
		load_payload(sample_toml_with("watch", "scan_interval_secs", Some(Value::Integer(0))))
			.expect_err("Expected zero scan interval to fail.");

	assert!(
		err.to_string().contains("watch.scan_interval_secs must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn unknown_strategy_is_rejected() {
	let err = load_payload(sample_toml_with(
		"resolver",
		"strategy",
		Some(Value::String("guess".to_string())),
	))
	.expect_err("Expected unknown strategy to fail.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn host_must_carry_a_scheme() {
	let mut cfg = base_config();

	cfg.index.host = "elasticsearch:9200".to_string();

	let err = annex_config::validate(&cfg).expect_err("Expected host validation error.");

	assert!(
		err.to_string().contains("index.host must start with http:// or https://."),
		"Unexpected error: {err}"
	);
}

#[test]
fn host_and_prefix_are_normalized() {
	let payload = sample_toml_with(
		"index",
		"host",
		Some(Value::String("https://elasticsearch:9200/".to_string())),
	);
	let mut value: Value = toml::from_str(&payload).expect("Failed to parse config.");

	value
		.get_mut("resolver")
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [resolver].")
		.insert("url_prefix".to_string(), Value::String("/srv/ingest".to_string()));

	let cfg = load_payload(toml::to_string(&value).expect("Failed to render config."))
		.expect("Config must load.");

	assert_eq!(cfg.index.host, "https://elasticsearch:9200");
	assert_eq!(cfg.resolver.url_prefix, "/srv/ingest/");
}

#[test]
fn debug_output_redacts_password() {
	let cfg = base_config();
	let rendered = format!("{:?}", cfg.index);

	assert!(!rendered.contains("changeme"), "Password leaked: {rendered}");
	assert!(rendered.contains("<redacted>"));
}

#[test]
fn env_config_loads_with_defaults() {
	let cfg = from_map(&base_env()).expect("Environment config must load.");

	assert_eq!(cfg.index.host, "http://elasticsearch:9200");
	assert_eq!(cfg.index.name, "test");
	assert!(!cfg.index.verify_certs);
	assert_eq!(cfg.watch.root, PathBuf::from("/tmp/es"));
	assert_eq!(cfg.watch.scan_interval_secs, 60);
	assert_eq!(cfg.resolver.strategy, ResolverStrategy::DirectId);
}

#[test]
fn env_config_requires_every_connection_setting() {
	for key in ["ELASTIC_HOST", "ELASTIC_USERNAME", "ELASTIC_PASSWORD", "ELASTIC_INDEX", "WATCH_PATH"]
	{
		let mut vars = base_env();

		vars.remove(key);

		let err = from_map(&vars).expect_err("Expected missing setting to fail.");

		assert!(
			matches!(err, Error::Missing { key: missing } if missing == key),
			"Unexpected error for {key}: {err}"
		);
	}
}

#[test]
fn env_blank_value_counts_as_missing() {
	let mut vars = base_env();

	vars.insert("ELASTIC_PASSWORD", "   ".to_string());

	let err = from_map(&vars).expect_err("Expected blank password to fail.");

	assert!(matches!(err, Error::Missing { key: "ELASTIC_PASSWORD" }), "Unexpected error: {err}");
}

#[test]
fn env_optional_settings_are_parsed() {
	let mut vars = base_env();

	vars.insert("SCAN_INTERVAL_SECONDS", "15".to_string());
	vars.insert("RESOLVER_STRATEGY", "url_search".to_string());
	vars.insert("SEARCH_FIELD", "file.url".to_string());
	vars.insert("URL_PREFIX", "file:///tmp/es".to_string());
	vars.insert("ELASTIC_VERIFY_CERTS", "true".to_string());

	let cfg = from_map(&vars).expect("Environment config must load.");

	assert_eq!(cfg.watch.scan_interval(), Duration::from_secs(15));
	assert_eq!(cfg.resolver.strategy, ResolverStrategy::UrlSearch);
	assert_eq!(cfg.resolver.search_field, "file.url");
	assert_eq!(cfg.resolver.url_prefix, "file:///tmp/es/");
	assert!(cfg.index.verify_certs);
}

#[test]
fn env_rejects_malformed_numbers_and_strategies() {
	let mut vars = base_env();

	vars.insert("SCAN_INTERVAL_SECONDS", "soon".to_string());

	let err = from_map(&vars).expect_err("Expected malformed interval to fail.");

	assert!(
		matches!(err, Error::Invalid { key: "SCAN_INTERVAL_SECONDS", .. }),
		"Unexpected error: {err}"
	);

	let mut vars = base_env();

	vars.insert("RESOLVER_STRATEGY", "fuzzy".to_string());

	let err = from_map(&vars).expect_err("Expected unknown strategy to fail.");

	assert!(
		matches!(err, Error::Invalid { key: "RESOLVER_STRATEGY", .. }),
		"Unexpected error: {err}"
	);
}
