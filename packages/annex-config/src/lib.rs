pub mod env;

mod error;
mod types;

pub use env::{from_env, from_lookup};
pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_SCAN_INTERVAL_SECS, Index, Resolver, ResolverStrategy, Service, Watch,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("index.host", &cfg.index.host),
		("index.username", &cfg.index.username),
		("index.password", &cfg.index.password),
		("index.name", &cfg.index.name),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !cfg.index.host.starts_with("http://") && !cfg.index.host.starts_with("https://") {
		return Err(Error::Validation {
			message: "index.host must start with http:// or https://.".to_string(),
		});
	}
	if cfg.watch.root.as_os_str().is_empty() {
		return Err(Error::Validation { message: "watch.root must be non-empty.".to_string() });
	}
	if cfg.watch.scan_interval_secs == 0 {
		return Err(Error::Validation {
			message: "watch.scan_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.resolver.search_field.trim().is_empty() {
		return Err(Error::Validation {
			message: "resolver.search_field must be non-empty.".to_string(),
		});
	}
	if cfg.resolver.url_prefix.is_empty() {
		return Err(Error::Validation {
			message: "resolver.url_prefix must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let host = cfg.index.host.trim().trim_end_matches('/');

	if host.len() != cfg.index.host.len() {
		cfg.index.host = host.to_string();
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.resolver.search_field = cfg.resolver.search_field.trim().to_string();

	if !cfg.resolver.url_prefix.is_empty() && !cfg.resolver.url_prefix.ends_with('/') {
		cfg.resolver.url_prefix.push('/');
	}
}
