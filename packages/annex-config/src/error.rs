pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: std::path::PathBuf, source: toml::de::Error },
	#[error("Required setting {key} is not set.")]
	Missing { key: &'static str },
	#[error("Setting {key} is invalid: {message}")]
	Invalid { key: &'static str, message: String },
	#[error("{message}")]
	Validation { message: String },
}
