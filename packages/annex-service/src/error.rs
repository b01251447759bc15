use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid watch root {path:?}: {message}")]
	InvalidRoot { path: PathBuf, message: String },
	#[error("Filesystem watch error: {message}")]
	Watch { message: String },
}
impl From<notify::Error> for Error {
	fn from(err: notify::Error) -> Self {
		Self::Watch { message: err.to_string() }
	}
}
