use std::{
	fs,
	path::{Path, PathBuf},
};

use tempfile::TempDir;

/// A temporary watch root populated with plain files and annotation files.
pub struct AnnotatedTree {
	dir: TempDir,
}
impl AnnotatedTree {
	pub fn new() -> Self {
		let dir = tempfile::Builder::new()
			.prefix("annex_tree_")
			.tempdir()
			.unwrap_or_else(|err| panic!("Failed to create temporary tree: {err}."));

		Self { dir }
	}

	/// Canonical path of the tree root, matching what a watcher reports.
	pub fn root(&self) -> PathBuf {
		fs::canonicalize(self.dir.path())
			.unwrap_or_else(|err| panic!("Failed to canonicalize temporary tree: {err}."))
	}

	pub fn path(&self, relative: &str) -> PathBuf {
		self.root().join(relative)
	}

	/// Writes `contents` to `relative`, creating parent directories as needed.
	pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
		let path = self.path(relative);

		write_file(&path, contents);

		path
	}

	/// Writes an annotation file into the directory `relative_dir` (empty for the root).
	pub fn annotate(&self, relative_dir: &str, yaml: &str) -> PathBuf {
		let path = self.path(relative_dir).join("metadata_annotation.yaml");

		write_file(&path, yaml);

		path
	}
}
impl Default for AnnotatedTree {
	fn default() -> Self {
		Self::new()
	}
}

fn write_file(path: &Path, contents: &str) {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.unwrap_or_else(|err| panic!("Failed to create {}: {err}.", parent.display()));
	}

	fs::write(path, contents)
		.unwrap_or_else(|err| panic!("Failed to write {}: {err}.", path.display()));
}
