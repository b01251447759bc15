use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::annotation::{ANNOTATION_FILE_NAME, is_annotation_file};

/// Files below `dir` (recursively) that the annotation in `dir` applies to.
///
/// A file belongs to its nearest enclosing annotation: subdirectories holding their own annotation
/// file are not descended into. Symlinked files are yielded under the link's path; symlinked
/// directories are not followed. Annotation files are never yielded. Entries that cannot be read
/// are logged and skipped. Order follows directory traversal and is unspecified.
pub fn candidate_files(dir: &Path) -> impl Iterator<Item = PathBuf> + use<> {
	let walk = WalkDir::new(dir)
		.follow_links(false)
		.into_iter()
		.filter_entry(belongs_to_walk_root);

	files(walk).filter(|path| !is_annotation_file(path))
}

/// Annotation files anywhere below `root`.
pub fn annotation_files(root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
	files(WalkDir::new(root).follow_links(false).into_iter()).filter(|path| is_annotation_file(path))
}

/// `path` relative to `root`, joined with `/`, or `None` when `path` is not below `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
	let relative = path.strip_prefix(root).ok()?;
	let mut parts = Vec::new();

	for component in relative.components() {
		match component {
			Component::Normal(part) => parts.push(part.to_string_lossy()),
			Component::CurDir => {},
			_ => return None,
		}
	}

	if parts.is_empty() {
		return None;
	}

	Some(parts.join("/"))
}

fn files<I>(entries: I) -> impl Iterator<Item = PathBuf>
where
	I: Iterator<Item = walkdir::Result<DirEntry>>,
{
	entries
		.filter_map(|entry| match entry {
			Ok(entry) => Some(entry),
			Err(err) => {
				tracing::warn!(
					path = ?err.path(),
					error = %err,
					"Skipping unreadable entry during directory walk."
				);

				None
			},
		})
		.filter(is_file)
		.map(DirEntry::into_path)
}

fn is_file(entry: &DirEntry) -> bool {
	entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn belongs_to_walk_root(entry: &DirEntry) -> bool {
	entry.depth() == 0 || !is_annotated_dir(entry)
}

fn is_annotated_dir(entry: &DirEntry) -> bool {
	entry.file_type().is_dir() && entry.path().join(ANNOTATION_FILE_NAME).is_file()
}

#[cfg(test)]
mod tests {
	use std::{collections::BTreeSet, fs};

	use super::*;

	fn touch(root: &Path, relative: &str) {
		let path = root.join(relative);

		fs::create_dir_all(path.parent().expect("file must have a parent"))
			.expect("Failed to create dirs.");
		fs::write(&path, "x").expect("Failed to write file.");
	}

	fn relative_set(root: &Path, paths: impl Iterator<Item = PathBuf>) -> BTreeSet<String> {
		paths.filter_map(|path| relative_path(root, &path)).collect()
	}

	#[test]
	fn candidates_cover_subdirectories_and_skip_annotations() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let root = dir.path();

		touch(root, "a/report.csv");
		touch(root, &format!("a/{ANNOTATION_FILE_NAME}"));
		touch(root, "a/plain/er/notes.txt");
		touch(root, "b/elsewhere.txt");
		fs::create_dir_all(root.join("a/empty")).expect("Failed to create dir.");

		let found = relative_set(root, candidate_files(&root.join("a")));

		assert_eq!(
			found,
			BTreeSet::from(["a/report.csv".to_string(), "a/plain/er/notes.txt".to_string()])
		);
	}

	#[test]
	fn nested_annotations_own_their_subtrees() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let root = dir.path();

		touch(root, &format!("a/{ANNOTATION_FILE_NAME}"));
		touch(root, "a/report.csv");
		touch(root, &format!("a/b/{ANNOTATION_FILE_NAME}"));
		touch(root, "a/b/inner.csv");
		touch(root, "a/b/c/deeper.csv");

		assert_eq!(
			relative_set(root, candidate_files(&root.join("a"))),
			BTreeSet::from(["a/report.csv".to_string()])
		);
		assert_eq!(
			relative_set(root, candidate_files(&root.join("a/b"))),
			BTreeSet::from(["a/b/inner.csv".to_string(), "a/b/c/deeper.csv".to_string()])
		);
		assert_eq!(annotation_files(root).count(), 2);
	}

	#[cfg(unix)]
	#[test]
	fn symlinked_files_are_candidates_but_linked_dirs_are_not_walked() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let root = dir.path();

		touch(root, "a/report-2024.csv");
		touch(root, "outside/hidden.csv");
		std::os::unix::fs::symlink(root.join("a/report-2024.csv"), root.join("a/latest.csv"))
			.expect("Failed to create file symlink.");
		std::os::unix::fs::symlink(root.join("outside"), root.join("a/linked"))
			.expect("Failed to create dir symlink.");
		std::os::unix::fs::symlink(root.join("a/missing.csv"), root.join("a/dangling.csv"))
			.expect("Failed to create dangling symlink.");

		assert_eq!(
			relative_set(root, candidate_files(&root.join("a"))),
			BTreeSet::from(["a/latest.csv".to_string(), "a/report-2024.csv".to_string()])
		);
	}

	#[test]
	fn annotation_files_are_found_at_every_depth() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let root = dir.path();

		touch(root, ANNOTATION_FILE_NAME);
		touch(root, &format!("x/y/{ANNOTATION_FILE_NAME}"));
		touch(root, "x/y/data.bin");

		let found = relative_set(root, annotation_files(root));

		assert_eq!(
			found,
			BTreeSet::from([
				ANNOTATION_FILE_NAME.to_string(),
				format!("x/y/{ANNOTATION_FILE_NAME}"),
			])
		);
	}

	#[test]
	fn missing_directory_yields_nothing() {
		assert_eq!(candidate_files(Path::new("/definitely/not/here")).count(), 0);
	}

	#[test]
	fn relative_paths_use_forward_slashes() {
		let root = Path::new("/data");

		assert_eq!(
			relative_path(root, Path::new("/data/a/report.csv")),
			Some("a/report.csv".to_string())
		);
		assert_eq!(relative_path(root, Path::new("/data")), None);
		assert_eq!(relative_path(root, Path::new("/elsewhere/report.csv")), None);
	}
}
