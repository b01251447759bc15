use std::path::{Path, PathBuf};

use notify::{
	Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
	event::{ModifyKind, RenameMode},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{Result, annotation::is_annotation_file};

/// Recursive watch that forwards created or modified annotation files.
///
/// The notify callback thread only forwards paths; reconciliation happens on the receiving side.
pub struct AnnotationWatch {
	watcher: Option<RecommendedWatcher>,
	root: PathBuf,
}
impl AnnotationWatch {
	pub fn start(root: &Path, sender: UnboundedSender<PathBuf>) -> Result<Self> {
		let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
			Ok(event) =>
				for path in annotation_paths(&event) {
					if sender.send(path).is_err() {
						tracing::debug!("Annotation event receiver dropped.");

						return;
					}
				},
			Err(err) => {
				tracing::error!(error = %err, "Filesystem watch reported an error.");
			},
		})?;

		watcher.watch(root, RecursiveMode::Recursive)?;
		tracing::info!(root = %root.display(), "Watching for annotation files.");

		Ok(Self { watcher: Some(watcher), root: root.to_path_buf() })
	}

	pub fn is_active(&self) -> bool {
		self.watcher.is_some()
	}

	/// Releases the watch handle. Calling it again is a no-op.
	pub fn stop(&mut self) {
		let Some(mut watcher) = self.watcher.take() else {
			return;
		};

		if let Err(err) = watcher.unwatch(&self.root) {
			tracing::warn!(root = %self.root.display(), error = %err, "Failed to unwatch root.");
		}

		tracing::info!(root = %self.root.display(), "Stopped watching for annotation files.");
	}
}
impl Drop for AnnotationWatch {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Annotation files touched by a create or modify event.
pub fn annotation_paths(event: &Event) -> Vec<PathBuf> {
	match event.kind {
		EventKind::Modify(ModifyKind::Name(RenameMode::From)) => return Vec::new(),
		EventKind::Create(_) | EventKind::Modify(_) => {},
		_ => return Vec::new(),
	}

	event
		.paths
		.iter()
		.filter(|path| is_annotation_file(path) && !path.is_dir())
		.cloned()
		.collect()
}
