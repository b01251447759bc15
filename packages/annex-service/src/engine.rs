//! The reconciliation engine: annotation → candidate files → index documents.

use std::{
	ops::AddAssign,
	path::{Path, PathBuf},
	sync::Arc,
};

use annex_index::IndexClient;

use crate::{
	annotation::{self, Metadata},
	applier::{self, ApplyOutcome},
	resolver::IdentityResolver,
	walker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	Idle,
	Scanning,
	ApplyingOne,
}

/// What happened to the candidates of one annotation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
	pub candidates: usize,
	pub updated: usize,
	pub unchanged: usize,
	pub not_found: usize,
	pub failed: usize,
}
impl PassReport {
	fn record(&mut self, outcome: CandidateOutcome) {
		match outcome {
			CandidateOutcome::Updated => self.updated += 1,
			CandidateOutcome::Unchanged => self.unchanged += 1,
			CandidateOutcome::NotFound => self.not_found += 1,
			CandidateOutcome::Failed => self.failed += 1,
		}
	}
}
impl AddAssign for PassReport {
	fn add_assign(&mut self, rhs: Self) {
		self.candidates += rhs.candidates;
		self.updated += rhs.updated;
		self.unchanged += rhs.unchanged;
		self.not_found += rhs.not_found;
		self.failed += rhs.failed;
	}
}

/// Totals of a full scan over the watch root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
	pub annotations: usize,
	pub totals: PassReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateOutcome {
	Updated,
	Unchanged,
	NotFound,
	Failed,
}

pub struct Reconciler {
	index: Arc<dyn IndexClient>,
	resolver: Box<dyn IdentityResolver>,
	index_name: String,
	root: PathBuf,
	state: EngineState,
}
impl Reconciler {
	/// `root` must already be canonical; watch events and walks are matched against it verbatim.
	pub fn new(
		index: Arc<dyn IndexClient>,
		resolver: Box<dyn IdentityResolver>,
		index_name: impl Into<String>,
		root: impl Into<PathBuf>,
	) -> Self {
		Self {
			index,
			resolver,
			index_name: index_name.into(),
			root: root.into(),
			state: EngineState::Idle,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn state(&self) -> EngineState {
		self.state
	}

	/// Event-triggered pass over a single annotation file.
	pub async fn reconcile_annotation(&mut self, annotation_path: &Path) -> PassReport {
		self.transition(EngineState::Scanning);

		let report = self.apply_one(annotation_path).await;

		self.transition(EngineState::Idle);

		report
	}

	/// Scan-triggered pass over every annotation file below the root.
	pub async fn scan_tree(&mut self) -> ScanReport {
		self.transition(EngineState::Scanning);

		let mut report = ScanReport::default();

		for annotation_path in walker::annotation_files(&self.root) {
			report.annotations += 1;
			report.totals += self.apply_one(&annotation_path).await;
		}

		self.transition(EngineState::Idle);

		tracing::info!(
			annotations = report.annotations,
			candidates = report.totals.candidates,
			updated = report.totals.updated,
			unchanged = report.totals.unchanged,
			not_found = report.totals.not_found,
			failed = report.totals.failed,
			"Full scan finished."
		);

		report
	}

	async fn apply_one(&mut self, annotation_path: &Path) -> PassReport {
		let mut report = PassReport::default();

		if walker::relative_path(&self.root, annotation_path).is_none() {
			tracing::warn!(
				path = %annotation_path.display(),
				root = %self.root.display(),
				"Ignoring annotation file outside the watch root."
			);

			return report;
		}

		let Some(metadata) = load_off_runtime(annotation_path).await else {
			return report;
		};
		let Some(directory) = annotation_path.parent() else {
			return report;
		};

		self.transition(EngineState::ApplyingOne);
		tracing::info!(path = %annotation_path.display(), "Applying annotation file.");

		for candidate in walker::candidate_files(directory) {
			report.candidates += 1;
			report.record(self.apply_candidate(&candidate, &metadata).await);
		}

		self.transition(EngineState::Scanning);
		tracing::info!(
			path = %annotation_path.display(),
			candidates = report.candidates,
			updated = report.updated,
			unchanged = report.unchanged,
			not_found = report.not_found,
			failed = report.failed,
			"Annotation file applied."
		);

		report
	}

	async fn apply_candidate(&self, candidate: &Path, metadata: &Metadata) -> CandidateOutcome {
		let Some(relative) = walker::relative_path(&self.root, candidate) else {
			tracing::warn!(path = %candidate.display(), "Candidate file is outside the watch root.");

			return CandidateOutcome::Failed;
		};
		let index = self.index.as_ref();
		let resolved = match self.resolver.resolve(index, &self.index_name, &relative).await {
			Ok(Some(resolved)) => resolved,
			Ok(None) => {
				tracing::warn!(
					path = %relative,
					strategy = %self.resolver.strategy(),
					"No index document found for file."
				);

				return CandidateOutcome::NotFound;
			},
			Err(err) => {
				tracing::error!(
					path = %relative,
					strategy = %self.resolver.strategy(),
					error = %err,
					"Failed to resolve index document for file."
				);

				return CandidateOutcome::Failed;
			},
		};
		let id = resolved.id.clone();

		match applier::apply_metadata(index, &self.index_name, resolved, metadata).await {
			Ok(ApplyOutcome::Updated) => {
				tracing::info!(path = %relative, id = %id, "Updated metadata.");

				CandidateOutcome::Updated
			},
			Ok(ApplyOutcome::Unchanged) => {
				tracing::debug!(path = %relative, id = %id, "Metadata already up to date.");

				CandidateOutcome::Unchanged
			},
			Ok(ApplyOutcome::Missing) => {
				tracing::warn!(path = %relative, id = %id, "Index document vanished before update.");

				CandidateOutcome::NotFound
			},
			Err(err) => {
				tracing::error!(
					path = %relative,
					id = %id,
					error = %err,
					"Failed to update metadata."
				);

				CandidateOutcome::Failed
			},
		}
	}

	fn transition(&mut self, next: EngineState) {
		tracing::trace!(from = ?self.state, to = ?next, "Engine state transition.");

		self.state = next;
	}
}

/// Reads the annotation on the blocking pool. The directory walk stays inline and lazy.
async fn load_off_runtime(annotation_path: &Path) -> Option<Metadata> {
	let path = annotation_path.to_path_buf();

	match tokio::task::spawn_blocking(move || annotation::load_annotation(&path)).await {
		Ok(metadata) => metadata,
		Err(err) => {
			tracing::error!(
				path = %annotation_path.display(),
				error = %err,
				"Annotation loader task failed."
			);

			None
		},
	}
}
