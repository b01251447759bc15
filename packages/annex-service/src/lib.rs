pub mod annotation;
pub mod applier;
pub mod engine;
pub mod resolver;
pub mod schedule;
pub mod walker;
pub mod watch;

mod error;

pub use annotation::{ANNOTATION_FILE_NAME, AnnotationError, Metadata};
pub use applier::ApplyOutcome;
pub use engine::{EngineState, PassReport, Reconciler, ScanReport};
pub use error::{Error, Result};
pub use resolver::{DirectIdResolver, IdentityResolver, ResolvedDocument, UrlSearchResolver};
pub use schedule::{ProgressMark, ScanSchedule, Tick};
pub use watch::AnnotationWatch;

use std::{
	collections::BTreeSet,
	fs,
	future::Future,
	path::{Path, PathBuf},
	sync::Arc,
	time::{Duration, Instant},
};

use tokio::{
	sync::mpsc::{self, UnboundedReceiver},
	time::{self as tokio_time, MissedTickBehavior},
};

use annex_config::Config;
use annex_index::IndexClient;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Keeps index documents in line with the annotation files below one watch root.
///
/// A single task owns the engine, so scheduled scans and watch events never interleave.
pub struct AnnexService {
	reconciler: Reconciler,
	scan_interval: Duration,
}
impl AnnexService {
	pub fn new(cfg: &Config, index: Arc<dyn IndexClient>) -> Result<Self> {
		let root = canonical_root(&cfg.watch.root)?;
		let resolver = resolver::resolver_for(&cfg.resolver);

		tracing::info!(
			root = %root.display(),
			index = %cfg.index.name,
			strategy = %resolver.strategy(),
			scan_interval_secs = cfg.watch.scan_interval_secs,
			"Annotation service configured."
		);

		Ok(Self {
			reconciler: Reconciler::new(index, resolver, cfg.index.name.clone(), root),
			scan_interval: cfg.watch.scan_interval(),
		})
	}

	pub fn root(&self) -> &Path {
		self.reconciler.root()
	}

	pub fn state(&self) -> EngineState {
		self.reconciler.state()
	}

	/// Runs until `shutdown` resolves.
	///
	/// The watch starts before the startup scan so that changes made during the scan are queued.
	pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
	where
		F: Future<Output = ()>,
	{
		let (sender, mut events) = mpsc::unbounded_channel();
		let mut watch = AnnotationWatch::start(self.reconciler.root(), sender)?;
		let mut schedule = ScanSchedule::new(Instant::now());

		tracing::info!("Running startup scan.");
		self.reconciler.scan_tree().await;

		let mut ticker = tokio_time::interval(TICK_INTERVAL);

		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				_ = &mut shutdown => {
					tracing::info!("Shutdown requested.");

					break;
				},
				Some(path) = events.recv() => {
					for path in drain_pending(path, &mut events) {
						self.reconciler.reconcile_annotation(&path).await;
					}
				},
				_ = ticker.tick() => {
					let (next, tick) = schedule.tick(Instant::now(), self.scan_interval);

					schedule = next;

					log_progress(&tick, self.scan_interval);

					if tick.scan_due {
						tracing::info!("Running scheduled scan.");
						self.reconciler.scan_tree().await;
					}
				},
			}
		}

		watch.stop();

		Ok(())
	}
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
	let canonical = fs::canonicalize(root)
		.map_err(|err| Error::InvalidRoot { path: root.to_path_buf(), message: err.to_string() })?;

	if !canonical.is_dir() {
		return Err(Error::InvalidRoot {
			path: root.to_path_buf(),
			message: "not a directory".to_string(),
		});
	}

	Ok(canonical)
}

/// One heartbeat line per progress mark crossed by `tick`.
fn log_progress(tick: &Tick, interval: Duration) {
	let remaining_secs = (interval.as_secs_f64() * (1.0 - tick.ratio)).max(0.0).round() as u64;

	for mark in &tick.newly_crossed {
		tracing::info!(
			progress = %mark,
			ratio = tick.ratio,
			remaining_secs,
			"Waiting for next scheduled scan."
		);
	}
}

fn drain_pending(first: PathBuf, events: &mut UnboundedReceiver<PathBuf>) -> BTreeSet<PathBuf> {
	let mut pending = BTreeSet::from([first]);

	while let Ok(path) = events.try_recv() {
		pending.insert(path);
	}

	pending
}
