//! Periodic full-scan bookkeeping, kept as a value that is threaded through each tick.

use std::{
	collections::BTreeSet,
	fmt::{self, Display, Formatter},
	time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgressMark {
	Quarter,
	Half,
	ThreeQuarters,
}
impl ProgressMark {
	pub const ALL: [Self; 3] = [Self::Quarter, Self::Half, Self::ThreeQuarters];

	pub fn ratio(self) -> f64 {
		match self {
			Self::Quarter => 0.25,
			Self::Half => 0.5,
			Self::ThreeQuarters => 0.75,
		}
	}
}
impl Display for ProgressMark {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let percent = match self {
			Self::Quarter => "25%",
			Self::Half => "50%",
			Self::ThreeQuarters => "75%",
		};

		f.write_str(percent)
	}
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
	pub scan_due: bool,
	/// Marks reached for the first time in the current interval, in ascending order.
	pub newly_crossed: Vec<ProgressMark>,
	/// Elapsed fraction of the interval, capped at 1.0.
	pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSchedule {
	last_scan: Instant,
	crossed: BTreeSet<ProgressMark>,
}
impl ScanSchedule {
	/// A schedule whose interval starts at `last_scan`.
	pub fn new(last_scan: Instant) -> Self {
		Self { last_scan, crossed: BTreeSet::new() }
	}

	pub fn last_scan(&self) -> Instant {
		self.last_scan
	}

	pub fn crossed(&self) -> &BTreeSet<ProgressMark> {
		&self.crossed
	}

	/// Advances the schedule to `now`.
	///
	/// When a scan is due the returned schedule is anchored at `now`, so a late tick does not
	/// shorten the following interval.
	pub fn tick(self, now: Instant, interval: Duration) -> (Self, Tick) {
		let elapsed = now.saturating_duration_since(self.last_scan);

		if elapsed >= interval {
			return (
				Self::new(now),
				Tick { scan_due: true, newly_crossed: Vec::new(), ratio: 1.0 },
			);
		}

		let ratio = elapsed.as_secs_f64() / interval.as_secs_f64();
		let mut crossed = self.crossed;
		let newly_crossed = ProgressMark::ALL
			.into_iter()
			.filter(|mark| ratio >= mark.ratio() && crossed.insert(*mark))
			.collect::<Vec<_>>();

		(
			Self { last_scan: self.last_scan, crossed },
			Tick { scan_due: false, newly_crossed, ratio },
		)
	}
}
