//! Integer sweep range and run-id padding.

/// Inclusive integer range traversed with a fixed positive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepRange {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl SweepRange {
    pub fn new(start: i64, stop: i64, step: i64) -> Self {
        Self { start, stop, step }
    }

    /// Yields `start, start + step, …` up to and including `stop`.
    ///
    /// Empty when `step <= 0` or `stop < start`.
    pub fn values(&self) -> impl Iterator<Item = i64> + use<> {
        let Self { start, stop, step } = *self;
        let first = (step > 0 && start <= stop).then_some(start);
        std::iter::successors(first, move |&i| i.checked_add(step).filter(|&n| n <= stop))
    }

    /// Number of runs, `floor((stop - start) / step) + 1` for a valid range.
    pub fn len(&self) -> usize {
        if self.step <= 0 || self.stop < self.start {
            return 0;
        }
        ((self.stop - self.start) / self.step + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Archive suffix of `value`, zero-padded to the digit count of `stop`.
    pub fn run_suffix(&self, value: i64) -> String {
        pad_run_id(value, self.stop)
    }
}

/// Left-pads `value` with zeros to as many digits as `stop` has, so that
/// lexicographic order of archived files matches numeric order.
pub fn pad_run_id(value: i64, stop: i64) -> String {
    let width = stop.to_string().len();
    format!("{value:0width$}")
}
