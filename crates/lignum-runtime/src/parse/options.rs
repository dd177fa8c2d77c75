//! Parse options and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::error::CancelReason;

/// Runtime limits and knobs for one parse.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Maximum parser operations (default: unlimited).
    pub(crate) budget: Option<u64>,
    pub(crate) deadline: Option<Instant>,
    pub(crate) cancellation_flag: Option<Arc<AtomicBool>>,
    /// Operations between deadline and flag checks (default: 100).
    pub(crate) check_interval: u32,
    /// Maximum live parse versions (default: 6).
    pub(crate) max_versions: usize,
    /// Reuse subtrees of the previous tree on reparse (default: true).
    pub(crate) incremental: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            budget: None,
            deadline: None,
            cancellation_flag: None,
            check_interval: 100,
            max_versions: 6,
            incremental: true,
        }
    }
}

impl ParseOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel after this many parser operations.
    pub fn budget(mut self, operations: u64) -> Self {
        self.budget = Some(operations);
        self
    }

    /// Cancel once `deadline` has passed.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cancel once `timeout` has elapsed from now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    /// Cancel when `flag` becomes true.
    pub fn cancellation_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation_flag = Some(flag);
        self
    }

    /// Set how many operations pass between deadline and flag checks.
    pub fn check_interval(mut self, interval: u32) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Set the maximum number of live parse versions.
    pub fn max_versions(mut self, max: usize) -> Self {
        self.max_versions = max.max(1);
        self
    }

    /// Enable or disable subtree reuse on reparse.
    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn get_budget(&self) -> Option<u64> {
        self.budget
    }
    pub fn get_deadline(&self) -> Option<Instant> {
        self.deadline
    }
    pub fn get_check_interval(&self) -> u32 {
        self.check_interval
    }
    pub fn get_max_versions(&self) -> usize {
        self.max_versions
    }
    pub fn get_incremental(&self) -> bool {
        self.incremental
    }
}

/// Operation counter checked by the parser loop.
pub(crate) struct Fuel<'o> {
    options: &'o ParseOptions,
    operations: u64,
    until_check: u32,
}

impl<'o> Fuel<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            operations: 0,
            until_check: options.check_interval,
        }
    }

    /// Count one operation. The budget is exact; the deadline and the flag
    /// are polled every `check_interval` operations.
    pub fn tick(&mut self) -> Result<(), CancelReason> {
        self.operations += 1;
        if let Some(budget) = self.options.budget {
            if self.operations > budget {
                return Err(CancelReason::Budget(budget));
            }
        }

        self.until_check -= 1;
        if self.until_check > 0 {
            return Ok(());
        }
        self.until_check = self.options.check_interval;

        if let Some(flag) = &self.options.cancellation_flag {
            if flag.load(Ordering::Relaxed) {
                return Err(CancelReason::Flag);
            }
        }
        if let Some(deadline) = self.options.deadline {
            if Instant::now() >= deadline {
                return Err(CancelReason::Deadline);
            }
        }
        Ok(())
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }
}
