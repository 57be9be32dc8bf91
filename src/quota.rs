//! Demo-mode policy.
//!
//! Every limit is enforced here and nowhere else. Counts are derived from the activity
//! log on each call; nothing in this module holds state between calls.

use crate::activity::ActivityLogEntry;
use crate::error::{InterchangeError, InterchangeResult};
use crate::settings::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoLimits {
    pub max_import_tasks: usize,
    pub max_exports_per_day: usize,
    pub max_range_days_demo: i64,
    pub max_range_days: i64,
}

impl Default for DemoLimits {
    fn default() -> Self {
        Self {
            max_import_tasks: 10,
            max_exports_per_day: 3,
            max_range_days_demo: 7,
            max_range_days: 365,
        }
    }
}

/// Snapshot of a project's demo allowance, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub demo: bool,
    pub exports_today: usize,
    pub exports_remaining: Option<usize>,
    pub max_import_tasks: Option<usize>,
    pub max_range_days: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct QuotaTracker<'a> {
    limits: &'a DemoLimits,
}

impl<'a> QuotaTracker<'a> {
    pub fn new(limits: &'a DemoLimits) -> Self {
        Self { limits }
    }

    pub fn demo_exports_on(&self, log: &[ActivityLogEntry], day: NaiveDate) -> usize {
        log.iter().filter(|entry| entry.is_demo_export_on(day)).count()
    }

    pub fn check_import(&self, demo: bool, task_count: usize) -> InterchangeResult<()> {
        if demo && task_count > self.limits.max_import_tasks {
            return Err(InterchangeError::DemoTaskQuotaExceeded {
                limit: self.limits.max_import_tasks,
                found: task_count,
            });
        }
        Ok(())
    }

    pub fn check_export(
        &self,
        demo: bool,
        log: &[ActivityLogEntry],
        today: NaiveDate,
    ) -> InterchangeResult<()> {
        if demo && self.demo_exports_on(log, today) >= self.limits.max_exports_per_day {
            return Err(InterchangeError::DemoExportQuotaExceeded {
                limit: self.limits.max_exports_per_day,
            });
        }
        Ok(())
    }

    pub fn max_range_days(&self, demo: bool) -> i64 {
        if demo {
            self.limits.max_range_days_demo
        } else {
            self.limits.max_range_days
        }
    }

    /// Rejects inverted ranges and ranges wider than the mode allows.
    pub fn check_date_range(&self, demo: bool, range: &DateRange) -> InterchangeResult<()> {
        if range.start > range.end {
            return Err(InterchangeError::InvalidDateRange {
                start: range.start,
                end: range.end,
            });
        }
        let days = range.span_days();
        let max_days = self.max_range_days(demo);
        if days > max_days {
            return Err(InterchangeError::DateRangeTooLarge {
                days,
                max_days,
                demo,
            });
        }
        Ok(())
    }

    pub fn usage(&self, demo: bool, log: &[ActivityLogEntry], today: NaiveDate) -> QuotaUsage {
        let exports_today = self.demo_exports_on(log, today);
        QuotaUsage {
            demo,
            exports_today,
            exports_remaining: demo
                .then(|| self.limits.max_exports_per_day.saturating_sub(exports_today)),
            max_import_tasks: demo.then_some(self.limits.max_import_tasks),
            max_range_days: self.max_range_days(demo),
        }
    }
}
