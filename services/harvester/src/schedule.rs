//! Daily harvest trigger
//!
//! Fires `RunCoordinator::trigger` once a day at a fixed local wall-clock
//! time. The next firing is recomputed from the clock after every run, so
//! DST shifts and suspended hosts do not accumulate drift.

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use harvest::RunCoordinator;
use std::sync::Arc;
use tracing::{error, info};

use crate::status::RunStatus;

/// A DST gap can swallow at most one occurrence.
const MAX_LOOKAHEAD_DAYS: usize = 3;

/// Time of day at which a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    pub fn parse(raw: &str) -> common::Result<Self> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map(Self::new)
            .map_err(|_| {
                common::Error::Config(format!(
                    "schedule.daily_at must be HH:MM or HH:MM:SS, got: {raw:?}"
                ))
            })
    }

    pub fn time(&self) -> NaiveTime {
        self.at
    }

    /// First occurrence strictly after `now`, in `now`'s timezone.
    ///
    /// When the time falls in a DST gap that day is skipped; when it is
    /// ambiguous the earlier instant is used.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let mut date = now.date_naive();
        for _ in 0..MAX_LOOKAHEAD_DAYS {
            let candidate = tz.from_local_datetime(&date.and_time(self.at)).earliest();
            if let Some(candidate) = candidate.filter(|c| c > now) {
                return Some(candidate);
            }
            date = date.succ_opt()?;
        }
        None
    }

    /// Next occurrence after both `now` and the last fired instant, so a
    /// clock stepped backwards cannot fire the same run twice.
    pub fn next_run<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_fired: Option<&DateTime<Tz>>,
    ) -> Option<DateTime<Tz>> {
        match last_fired {
            Some(fired) if fired > now => self.next_after(fired),
            _ => self.next_after(now),
        }
    }
}

/// Spawn the daily trigger loop. Runs until aborted.
pub fn spawn_daily_trigger(
    coordinator: Arc<RunCoordinator>,
    schedule: DailySchedule,
    status: RunStatus,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_fired: Option<DateTime<Local>> = None;
        loop {
            let now = Local::now();
            let Some(next) = schedule.next_run(&now, last_fired.as_ref()) else {
                error!(at = %schedule.time(), "no upcoming daily run could be computed, trigger stopped");
                return;
            };
            status.set_next_run(next);
            info!(next_run = %next.to_rfc3339(), "next harvest run scheduled");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let handles = coordinator.trigger();
            status.record_run(handles.len());
            last_fired = Some(next);
        }
    })
}
