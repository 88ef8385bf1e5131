use crate::error::CoreResult;
use std::cell::Cell;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to one instant until advanced. Interior mutability so a shared
/// `&FixedClock` can be moved between scheduler ticks.
#[derive(Debug)]
pub struct FixedClock {
    at: Cell<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(at: OffsetDateTime) -> Self {
        Self { at: Cell::new(at) }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let by = Duration::try_from(by).unwrap_or(Duration::MAX);
        self.at.set(self.at.get().saturating_add(by));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.at.get()
    }
}

pub fn rfc3339_utc(at: OffsetDateTime) -> CoreResult<String> {
    Ok(at.to_offset(UtcOffset::UTC).format(&Rfc3339)?)
}

/// Human-readable form for the notification panel, e.g. `10/9/2025, 8:53:20 AM UTC`.
pub fn display_timestamp(at: OffsetDateTime) -> CoreResult<String> {
    let fmt = format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period] UTC"
    );
    Ok(at.to_offset(UtcOffset::UTC).format(fmt)?)
}
