use chrono::{Datelike, Duration, NaiveDate, TimeDelta};
use std::ops::DerefMut;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::errors::TrackerError;
use crate::models::{Day, Week, WeekInfo};
use crate::store::{AppData, UserScope};

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday and Sunday of the week `offset` weeks away from the one containing `today`.
/// Offsets that leave the representable calendar are rejected.
pub fn week_bounds(today: NaiveDate, offset: i64) -> Result<(NaiveDate, NaiveDate), TrackerError> {
    TimeDelta::try_weeks(offset)
        .and_then(|shift| week_start(today).checked_add_signed(shift))
        .and_then(|start| Some((start, start.checked_add_signed(Duration::days(6))?)))
        .ok_or_else(|| {
            warn!(offset, "week offset out of range");
            TrackerError::invalid("week offset out of range")
        })
}

/// Returns the user's week for `offset`, creating it on first access.
pub fn resolve_week<D>(
    scope: &mut UserScope<D>,
    clock: &dyn Clock,
    offset: i64,
) -> Result<Week, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let (start, end) = week_bounds(clock.today(), offset)?;
    let (week, created) = scope.get_or_insert_week(start, end, clock.now());
    if created {
        info!(user = scope.user_id(), %start, %end, "created week");
    }
    Ok(week)
}

/// The seven dates of a week paired with their day keys.
pub fn week_days(week: &Week) -> impl Iterator<Item = (Day, NaiveDate)> {
    let start = week.start_date;
    Day::ALL
        .into_iter()
        .map(move |day| (day, start + Duration::days(day.offset() as i64)))
}

pub fn week_label(offset: i64) -> String {
    match offset {
        0 => "This week".to_string(),
        1 => "Next week".to_string(),
        -1 => "Last week".to_string(),
        n if n > 1 => format!("{n} weeks ahead"),
        n => format!("{} weeks ago", n.unsigned_abs()),
    }
}

pub fn week_info(week: &Week, offset: i64) -> WeekInfo {
    WeekInfo {
        current_offset: offset,
        is_current_week: offset == 0,
        week_label: week_label(offset),
        date_range: format!(
            "{} - {}",
            week.start_date.format("%d/%m/%Y"),
            week.end_date.format("%d/%m/%Y")
        ),
    }
}
