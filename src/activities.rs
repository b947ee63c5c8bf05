use chrono::{DateTime, Utc};
use std::ops::DerefMut;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::errors::TrackerError;
use crate::models::{Activity, ActivityId, Day, NewActivity};
use crate::stats::progress_percentage;
use crate::store::{AppData, UserScope};
use crate::week::resolve_week;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TIME_LEN: usize = 50;

/// User-supplied activity fields, trimmed and length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFields {
    pub day: Day,
    pub name: String,
    pub time: Option<String>,
}

impl ActivityFields {
    pub fn new(day: Day, name: &str, time: Option<&str>) -> Result<Self, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid("activity name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TrackerError::invalid(format!(
                "activity name must be at most {MAX_NAME_LEN} characters"
            )));
        }

        let time = time.map(str::trim).filter(|time| !time.is_empty());
        if time.is_some_and(|time| time.chars().count() > MAX_TIME_LEN) {
            return Err(TrackerError::invalid(format!(
                "time must be at most {MAX_TIME_LEN} characters"
            )));
        }

        Ok(Self {
            day,
            name: name.to_string(),
            time: time.map(str::to_string),
        })
    }
}

/// Adds a user activity to the week at `offset`. Never produces a default entry.
pub fn create_activity<D>(
    scope: &mut UserScope<D>,
    clock: &dyn Clock,
    offset: i64,
    fields: ActivityFields,
) -> Result<Activity, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let now = clock.now();
    let week = resolve_week(scope, clock, offset)?;
    let new = NewActivity {
        day: fields.day,
        name: fields.name,
        time: fields.time,
        is_default: false,
    };
    let id = scope
        .insert_activity(week.id, new, now)
        .ok_or_else(|| TrackerError::Storage(format!("week {} is not writable", week.id)))?;
    scope.touch_profile(now);

    info!(user = scope.user_id(), activity = id, week = week.id, "created activity");
    owned_activity(scope, id)
}

pub fn edit_activity<D>(
    scope: &mut UserScope<D>,
    id: ActivityId,
    fields: ActivityFields,
    now: DateTime<Utc>,
) -> Result<Activity, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let week_id = editable(scope, id, "edited")?.week_id;
    if let Some(activity) = scope.activity_mut(id) {
        activity.day = fields.day;
        activity.name = fields.name;
        activity.time = fields.time;
        activity.updated_at = now;
    }
    scope.touch_week(week_id, now);
    scope.touch_profile(now);

    info!(user = scope.user_id(), activity = id, "edited activity");
    owned_activity(scope, id)
}

pub fn delete_activity<D>(
    scope: &mut UserScope<D>,
    id: ActivityId,
    now: DateTime<Utc>,
) -> Result<Activity, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let week_id = editable(scope, id, "deleted")?.week_id;
    let removed = scope
        .remove_activity(id)
        .ok_or(TrackerError::ActivityNotFound(id))?;
    scope.touch_week(week_id, now);
    scope.touch_profile(now);

    info!(user = scope.user_id(), activity = id, "deleted activity");
    Ok(removed)
}

/// Flips the completed flag, default entries included. Returns the new flag and
/// the week's recomputed progress.
pub fn toggle_activity<D>(
    scope: &mut UserScope<D>,
    id: ActivityId,
    now: DateTime<Utc>,
) -> Result<(bool, u32), TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let activity = scope
        .activity_mut(id)
        .ok_or(TrackerError::ActivityNotFound(id))?;
    activity.completed = !activity.completed;
    activity.updated_at = now;
    let (completed, week_id) = (activity.completed, activity.week_id);

    scope.touch_week(week_id, now);
    scope.touch_profile(now);
    Ok((completed, progress_percentage(scope, week_id)))
}

fn owned_activity<D>(scope: &UserScope<D>, id: ActivityId) -> Result<Activity, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    scope
        .activity(id)
        .cloned()
        .ok_or(TrackerError::ActivityNotFound(id))
}

fn editable<'a, D>(
    scope: &'a UserScope<D>,
    id: ActivityId,
    action: &'static str,
) -> Result<&'a Activity, TrackerError>
where
    D: DerefMut<Target = AppData>,
{
    let activity = scope.activity(id).ok_or(TrackerError::ActivityNotFound(id))?;
    if activity.is_default {
        warn!(user = scope.user_id(), activity = id, action, "refused change to default activity");
        return Err(TrackerError::DefaultActivityLocked { action });
    }
    Ok(activity)
}
