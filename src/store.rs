//! In-memory tables and the ownership-scoped view used by every request.
//!
//! Week and activity tables are private. Callers outside this module reach
//! them only through [`UserScope`], which filters every read and write by the
//! owning user so one account can never observe or mutate another's rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use crate::errors::TrackerError;
use crate::models::{
    Activity, ActivityId, NewActivity, User, UserId, UserProfile, Week, WeekId,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
struct NextIds {
    user: u64,
    week: u64,
    activity: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    next_ids: NextIds,
    #[serde(default)]
    users: BTreeMap<UserId, User>,
    #[serde(default)]
    profiles: BTreeMap<UserId, UserProfile>,
    #[serde(default)]
    weeks: BTreeMap<WeekId, Week>,
    #[serde(default)]
    activities: BTreeMap<ActivityId, Activity>,
}

impl AppData {
    /// Creates a user and its profile. Usernames are unique.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        full_name: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, TrackerError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(TrackerError::invalid("username is required"));
        }
        if email.is_empty() {
            return Err(TrackerError::invalid("email is required"));
        }
        if self.user_by_username(username).is_some() {
            return Err(TrackerError::UsernameTaken(username.to_string()));
        }

        let id = bump(&mut self.next_ids.user);
        self.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                email: email.to_string(),
                date_joined: now,
            },
        );
        self.profiles
            .insert(id, UserProfile::new(id, full_name.trim().to_string(), now));
        Ok(id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn scope(&self, user: UserId) -> Option<UserScope<&AppData>> {
        self.users
            .contains_key(&user)
            .then_some(UserScope { data: self, user })
    }

    pub fn scope_mut(&mut self, user: UserId) -> Option<UserScope<&mut AppData>> {
        if !self.users.contains_key(&user) {
            return None;
        }
        Some(UserScope { data: self, user })
    }

    /// Resolves a username to a mutable scope, the usual entry point for a request.
    pub fn scope_for(&mut self, username: &str) -> Result<UserScope<&mut AppData>, TrackerError> {
        let user = self
            .user_by_username(username)
            .map(|user| user.id)
            .ok_or_else(|| TrackerError::UserNotFound(username.to_string()))?;
        self.scope_mut(user)
            .ok_or_else(|| TrackerError::UserNotFound(username.to_string()))
    }
}

/// Rows of [`AppData`] visible to a single user.
pub struct UserScope<D> {
    data: D,
    user: UserId,
}

impl<D: Deref<Target = AppData>> UserScope<D> {
    pub fn user_id(&self) -> UserId {
        self.user
    }

    pub fn user(&self) -> Option<&User> {
        self.data.users.get(&self.user)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.data.profiles.get(&self.user)
    }

    fn owns_week(&self, week_id: WeekId) -> bool {
        self.week(week_id).is_some()
    }

    pub fn weeks(&self) -> impl Iterator<Item = &Week> {
        let user = self.user;
        self.data.weeks.values().filter(move |week| week.user_id == user)
    }

    pub fn week(&self, id: WeekId) -> Option<&Week> {
        self.data.weeks.get(&id).filter(|week| week.user_id == self.user)
    }

    pub fn week_starting(&self, start_date: NaiveDate) -> Option<&Week> {
        self.weeks().find(|week| week.start_date == start_date)
    }

    /// Every activity across all of the user's weeks.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.data
            .activities
            .values()
            .filter(move |activity| self.owns_week(activity.week_id))
    }

    /// Activities of one week, in creation order. Empty for weeks the user does not own.
    pub fn week_activities(&self, week_id: WeekId) -> impl Iterator<Item = &Activity> {
        let owned = self.owns_week(week_id);
        self.data
            .activities
            .values()
            .filter(move |activity| owned && activity.week_id == week_id)
    }

    pub fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.data
            .activities
            .get(&id)
            .filter(|activity| self.owns_week(activity.week_id))
    }
}

impl<D: DerefMut<Target = AppData>> UserScope<D> {
    /// Returns the week starting on `start_date`, inserting it when absent.
    /// The flag is true when a new row was created.
    pub fn get_or_insert_week(
        &mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> (Week, bool) {
        if let Some(week) = self.week_starting(start_date) {
            return (week.clone(), false);
        }

        let week = Week {
            id: bump(&mut self.data.next_ids.week),
            user_id: self.user,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        };
        self.data.weeks.insert(week.id, week.clone());
        (week, true)
    }

    pub fn insert_activity(
        &mut self,
        week_id: WeekId,
        new: NewActivity,
        now: DateTime<Utc>,
    ) -> Option<ActivityId> {
        if !self.owns_week(week_id) {
            return None;
        }

        let id = bump(&mut self.data.next_ids.activity);
        self.data.activities.insert(
            id,
            Activity {
                id,
                week_id,
                day: new.day,
                name: new.name,
                time: new.time,
                completed: false,
                is_default: new.is_default,
                created_at: now,
                updated_at: now,
            },
        );
        self.touch_week(week_id, now);
        Some(id)
    }

    pub fn activity_mut(&mut self, id: ActivityId) -> Option<&mut Activity> {
        let week_id = self.data.activities.get(&id)?.week_id;
        if !self.owns_week(week_id) {
            return None;
        }
        self.data.activities.get_mut(&id)
    }

    pub fn remove_activity(&mut self, id: ActivityId) -> Option<Activity> {
        self.activity(id)?;
        self.data.activities.remove(&id)
    }

    /// Deletes the week's activities whose default flag equals `is_default`.
    pub fn remove_week_activities(&mut self, week_id: WeekId, is_default: bool) -> usize {
        if !self.owns_week(week_id) {
            return 0;
        }
        let before = self.data.activities.len();
        self.data
            .activities
            .retain(|_, activity| activity.week_id != week_id || activity.is_default != is_default);
        before - self.data.activities.len()
    }

    pub fn touch_week(&mut self, week_id: WeekId, now: DateTime<Utc>) {
        let user = self.user;
        if let Some(week) = self.data.weeks.get_mut(&week_id).filter(|w| w.user_id == user) {
            week.updated_at = now;
        }
    }

    /// The user's profile, created on first access.
    pub fn profile_mut(&mut self, now: DateTime<Utc>) -> &mut UserProfile {
        let user = self.user;
        self.data
            .profiles
            .entry(user)
            .or_insert_with(|| UserProfile::new(user, String::new(), now))
    }

    /// Records that the user just changed something.
    pub fn touch_profile(&mut self, now: DateTime<Utc>) {
        self.profile_mut(now).last_activity = now;
    }
}
