//! Default activity catalog and the routines that apply it to weeks.
//!
//! The catalog is plain data (`templates/healthy_lifestyle.json` is compiled
//! in, `TRACKER_TEMPLATE_PATH` can replace it), so changing the schedule never
//! touches seeding code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::DerefMut;
use std::path::Path;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::errors::TrackerError;
use crate::models::{Day, NewActivity, WeekId};
use crate::store::{AppData, UserScope};
use crate::week::resolve_week;

const BUILTIN_TEMPLATE: &str = include_str!("../templates/healthy_lifestyle.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub day: Day,
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub version: u32,
    pub entries: Vec<TemplateEntry>,
}

impl Template {
    pub fn builtin() -> Result<Self, TrackerError> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| TrackerError::Template(format!("{}: {err}", path.display())))?;
        Self::parse(&raw)
    }

    /// Loads `path` when given, the built-in catalog otherwise.
    pub fn from_config(path: Option<&Path>) -> Result<Self, TrackerError> {
        let template = match path {
            Some(path) => Self::load(path)?,
            None => Self::builtin()?,
        };
        info!(
            name = %template.name,
            version = template.version,
            entries = template.len(),
            "loaded activity template"
        );
        Ok(template)
    }

    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let template: Template =
            serde_json::from_str(raw).map_err(|err| TrackerError::Template(err.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), TrackerError> {
        if self.is_empty() {
            return Err(TrackerError::Template(format!("template '{}' has no entries", self.name)));
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.name.trim().is_empty() {
                return Err(TrackerError::Template(format!(
                    "entry on {} has an empty name",
                    entry.day.key()
                )));
            }
            if !seen.insert((entry.day, entry.name.as_str())) {
                return Err(TrackerError::Template(format!(
                    "duplicate entry '{}' on {}",
                    entry.name,
                    entry.day.key()
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_for(&self, day: Day) -> impl Iterator<Item = &TemplateEntry> {
        self.entries.iter().filter(move |entry| entry.day == day)
    }
}

/// Inserts every catalog entry the week does not already have, matched by (day, name).
/// Returns how many activities were created.
pub fn seed_defaults<D>(
    scope: &mut UserScope<D>,
    week_id: WeekId,
    template: &Template,
    now: DateTime<Utc>,
) -> usize
where
    D: DerefMut<Target = AppData>,
{
    let existing: HashSet<(Day, String)> = scope
        .week_activities(week_id)
        .map(|activity| (activity.day, activity.name.clone()))
        .collect();

    let mut created = 0;
    for entry in &template.entries {
        if existing.contains(&(entry.day, entry.name.clone())) {
            continue;
        }
        let new = NewActivity {
            day: entry.day,
            name: entry.name.clone(),
            time: entry.time.clone(),
            is_default: true,
        };
        if scope.insert_activity(week_id, new, now).is_some() {
            created += 1;
        }
    }

    debug!(week = week_id, created, "seeded default activities");
    created
}

#[derive(Debug, Clone, Default)]
pub struct ReseedOptions {
    /// Only this user; every user when unset.
    pub username: Option<String>,
    /// Also delete the user's own (non-default) activities.
    pub clear_existing: bool,
    pub current_week_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekReseed {
    pub week_id: WeekId,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub deleted_custom: usize,
    pub deleted_default: usize,
    pub created: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserReseed {
    pub username: String,
    pub weeks: Vec<WeekReseed>,
}

impl UserReseed {
    pub fn deleted(&self) -> usize {
        self.weeks
            .iter()
            .map(|week| week.deleted_custom + week.deleted_default)
            .sum()
    }

    pub fn created(&self) -> usize {
        self.weeks.iter().map(|week| week.created).sum()
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ReseedReport {
    pub users: Vec<UserReseed>,
}

impl ReseedReport {
    pub fn total_deleted(&self) -> usize {
        self.users.iter().map(UserReseed::deleted).sum()
    }

    pub fn total_created(&self) -> usize {
        self.users.iter().map(UserReseed::created).sum()
    }
}

/// Re-applies the catalog: old default entries are always replaced, user entries are
/// dropped only with `clear_existing`.
pub fn reseed(
    data: &mut AppData,
    template: &Template,
    clock: &dyn Clock,
    options: &ReseedOptions,
) -> Result<ReseedReport, TrackerError> {
    let user_ids: Vec<_> = match &options.username {
        Some(username) => {
            let user = data
                .user_by_username(username)
                .ok_or_else(|| TrackerError::UserNotFound(username.clone()))?;
            vec![user.id]
        }
        None => data.users().map(|user| user.id).collect(),
    };

    let now = clock.now();
    let mut report = ReseedReport::default();

    for user_id in user_ids {
        let Some(mut scope) = data.scope_mut(user_id) else {
            continue;
        };
        let username = scope
            .user()
            .map(|user| user.username.clone())
            .unwrap_or_default();

        let mut weeks: Vec<_> = if options.current_week_only {
            vec![resolve_week(&mut scope, clock, 0)?]
        } else {
            scope.weeks().cloned().collect()
        };
        if weeks.is_empty() {
            weeks.push(resolve_week(&mut scope, clock, 0)?);
        }
        weeks.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        let mut user_report = UserReseed {
            username,
            weeks: Vec::with_capacity(weeks.len()),
        };

        for week in weeks {
            let deleted_custom = if options.clear_existing {
                scope.remove_week_activities(week.id, false)
            } else {
                0
            };
            let deleted_default = scope.remove_week_activities(week.id, true);
            let created = seed_defaults(&mut scope, week.id, template, now);

            info!(
                user = %user_report.username,
                start = %week.start_date,
                deleted_custom,
                deleted_default,
                created,
                "reseeded week"
            );
            user_report.weeks.push(WeekReseed {
                week_id: week.id,
                start_date: week.start_date,
                end_date: week.end_date,
                deleted_custom,
                deleted_default,
                created,
            });
        }

        report.users.push(user_report);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap())
    }

    fn data_with_user(name: &str) -> AppData {
        let mut data = AppData::default();
        data.register(name, &format!("{name}@example.com"), "", clock().now())
            .unwrap();
        data
    }

    fn custom(day: Day, name: &str) -> NewActivity {
        NewActivity {
            day,
            name: name.to_string(),
            time: None,
            is_default: false,
        }
    }

    fn monday_only() -> Template {
        let builtin = Template::builtin().unwrap();
        Template {
            name: "monday".to_string(),
            version: 1,
            entries: builtin.entries_for(Day::Senin).cloned().collect(),
        }
    }

    #[test]
    fn builtin_template_covers_every_day() {
        let template = Template::builtin().unwrap();
        assert_eq!(template.len(), 106);
        for day in Day::ALL {
            let count = template.entries_for(day).count();
            assert!((12..=17).contains(&count), "{} has {count}", day.key());
        }
    }

    #[test]
    fn monday_starts_with_morning_prayer() {
        let template = Template::builtin().unwrap();
        let monday: Vec<_> = template.entries_for(Day::Senin).collect();
        assert_eq!(monday.len(), 16);
        assert_eq!(monday[0].name, "Bangun Pagi & Doa Syukur");
        assert_eq!(monday[0].time.as_deref(), Some("05:30 - 05:35"));
    }

    #[test]
    fn parse_rejects_duplicate_entries() {
        let raw = r#"{"name":"t","version":1,"entries":[
            {"day":"senin","name":"Tidur","time":"22:00"},
            {"day":"senin","name":"Tidur"}
        ]}"#;
        assert!(matches!(Template::parse(raw), Err(TrackerError::Template(_))));
    }

    #[test]
    fn parse_rejects_empty_template() {
        let raw = r#"{"name":"t","version":1,"entries":[]}"#;
        assert!(matches!(Template::parse(raw), Err(TrackerError::Template(_))));
    }

    #[test]
    fn parse_rejects_unknown_day() {
        let raw = r#"{"name":"t","version":1,"entries":[{"day":"monday","name":"Tidur"}]}"#;
        assert!(Template::parse(raw).is_err());
    }

    #[test]
    fn seeding_twice_creates_nothing_new() {
        let template = Template::builtin().unwrap();
        let mut data = data_with_user("budi");
        let user = data.user_by_username("budi").unwrap().id;
        let mut scope = data.scope_mut(user).unwrap();
        let week = resolve_week(&mut scope, &clock(), 0).unwrap();

        let first = seed_defaults(&mut scope, week.id, &template, clock().now());
        let second = seed_defaults(&mut scope, week.id, &template, clock().now());

        assert_eq!(first, template.len());
        assert_eq!(second, 0);
        assert_eq!(scope.week_activities(week.id).count(), template.len());
        assert!(scope
            .week_activities(week.id)
            .all(|activity| activity.is_default && !activity.completed));
    }

    #[test]
    fn seeding_skips_names_the_user_already_has() {
        let template = monday_only();
        let mut data = data_with_user("budi");
        let user = data.user_by_username("budi").unwrap().id;
        let mut scope = data.scope_mut(user).unwrap();
        let week = resolve_week(&mut scope, &clock(), 0).unwrap();
        scope.insert_activity(week.id, custom(Day::Senin, "Tidur"), clock().now());

        let created = seed_defaults(&mut scope, week.id, &template, clock().now());
        assert_eq!(created, 15);
    }

    #[test]
    fn reseed_with_clear_existing_replaces_everything() {
        let template = monday_only();
        let mut data = data_with_user("budi");
        let user = data.user_by_username("budi").unwrap().id;
        let week_id = {
            let mut scope = data.scope_mut(user).unwrap();
            let week = resolve_week(&mut scope, &clock(), 0).unwrap();
            seed_defaults(&mut scope, week.id, &template, clock().now());
            for name in ["Jogging", "Baca Buku", "Masak"] {
                scope.insert_activity(week.id, custom(Day::Rabu, name), clock().now());
            }
            week.id
        };

        let options = ReseedOptions {
            username: Some("budi".to_string()),
            clear_existing: true,
            current_week_only: true,
        };
        let report = reseed(&mut data, &template, &clock(), &options).unwrap();

        let week = &report.users[0].weeks[0];
        assert_eq!(week.deleted_custom, 3);
        assert_eq!(week.deleted_default, 16);
        assert_eq!(week.created, 16);
        assert_eq!(report.total_created(), 16);
        assert_eq!(report.total_deleted(), 19);

        let scope = data.scope(user).unwrap();
        assert_eq!(scope.week_activities(week_id).count(), 16);
        assert!(scope.week_activities(week_id).all(|a| a.is_default));
    }

    #[test]
    fn reseed_keeps_custom_entries_by_default() {
        let template = monday_only();
        let mut data = data_with_user("budi");
        let user = data.user_by_username("budi").unwrap().id;
        {
            let mut scope = data.scope_mut(user).unwrap();
            let week = resolve_week(&mut scope, &clock(), 0).unwrap();
            scope.insert_activity(week.id, custom(Day::Rabu, "Jogging"), clock().now());
        }

        let report = reseed(&mut data, &template, &clock(), &ReseedOptions::default()).unwrap();
        assert_eq!(report.users[0].weeks[0].deleted_custom, 0);
        assert_eq!(report.total_created(), 16);
        assert_eq!(data.scope(user).unwrap().activities().count(), 17);
    }

    #[test]
    fn reseed_covers_all_weeks_and_creates_one_when_missing() {
        let template = monday_only();
        let mut data = data_with_user("budi");
        data.register("sari", "sari@example.com", "", clock().now())
            .unwrap();
        let budi = data.user_by_username("budi").unwrap().id;
        {
            let mut scope = data.scope_mut(budi).unwrap();
            resolve_week(&mut scope, &clock(), -1).unwrap();
            resolve_week(&mut scope, &clock(), 0).unwrap();
        }

        let report = reseed(&mut data, &template, &clock(), &ReseedOptions::default()).unwrap();
        assert_eq!(report.users.len(), 2);
        assert_eq!(report.users[0].weeks.len(), 2);
        assert!(report.users[0].weeks[0].start_date > report.users[0].weeks[1].start_date);
        assert_eq!(report.users[1].weeks.len(), 1);
        assert_eq!(report.total_created(), 48);
    }

    #[test]
    fn reseed_unknown_user_changes_nothing() {
        let template = monday_only();
        let mut data = data_with_user("budi");
        let options = ReseedOptions {
            username: Some("ghost".to_string()),
            ..ReseedOptions::default()
        };
        let err = reseed(&mut data, &template, &clock(), &options).unwrap_err();
        assert!(matches!(err, TrackerError::UserNotFound(_)));
        let user = data.user_by_username("budi").unwrap().id;
        assert_eq!(data.scope(user).unwrap().weeks().count(), 0);
    }
}
