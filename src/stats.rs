use chrono::NaiveDate;
use std::collections::HashSet;
use std::ops::Deref;

use crate::models::{Achievement, Activity, StatsResponse, WeekId};
use crate::store::{AppData, UserScope};

/// Longest streak reported; the backward scan stops here.
pub const STREAK_CAP: u32 = 30;

/// Percentage rounded half-to-even, 0 when there is nothing to count.
fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

fn tally<'a>(activities: impl Iterator<Item = &'a Activity>) -> (usize, usize) {
    activities.fold((0, 0), |(completed, total), activity| {
        (completed + usize::from(activity.completed), total + 1)
    })
}

pub fn progress_percentage<D>(scope: &UserScope<D>, week_id: WeekId) -> u32
where
    D: Deref<Target = AppData>,
{
    let (completed, total) = tally(scope.week_activities(week_id));
    percent(completed, total).round_ties_even() as u32
}

/// Share of all the user's activities that are completed, to one decimal.
pub fn completion_rate<D>(scope: &UserScope<D>) -> f64
where
    D: Deref<Target = AppData>,
{
    let (completed, total) = tally(scope.activities());
    (percent(completed, total) * 10.0).round_ties_even() / 10.0
}

/// Consecutive days, counting back from `today`, on which at least half of the
/// activities in the covering week(s) are completed. A day with no activities at
/// all ends the scan.
pub fn current_streak<D>(scope: &UserScope<D>, today: NaiveDate) -> u32
where
    D: Deref<Target = AppData>,
{
    let mut streak = 0;
    let mut date = today;

    while streak < STREAK_CAP {
        let weeks: HashSet<WeekId> = scope
            .weeks()
            .filter(|week| week.contains(date))
            .map(|week| week.id)
            .collect();
        let (completed, total) = tally(
            scope
                .activities()
                .filter(|activity| weeks.contains(&activity.week_id)),
        );

        if total == 0 || completed * 2 < total {
            break;
        }
        streak += 1;

        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
    }

    streak
}

pub fn stats_summary<D>(scope: &UserScope<D>) -> StatsResponse
where
    D: Deref<Target = AppData>,
{
    let (completed, total) = tally(scope.activities());
    StatsResponse {
        total_weeks: scope.weeks().count(),
        total_activities: total,
        completed_activities: completed,
        completion_rate: percent(completed, total).round_ties_even() as u32,
    }
}

pub fn achievements(
    total_weeks: usize,
    total_activities: usize,
    completion_rate: f64,
    current_streak: u32,
) -> Vec<Achievement> {
    let rules = [
        (total_weeks >= 1, "First Week", "Tracked a first week"),
        (completion_rate >= 80.0, "High Achiever", "Completion rate of 80% or more"),
        (current_streak >= 7, "Week Warrior", "Consistent for a whole week"),
        (total_activities >= 100, "Century Club", "More than 100 activities"),
    ];

    rules
        .into_iter()
        .filter(|(earned, _, _)| *earned)
        .map(|(_, title, desc)| Achievement {
            title: title.to_string(),
            desc: desc.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::models::{Day, NewActivity};
    use crate::week::resolve_week;
    use chrono::Duration;

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
    }

    fn setup() -> (AppData, u64) {
        let mut data = AppData::default();
        let clock = FixedClock::new(today());
        let id = data
            .register("budi", "budi@example.com", "", clock.now())
            .unwrap();
        (data, id)
    }

    /// Adds `total` activities to the week at `offset`, the first `completed` of them done.
    fn fill_week(data: &mut AppData, user: u64, offset: i64, total: usize, completed: usize) -> WeekId {
        let clock = FixedClock::new(today());
        let mut scope = data.scope_mut(user).unwrap();
        let week = resolve_week(&mut scope, &clock, offset).unwrap();
        for i in 0..total {
            let id = scope
                .insert_activity(
                    week.id,
                    NewActivity {
                        day: Day::Senin,
                        name: format!("Activity {i}"),
                        time: None,
                        is_default: false,
                    },
                    clock.now(),
                )
                .unwrap();
            if i < completed {
                scope.activity_mut(id).unwrap().completed = true;
            }
        }
        week.id
    }

    #[test]
    fn empty_week_has_zero_progress() {
        let (mut data, user) = setup();
        let week = fill_week(&mut data, user, 0, 0, 0);
        assert_eq!(progress_percentage(&data.scope(user).unwrap(), week), 0);
    }

    #[test]
    fn fully_completed_week_is_one_hundred() {
        let (mut data, user) = setup();
        let week = fill_week(&mut data, user, 0, 5, 5);
        assert_eq!(progress_percentage(&data.scope(user).unwrap(), week), 100);
    }

    #[test]
    fn progress_rounds_half_to_even() {
        let (mut data, user) = setup();
        let eighth = fill_week(&mut data, user, 0, 8, 1);
        let three_eighths = fill_week(&mut data, user, 1, 8, 3);
        let third = fill_week(&mut data, user, 2, 3, 1);
        let scope = data.scope(user).unwrap();
        assert_eq!(progress_percentage(&scope, eighth), 12);
        assert_eq!(progress_percentage(&scope, three_eighths), 38);
        assert_eq!(progress_percentage(&scope, third), 33);
    }

    #[test]
    fn progress_of_foreign_week_is_zero() {
        let (mut data, user) = setup();
        let week = fill_week(&mut data, user, 0, 4, 4);
        let clock = FixedClock::new(today());
        let other = data.register("sari", "s@example.com", "", clock.now()).unwrap();
        assert_eq!(progress_percentage(&data.scope(other).unwrap(), week), 0);
    }

    #[test]
    fn completion_rate_spans_all_weeks() {
        let (mut data, user) = setup();
        assert_eq!(completion_rate(&data.scope(user).unwrap()), 0.0);
        fill_week(&mut data, user, 0, 3, 1);
        fill_week(&mut data, user, -1, 3, 1);
        assert_eq!(completion_rate(&data.scope(user).unwrap()), 33.3);
    }

    #[test]
    fn streak_is_zero_without_activities() {
        let (data, user) = setup();
        assert_eq!(current_streak(&data.scope(user).unwrap(), today()), 0);
    }

    #[test]
    fn streak_counts_back_into_previous_week() {
        let (mut data, user) = setup();
        fill_week(&mut data, user, 0, 4, 2);
        fill_week(&mut data, user, -1, 4, 3);
        // Wed, Tue, Mon of this week plus all 7 days of the last one; the week
        // before that has no activities.
        assert_eq!(current_streak(&data.scope(user).unwrap(), today()), 10);
    }

    #[test]
    fn streak_stops_below_half() {
        let (mut data, user) = setup();
        fill_week(&mut data, user, 0, 4, 2);
        fill_week(&mut data, user, -1, 4, 1);
        assert_eq!(current_streak(&data.scope(user).unwrap(), today()), 3);

        let (mut data, user) = setup();
        fill_week(&mut data, user, 0, 3, 1);
        fill_week(&mut data, user, -1, 4, 4);
        assert_eq!(current_streak(&data.scope(user).unwrap(), today()), 0);
    }

    #[test]
    fn streak_never_exceeds_cap() {
        let (mut data, user) = setup();
        for offset in -6..=0 {
            fill_week(&mut data, user, offset, 2, 2);
        }
        let scope = data.scope(user).unwrap();
        assert_eq!(current_streak(&scope, today()), STREAK_CAP);
        assert!(current_streak(&scope, today() + Duration::days(4)) <= STREAK_CAP);
    }

    #[test]
    fn summary_counts_completed_activities() {
        let (mut data, user) = setup();
        fill_week(&mut data, user, 0, 4, 3);
        let summary = stats_summary(&data.scope(user).unwrap());
        assert_eq!(summary.total_weeks, 1);
        assert_eq!(summary.total_activities, 4);
        assert_eq!(summary.completed_activities, 3);
        assert_eq!(summary.completion_rate, 75);
    }

    #[test]
    fn achievements_follow_thresholds() {
        assert!(achievements(0, 0, 0.0, 0).is_empty());

        let titles: Vec<_> = achievements(1, 100, 80.0, 7)
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(
            titles,
            vec!["First Week", "High Achiever", "Week Warrior", "Century Club"]
        );

        let titles: Vec<_> = achievements(3, 99, 79.9, 6)
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["First Week"]);
    }
}
