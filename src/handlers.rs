use crate::activities::{self, ActivityFields};
use crate::auth::CurrentUser;
use crate::errors::{AppError, TrackerError};
use crate::models::{
    ActivityId, ActivityResponse, CreateActivityRequest, DashboardQuery, DashboardResponse,
    DayView, ProfileResponse, RegisterRequest, RegisterResponse, SUPPORTED_TIMEZONES,
    StatsResponse, ToggleRequest, ToggleResponse, UpdateActivityRequest, UpdateProfileRequest,
    UserProfile,
};
use crate::state::AppState;
use crate::stats::{achievements, completion_rate, current_streak, progress_percentage, stats_summary};
use crate::storage::persist_data;
use crate::store::{AppData, UserScope};
use crate::template::seed_defaults;
use crate::week::{resolve_week, week_days, week_info};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::NaiveDate;
use std::ops::Deref;
use tracing::{info, warn};

const MAX_FULL_NAME_LEN: usize = 100;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!("rejected request body: {rejection}");
            Err(AppError::bad_request(rejection.body_text()))
        }
    }
}

/// Runs `change` against a copy of the store and swaps the copy in only once it is
/// on disk. `change` reports whether anything needs saving alongside its result.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut AppData) -> Result<(T, bool), TrackerError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut draft = data.clone();
    let (value, changed) = change(&mut draft)?;
    if changed {
        persist_data(&state.data_path, &draft).await?;
        *data = draft;
    }
    Ok(value)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let payload = json_body(payload)?;
    let user_id = commit(&state, |data| {
        let id = data.register(
            &payload.username,
            &payload.email,
            payload.full_name.as_deref().unwrap_or_default(),
            state.clock.now(),
        )?;
        Ok((id, true))
    })
    .await?;

    let username = payload.username.trim().to_string();
    info!(user = user_id, %username, "registered user");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user_id,
            username,
        }),
    ))
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardResponse>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let offset = query.week;

    let response = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let weeks_before = scope.weeks().count();
        let week = resolve_week(&mut scope, state.clock.as_ref(), offset)?;
        let mut changed = scope.weeks().count() != weeks_before;

        if scope.week_activities(week.id).next().is_none() {
            let created = seed_defaults(&mut scope, week.id, &state.template, state.clock.now());
            info!(user = scope.user_id(), week = week.id, created, "seeded empty week");
            changed = true;
        }

        let days = week_days(&week)
            .map(|(day, date)| DayView {
                day,
                date,
                name: day.english_name().to_string(),
                activities: scope
                    .week_activities(week.id)
                    .filter(|activity| activity.day == day)
                    .cloned()
                    .collect(),
            })
            .collect();

        let response = DashboardResponse {
            progress: progress_percentage(&scope, week.id),
            week_info: week_info(&week, offset),
            week,
            days,
        };
        Ok((response, changed))
    })
    .await?;

    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    payload: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ActivityResponse>), AppError> {
    let payload = json_body(payload)?;
    let fields = ActivityFields::new(payload.day, &payload.name, payload.time.as_deref())?;

    let activity = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let activity =
            activities::create_activity(&mut scope, state.clock.as_ref(), payload.week_offset, fields)?;
        Ok((activity, true))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ActivityResponse {
            success: true,
            message: "Activity added".to_string(),
            activity: Some(activity),
        }),
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Path(id): Path<ActivityId>,
    payload: Result<Json<UpdateActivityRequest>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let payload = json_body(payload)?;
    let fields = ActivityFields::new(payload.day, &payload.name, payload.time.as_deref())?;

    let activity = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let activity = activities::edit_activity(&mut scope, id, fields, state.clock.now())?;
        Ok((activity, true))
    })
    .await?;

    Ok(Json(ActivityResponse {
        success: true,
        message: "Activity updated".to_string(),
        activity: Some(activity),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Path(id): Path<ActivityId>,
) -> Result<Json<ActivityResponse>, AppError> {
    let removed = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let removed = activities::delete_activity(&mut scope, id, state.clock.now())?;
        Ok((removed, true))
    })
    .await?;

    Ok(Json(ActivityResponse {
        success: true,
        message: format!("Activity '{}' deleted", removed.name),
        activity: None,
    }))
}

pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleResponse>, AppError> {
    let payload = json_body(payload)?;

    let (completed, progress) = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let toggled = activities::toggle_activity(&mut scope, payload.activity_id, state.clock.now())?;
        Ok((toggled, true))
    })
    .await?;

    Ok(Json(ToggleResponse {
        success: true,
        completed,
        progress,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<StatsResponse>, AppError> {
    let mut data = state.data.lock().await;
    let scope = data.scope_for(&username)?;
    Ok(Json(stats_summary(&scope)))
}

pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let response = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let created = scope.profile().is_none();
        let profile = scope.profile_mut(state.clock.now()).clone();
        Ok((profile_response(&scope, profile, state.clock.today()), created))
    })
    .await?;

    Ok(Json(response))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let payload = json_body(payload)?;
    if let Some(timezone) = payload.timezone.as_deref() {
        if !SUPPORTED_TIMEZONES.contains(&timezone) {
            return Err(TrackerError::invalid(format!("unsupported timezone '{timezone}'")).into());
        }
    }
    if let Some(full_name) = payload.full_name.as_deref() {
        if full_name.trim().chars().count() > MAX_FULL_NAME_LEN {
            return Err(TrackerError::invalid(format!(
                "full name must be at most {MAX_FULL_NAME_LEN} characters"
            ))
            .into());
        }
    }

    let response = commit(&state, |data| {
        let mut scope = data.scope_for(&username)?;
        let now = state.clock.now();
        let profile = scope.profile_mut(now);
        if let Some(full_name) = payload.full_name {
            profile.full_name = full_name.trim().to_string();
        }
        if let Some(timezone) = payload.timezone {
            profile.timezone = timezone;
        }
        if let Some(avatar) = payload.avatar {
            let avatar = avatar.trim();
            profile.avatar = (!avatar.is_empty()).then(|| avatar.to_string());
        }
        profile.last_activity = now;
        let profile = profile.clone();
        Ok((profile_response(&scope, profile, state.clock.today()), true))
    })
    .await?;

    Ok(Json(response))
}

fn profile_response<D>(scope: &UserScope<D>, profile: UserProfile, today: NaiveDate) -> ProfileResponse
where
    D: Deref<Target = AppData>,
{
    let total_weeks = scope.weeks().count();
    let total_activities = scope.activities().count();
    let completion_rate = completion_rate(scope);
    let current_streak = current_streak(scope, today);
    let username = scope
        .user()
        .map(|user| user.username.clone())
        .unwrap_or_default();

    ProfileResponse {
        username,
        profile,
        total_weeks,
        total_activities,
        completion_rate,
        current_streak,
        achievements: achievements(total_weeks, total_activities, completion_rate, current_streak),
    }
}
