use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type WeekId = u64;
pub type ActivityId = u64;

pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
pub const SUPPORTED_TIMEZONES: [&str; 3] = ["Asia/Jakarta", "Asia/Makassar", "Asia/Jayapura"];

/// Day of the week, keyed the way stored activities and templates name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Senin,
        Day::Selasa,
        Day::Rabu,
        Day::Kamis,
        Day::Jumat,
        Day::Sabtu,
        Day::Minggu,
    ];

    /// Days after Monday, 0 for Senin.
    pub fn offset(self) -> u32 {
        self as u32
    }

    pub fn key(self) -> &'static str {
        match self {
            Day::Senin => "senin",
            Day::Selasa => "selasa",
            Day::Rabu => "rabu",
            Day::Kamis => "kamis",
            Day::Jumat => "jumat",
            Day::Sabtu => "sabtu",
            Day::Minggu => "minggu",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Day::Senin => "Monday",
            Day::Selasa => "Tuesday",
            Day::Rabu => "Wednesday",
            Day::Kamis => "Thursday",
            Day::Jumat => "Friday",
            Day::Sabtu => "Saturday",
            Day::Minggu => "Sunday",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub full_name: String,
    pub timezone: String,
    pub avatar: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: UserId, full_name: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            full_name,
            timezone: DEFAULT_TIMEZONE.to_string(),
            avatar: None,
            date_joined: now,
            last_activity: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    pub id: WeekId,
    pub user_id: UserId,
    /// Always a Monday.
    pub start_date: NaiveDate,
    /// `start_date` + 6 days.
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Week {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub week_id: WeekId,
    pub day: Day,
    pub name: String,
    pub time: Option<String>,
    pub completed: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when inserting an activity; ids and timestamps come from the store.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub day: Day,
    pub name: String,
    pub time: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub week: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub day: Day,
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub week_offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    pub day: Day,
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub activity_id: ActivityId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub timezone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub completed: bool,
    pub progress: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub message: String,
    pub activity: Option<Activity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeekInfo {
    pub current_offset: i64,
    pub is_current_week: bool,
    pub week_label: String,
    pub date_range: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayView {
    pub day: Day,
    pub date: NaiveDate,
    pub name: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub week: Week,
    pub week_info: WeekInfo,
    pub days: Vec<DayView>,
    pub progress: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_weeks: usize,
    pub total_activities: usize,
    pub completed_activities: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub profile: UserProfile,
    pub total_weeks: usize,
    pub total_activities: usize,
    pub completion_rate: f64,
    pub current_streak: u32,
    pub achievements: Vec<Achievement>,
}
