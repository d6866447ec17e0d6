use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Anything with a single instant the window selector can filter on.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// One scheduled medication dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    pub medication_id: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_time: Option<DateTime<Utc>>,
}

impl DoseEvent {
    /// `taken - scheduled`, negative when taken early.
    pub fn lateness(&self) -> Option<Duration> {
        self.taken_time.map(|taken| taken - self.scheduled_time)
    }

    pub fn is_due(&self, now: &DateTime<Utc>) -> bool {
        self.scheduled_time <= *now
    }
}

impl Timestamped for DoseEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.scheduled_time
    }
}

/// Maximum severity on the 0–10 scale.
pub const MAX_SEVERITY: u8 = 10;

/// One symptom observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomReport {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub symptom_type: String,
    pub severity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Timestamped for SymptomReport {
    fn timestamp(&self) -> DateTime<Utc> {
        self.time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Completed,
    Upcoming,
    Missed,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Missed => write!(f, "missed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(AppointmentStatus::Completed),
            "upcoming" => Ok(AppointmentStatus::Upcoming),
            "missed" => Ok(AppointmentStatus::Missed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub time: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Timestamped for AppointmentEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.time
    }
}

/// The three event collections supplied for one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSet {
    #[serde(default)]
    pub doses: Vec<DoseEvent>,
    #[serde(default)]
    pub symptoms: Vec<SymptomReport>,
    #[serde(default)]
    pub appointments: Vec<AppointmentEvent>,
}

impl EventSet {
    pub fn is_empty(&self) -> bool {
        self.doses.is_empty() && self.symptoms.is_empty() && self.appointments.is_empty()
    }
}
