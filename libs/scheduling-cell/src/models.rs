// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use clinic_cell::models::TimeOfDay;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub clinic_id: Uuid,
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: TimeOfDay,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    CheckIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Whether an appointment in this status holds its slot. Cancelled
    /// appointments keep their row but release the slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::CheckIn => write!(f, "check_in"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub clinic_id: Uuid,
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: TimeOfDay,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<TimeOfDay>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilters {
    pub clinic_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 1-based pagination. A page below 1 or a zero page size is clamped rather
/// than rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentPage {
    pub data: Vec<Appointment>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindAvailabilityRequest {
    pub clinic_id: Uuid,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub checked_in: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub no_show: u64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid appointment: {0}")]
    InvalidAppointment(String),

    #[error("Clinic not available for the requested tenant or day")]
    ClinicNotAvailable,

    #[error("Appointment slot already occupied")]
    AppointmentConflict,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<shared_database::DbError> for SchedulingError {
    fn from(err: shared_database::DbError) -> Self {
        match err {
            // A 409 from the store is the unique index rejecting a second
            // non-cancelled appointment for the same slot.
            shared_database::DbError::Conflict(_) => SchedulingError::AppointmentConflict,
            other => SchedulingError::Storage(other.to_string()),
        }
    }
}
