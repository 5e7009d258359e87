// libs/clinic-cell/src/services/schedule.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};

use crate::models::{Clinic, ClinicSchedule};

/// Read-only access to clinics and their weekly operating windows. Rows are
/// maintained by clinic administration; this service never writes them.
pub struct ClinicScheduleService {
    supabase: Arc<SupabaseClient>,
}

impl ClinicScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Point lookup scoped by tenant; a clinic owned by another tenant is
    /// indistinguishable from an absent one.
    pub async fn find_clinic(&self, tenant_id: Uuid, clinic_id: Uuid) -> Result<Option<Clinic>, DbError> {
        debug!("Resolving clinic {} for tenant {}", clinic_id, tenant_id);

        let path = format!(
            "/rest/v1/clinics?id=eq.{}&tenant_id=eq.{}&limit=1",
            clinic_id, tenant_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// The operating window for one weekday (0 = Sunday .. 6 = Saturday), or
    /// `None` when the clinic has no row for that day.
    pub async fn schedule_for(&self, clinic_id: Uuid, day_of_week: u8) -> Result<Option<ClinicSchedule>, DbError> {
        debug!("Fetching schedule for clinic {} day {}", clinic_id, day_of_week);

        let path = format!(
            "/rest/v1/clinic_schedules?clinic_id=eq.{}&day_of_week=eq.{}&limit=1",
            clinic_id, day_of_week
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// The full weekly grid ordered by day, for week-view callers.
    pub async fn week_schedule(&self, clinic_id: Uuid) -> Result<Vec<ClinicSchedule>, DbError> {
        debug!("Fetching weekly schedule for clinic {}", clinic_id);

        let path = format!(
            "/rest/v1/clinic_schedules?clinic_id=eq.{}&order=day_of_week.asc",
            clinic_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let schedules: Vec<ClinicSchedule> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?;

        Ok(schedules)
    }
}
