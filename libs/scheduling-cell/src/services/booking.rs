// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use clinic_cell::models::{day_index, AvailabilitySlot, ClinicSchedule, TimeOfDay};
use clinic_cell::services::schedule::ClinicScheduleService;
use clinic_cell::services::slots::generate_day_slots;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentFilters, AppointmentPage, AppointmentStats, AppointmentStatus,
    CreateAppointmentRequest, FindAvailabilityRequest, PageRequest, SchedulingError,
    UpdateAppointmentRequest,
};
use crate::services::conflict::mark_conflicts;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Upper bound on rows scanned for a stats summary.
const STATS_SCAN_LIMIT: u32 = 1000;

/// Orchestrates slot validation, conflict detection and lifecycle rules over
/// the appointment store. This service is the only writer of appointment
/// rows; every operation re-validates the caller's tenant id and scopes all
/// reads and writes by it.
pub struct SchedulingService {
    supabase: Arc<SupabaseClient>,
    schedule_service: ClinicScheduleService,
    lifecycle_service: AppointmentLifecycleService,
}

impl SchedulingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let schedule_service = ClinicScheduleService::with_client(Arc::clone(&supabase));

        Self {
            supabase,
            schedule_service,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Book a new appointment. Validation order: tenant id, clinic
    /// resolution, operating window, lunch break, slot occupancy, insert.
    ///
    /// The occupancy pre-check and the insert are two storage round trips,
    /// so two concurrent requests can both pass the check; the partial
    /// unique index on (tenant, clinic, date, time) is the arbiter, and its
    /// 409 rejection surfaces here as `AppointmentConflict`. Callers resolve
    /// a conflict by resubmitting with a different slot.
    pub async fn create_appointment(
        &self,
        tenant_id: &str,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;
        info!(
            "Booking appointment at clinic {} on {} {}",
            request.clinic_id, request.appointment_date, request.appointment_time
        );

        let clinic = self
            .schedule_service
            .find_clinic(tenant, request.clinic_id)
            .await?
            .ok_or(SchedulingError::ClinicNotAvailable)?;

        let schedule = self.resolve_open_schedule(clinic.id, request.appointment_date).await?;
        validate_time_against_schedule(&schedule, request.appointment_time)?;

        if self
            .slot_taken(tenant, request.clinic_id, request.appointment_date, request.appointment_time)
            .await?
        {
            warn!(
                "Appointment conflict at clinic {} on {} {}",
                request.clinic_id, request.appointment_date, request.appointment_time
            );
            return Err(SchedulingError::AppointmentConflict);
        }

        self.insert_appointment(tenant, &request).await
    }

    /// Fetch one appointment under the caller's tenant.
    pub async fn get_appointment(&self, tenant_id: &str, id: Uuid) -> Result<Appointment, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;
        debug!("Fetching appointment {}", id);

        self.fetch_appointment(tenant, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    /// List appointments with filters and 1-based pagination, ordered by
    /// date then time. `total_pages = ceil(total / page_size)`; an empty
    /// result set has zero pages.
    pub async fn list_appointments(
        &self,
        tenant_id: &str,
        filters: AppointmentFilters,
        page: PageRequest,
    ) -> Result<AppointmentPage, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;
        debug!("Listing appointments with filters: {:?}", filters);

        let page_number = page.page.max(1);
        let page_size = page.page_size.max(1);
        let offset = u64::from(page_number - 1) * u64::from(page_size);

        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}{}&order=appointment_date.asc,appointment_time.asc&limit={}&offset={}",
            tenant,
            filter_query(&filters),
            page_size,
            offset
        );

        let (rows, total): (Vec<Value>, u64) = self.supabase.fetch_with_count(&path).await?;
        let data = parse_appointments(rows)?;

        Ok(AppointmentPage {
            data,
            total,
            page: page_number,
            page_size,
            total_pages: total.div_ceil(u64::from(page_size)),
        })
    }

    /// Patch an appointment. A date/time change is re-validated against the
    /// clinic's operating window and lunch break for the new slot; the
    /// conflict against other bookings is left to the storage unique index
    /// (the row keeps its identity, so the index never trips on the
    /// appointment itself). A status in the patch goes through the
    /// lifecycle rules.
    pub async fn update_appointment(
        &self,
        tenant_id: &str,
        id: Uuid,
        patch: UpdateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;
        debug!("Updating appointment {}", id);

        let current = self
            .fetch_appointment(tenant, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        let new_date = patch.appointment_date.unwrap_or(current.appointment_date);
        let new_time = patch.appointment_time.unwrap_or(current.appointment_time);
        let slot_changed = new_date != current.appointment_date || new_time != current.appointment_time;

        if slot_changed {
            let schedule = self.resolve_open_schedule(current.clinic_id, new_date).await?;
            validate_time_against_schedule(&schedule, new_time)?;
        }

        if let Some(next_status) = patch.status {
            self.lifecycle_service.validate_transition(current.status, next_status)?;
        }

        let mut update = serde_json::Map::new();
        if slot_changed {
            update.insert("appointment_date".to_string(), json!(new_date));
            update.insert("appointment_time".to_string(), json!(new_time.to_string()));
        }
        if let Some(status) = patch.status {
            update.insert("status".to_string(), json!(status.to_string()));
        }
        if let Some(notes) = patch.notes {
            update.insert("notes".to_string(), json!(notes));
        }
        update.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self.patch_appointment(tenant, id, Value::Object(update)).await?;
        info!("Appointment {} updated", id);
        Ok(updated)
    }

    /// Cancel an appointment. Cancellation is a status, not a row removal,
    /// and is idempotent: cancelling an already-cancelled appointment
    /// succeeds without a write.
    pub async fn cancel_appointment(&self, tenant_id: &str, id: Uuid) -> Result<(), SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;
        debug!("Cancelling appointment {}", id);

        let current = self
            .fetch_appointment(tenant, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if current.status == AppointmentStatus::Cancelled {
            debug!("Appointment {} already cancelled", id);
            return Ok(());
        }

        let update = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.patch_appointment(tenant, id, update).await?;

        info!("Appointment {} cancelled", id);
        Ok(())
    }

    /// Request a lifecycle move. This is the one sanctioned path for API
    /// layers to change an appointment's status outside cancellation.
    pub async fn transition_appointment(
        &self,
        tenant_id: &str,
        id: Uuid,
        next_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;

        let current = self
            .fetch_appointment(tenant, id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        self.lifecycle_service.validate_transition(current.status, next_status)?;

        let update = json!({
            "status": next_status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });
        let updated = self.patch_appointment(tenant, id, update).await?;

        info!("Appointment {} moved {} -> {}", id, current.status, next_status);
        Ok(updated)
    }

    /// Compute the bookable slots for each date in `[date_from, date_to]`.
    /// Closed or unscheduled days contribute nothing; taken slots are
    /// emitted with `available == false`. Chronological by date then time.
    pub async fn find_available_slots(
        &self,
        tenant_id: &str,
        request: FindAvailabilityRequest,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;

        if request.date_from > request.date_to {
            return Err(SchedulingError::InvalidAppointment(
                "date_from must not be after date_to".to_string(),
            ));
        }
        if request.duration_minutes <= 0 {
            return Err(SchedulingError::InvalidAppointment(
                "duration must be a positive number of minutes".to_string(),
            ));
        }

        let clinic = self
            .schedule_service
            .find_clinic(tenant, request.clinic_id)
            .await?
            .ok_or(SchedulingError::ClinicNotAvailable)?;

        debug!(
            "Finding available slots for clinic {} from {} to {}",
            clinic.id, request.date_from, request.date_to
        );

        let mut slots = Vec::new();
        let mut date = request.date_from;

        loop {
            if let Some(schedule) = self.schedule_service.schedule_for(clinic.id, day_index(date)).await? {
                if schedule.is_open {
                    let candidates = generate_day_slots(clinic.id, date, &schedule, request.duration_minutes);
                    if !candidates.is_empty() {
                        let existing = self.day_appointments(tenant, clinic.id, date).await?;
                        slots.extend(mark_conflicts(candidates, &existing));
                    }
                }
            }

            if date == request.date_to {
                break;
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        debug!("Found {} candidate slots", slots.len());
        Ok(slots)
    }

    /// Per-status counts over a filtered set, scanning at most
    /// `STATS_SCAN_LIMIT` rows.
    pub async fn appointment_stats(
        &self,
        tenant_id: &str,
        filters: AppointmentFilters,
    ) -> Result<AppointmentStats, SchedulingError> {
        let tenant = parse_tenant(tenant_id)?;

        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}{}&limit={}",
            tenant,
            filter_query(&filters),
            STATS_SCAN_LIMIT
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let appointments = parse_appointments(rows)?;

        let mut stats = AppointmentStats::default();
        for appointment in &appointments {
            stats.total += 1;
            match appointment.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::CheckIn => stats.checked_in += 1,
                AppointmentStatus::InProgress => stats.in_progress += 1,
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::NoShow => stats.no_show += 1,
            }
        }

        Ok(stats)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn resolve_open_schedule(
        &self,
        clinic_id: Uuid,
        date: NaiveDate,
    ) -> Result<ClinicSchedule, SchedulingError> {
        let schedule = self.schedule_service.schedule_for(clinic_id, day_index(date)).await?;

        match schedule {
            Some(schedule) if schedule.is_open => Ok(schedule),
            _ => Err(SchedulingError::ClinicNotAvailable),
        }
    }

    async fn fetch_appointment(&self, tenant: Uuid, id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&tenant_id=eq.{}&limit=1", id, tenant);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(parse_appointment(row)?)),
            None => Ok(None),
        }
    }

    async fn slot_taken(
        &self,
        tenant: Uuid,
        clinic_id: Uuid,
        date: NaiveDate,
        time: TimeOfDay,
    ) -> Result<bool, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&clinic_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=neq.cancelled&limit=1",
            tenant,
            clinic_id,
            date,
            urlencoding::encode(&time.to_string())
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(!result.is_empty())
    }

    async fn day_appointments(
        &self,
        tenant: Uuid,
        clinic_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&clinic_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled&order=appointment_time.asc",
            tenant, clinic_id, date
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        parse_appointments(rows)
    }

    async fn insert_appointment(
        &self,
        tenant: Uuid,
        request: &CreateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let now = Utc::now();
        let body = json!({
            "tenant_id": tenant,
            "clinic_id": request.clinic_id,
            "employee_id": request.employee_id,
            "company_id": request.company_id,
            "appointment_date": request.appointment_date,
            "appointment_time": request.appointment_time.to_string(),
            "status": AppointmentStatus::Pending.to_string(),
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(body),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::Storage("empty insert response".to_string()))?;
        let appointment = parse_appointment(row)?;

        info!("Appointment {} booked with status {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    async fn patch_appointment(
        &self,
        tenant: Uuid,
        id: Uuid,
        update: Value,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&tenant_id=eq.{}", id, tenant);

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(update), Some(representation_headers()))
            .await?;

        let row = result.into_iter().next().ok_or(SchedulingError::AppointmentNotFound)?;
        parse_appointment(row)
    }
}

fn filter_query(filters: &AppointmentFilters) -> String {
    let mut query = String::new();

    if let Some(clinic_id) = filters.clinic_id {
        query.push_str(&format!("&clinic_id=eq.{}", clinic_id));
    }
    if let Some(company_id) = filters.company_id {
        query.push_str(&format!("&company_id=eq.{}", company_id));
    }
    if let Some(employee_id) = filters.employee_id {
        query.push_str(&format!("&employee_id=eq.{}", employee_id));
    }
    if let Some(status) = filters.status {
        query.push_str(&format!("&status=eq.{}", status));
    }
    if let Some(date_from) = filters.date_from {
        query.push_str(&format!("&appointment_date=gte.{}", date_from));
    }
    if let Some(date_to) = filters.date_to {
        query.push_str(&format!("&appointment_date=lte.{}", date_to));
    }

    query
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn parse_tenant(tenant_id: &str) -> Result<Uuid, SchedulingError> {
    Uuid::parse_str(tenant_id).map_err(|_| {
        SchedulingError::InvalidAppointment(format!("tenant id '{}' is not a valid UUID", tenant_id))
    })
}

fn validate_time_against_schedule(
    schedule: &ClinicSchedule,
    time: TimeOfDay,
) -> Result<(), SchedulingError> {
    if !schedule.within_hours(time) {
        return Err(SchedulingError::InvalidAppointment(format!(
            "appointment time {} is outside operating hours {}-{}",
            time, schedule.opening_time, schedule.closing_time
        )));
    }

    if schedule.in_lunch(time) {
        return Err(SchedulingError::InvalidAppointment(format!(
            "appointment time {} falls inside the lunch break",
            time
        )));
    }

    Ok(())
}

fn parse_appointment(row: Value) -> Result<Appointment, SchedulingError> {
    serde_json::from_value(row)
        .map_err(|e| SchedulingError::Storage(format!("failed to parse appointment: {}", e)))
}

fn parse_appointments(rows: Vec<Value>) -> Result<Vec<Appointment>, SchedulingError> {
    rows.into_iter().map(parse_appointment).collect()
}
