use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn for_mock_server(url: &str) -> AppConfig {
        AppConfig {
            supabase_url: url.to_string(),
            supabase_service_role_key: Self::default().supabase_service_role_key,
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
        }
    }
}

/// Canned PostgREST row payloads matching the scheduling tables.
pub struct MockStorageResponses;

impl MockStorageResponses {
    pub fn clinic_response(clinic_id: &str, tenant_id: &str, name: &str) -> Value {
        json!({
            "id": clinic_id,
            "tenant_id": tenant_id,
            "name": name,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    /// A weekday operating window; times use the `HH:MM:SS` rendering of
    /// Postgres `time` columns.
    pub fn schedule_response(
        clinic_id: &str,
        day_of_week: u8,
        opening: &str,
        closing: &str,
        lunch: Option<(&str, &str)>,
        is_open: bool,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "clinic_id": clinic_id,
            "day_of_week": day_of_week,
            "opening_time": opening,
            "closing_time": closing,
            "lunch_start": lunch.map(|(start, _)| start),
            "lunch_end": lunch.map(|(_, end)| end),
            "is_open": is_open
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        tenant_id: &str,
        clinic_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "tenant_id": tenant_id,
            "clinic_id": clinic_id,
            "employee_id": Uuid::new_v4(),
            "company_id": Uuid::new_v4(),
            "appointment_date": date,
            "appointment_time": time,
            "status": status,
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    /// The error payload PostgREST returns when a unique index rejects a
    /// write.
    pub fn unique_violation_response() -> Value {
        json!({
            "code": "23505",
            "details": "Key (tenant_id, clinic_id, appointment_date, appointment_time) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"appointments_slot_key\""
        })
    }
}
