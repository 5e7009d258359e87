use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use clinic_cell::models::AvailabilitySlot;
use scheduling_cell::models::{Appointment, AppointmentStatus};
use scheduling_cell::services::conflict::{mark_conflicts, occupied_starts};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn slot(clinic_id: Uuid, date: NaiveDate, time: &str) -> AvailabilitySlot {
    AvailabilitySlot {
        clinic_id,
        date,
        time: time.parse().unwrap(),
        duration_minutes: 30,
        available: true,
    }
}

fn appointment(clinic_id: Uuid, date: NaiveDate, time: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        clinic_id,
        employee_id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        appointment_date: date,
        appointment_time: time.parse().unwrap(),
        status,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn exact_start_match_marks_slot_unavailable() {
    let clinic_id = Uuid::new_v4();
    let slots = vec![
        slot(clinic_id, monday(), "09:00"),
        slot(clinic_id, monday(), "09:30"),
        slot(clinic_id, monday(), "10:00"),
    ];
    let existing = vec![appointment(clinic_id, monday(), "09:00", AppointmentStatus::Confirmed)];

    let marked = mark_conflicts(slots, &existing);

    assert!(!marked[0].available);
    assert!(marked[1].available);
    assert!(marked[2].available);
}

#[test]
fn cancelled_appointments_do_not_occupy() {
    let clinic_id = Uuid::new_v4();
    let slots = vec![slot(clinic_id, monday(), "09:00")];
    let existing = vec![appointment(clinic_id, monday(), "09:00", AppointmentStatus::Cancelled)];

    let marked = mark_conflicts(slots, &existing);

    assert!(marked[0].available);
}

#[test]
fn every_non_cancelled_status_occupies() {
    let clinic_id = Uuid::new_v4();

    for status in [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::CheckIn,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
    ] {
        let marked = mark_conflicts(
            vec![slot(clinic_id, monday(), "11:00")],
            &[appointment(clinic_id, monday(), "11:00", status)],
        );
        assert!(!marked[0].available, "{status} should block the slot");
    }
}

#[test]
fn other_dates_do_not_collide() {
    let clinic_id = Uuid::new_v4();
    let tuesday = monday().succ_opt().unwrap();
    let slots = vec![slot(clinic_id, monday(), "09:00")];
    let existing = vec![appointment(clinic_id, tuesday, "09:00", AppointmentStatus::Confirmed)];

    let marked = mark_conflicts(slots, &existing);

    assert!(marked[0].available);
}

#[test]
fn occupied_starts_deduplicates_by_date_and_time() {
    let clinic_id = Uuid::new_v4();
    let existing = vec![
        appointment(clinic_id, monday(), "09:00", AppointmentStatus::Confirmed),
        appointment(clinic_id, monday(), "09:00", AppointmentStatus::NoShow),
        appointment(clinic_id, monday(), "10:00", AppointmentStatus::Cancelled),
    ];

    let occupied = occupied_starts(&existing);

    assert_eq!(occupied.len(), 1);
    assert!(occupied.contains(&(monday(), "09:00".parse().unwrap())));
}
