use chrono::NaiveDate;
use uuid::Uuid;

use clinic_cell::models::{ClinicSchedule, TimeOfDay};
use clinic_cell::services::slots::{generate_day_slots, SLOT_STEP_MINUTES};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn schedule(opening: &str, closing: &str, lunch: Option<(&str, &str)>, is_open: bool) -> ClinicSchedule {
    ClinicSchedule {
        id: Uuid::new_v4(),
        clinic_id: Uuid::new_v4(),
        day_of_week: 1,
        opening_time: opening.parse().unwrap(),
        closing_time: closing.parse().unwrap(),
        lunch_start: lunch.map(|(start, _)| start.parse().unwrap()),
        lunch_end: lunch.map(|(_, end)| end.parse().unwrap()),
        is_open,
    }
}

fn times(slots: &[clinic_cell::models::AvailabilitySlot]) -> Vec<String> {
    slots.iter().map(|slot| slot.time.to_string()).collect()
}

#[test]
fn full_day_produces_thirty_minute_grid() {
    let sched = schedule("09:00", "17:00", None, true);
    let slots = generate_day_slots(sched.clinic_id, monday(), &sched, 30);

    assert_eq!(slots.len(), 16);
    assert_eq!(slots[0].time.to_string(), "09:00");
    assert_eq!(slots[15].time.to_string(), "16:30");
    assert!(slots.iter().all(|slot| slot.available));
    assert!(slots
        .windows(2)
        .all(|pair| pair[1].time.minutes() - pair[0].time.minutes() == SLOT_STEP_MINUTES));
}

#[test]
fn lunch_break_is_excluded() {
    let sched = schedule("09:00", "17:00", Some(("13:00", "14:00")), true);
    let slots = generate_day_slots(sched.clinic_id, monday(), &sched, 30);

    let produced = times(&slots);
    assert_eq!(slots.len(), 14);
    assert!(!produced.contains(&"13:00".to_string()));
    assert!(!produced.contains(&"13:30".to_string()));
    assert!(produced.contains(&"12:30".to_string()));
    assert!(produced.contains(&"14:00".to_string()));
}

#[test]
fn step_stays_fixed_when_duration_differs() {
    // A 60-minute request still walks the 30-minute grid; the duration only
    // bounds the last slot and rides along as metadata.
    let sched = schedule("09:00", "17:00", Some(("13:00", "14:00")), true);
    let slots = generate_day_slots(sched.clinic_id, monday(), &sched, 60);

    assert_eq!(slots.len(), 13);
    assert_eq!(slots.last().unwrap().time.to_string(), "16:00");
    assert!(slots.iter().all(|slot| slot.duration_minutes == 60));
    assert_eq!(slots[1].time.minutes() - slots[0].time.minutes(), SLOT_STEP_MINUTES);
}

#[test]
fn duration_must_fit_before_closing() {
    let sched = schedule("09:00", "10:00", None, true);

    assert_eq!(generate_day_slots(sched.clinic_id, monday(), &sched, 90).len(), 0);
    assert_eq!(generate_day_slots(sched.clinic_id, monday(), &sched, 60).len(), 1);
    assert_eq!(generate_day_slots(sched.clinic_id, monday(), &sched, 30).len(), 2);
}

#[test]
fn closed_day_yields_nothing() {
    let sched = schedule("09:00", "17:00", None, false);
    assert!(generate_day_slots(sched.clinic_id, monday(), &sched, 30).is_empty());
}

#[test]
fn non_positive_duration_yields_nothing() {
    let sched = schedule("09:00", "17:00", None, true);
    assert!(generate_day_slots(sched.clinic_id, monday(), &sched, 0).is_empty());
    assert!(generate_day_slots(sched.clinic_id, monday(), &sched, -15).is_empty());
}

#[test]
fn generation_is_deterministic() {
    let sched = schedule("08:30", "18:00", Some(("12:30", "13:15")), true);
    let first = generate_day_slots(sched.clinic_id, monday(), &sched, 45);
    let second = generate_day_slots(sched.clinic_id, monday(), &sched, 45);

    assert_eq!(first, second);
}

#[test]
fn slot_carries_date_and_clinic() {
    let sched = schedule("09:00", "10:00", None, true);
    let slots = generate_day_slots(sched.clinic_id, monday(), &sched, 30);

    assert!(slots.iter().all(|slot| slot.date == monday() && slot.clinic_id == sched.clinic_id));
}
