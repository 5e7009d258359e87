// libs/scheduling-cell/src/services/conflict.rs
use std::collections::HashSet;

use chrono::NaiveDate;

use clinic_cell::models::{AvailabilitySlot, TimeOfDay};

use crate::models::Appointment;

/// Mark candidate slots that are already taken by a non-cancelled
/// appointment at the exact same (date, time).
///
/// An appointment occupies only its start minute; variable service durations
/// are not expanded into overlap ranges here. That is a known limitation of
/// the 30-minute-grid model, not an oversight.
pub fn mark_conflicts(mut slots: Vec<AvailabilitySlot>, existing: &[Appointment]) -> Vec<AvailabilitySlot> {
    let occupied = occupied_starts(existing);

    for slot in &mut slots {
        if occupied.contains(&(slot.date, slot.time)) {
            slot.available = false;
        }
    }

    slots
}

/// The set of (date, time) start points held by non-cancelled appointments.
pub fn occupied_starts(existing: &[Appointment]) -> HashSet<(NaiveDate, TimeOfDay)> {
    existing
        .iter()
        .filter(|apt| apt.status.occupies_slot())
        .map(|apt| (apt.appointment_date, apt.appointment_time))
        .collect()
}
