// libs/clinic-cell/src/services/slots.rs
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{AvailabilitySlot, ClinicSchedule, TimeOfDay};

/// The slot grid always advances in 30-minute steps, independent of the
/// duration a caller asks for. All services are booked on this grid; the
/// requested duration only bounds the last emitted slot and is attached to
/// each slot as metadata.
pub const SLOT_STEP_MINUTES: u16 = 30;

/// Generate the candidate slots for one calendar date. Pure function of its
/// inputs: same schedule, date and duration always yield the same sequence.
///
/// The cursor starts at opening time and a slot is emitted while the full
/// requested duration still fits before closing. Cursor positions inside the
/// lunch break are skipped without emitting. Closed schedules and
/// non-positive durations yield nothing.
pub fn generate_day_slots(
    clinic_id: Uuid,
    date: NaiveDate,
    schedule: &ClinicSchedule,
    duration_minutes: i32,
) -> Vec<AvailabilitySlot> {
    if !schedule.is_open || duration_minutes <= 0 {
        return Vec::new();
    }

    let closing = i32::from(schedule.closing_time.minutes());
    let mut cursor = i32::from(schedule.opening_time.minutes());
    let mut slots = Vec::new();

    while cursor + duration_minutes <= closing {
        let Some(time) = TimeOfDay::from_minutes(cursor as u16) else {
            break;
        };

        if !schedule.in_lunch(time) {
            slots.push(AvailabilitySlot {
                clinic_id,
                date,
                time,
                duration_minutes,
                available: true,
            });
        }

        cursor += i32::from(SLOT_STEP_MINUTES);
    }

    slots
}
