pub mod schedule;
pub mod slots;
