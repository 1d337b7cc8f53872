//! Domain models: purchases, schedules, the schedule book, and the
//! sweep attempt log

pub mod book;
pub mod event;
pub mod purchase;
pub mod schedule;
