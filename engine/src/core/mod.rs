//! Core utilities: calendar-day scheduling arithmetic

pub mod time;
