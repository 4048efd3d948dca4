//! Shared wire types for the `DailyTask` recovery task API.

pub mod api;
pub mod proof;
pub mod streak;
pub mod tag;
pub mod task;
