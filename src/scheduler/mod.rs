//! 日程层：SQLite 事件存储与自然语言时间解析

pub mod store;
pub mod timeparse;

pub use store::{Event, EventStore, SchedulerError};
pub use timeparse::parse_natural_time;
