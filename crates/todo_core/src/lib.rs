pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod recurrence;
pub mod reminder;
pub mod repository;
pub mod storage;
pub mod view;
