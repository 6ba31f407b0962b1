pub mod types;
pub mod weekday;
