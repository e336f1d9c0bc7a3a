pub mod daily;
pub mod month;
pub mod station;
