pub mod availability;
pub mod catalog;
pub mod events;
pub mod lifecycle;
pub mod stats;
