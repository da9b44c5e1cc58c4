pub mod panel;
pub mod schedule;
pub mod transport;
