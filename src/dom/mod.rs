pub mod clock;
pub mod host;
pub mod memory;
pub mod wait;
