pub mod events;
pub mod gate;
pub mod navigation;
