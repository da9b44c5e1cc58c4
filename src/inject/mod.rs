pub mod engine;
pub mod feature;
pub mod features;
pub mod marks;
pub mod placement;
