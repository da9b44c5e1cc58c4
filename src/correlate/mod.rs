pub mod correlator;
pub mod index;
