pub mod matcher;
pub mod view_model;
