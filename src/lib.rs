pub mod action;
pub mod api;
pub mod browser;
pub mod cli;
pub mod correlate;
pub mod dom;
pub mod format;
pub mod inject;
pub mod notify;
pub mod runtime;
pub mod signal;
pub mod trace;
pub mod view;
