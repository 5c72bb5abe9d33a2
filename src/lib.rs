pub mod analysis;
pub mod api;
pub mod cache;
pub mod charts;
pub mod config;
pub mod display;
pub mod error;
pub mod flatten;
pub mod pipeline;
