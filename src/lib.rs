pub mod aggregate;
pub mod app;
pub mod config;
pub mod estimate;
pub mod filter;
pub mod history;
pub mod model;
pub mod normalize;
pub mod report;
pub mod snapshot;
