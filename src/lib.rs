pub mod api;
pub mod config;
pub mod consts;
pub mod core_types;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod model;
pub mod optimizer;
pub mod report;
pub mod scorer;
// cmd and reports are binary modules (see main.rs).
