pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod engine;
pub mod exit;
pub mod platform;
pub mod probes;
pub mod recommend;
pub mod remote;
pub mod report;
pub mod ui;
