pub mod app;
pub mod board;
pub mod cli;
pub mod cli_ops;
pub mod clock;
pub mod completions;
pub mod config;
pub mod datetime_format;
pub mod db;
pub mod domain;
pub mod feed;
pub mod ids;
pub mod logging;
pub mod observable;
pub mod repository;
pub mod stats;
pub mod ui;
