pub mod app;
pub mod audio;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod library;
pub mod logging;
pub mod model;
pub mod names;
pub mod session;
pub mod ui;
