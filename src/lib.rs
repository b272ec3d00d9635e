//! ColorBook: an SVG coloring book with undo history, completion tracking
//! and PNG export.
//!
//! The binary wraps this library in an eframe window or a headless CLI.

pub mod logger;

pub mod binder;
pub mod catalog;
pub mod cli;
pub mod components;
pub mod document;
pub mod export;
pub mod loader;
pub mod progress;
pub mod project;
pub mod render;
pub mod settings;
