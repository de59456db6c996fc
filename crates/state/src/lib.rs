//! Settings and persistence for artimine.
//!
//! This crate provides utilities for:
//! - Resolving settings from the environment, a JSON config file and defaults.
//! - Storing detected skills per project in SQLite.

pub mod env;
pub mod persistence;

pub use env::{
    config_file, home_dir, load_file_settings, load_settings, FileSettings, Settings,
};
pub use persistence::{SaveReport, SkillStore, StoreError};
