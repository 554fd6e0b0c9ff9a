//! Tempest Dashboard - headless dashboard client for the tempestd weather-station API
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod controls;
pub mod error;
pub mod plugins;
pub mod range;
pub mod render;
pub mod session;
pub mod store;
pub mod sync;
pub mod tempestd;
