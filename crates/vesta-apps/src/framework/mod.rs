//! App Framework
//!
//! Core types and traits for building Vesta applications:
//!
//! - **App**: The trait all apps implement
//! - **AppProcess**: The windowed process hosting an app
//! - **AppError**: Load and runtime failures

mod app;
mod error;
mod process;

pub use app::App;
pub use error::AppError;
pub use process::{AppProcess, AppTimings};
