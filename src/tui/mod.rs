//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides the clinic front desk screens:
//! - Sign-up and patient registration forms
//! - Appointment requests and their confirmation
//! - Passkey-gated admin dashboard

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::CareTheme;
pub use worker::{SubmitHandle, SubmitOutcome, SubmitWorker};
