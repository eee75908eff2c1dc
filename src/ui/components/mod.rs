//! Reusable UI components

mod alert;

pub use alert::render_alert_dialog;
