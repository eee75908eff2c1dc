//! Form rendering module
//!
//! - `field_renderer`: one list item per logical field
//! - `application_form`: the scrolling form with its shareable address

mod application_form;
mod field_renderer;

pub use application_form::draw_application;
