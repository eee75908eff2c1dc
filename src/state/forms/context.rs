//! Explicit engine context
//!
//! Holds what the engine needs from outside the form: the signature pad, the
//! prefill table and the calendar. It must be constructed before the first
//! snapshot is taken.

use super::prefill::Prefill;
use crate::export::SignaturePad;
use chrono::{Local, NaiveDate};

/// Source of the current calendar date
pub trait Clock: Send {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Collaborators handed to the engine at start-up
pub struct FormContext {
    pub signature: Box<dyn SignaturePad>,
    pub prefill: Prefill,
    pub clock: Box<dyn Clock>,
}

impl FormContext {
    pub fn new(signature: Box<dyn SignaturePad>, prefill: Prefill, clock: Box<dyn Clock>) -> Self {
        Self {
            signature,
            prefill,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
