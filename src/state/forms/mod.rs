//! Form-state engine
//!
//! Turns the live form document into a canonical snapshot and back, keeps the
//! snapshot in the address fragment, and enforces the dependency and
//! validation rules between fields:
//! - `document`: controls grouped by name, resolved once per lookup
//! - `codec` / `snapshot`: per-field and whole-form (de)serialization
//! - `fragment`: base64url address fragment persistence
//! - `rules` / `validation` / `prefill`: the rule table and its evaluation
//! - `session`: routes user events through all of the above

mod codec;
mod context;
mod debounce;
mod document;
mod field;
mod fragment;
mod layout;
mod prefill;
mod rules;
mod session;
mod snapshot;
mod validation;

pub use context::{FormContext, SystemClock};
pub use debounce::DEFAULT_PERSIST_DELAY;
pub use document::{ControlKind, FieldDescriptor, FormDocument};
pub use field::{FieldValue, FormSnapshot};
pub use fragment::SessionLocation;
pub use layout::{transfer_application, ALL_NO_BUTTON};
pub use prefill::Prefill;
pub use session::{ExportError, FormEvent, FormSession};

#[cfg(test)]
pub use context::FixedClock;
#[cfg(test)]
pub use fragment::MemoryLocation;
