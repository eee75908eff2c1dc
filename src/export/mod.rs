//! Collaborators outside the form engine: signature capture and document filling

mod sheet;
mod signature;
mod traits;

pub use sheet::FieldSheetFiller;
pub use signature::TypedSignature;
pub use traits::{ExportReceipt, PdfFiller, SignaturePad};

#[cfg(test)]
pub use traits::{MockPdfFiller, MockSignaturePad};
