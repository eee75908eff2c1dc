//! Trait abstractions for the collaborators the form engine talks to,
//! enabling mocking in tests

use crate::state::FormSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Signature capture surface
///
/// The engine treats the payload as opaque and only looks at emptiness.
#[cfg_attr(test, mockall::automock)]
pub trait SignaturePad: Send {
    /// Whether nothing has been signed
    fn is_empty(&self) -> bool;

    /// Opaque payload of the current signature
    fn serialize(&self) -> Option<String>;

    /// Restore a payload previously produced by `serialize`
    fn deserialize(&mut self, payload: Option<String>);

    /// Wipe the signature
    fn clear(&mut self);
}

/// Where a filled document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub location: String,
}

/// Document generation backend fed with the export snapshot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdfFiller: Send + Sync {
    /// Fill the document with every answerable field
    async fn fill(&self, snapshot: &FormSnapshot) -> Result<ExportReceipt>;
}
