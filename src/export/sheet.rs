//! Field sheet writer standing in for the PDF backend
//!
//! Writes the export snapshot as pretty JSON, one file per export, so any
//! downstream PDF tool can pick it up.

use super::{ExportReceipt, PdfFiller};
use crate::state::FormSnapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Writes `form-<uuid>.json` files into a directory
#[derive(Debug, Clone)]
pub struct FieldSheetFiller {
    dir: PathBuf,
}

impl FieldSheetFiller {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PdfFiller for FieldSheetFiller {
    async fn fill(&self, snapshot: &FormSnapshot) -> Result<ExportReceipt> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(format!("form-{}.json", uuid::Uuid::new_v4()));
        let content = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(ExportReceipt {
            location: path.display().to_string(),
        })
    }
}
