#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! JSON-lines file collaborators: one record per line.

use std::path::{Path, PathBuf};

use alvin_core::{Extractor, InvalidRecord, Loader, Record};
use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tracing::{debug, info};

/// Reads records from a JSON-lines file. Blank lines are skipped.
///
/// A line that does not decode is reported as [`InvalidRecord`]; reading
/// resumes at the next line.
pub struct JsonLinesExtractor {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_number: usize,
}

impl JsonLinesExtractor {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        info!("Reading records from {}", path.display());

        Ok(Self {
            path,
            lines: Some(BufReader::new(file).lines()),
            line_number: 0,
        })
    }
}

#[async_trait]
impl Extractor for JsonLinesExtractor {
    async fn extract(&mut self) -> anyhow::Result<Option<Record>> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        while let Some(line) = lines.next_line().await? {
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| InvalidRecord {
                location: format!("{}:{}", self.path.display(), self.line_number),
                reason: e.to_string(),
            })?;
            return Ok(Some(record));
        }

        Ok(None)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if self.lines.take().is_some() {
            debug!("Closed {} after {} lines", self.path.display(), self.line_number);
        }
        Ok(())
    }

    fn scope(&self) -> &str {
        "extractor.json_lines"
    }
}

/// Writes records to a JSON-lines file, one per line.
pub struct JsonLinesLoader {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl JsonLinesLoader {
    pub async fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }
}

#[async_trait]
impl Loader for JsonLinesLoader {
    async fn load(&mut self, record: &Record) -> anyhow::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Loader for {} is closed", self.path.display()))?;

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.into_inner().sync_all().await?;
            info!("Wrote {} records to {}", self.written, self.path.display());
        }
        Ok(())
    }

    fn scope(&self) -> &str {
        "loader.json_lines"
    }
}
