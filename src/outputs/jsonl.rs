//! Append-only JSON-Lines result sink.
//!
//! One serialized [`JobRecord`] per line, pushed in acceptance order. The
//! open file handle sits behind an async mutex because multiple detail
//! workers can finish and emit simultaneously; the write itself awaits
//! while holding the lock, so lines never interleave.

use crate::models::JobRecord;
use chrono::Local;
use std::error::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Append-only sink writing one JSON object per line.
#[derive(Debug)]
pub struct JsonlSink {
    file: Mutex<File>,
    path: String,
}

impl JsonlSink {
    /// Open (or create) today's result file under `output_dir`.
    #[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
    pub async fn open(output_dir: &str) -> Result<Self, Box<dyn Error>> {
        let date = Local::now().date_naive();
        let path = format!("{}/jobs_{}.jsonl", output_dir.trim_end_matches('/'), date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path, "Opened result sink");
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Append one record as a single JSON line.
    pub async fn push(&self, record: &JobRecord) -> Result<(), Box<dyn Error>> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Path of the file being appended to.
    pub fn path(&self) -> &str {
        &self.path
    }
}
