//! JSON-lines snapshot recorder

use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::snapshot::PublishedState;

pub struct SnapshotRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl SnapshotRecorder {
    /// Create (or truncate) the output file
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create recording {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn record(&mut self, state: &PublishedState) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, state)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of snapshots written
    pub fn finish(mut self) -> anyhow::Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}
