//! JSON-lines audit log: one [`AuditRecord`] per line, append-only.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cargobay_audit::{AuditReader, AuditRecord, AuditSink};

use crate::error::StoreError;

#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesAuditSink {
    type Error = StoreError;

    fn append(&self, batch: Vec<AuditRecord>) -> Result<(), Self::Error> {
        if batch.is_empty() {
            return Ok(());
        }

        // Serialize the whole batch first so a bad record writes nothing.
        let mut buf = Vec::new();
        for record in &batch {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(&buf).map_err(|e| StoreError::io(&self.path, e))
    }
}

impl AuditReader for JsonLinesAuditSink {
    type Error = StoreError;

    fn read_all(&self) -> Result<Vec<AuditRecord>, Self::Error> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| StoreError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}
