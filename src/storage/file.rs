// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed storage.
//!
//! All entries live in one JSON object document. The document is re-read on
//! every access so a freshly started process observes whatever the previous
//! one persisted, and every write goes through a temp file + rename so a
//! crash mid-write never leaves a truncated document behind.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStorage, StorageError, StorageResult};

type Document = BTreeMap<String, String>;

/// Storage persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create storage backed by `path`. The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> StorageResult<Document> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        let document = serde_json::from_reader(BufReader::new(file))?;
        Ok(document)
    }

    fn write_document(&self, document: &Document) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Document) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut document = self.read_document()?;
        if mutate(&mut document) {
            self.write_document(&document)?;
        }
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.update(|document| {
            document.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.update(|document| document.remove(key).is_some())
    }
}
