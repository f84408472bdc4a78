//! Flat keyed result storage.
//!
//! Every derived series or aggregate is addressed by one [`ResultKey`]
//! `(building, zone, scenario, metric)`. A key may be written once per run.
//! [`MemoryStore`] keeps results in a sorted map and persists them as JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::activity::ActivityTally;
use crate::analysis::comfort::PeakHumidex;
use crate::analysis::degree_hours::DegreeExceedanceRecord;
use crate::error::AnalysisError;
use crate::key::ResultKey;
use crate::run_id::RunId;

/// Value stored under a result key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Series(Vec<f64>),
    DegreeExceedance(DegreeExceedanceRecord),
    Activity(ActivityTally),
    PeakHumidex(PeakHumidex),
}

impl StoredValue {
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            StoredValue::Series(v) => Some(v),
            _ => None,
        }
    }
}

pub trait ResultStore {
    /// Stores a value; fails with [`AnalysisError::DuplicateKey`] if the key
    /// was already written in this run.
    fn put(&mut self, key: ResultKey, value: StoredValue) -> Result<(), AnalysisError>;

    fn get(&self, key: &ResultKey) -> Option<&StoredValue>;

    fn contains(&self, key: &ResultKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory store over a sorted flat map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    run_id: RunId,
    entries: BTreeMap<ResultKey, StoredValue>,
}

/// On-disk layout. JSON object keys must be strings, so entries are a list.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    run_id: RunId,
    entries: Vec<StoreEntry>,
}

#[derive(Serialize, Deserialize)]
struct StoreEntry {
    key: ResultKey,
    value: StoredValue,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &StoredValue)> {
        self.entries.iter()
    }

    /// Entries of one building, in key order.
    pub fn building<'a>(
        &'a self,
        building: &'a str,
    ) -> impl Iterator<Item = (&'a ResultKey, &'a StoredValue)> + 'a {
        self.entries.iter().filter(move |(k, _)| k.building == building)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_file()).context("Failed to serialize results to string")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: StoreFile =
            serde_json::from_str(json).context("Failed to deserialize results from string")?;
        Self::from_file(file)
    }

    fn to_file(&self) -> StoreFile {
        StoreFile {
            run_id: self.run_id.clone(),
            entries: self
                .entries
                .iter()
                .map(|(key, value)| StoreEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    fn from_file(file: StoreFile) -> Result<Self> {
        let mut store = Self {
            run_id: file.run_id,
            entries: BTreeMap::new(),
        };
        for entry in file.entries {
            store.put(entry.key, entry.value)?;
        }
        Ok(store)
    }
}

impl ResultStore for MemoryStore {
    fn put(&mut self, key: ResultKey, value: StoredValue) -> Result<(), AnalysisError> {
        if self.entries.contains_key(&key) {
            return Err(AnalysisError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &ResultKey) -> Option<&StoredValue> {
        self.entries.get(key)
    }
}

/// Writes a store to a JSON file.
pub fn write_results(path: &Path, store: &MemoryStore) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &store.to_file())
        .with_context(|| format!("Failed to serialize results to: {}", path.display()))?;

    Ok(())
}

/// Reads a store from a JSON file written by [`write_results`].
pub fn read_results(path: &Path) -> Result<MemoryStore> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let data: StoreFile = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize results from: {}", path.display()))?;

    MemoryStore::from_file(data)
        .with_context(|| format!("Invalid result file: {}", path.display()))
}
