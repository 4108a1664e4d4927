//! Snapshot sources: where the display tier gets its point-in-time process table.
//!
//! The capture engine exports its statistics as a JSON document; the host loop
//! reloads it every refresh so the composer always works on an owned copy that
//! cannot change underneath it.
//!
//! Document shape:
//! ```json
//! { "processes": [ { "process_id": 1234, "target": true, "module_name": "game.exe",
//!     "chains": [ { "id": "0x1", "runtime": "dxgi", "fps": 60.0, ... } ] } ] }
//! ```
//! Chain ids are accepted as JSON numbers or as hex strings with an optional
//! `0x` prefix. Unknown runtime / present mode names fall back to
//! `RuntimeKind::Other` / `PresentMode::Unknown`.

use crate::{ChainId, ChainStats, PresentMode, ProcessSnapshot, ProcessTable, RuntimeKind};
use serde::Deserialize;
use std::collections::btree_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid chain id {0:?}")]
    InvalidChainId(String),
    #[error("process {0} listed more than once")]
    DuplicateProcess(u32),
    #[error("chain {chain} listed more than once for process {process_id}")]
    DuplicateChain { process_id: u32, chain: ChainId },
}

/// Provider of consistent process tables. Each call returns a fresh copy.
pub trait SnapshotSource {
    fn load(&mut self) -> Result<ProcessTable, SnapshotError>;
}

/// Reads an exported snapshot document from disk on every `load`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for JsonFileSource {
    fn load(&mut self) -> Result<ProcessTable, SnapshotError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        let table = parse_document(&content)?;
        debug!(
            target: "capture",
            file = %self.path.display(),
            processes = table.len(),
            "snapshot_loaded"
        );
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    processes: Vec<ProcessEntry>,
}

#[derive(Debug, Deserialize)]
struct ProcessEntry {
    process_id: u32,
    #[serde(default = "ProcessEntry::default_target")]
    target: bool,
    #[serde(default)]
    module_name: String,
    #[serde(default)]
    chains: Vec<ChainEntry>,
}

impl ProcessEntry {
    const fn default_target() -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    id: RawChainId,
    #[serde(default)]
    runtime: RuntimeKind,
    #[serde(default)]
    sync_interval: i32,
    #[serde(default)]
    present_flags: u32,
    #[serde(default)]
    present_mode: PresentMode,
    #[serde(default)]
    plane_index: i32,
    #[serde(default)]
    dwm_notified: bool,
    #[serde(default)]
    has_been_batched: bool,
    #[serde(default)]
    fps: f64,
    #[serde(default)]
    displayed_fps: f64,
    #[serde(default)]
    cpu_frame_time_seconds: f64,
    #[serde(default)]
    latency_seconds: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChainId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawChainId> for ChainId {
    type Error = SnapshotError;

    fn try_from(raw: RawChainId) -> Result<Self, Self::Error> {
        match raw {
            RawChainId::Number(n) => Ok(ChainId(n)),
            RawChainId::Text(s) => {
                let trimmed = s.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                u64::from_str_radix(digits, 16)
                    .map(ChainId)
                    .map_err(|_| SnapshotError::InvalidChainId(s))
            }
        }
    }
}

impl ChainEntry {
    fn into_parts(self) -> (RawChainId, ChainStats) {
        let stats = ChainStats {
            runtime: self.runtime,
            sync_interval: self.sync_interval,
            present_flags: self.present_flags,
            present_mode: self.present_mode,
            plane_index: self.plane_index,
            dwm_notified: self.dwm_notified,
            has_been_batched: self.has_been_batched,
            fps: self.fps,
            displayed_fps: self.displayed_fps,
            cpu_frame_time_seconds: self.cpu_frame_time_seconds,
            latency_seconds: self.latency_seconds,
        };
        (self.id, stats)
    }
}

/// Parse a snapshot document into an ordered process table.
pub fn parse_document(content: &str) -> Result<ProcessTable, SnapshotError> {
    let doc: SnapshotDocument = serde_json::from_str(content)?;
    let mut table = ProcessTable::new();
    for entry in doc.processes {
        let process_id = entry.process_id;
        let mut snapshot = ProcessSnapshot::new(entry.module_name, entry.target);
        for chain in entry.chains {
            let (raw_id, stats) = chain.into_parts();
            let id = ChainId::try_from(raw_id)?;
            match snapshot.chains.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(stats);
                }
                Entry::Occupied(_) => {
                    return Err(SnapshotError::DuplicateChain {
                        process_id,
                        chain: id,
                    });
                }
            }
        }
        match table.entry(process_id) {
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
            }
            Entry::Occupied(_) => return Err(SnapshotError::DuplicateProcess(process_id)),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_numeric_chain_ids() {
        assert_eq!(
            ChainId::try_from(RawChainId::Text("0x1A".into())).unwrap(),
            ChainId(0x1a)
        );
        assert_eq!(
            ChainId::try_from(RawChainId::Text("ff".into())).unwrap(),
            ChainId(0xff)
        );
        assert_eq!(
            ChainId::try_from(RawChainId::Number(42)).unwrap(),
            ChainId(42)
        );
        assert!(matches!(
            ChainId::try_from(RawChainId::Text("zz".into())),
            Err(SnapshotError::InvalidChainId(_))
        ));
    }

    #[test]
    fn duplicate_chain_rejected() {
        let doc = r#"{"processes":[{"process_id":1,"module_name":"a.exe",
            "chains":[{"id":1},{"id":"0x1"}]}]}"#;
        let err = parse_document(doc).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::DuplicateChain { process_id: 1, chain: ChainId(1) }
        ));
    }

    #[test]
    fn duplicate_process_rejected() {
        let doc = r#"{"processes":[{"process_id":7},{"process_id":7}]}"#;
        assert!(matches!(
            parse_document(doc),
            Err(SnapshotError::DuplicateProcess(7))
        ));
    }

    #[test]
    fn empty_document_is_empty_table() {
        assert!(parse_document("{}").unwrap().is_empty());
    }
}
