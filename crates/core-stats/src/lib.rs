//! Per-process presentation statistics as seen by the display tier.
//!
//! The capture engine owns and mutates the live statistics; everything in this
//! crate is a point-in-time copy handed to the report composer. Nothing here
//! computes frame rates or latency: the derived metrics on [`ChainStats`] are
//! supplied already reduced by the engine and are trusted as-is (no finiteness
//! or sign checks).
//!
//! Ordering:
//! - Chains are keyed by [`ChainId`] in a `BTreeMap`, so iteration is ascending
//!   handle order and identical across runs for an unchanged snapshot.
//! - A [`ProcessTable`] is likewise ordered by process id.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub mod source;
pub use source::{JsonFileSource, SnapshotError, SnapshotSource};

/// Opaque 64-bit swap chain handle. Displays as 16 uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Graphics runtime that issued the presents on a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Dxgi,
    D3d9,
    #[default]
    #[serde(other)]
    Other,
}

impl RuntimeKind {
    pub const fn name(self) -> &'static str {
        match self {
            RuntimeKind::Dxgi => "DXGI",
            RuntimeKind::D3d9 => "D3D9",
            RuntimeKind::Other => "Other",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the most recent frame on a chain reached the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    HardwareLegacyFlip,
    HardwareLegacyCopyToFrontBuffer,
    HardwareIndependentFlip,
    ComposedFlip,
    HardwareComposedIndependentFlip,
    ComposedCopyWithGpuGdi,
    ComposedCopyWithCpuGdi,
    ComposedCompositionAtlas,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PresentMode {
    pub const fn name(self) -> &'static str {
        match self {
            PresentMode::HardwareLegacyFlip => "Hardware Legacy Flip",
            PresentMode::HardwareLegacyCopyToFrontBuffer => "Hardware Legacy Copy To Front Buffer",
            PresentMode::HardwareIndependentFlip => "Hardware Independent Flip",
            PresentMode::ComposedFlip => "Composed Flip",
            PresentMode::HardwareComposedIndependentFlip => "Hardware Composed Independent Flip",
            PresentMode::ComposedCopyWithGpuGdi => "Composed Copy With GPU GDI",
            PresentMode::ComposedCopyWithCpuGdi => "Composed Copy With CPU GDI",
            PresentMode::ComposedCompositionAtlas => "Composed Composition Atlas",
            PresentMode::Unknown => "Other",
        }
    }

    /// Independent flip modes, the only ones where a DWM notification is meaningful.
    pub const fn is_independent_flip(self) -> bool {
        matches!(
            self,
            PresentMode::HardwareIndependentFlip | PresentMode::HardwareComposedIndependentFlip
        )
    }
}

impl fmt::Display for PresentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last observed present parameters of one swap chain plus the engine's derived metrics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainStats {
    pub runtime: RuntimeKind,
    pub sync_interval: i32,
    pub present_flags: u32,
    pub present_mode: PresentMode,
    /// Only meaningful for `HardwareComposedIndependentFlip`.
    pub plane_index: i32,
    pub dwm_notified: bool,
    pub has_been_batched: bool,
    pub fps: f64,
    pub displayed_fps: f64,
    pub cpu_frame_time_seconds: f64,
    pub latency_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessSnapshot {
    pub is_target_process: bool,
    pub module_name: String,
    pub chains: BTreeMap<ChainId, ChainStats>,
}

impl ProcessSnapshot {
    pub fn new(module_name: impl Into<String>, is_target_process: bool) -> Self {
        Self {
            is_target_process,
            module_name: module_name.into(),
            chains: BTreeMap::new(),
        }
    }

    pub fn with_chain(mut self, id: u64, stats: ChainStats) -> Self {
        self.chains.insert(ChainId(id), stats);
        self
    }

    /// A process contributes to the report only when it is a capture target,
    /// has a resolved module name and owns at least one chain.
    pub fn is_visible(&self) -> bool {
        self.is_target_process && !self.module_name.is_empty() && !self.chains.is_empty()
    }
}

/// Snapshot of every tracked process keyed by process id.
pub type ProcessTable = BTreeMap<u32, ProcessSnapshot>;
