use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable index of a reach inside a built network.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<ReachIdx>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReachIdx(NonZeroU32);

impl ReachIdx {
    /// Create an index from a 0-based position by storing position+1.
    pub fn from_index(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(v) => Self(v),
            None => Self(NonZeroU32::MAX),
        }
    }

    /// Recover the 0-based position.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    pub fn as_usize(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for ReachIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReachIdx({})", self.index())
    }
}

impl fmt::Display for ReachIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// External reach identifier (river segment number from the input tables).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ReachId(pub u64);

impl fmt::Display for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReachId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Hydrological network node (junction between reaches).
pub type HydroNodeId = u64;

/// Hydrological sequence number: strictly increasing downstream.
pub type HydSeq = i64;
