//! `DeoptTable` — the read-only mapping between specialized and generic
//! bytecode offsets for one candidate.
//!
//! A deopt *index* names a pair: the generic-bytecode offset to resume at,
//! and the specialized-bytecode offset the pair is valid from. Both halves
//! live in one flat `Vec` (generic, specialized, generic, specialized, ...)
//! rather than a `Vec<(u32, u32)>`, matching the original's flat
//! `deopts[2i]` / `deopts[2i+1]` indexing — kept because
//! [`crate::deopt::reconstructor`] indexes by `2 * idx` directly when it has
//! to resolve a *return* deopt index recorded on an [`crate::inline_table::InlineDescriptor`].

/// One `(generic_offset, specialized_offset)` pair, named by its index in
/// the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeoptPoint {
    /// Offset into the static frame's generic bytecode to resume execution
    /// at after deopt.
    pub generic_offset: u32,
    /// Offset into the candidate's specialized bytecode this pair is valid
    /// from (the point a guard failure or explicit deopt instruction can
    /// name).
    pub specialized_offset: u32,
}

/// Read-only per-candidate deopt index.
#[derive(Debug, Clone, Default)]
pub struct DeoptTable {
    points: Vec<DeoptPoint>,
}

impl DeoptTable {
    /// Build a table from an explicit list of points, index order
    /// preserved (the index *is* position in this list).
    pub fn new(points: Vec<DeoptPoint>) -> Self {
        DeoptTable { points }
    }

    /// Number of deopt indices in the table.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The pair named by `idx`, or `None` if out of range.
    pub fn get(&self, idx: u32) -> Option<DeoptPoint> {
        self.points.get(idx as usize).copied()
    }

    /// The generic-bytecode offset for deopt index `idx`.
    pub fn generic_offset(&self, idx: u32) -> Option<u32> {
        self.get(idx).map(|p| p.generic_offset)
    }

    /// Find the deopt index whose specialized offset equals `offset`,
    /// scanning in table order. Used to resolve an inactive frame's
    /// `return_address` back to a deopt index (§4.3).
    pub fn index_of_specialized_offset(&self, offset: u32) -> Option<u32> {
        self.points
            .iter()
            .position(|p| p.specialized_offset == offset)
            .map(|i| i as u32)
    }
}
