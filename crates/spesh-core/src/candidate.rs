//! `Candidate` — one specialized compilation of a static frame.

use std::sync::Arc;

use crate::deopt_table::DeoptTable;
use crate::inline_table::InlineTable;
use crate::jit::JitCodeHandle;
use crate::static_frame::StaticFrameId;

/// Stable identity for a [`Candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateId(pub u64);

/// A deopt point flagged as depending on a partial-escape-analysis
/// materialization. Materialization itself is unimplemented (§9) — this
/// type only records *where* it would be needed, so [`crate::deopt`] can
/// report [`crate::error::DeoptError::PeaMaterializationNotImplemented`]
/// instead of silently skipping it.
#[derive(Debug, Clone, Copy)]
pub struct PeaDeoptPoint {
    /// Specialized-bytecode offset this materialization applies at.
    pub deopt_point_offset: u32,
    /// Index into the specializer's materialization-info table (opaque;
    /// the materializer is not implemented here).
    pub materialize_info_idx: u32,
}

/// One specialized compilation of a [`crate::static_frame::StaticFrame`]
/// for a specific callsite shape and argument-type tuple.
#[derive(Debug)]
pub struct Candidate {
    /// Stable identity.
    pub id: CandidateId,

    /// The frame this candidate specializes.
    pub static_frame: StaticFrameId,

    /// Specialized bytecode. Deopt offsets are measured relative to the
    /// start of this buffer.
    pub bytecode: Arc<[u8]>,

    /// Generic ↔ specialized offset pairs.
    pub deopts: DeoptTable,

    /// Inline-region descriptors, if the specializer inlined any callees
    /// into this candidate.
    pub inlines: Option<InlineTable>,

    /// JIT-compiled code for this candidate, if the JIT backend has
    /// compiled it.
    pub jit_code: Option<JitCodeHandle>,

    /// Deopt points that require partial-escape-analysis materialization.
    pub deopt_pea_points: Vec<PeaDeoptPoint>,

    /// Named arguments marked consumed at specialization time, restored
    /// onto the frame at deopt in case the deopt happened mid-argument-
    /// handling (so the generic code doesn't re-bind an argument that was
    /// already spent).
    pub deopt_named_used_bit_field: Option<u64>,
}
