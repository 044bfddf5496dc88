//! Runtime profile statistics — the planner's input.
//!
//! Statistics collection itself (sampling call sites, recording observed
//! argument types) is out of scope; this module only defines the shapes
//! [`crate::plan::PlanBuilder`] reads. The nesting mirrors the original:
//! a static frame has stats `by_callsite`, each callsite has stats
//! `by_type`, and each type bucket has stats `by_offset` recording which
//! invoke instructions were reached with that type tuple (used to walk
//! caller → callee edges during [`crate::plan::builder::twiddle_stack_depths`]).

use crate::callsite::Callsite;
use crate::static_frame::StaticFrameId;

/// Opaque handle to a GC-managed type object (a class, a role, etc).
///
/// The identity is all this crate needs — type objects themselves are
/// opaque collaborators owned by the object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeHandle(pub u64);

/// One argument position's observed (type, decont-type) pair.
///
/// `decont_type` is the type the argument would have after decontainerizing
/// (unwrapping a `Scalar`/`Array` container), matching how the source
/// engine's container model distinguishes a binding's declared type from
/// its currently-held value's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatsType {
    /// Observed type of the argument as passed.
    pub type_id: Option<TypeHandle>,
    /// Observed type after decontainerization, if the argument was
    /// containerized.
    pub decont_type_id: Option<TypeHandle>,
}

/// A full argument-type tuple for one callsite shape, one entry per
/// argument position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeTuple(pub Vec<StatsType>);

impl TypeTuple {
    /// Build a type tuple from per-argument observations.
    pub fn new(types: Vec<StatsType>) -> Self {
        TypeTuple(types)
    }

    /// Number of argument positions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tuple has no argument positions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One observed invoke instruction inside a type bucket's bytecode.
#[derive(Debug, Clone)]
pub struct InvokeRecord {
    /// The static frame that was invoked.
    pub sf: StaticFrameId,
}

/// Statistics for all invokes observed at one bytecode offset, for frames
/// specialized with a particular argument type tuple.
#[derive(Debug, Clone, Default)]
pub struct StatsByOffset {
    /// Bytecode offset of the invoke instruction.
    pub offset: u32,
    /// Every static frame invoked from this offset under this type tuple.
    pub invokes: Vec<InvokeRecord>,
}

/// Statistics for one observed argument type tuple at a callsite.
#[derive(Debug, Clone, Default)]
pub struct StatsByType {
    /// The observed argument types.
    pub arg_types: TypeTuple,
    /// Calls seen with exactly this type tuple.
    pub hits: u32,
    /// OSR entries seen with exactly this type tuple.
    pub osr_hits: u32,
    /// Maximum call-stack depth observed for this type tuple, used as a
    /// specialization-ordering heuristic.
    pub max_depth: u32,
    /// Per-offset invoke statistics, used by `twiddle_stack_depths` to find
    /// callees that also have their own plan.
    pub by_offset: Vec<StatsByOffset>,
}

/// Statistics for one callsite shape at a static frame.
#[derive(Debug, Clone, Default)]
pub struct StatsByCallsite {
    /// The callsite shape these stats describe. `None` represents calls
    /// whose shape could not be attributed to a single callsite (e.g.
    /// calls via `apply`), which are excluded from type-tuple planning but
    /// still count toward the frame's aggregate hits.
    pub cs: Option<Callsite>,
    /// Calls seen at this callsite.
    pub hits: u32,
    /// OSR entries seen at this callsite.
    pub osr_hits: u32,
    /// Maximum call-stack depth observed at this callsite.
    pub max_depth: u32,
    /// Per-type-tuple breakdown.
    pub by_type: Vec<StatsByType>,
}

/// All statistics gathered for one static frame.
#[derive(Debug, Clone, Default)]
pub struct SpeshStats {
    /// Total calls to this frame, across all callsites.
    pub hits: u32,
    /// Total OSR entries into this frame.
    pub osr_hits: u32,
    /// Per-callsite breakdown.
    pub by_callsite: Vec<StatsByCallsite>,
}
