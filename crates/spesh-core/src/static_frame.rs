//! `StaticFrame` — the compiled representation of a source-level subroutine.
//!
//! Treated as an opaque collaborator per the spec: this crate only reads the
//! handful of fields it needs (bytecode, local/lexical counts, the
//! specializable flag, and the attached [`SpeshFacts`]). Parsing, lowering,
//! and bytecode verification live elsewhere in the engine and are not
//! reproduced here.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::candidate::CandidateId;
use crate::callsite::Callsite;
use crate::plan::stats::{SpeshStats, TypeTuple};

/// Stable identity for a [`StaticFrame`], cheap to copy and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticFrameId(pub u64);

/// The compiled representation of one source-level subroutine.
#[derive(Debug)]
pub struct StaticFrame {
    /// Stable identity, used as the key in arg-guard lookups and as the
    /// `sf` field the GC worklist walks.
    pub id: StaticFrameId,

    /// Human-readable name, used only for diagnostics.
    pub name: String,

    /// Generic (unspecialized) bytecode. Offsets into this buffer are what
    /// deopt targets ultimately resolve to.
    pub bytecode: Arc<[u8]>,

    /// Number of local registers the generic frame layout reserves.
    pub num_locals: u32,

    /// Number of lexical registers the generic frame layout reserves.
    pub num_lexicals: u32,

    /// Whether this frame is eligible for type-tuple specialization at all
    /// (some frames — e.g. those using introspection primitives the
    /// specializer can't reason about — are marked unspecializable).
    pub specializable: bool,

    /// Size of the generic bytecode, used by the admission filter against
    /// [`crate::config::PlanThresholds::max_bytecode_size`].
    pub bytecode_size: u32,

    /// Runtime statistics and the arg-guard tree, updated by the profiler
    /// and consulted by the planner.
    pub facts: RwLock<SpeshFacts>,
}

impl StaticFrame {
    /// Create a static frame with empty statistics and an empty arg-guard
    /// tree.
    pub fn new(
        id: StaticFrameId,
        name: impl Into<String>,
        bytecode: impl Into<Arc<[u8]>>,
        num_locals: u32,
        num_lexicals: u32,
        specializable: bool,
    ) -> Self {
        let bytecode = bytecode.into();
        let bytecode_size = bytecode.len() as u32;
        StaticFrame {
            id,
            name: name.into(),
            bytecode,
            num_locals,
            num_lexicals,
            specializable,
            bytecode_size,
            facts: RwLock::new(SpeshFacts::default()),
        }
    }
}

/// Statistics plus the arg-guard decision tree for one static frame.
#[derive(Debug, Default)]
pub struct SpeshFacts {
    /// Aggregated call/OSR-hit statistics, rebuilt by the profiler and
    /// consumed by [`crate::plan::PlanBuilder`].
    pub stats: SpeshStats,

    /// Decision tree mapping `(callsite, type tuple) -> candidate`.
    pub arg_guard: ArgGuardTree,
}

/// Maps `(callsite, argument type tuple) -> candidate` for one static frame.
///
/// The real engine's arg guard is a compact decision tree keyed on argument
/// types so that dispatch doesn't need a full equality scan; this port uses
/// a flat hash map, preserving the semantics the planner depends on (does an
/// entry already exist for this shape?) without re-deriving the dispatch
/// tree's internal layout, which belongs to the specializer producer this
/// crate does not implement.
#[derive(Debug, Default)]
pub struct ArgGuardTree {
    routes: FxHashMap<(Option<Callsite>, Option<TypeTuple>), CandidateId>,
}

impl ArgGuardTree {
    /// Create an empty arg-guard tree.
    pub fn new() -> Self {
        ArgGuardTree::default()
    }

    /// Whether a candidate is already routed for this (callsite, type
    /// tuple) shape. `cs = None` represents calls whose shape could not be
    /// attributed to a single callsite; `type_tuple = None` represents a
    /// `Certain` specialization, which is keyed purely on the callsite.
    pub fn exists(&self, cs: Option<&Callsite>, type_tuple: Option<&TypeTuple>) -> bool {
        self.routes
            .contains_key(&(cs.cloned(), type_tuple.cloned()))
    }

    /// Record a new route. Used by the (unimplemented-here) specialization
    /// producer once it has compiled a candidate for a planned entry.
    pub fn insert(&mut self, cs: Option<Callsite>, type_tuple: Option<TypeTuple>, candidate: CandidateId) {
        self.routes.insert((cs, type_tuple), candidate);
    }
}
