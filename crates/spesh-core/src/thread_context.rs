//! `ThreadContext` — this crate's explicit stand-in for the interpreter's
//! per-thread mutable state.
//!
//! The original keeps the interpreter's program counter, active bytecode
//! buffer, register base and compunit pointer as fields directly on
//! `MVMThreadContext`, a singleton the interpreter loop and the deoptimizer
//! both reach through a thread-local. This port has no globals: every
//! entrypoint in [`crate::deopt`] and [`crate::plan`] takes `&mut
//! ThreadContext` explicitly, the same way `raya_engine`'s interpreter core
//! threads its collaborators through constructor parameters rather than
//! reaching for ambient state.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::candidate::{Candidate, CandidateId};
use crate::frame::FrameHandle;
use crate::static_frame::{StaticFrame, StaticFrameId};

/// Registry of [`StaticFrame`]s, keyed by id.
///
/// Mirrors `raya_engine::vm::vm::class_registry::ClassRegistry`'s shape: a
/// flat map owned by the context, looked up by the stable id frames and
/// candidates carry instead of an owning reference.
#[derive(Debug, Default)]
pub struct StaticFrameRegistry {
    frames: FxHashMap<StaticFrameId, Arc<StaticFrame>>,
}

impl StaticFrameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        StaticFrameRegistry::default()
    }

    /// Register `frame`, keyed by its own id.
    pub fn insert(&mut self, frame: Arc<StaticFrame>) {
        self.frames.insert(frame.id, frame);
    }

    /// Look up a static frame by id.
    pub fn get(&self, id: StaticFrameId) -> Option<Arc<StaticFrame>> {
        self.frames.get(&id).cloned()
    }
}

/// Registry of [`Candidate`]s, keyed by id.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    candidates: FxHashMap<CandidateId, Arc<Candidate>>,
}

impl CandidateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        CandidateRegistry::default()
    }

    /// Register `candidate`, keyed by its own id.
    pub fn insert(&mut self, candidate: Arc<Candidate>) {
        self.candidates.insert(candidate.id, candidate);
    }

    /// Look up a candidate by id.
    pub fn get(&self, id: CandidateId) -> Option<Arc<Candidate>> {
        self.candidates.get(&id).cloned()
    }
}

/// The interpreter-visible slots the deoptimizer retargets, plus the
/// registries needed to resolve the opaque ids frames and candidates carry.
///
/// There is deliberately no `static`/`thread_local!` anywhere in this crate;
/// every piece of mutable state the planner or deoptimizer needs flows
/// through a `&mut ThreadContext`.
#[derive(Debug)]
pub struct ThreadContext {
    /// The frame currently executing, and the starting point for every
    /// ancestor walk `deopt_all` performs.
    pub cur_frame: Option<FrameHandle>,

    /// Depth of `cur_frame` from the entry frame, incremented on call and
    /// decremented on return; used only for diagnostics in this port.
    pub current_frame_nr: u64,

    /// Program counter: an offset into `interp_bytecode_start`.
    pub interp_cur_op: u32,

    /// The bytecode buffer `interp_cur_op` is an offset into — generic or
    /// specialized, depending on whether `cur_frame` currently has a
    /// `spesh_cand`.
    pub interp_bytecode_start: Arc<[u8]>,

    /// Cached pointer to the active register file, retargeted in lockstep
    /// with `cur_frame` whenever deopt installs a new frame. This port gives
    /// every frame its own `work`/`env` arrays rather than windowing a
    /// shared register stack, so this field is redundant with `cur_frame`;
    /// it is kept so every slot the original's interpreter loop retargets at
    /// deopt has a direct counterpart here.
    pub interp_reg_base: Option<FrameHandle>,

    /// The compilation unit `cur_frame` belongs to, approximated here as
    /// the owning static frame's id (the real compunit pointer carries
    /// serialization/string-heap state this crate has no use for).
    pub interp_cu: Option<StaticFrameId>,

    /// Static frames reachable from this thread, looked up by id.
    pub static_frames: StaticFrameRegistry,

    /// Specialized candidates reachable from this thread, looked up by id.
    pub candidates: CandidateRegistry,
}

impl ThreadContext {
    /// Create a context with no active frame and empty registries.
    pub fn new() -> Self {
        ThreadContext {
            cur_frame: None,
            current_frame_nr: 0,
            interp_cur_op: 0,
            interp_bytecode_start: Arc::from(Vec::new().into_boxed_slice()),
            interp_reg_base: None,
            interp_cu: None,
            static_frames: StaticFrameRegistry::new(),
            candidates: CandidateRegistry::new(),
        }
    }

    /// Retarget the interpreter onto `frame`, executing bytecode starting at
    /// `bytecode`. Called once per level reconstructed during uninlining, and
    /// once more at the end of `deopt_all` to resume in the outermost frame.
    pub fn retarget(&mut self, frame: FrameHandle, bytecode: Arc<[u8]>, op: u32, cu: Option<StaticFrameId>) {
        self.interp_reg_base = Some(Arc::clone(&frame));
        self.cur_frame = Some(frame);
        self.interp_bytecode_start = bytecode;
        self.interp_cur_op = op;
        self.interp_cu = cu;
    }
}

impl Default for ThreadContext {
    fn default() -> Self {
        ThreadContext::new()
    }
}
