//! `Frame` — opaque runtime activation record.
//!
//! The interpreter's frame allocator, calling convention, and exception
//! handling all live outside this crate; `Frame` here models only the
//! fields the deoptimizer touches. Frames are `Arc<RwLock<Frame>>` rather
//! than raw GC pointers: the original's "no heap object may point at a
//! stack frame" invariant is enforced by the real engine's copying/moving
//! collector, which this crate does not implement. [`force_to_heap`]
//! is modeled as a no-op that returns its input unchanged, since every
//! frame in this port already lives behind an `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::candidate::{Candidate, CandidateId};
use crate::static_frame::StaticFrameId;

/// Shared, mutable handle to one frame. Cloning a `FrameHandle` shares the
/// same underlying frame (it is a reference-counted pointer, not a copy).
pub type FrameHandle = Arc<RwLock<Frame>>;

/// The type of value a call/inline returns, and therefore how
/// `return_value` should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// No return value.
    Void,
    /// An object reference.
    Obj,
    /// A boxed/native integer.
    Int,
    /// A floating point number.
    Num,
    /// A string.
    Str,
}

/// One register slot's raw contents.
///
/// The interpreter's value representation (tagged pointers, NaN-boxing,
/// whatever the object model uses) is out of scope here; this crate only
/// ever copies contiguous ranges of registers between frames, so an opaque
/// fixed-width slot is all it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Register(pub u64);

/// Dynamic-lexical-lookup cache, invalidated whenever uninlining changes
/// which frame a cached lexical actually lives in.
#[derive(Debug, Clone, Default)]
pub struct DynlexCache {
    /// Cached lexical name, if any lookup has been cached.
    pub name: Option<Arc<str>>,
    /// Register index the cached name was found at.
    pub reg: Option<u16>,
}

impl DynlexCache {
    /// Clear the cache. Uninlining can make a cached lexical lookup point
    /// at a register in a frame that no longer represents that scope.
    pub fn clear(&mut self) {
        self.name = None;
        self.reg = None;
    }
}

/// Per-frame extra state, allocated lazily by the interpreter in the
/// original; modeled here as a plain field since this crate doesn't need to
/// reproduce the lazy-allocation optimization.
#[derive(Debug, Clone, Default)]
pub struct FrameExtra {
    /// Dynamic-lexical-lookup cache.
    pub dynlex_cache: DynlexCache,
}

/// Which named arguments were consumed, tracked as a bit field indexed by
/// argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NamedUsed {
    /// One bit per named argument position.
    pub bit_field: u64,
}

/// One runtime activation record.
#[derive(Debug)]
pub struct Frame {
    /// The static frame this activation is executing.
    pub static_frame: StaticFrameId,

    /// Local register file (`work` in the original).
    pub work: Vec<Register>,

    /// Lexical register file (`env` in the original) — same element
    /// type as `work`, since both are opaque register slots to this crate.
    pub env: Vec<Register>,

    /// Owning reference to the caller. `None` for the entry frame.
    pub caller: Option<FrameHandle>,

    /// Address (an offset into *some* bytecode buffer — generic or
    /// specialized depending on `spesh_cand`) execution resumes at when
    /// this frame returns.
    pub return_address: Option<u32>,

    /// Type of value this frame will return.
    pub return_type: ReturnType,

    /// Register index `return_value` should be written into by the callee,
    /// interpreted relative to `work`. `None` when `return_type` is `Void`.
    pub return_value: Option<u16>,

    /// The specialized candidate this frame is currently executing, if any.
    pub spesh_cand: Option<CandidateId>,

    /// Specialization constant-pool slots active for this frame, cleared
    /// alongside `spesh_cand` on deopt.
    pub effective_spesh_slots: bool,

    /// JIT resume label, cleared when a JIT-bearing ancestor is deopted in
    /// `deopt_all`'s known-wart path.
    pub jit_entry_label: Option<u32>,

    /// Which named arguments were marked used.
    pub named_used: NamedUsed,

    /// Lazily-populated extra state (dynlex cache).
    pub extra: Option<FrameExtra>,
}

impl Frame {
    /// Create a frame for `static_frame`, with `num_locals`/`num_lexicals`
    /// null-initialized registers and no specialization.
    pub fn new(static_frame: StaticFrameId, num_locals: usize, num_lexicals: usize) -> Self {
        Frame {
            static_frame,
            work: vec![Default::default(); num_locals],
            env: vec![Default::default(); num_lexicals],
            caller: None,
            return_address: None,
            return_type: ReturnType::Void,
            return_value: None,
            spesh_cand: None,
            effective_spesh_slots: false,
            jit_entry_label: None,
            named_used: NamedUsed::default(),
            extra: None,
        }
    }

    /// Clear the dynlex cache, if this frame has allocated extra state.
    ///
    /// Uninlining can invalidate what the dynlex cache points to, so every
    /// deopt path clears it first.
    pub fn clear_dynlex_cache(&mut self) {
        if let Some(extra) = self.extra.as_mut() {
            extra.dynlex_cache.clear();
        }
    }

    /// Clear specialization state: `spesh_cand` and
    /// `effective_spesh_slots`. Called at the end of every successful
    /// deopt.
    pub fn clear_specialization(&mut self) {
        self.spesh_cand = None;
        self.effective_spesh_slots = false;
    }
}

/// Frame allocator contract (§6): creates heap frames for deopt, and
/// migrates stack-resident frames (and their ancestors) to the heap before
/// any reconstruction that would otherwise let a heap object point at
/// stack memory.
///
/// This port represents every frame as an `Arc<RwLock<Frame>>` from
/// creation, so `force_to_heap` has nothing to migrate; it exists purely to
/// keep the call sites in [`crate::deopt`] symmetrical with the original and
/// to document where the real engine would need to act.
pub trait FrameAllocator {
    /// Allocate a fresh heap frame for `static_frame`, to host one level of
    /// uninlined code during reconstruction.
    fn create_for_deopt(&self, static_frame: StaticFrameId, candidate: &Candidate) -> FrameHandle;

    /// Ensure `frame` and every frame reachable via `caller` lives on the
    /// heap, returning the (possibly unchanged) handle to `frame`.
    fn force_to_heap(&self, frame: FrameHandle) -> FrameHandle {
        frame
    }
}
