//! Garbage collector contract (§6): root-marking and heap-snapshot
//! description, mirroring `raya_engine::vm::gc::roots::RootSet` and the
//! engine's cached-label heap-snapshot helpers. Mark/sweep/copy itself is
//! not implemented here.

use crate::plan::stats::TypeHandle;
use crate::static_frame::StaticFrameId;

/// A worklist the GC walks to find reachable objects.
///
/// [`crate::plan::gc_integration::plan_gc_mark`] pushes every
/// GC-managed reference the plan holds onto this worklist, the same way
/// `vm::gc::roots::RootSet` collects stack/global roots for the collector
/// to trace from. Static frames and type objects are distinct identity
/// spaces in the object model this crate treats as opaque, so they get
/// distinct methods rather than being coerced into one id type.
pub trait GcWorklist {
    /// Register a type object `slot` as a root to be traced.
    fn add(&mut self, slot: TypeHandle);

    /// Register a static frame as a root to be traced.
    fn add_static_frame(&mut self, sf: StaticFrameId);
}

/// A worklist that simply records what was pushed, useful for tests and
/// for hosts without a real collector wired up yet.
#[derive(Debug, Default)]
pub struct VecWorklist {
    /// Every type handle pushed so far, in push order.
    pub pushed: Vec<TypeHandle>,
    /// Every static frame pushed so far, in push order.
    pub pushed_static_frames: Vec<StaticFrameId>,
}

impl GcWorklist for VecWorklist {
    fn add(&mut self, slot: TypeHandle) {
        self.pushed.push(slot);
    }

    fn add_static_frame(&mut self, sf: StaticFrameId) {
        self.pushed_static_frames.push(sf);
    }
}

/// Per-label de-duplication cache for heap snapshotting, mirroring the
/// engine's `MVM_profile_heap_add_collectable_rel_const_cstr_cached`
/// pattern: a label string is registered with the snapshot writer once,
/// and subsequent uses of the same label reuse the cached id instead of
/// re-interning it.
#[derive(Debug, Default)]
pub struct HeapSnapshotCache {
    cached_labels: rustc_hash::FxHashMap<&'static str, u64>,
    next_id: u64,
}

impl HeapSnapshotCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `label` to a cached id, interning it on first use.
    pub fn label_id(&mut self, label: &'static str) -> u64 {
        if let Some(id) = self.cached_labels.get(label) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.cached_labels.insert(label, id);
        id
    }
}

/// Heap-snapshot writer contract: records a relationship from the plan to
/// one of its referenced collectables, under a cached label.
pub trait HeapSnapshotWriter {
    /// Record that the plan holds a reference to `handle`, described by
    /// `label` (e.g. `"argument type"`).
    fn add_collectable(&mut self, handle: TypeHandle, label: &'static str, cache: &mut HeapSnapshotCache);

    /// Record that the plan holds a reference to static frame `sf`,
    /// described by `label` (e.g. `"staticframe"`).
    fn add_static_frame(&mut self, sf: StaticFrameId, label: &'static str, cache: &mut HeapSnapshotCache);
}
