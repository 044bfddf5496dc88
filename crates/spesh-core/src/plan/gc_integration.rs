//! Exposes the plan's object references to the garbage collector (§4.4).

use crate::gc::{GcWorklist, HeapSnapshotCache, HeapSnapshotWriter};
use crate::plan::builder::Plan;

/// Mark every GC-managed reference the plan holds: each entry's static
/// frame, plus — for entries carrying a type tuple — the observed type and
/// decont type of every `OBJ`-flagged argument position.
pub fn plan_gc_mark(plan: &Plan, worklist: &mut impl GcWorklist) {
    for p in &plan.planned {
        worklist.add_static_frame(p.sf);
        if let (Some(type_tuple), Some(cs)) = (&p.type_tuple, &p.cs) {
            for (j, arg) in type_tuple.0.iter().enumerate() {
                if cs.is_obj_arg(j) {
                    if let Some(type_id) = arg.type_id {
                        worklist.add(type_id);
                    }
                    if let Some(decont_type_id) = arg.decont_type_id {
                        worklist.add(decont_type_id);
                    }
                }
            }
        }
    }
}

/// Describe the same references as [`plan_gc_mark`], but for heap
/// snapshotting. Three independent caches (one per label) mirror the
/// original's `cache_1`/`cache_2`/`cache_3` so that a repeated label across
/// entries reuses its cached id rather than being re-interned.
pub fn plan_gc_describe(plan: &Plan, writer: &mut impl HeapSnapshotWriter) {
    let mut cache_static_frame = HeapSnapshotCache::new();
    let mut cache_arg_type = HeapSnapshotCache::new();
    let mut cache_arg_decont_type = HeapSnapshotCache::new();
    for p in &plan.planned {
        writer.add_static_frame(p.sf, "staticframe", &mut cache_static_frame);
        if let (Some(type_tuple), Some(cs)) = (&p.type_tuple, &p.cs) {
            for (j, arg) in type_tuple.0.iter().enumerate() {
                if cs.is_obj_arg(j) {
                    if let Some(type_id) = arg.type_id {
                        writer.add_collectable(type_id, "argument type", &mut cache_arg_type);
                    }
                    if let Some(decont_type_id) = arg.decont_type_id {
                        writer.add_collectable(decont_type_id, "argument decont type", &mut cache_arg_decont_type);
                    }
                }
            }
        }
    }
}
