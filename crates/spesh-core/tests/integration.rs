//! End-to-end coverage of the six scenarios named in this crate's test plan:
//! single-level and two-level uninlining, `deopt_all`'s documented
//! JIT-ancestor wart, planner admission, depth reconciliation, and
//! cross-call duplicate rejection.

use std::sync::Arc;

use parking_lot::RwLock;

use spesh_core::callsite::{Callsite, ARG_FLAG_OBJ};
use spesh_core::candidate::{Candidate, CandidateId};
use spesh_core::deopt_table::{DeoptPoint, DeoptTable};
use spesh_core::frame::{Frame, FrameAllocator, FrameHandle, ReturnType};
use spesh_core::inline_table::{InlineDescriptor, InlineTable};
use spesh_core::jit::{JitBackend, JitCodeHandle, NoJitBackend};
use spesh_core::plan::stats::{
    InvokeRecord, SpeshStats, StatsByCallsite, StatsByOffset, StatsByType, StatsType, TypeTuple,
};
use spesh_core::profiler::NoopProfiler;
use spesh_core::static_frame::{SpeshFacts, StaticFrame, StaticFrameId};
use spesh_core::{DeoptError, Deoptimizer, PlanBuilder, PlanThresholds, PlannedKind, ThreadContext};

struct HeapAllocator;

impl FrameAllocator for HeapAllocator {
    fn create_for_deopt(&self, static_frame: StaticFrameId, _candidate: &Candidate) -> FrameHandle {
        Arc::new(RwLock::new(Frame::new(static_frame, 8, 8)))
    }
}

fn deoptimizer() -> Deoptimizer<HeapAllocator, NoJitBackend, NoopProfiler> {
    Deoptimizer::new(HeapAllocator, NoJitBackend, NoopProfiler)
}

#[test]
fn single_level_deopt_one_no_inlines_retargets_into_generic_bytecode() {
    let mut tc = ThreadContext::new();
    let generic_bytecode = vec![0u8; 64];
    let sf = Arc::new(StaticFrame::new(StaticFrameId(1), "main", generic_bytecode.clone(), 4, 0, true));
    tc.static_frames.insert(Arc::clone(&sf));

    let cand = Arc::new(Candidate {
        id: CandidateId(1),
        static_frame: StaticFrameId(1),
        bytecode: Arc::from(vec![0u8; 300].into_boxed_slice()),
        deopts: DeoptTable::new(vec![DeoptPoint { generic_offset: 12, specialized_offset: 200 }]),
        inlines: None,
        jit_code: None,
        deopt_pea_points: Vec::new(),
        deopt_named_used_bit_field: None,
    });
    tc.candidates.insert(Arc::clone(&cand));

    let f = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 4, 0)));
    f.write().spesh_cand = Some(CandidateId(1));
    tc.cur_frame = Some(Arc::clone(&f));
    tc.interp_cur_op = 200;

    deoptimizer().deopt_one(&mut tc, 12).expect("deopt_one should succeed");

    assert!(f.read().spesh_cand.is_none());
    assert_eq!(tc.interp_cur_op, 12);
    assert!(Arc::ptr_eq(tc.cur_frame.as_ref().unwrap(), &f));
    assert!(Arc::ptr_eq(&tc.interp_bytecode_start, &sf.bytecode));
}

#[test]
fn two_level_uninline_on_deopt_one_reconstructs_a_chain_of_frames() {
    let mut tc = ThreadContext::new();
    let outer_sf = StaticFrame::new(StaticFrameId(1), "outer", vec![0u8; 100], 6, 0, true);
    let inner_sf = StaticFrame::new(StaticFrameId(2), "inner", vec![0u8; 60], 2, 0, true);
    let innermost_sf = StaticFrame::new(StaticFrameId(3), "innermost", vec![0u8; 40], 2, 0, true);
    tc.static_frames.insert(Arc::new(outer_sf));
    tc.static_frames.insert(Arc::new(inner_sf));
    tc.static_frames.insert(Arc::new(innermost_sf));

    let desc_inner = InlineDescriptor {
        start: 50,
        end: 90,
        sf: StaticFrameId(2),
        code_ref_reg: 0,
        locals_start: 1,
        lexicals_start: 0,
        res_reg: 5,
        res_type: ReturnType::Int,
        return_deopt_idx: 0,
        deopt_named_used_bit_field: None,
    };
    let desc_innermost = InlineDescriptor {
        start: 55,
        end: 70,
        sf: StaticFrameId(3),
        code_ref_reg: 2,
        locals_start: 3,
        lexicals_start: 0,
        res_reg: 7,
        res_type: ReturnType::Num,
        return_deopt_idx: 1,
        deopt_named_used_bit_field: None,
    };
    let cand = Arc::new(Candidate {
        id: CandidateId(1),
        static_frame: StaticFrameId(1),
        bytecode: Arc::from(vec![0u8; 300].into_boxed_slice()),
        deopts: DeoptTable::new(vec![
            DeoptPoint { generic_offset: 10, specialized_offset: 200 },
            DeoptPoint { generic_offset: 20, specialized_offset: 210 },
        ]),
        inlines: Some(InlineTable::new(vec![desc_inner, desc_innermost])),
        jit_code: None,
        deopt_pea_points: Vec::new(),
        deopt_named_used_bit_field: None,
    });
    tc.candidates.insert(Arc::clone(&cand));

    let outer = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 6, 0)));
    outer.write().spesh_cand = Some(CandidateId(1));
    tc.cur_frame = Some(Arc::clone(&outer));
    tc.interp_cur_op = 60;

    deoptimizer().deopt_one(&mut tc, 999).expect("deopt_one with inlines should succeed");

    // The interpreter resumes in the frame for the first-matched (stored
    // order) descriptor, `desc_inner`; it chains onto the frame for the
    // next-matched descriptor, `desc_innermost`, which in turn chains onto
    // `outer` — caller order mirrors processing order, not nesting depth.
    let active_uf = Arc::clone(tc.cur_frame.as_ref().unwrap());
    assert!(!Arc::ptr_eq(&active_uf, &outer));
    let chained_uf = Arc::clone(active_uf.read().caller.as_ref().unwrap());
    assert!(Arc::ptr_eq(chained_uf.read().caller.as_ref().unwrap(), &outer));

    assert!(outer.read().spesh_cand.is_none());
    let outer_guard = outer.read();
    assert_eq!(outer_guard.return_address, Some(20));
    assert_eq!(outer_guard.return_type, ReturnType::Num);
}

struct ResolvesDeoptIdxZero;

impl JitBackend for ResolvesDeoptIdxZero {
    fn get_active_deopt_idx(&self, _jit_code: &JitCodeHandle, _frame: &FrameHandle) -> Option<u32> {
        Some(0)
    }
}

#[test]
fn deopt_all_leaves_jit_bearing_ancestor_as_the_documented_stopping_point() {
    let mut tc = ThreadContext::new();
    let sf = Arc::new(StaticFrame::new(StaticFrameId(1), "f", vec![0u8; 80], 0, 0, true));
    tc.static_frames.insert(Arc::clone(&sf));

    let cand = Arc::new(Candidate {
        id: CandidateId(1),
        static_frame: StaticFrameId(1),
        bytecode: Arc::from(vec![0u8; 200].into_boxed_slice()),
        deopts: DeoptTable::new(vec![DeoptPoint { generic_offset: 5, specialized_offset: 100 }]),
        inlines: None,
        jit_code: Some(JitCodeHandle { num_deopts: 1 }),
        deopt_pea_points: Vec::new(),
        deopt_named_used_bit_field: None,
    });
    tc.candidates.insert(Arc::clone(&cand));

    let great_grandparent = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 0, 0)));
    great_grandparent.write().spesh_cand = Some(CandidateId(1));

    let grandparent = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 0, 0)));
    grandparent.write().spesh_cand = Some(CandidateId(1));
    grandparent.write().caller = Some(Arc::clone(&great_grandparent));

    let parent = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 0, 0)));
    parent.write().spesh_cand = Some(CandidateId(1));
    parent.write().return_address = Some(100);
    parent.write().caller = Some(Arc::clone(&grandparent));

    let current = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 0, 0)));
    current.write().caller = Some(Arc::clone(&parent));
    tc.cur_frame = Some(Arc::clone(&current));

    let deopt = Deoptimizer::new(HeapAllocator, ResolvesDeoptIdxZero, NoopProfiler);
    deopt.deopt_all(&mut tc).expect("deopt_all should succeed despite the JIT wart");

    assert!(parent.read().spesh_cand.is_none());
    assert_eq!(parent.read().return_address, Some(5));
    // The known wart: the walk stops as soon as one JIT-bearing ancestor is
    // cleared, so frames further up the chain are left untouched.
    assert!(grandparent.read().spesh_cand.is_some());
    assert!(great_grandparent.read().spesh_cand.is_some());
}

fn specializable_frame_with_stats(id: u64, stats: SpeshStats) -> Arc<StaticFrame> {
    let sf = StaticFrame::new(StaticFrameId(id), format!("sf{id}"), vec![0u8; 20], 1, 0, true);
    *sf.facts.write() = SpeshFacts { stats, arg_guard: Default::default() };
    Arc::new(sf)
}

#[test]
fn planner_admits_observed_types_without_a_certain_specialization() {
    let cs = Callsite::new(vec![ARG_FLAG_OBJ]);
    let by_type = StatsByType {
        arg_types: TypeTuple::new(vec![StatsType::default()]),
        hits: 95,
        osr_hits: 0,
        max_depth: 1,
        by_offset: Vec::new(),
    };
    let by_cs = StatsByCallsite { cs: Some(cs), hits: 100, osr_hits: 0, max_depth: 1, by_type: vec![by_type] };
    let stats = SpeshStats { hits: 100, osr_hits: 0, by_callsite: vec![by_cs] };
    let sf = specializable_frame_with_stats(1, stats);

    let builder = PlanBuilder::new(PlanThresholds::new());
    let plan = builder.plan(&[sf]).unwrap();

    assert_eq!(plan.observed, 1);
    assert_eq!(plan.certain, 0);
    assert_eq!(plan.planned.len(), 1);
    assert_eq!(plan.planned[0].kind, PlannedKind::ObservedTypes);
}

#[test]
fn planner_depth_reconciliation_boosts_callees_then_sorts_descending() {
    let caller_sf = StaticFrameId(1);
    let callee_sf = StaticFrameId(2);

    let by_type = StatsByType {
        arg_types: TypeTuple::default(),
        hits: 100,
        osr_hits: 0,
        max_depth: 5,
        by_offset: vec![StatsByOffset { offset: 12, invokes: vec![InvokeRecord { sf: callee_sf }] }],
    };
    let caller_cs = StatsByCallsite {
        cs: Some(Callsite::new(vec![])),
        hits: 100,
        osr_hits: 0,
        max_depth: 5,
        by_type: vec![by_type],
    };
    let caller_stats = SpeshStats { hits: 100, osr_hits: 0, by_callsite: vec![caller_cs] };
    let caller = specializable_frame_with_stats(1, caller_stats);

    let callee_cs = StatsByCallsite {
        cs: Some(Callsite::new(vec![])),
        hits: 100,
        osr_hits: 0,
        max_depth: 1,
        by_type: Vec::new(),
    };
    let callee_stats = SpeshStats { hits: 100, osr_hits: 0, by_callsite: vec![callee_cs] };
    let callee = specializable_frame_with_stats(2, callee_stats);

    let builder = PlanBuilder::new(PlanThresholds::new());
    let plan = builder.plan(&[caller, callee]).unwrap();

    assert_eq!(plan.planned.len(), 2);
    // Sorted descending by max_depth: the reconciled callee (boosted to
    // depth 6) now sorts before its caller (depth 5), even though the
    // caller was planned first.
    assert_eq!(plan.planned[0].sf, callee_sf);
    assert_eq!(plan.planned[0].max_depth, 6);
    assert_eq!(plan.planned[1].sf, caller_sf);
    assert_eq!(plan.planned[1].max_depth, 5);
}

#[test]
fn duplicate_rejection_holds_across_two_plan_for_sf_calls() {
    let cs = Callsite::new(vec![]);
    let by_cs = StatsByCallsite { cs: Some(cs.clone()), hits: 100, osr_hits: 0, max_depth: 1, by_type: Vec::new() };
    let stats = SpeshStats { hits: 100, osr_hits: 0, by_callsite: vec![by_cs.clone()] };
    let sf = specializable_frame_with_stats(1, stats.clone());

    let builder = PlanBuilder::new(PlanThresholds::new());

    let first_plan = builder.plan(&[Arc::clone(&sf)]).unwrap();
    assert_eq!(first_plan.certain, 1);

    // Simulate the specializer having compiled the first plan's candidate
    // and registered it in the arg-guard tree before the next planning pass.
    sf.facts.write().arg_guard.insert(Some(cs), None, CandidateId(1));

    let second_plan = builder.plan(&[sf]).unwrap();
    assert!(second_plan.planned.is_empty());
    assert_eq!(second_plan.certain, 0);
}

#[test]
fn deopt_one_on_unspecialized_frame_is_reported_not_a_crash() {
    let mut tc = ThreadContext::new();
    let f = Arc::new(RwLock::new(Frame::new(StaticFrameId(1), 0, 0)));
    tc.cur_frame = Some(f);

    let err = deoptimizer().deopt_one(&mut tc, 0).unwrap_err();
    assert!(matches!(err, DeoptError::NotSpecialized));
}
