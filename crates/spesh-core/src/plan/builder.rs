//! `PlanBuilder` — turns profile statistics into an ordered specialization
//! plan (§4.4).

use std::sync::Arc;

use crate::config::PlanThresholds;
use crate::error::PlanError;
use crate::plan::planned::{Planned, PlannedKind};
use crate::plan::stats::{StatsByCallsite, StatsByType};
use crate::static_frame::StaticFrame;

/// The result of one [`PlanBuilder::plan`] call: the ordered list of
/// specialization requests, plus how many of each kind were issued.
#[derive(Debug, Default)]
pub struct Plan {
    /// Every admitted specialization request, sorted in descending
    /// `max_depth` order by [`sort_plan`].
    pub planned: Vec<Planned>,
    /// Number of [`PlannedKind::Certain`] entries issued.
    pub certain: u64,
    /// Number of [`PlannedKind::ObservedTypes`] entries issued.
    pub observed: u64,
    /// Number of entries (of either kind) issued on account of OSR hits
    /// alone, i.e. that would not have qualified from ordinary call hits.
    pub osr: u64,
}

/// Builds a [`Plan`] from a batch of static frames whose profile statistics
/// changed since the last planning pass.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    thresholds: PlanThresholds,
}

impl PlanBuilder {
    /// Create a builder with the given thresholds.
    pub fn new(thresholds: PlanThresholds) -> Self {
        PlanBuilder { thresholds }
    }

    /// Form a specialization plan from every frame in `updated_static_frames`.
    ///
    /// Each frame's own [`crate::static_frame::SpeshFacts`] (statistics and
    /// arg-guard tree) is read under its lock for the duration of planning
    /// that one frame; callers that want a fully consistent snapshot across
    /// frames should ensure nothing else is mutating these frames'
    /// statistics concurrently.
    pub fn plan(&self, updated_static_frames: &[Arc<StaticFrame>]) -> Result<Plan, PlanError> {
        let mut plan = Plan::default();
        for sf in updated_static_frames {
            self.plan_for_sf(&mut plan, sf)?;
        }
        twiddle_stack_depths(&mut plan.planned);
        sort_plan(&mut plan.planned);
        Ok(plan)
    }

    fn plan_for_sf(&self, plan: &mut Plan, sf: &Arc<StaticFrame>) -> Result<(), PlanError> {
        let threshold = self.thresholds.threshold(sf);
        let facts = sf.facts.read();
        if facts.stats.hits >= threshold || facts.stats.osr_hits >= self.thresholds.min_osr_sf {
            for by_cs in &facts.stats.by_callsite {
                if by_cs.hits >= threshold || by_cs.osr_hits >= self.thresholds.min_osr_cs {
                    self.plan_for_cs(plan, sf, &facts.arg_guard, by_cs, threshold)?;
                }
            }
        }
        Ok(())
    }

    fn plan_for_cs(
        &self,
        plan: &mut Plan,
        sf: &Arc<StaticFrame>,
        arg_guard: &crate::static_frame::ArgGuardTree,
        by_cs: &StatsByCallsite,
        threshold: u32,
    ) -> Result<(), PlanError> {
        let mut unaccounted_hits = by_cs.hits;
        let mut unaccounted_osr_hits = by_cs.osr_hits;

        if sf.specializable {
            for by_type in &by_cs.by_type {
                if let Some(cs) = &by_cs.cs {
                    let expected = cs.flag_count();
                    let actual = by_type.arg_types.len();
                    if expected != actual {
                        return Err(PlanError::TypeTupleLengthMismatch { expected, actual });
                    }
                }
                let hit_percent = if by_cs.hits != 0 {
                    100 * by_type.hits / by_cs.hits
                } else {
                    0
                };
                let osr_hit_percent = if by_cs.osr_hits != 0 {
                    100 * by_type.osr_hits / by_cs.osr_hits
                } else {
                    0
                };
                if by_cs.cs.is_some()
                    && (hit_percent >= self.thresholds.tt_obs_percent
                        || osr_hit_percent >= self.thresholds.tt_obs_percent_osr)
                {
                    let admitted = add_planned(
                        plan,
                        arg_guard,
                        PlannedKind::ObservedTypes,
                        sf.id,
                        by_cs,
                        Some(by_type.arg_types.clone()),
                        vec![by_type.clone()],
                        self.thresholds.max_bytecode_size,
                        sf.bytecode_size,
                    );
                    if admitted {
                        plan.observed += 1;
                        if hit_percent < self.thresholds.tt_obs_percent {
                            plan.osr += 1;
                        }
                        unaccounted_hits = unaccounted_hits.saturating_sub(by_type.hits);
                        unaccounted_osr_hits = unaccounted_osr_hits.saturating_sub(by_type.osr_hits);
                    }
                }
            }
        }

        if (unaccounted_hits != 0 && unaccounted_hits >= threshold)
            || unaccounted_osr_hits >= self.thresholds.min_osr_cs
        {
            let admitted = add_planned(
                plan,
                arg_guard,
                PlannedKind::Certain,
                sf.id,
                by_cs,
                None,
                Vec::new(),
                self.thresholds.max_bytecode_size,
                sf.bytecode_size,
            );
            if admitted {
                plan.certain += 1;
                if unaccounted_hits == 0 || unaccounted_hits < threshold {
                    plan.osr += 1;
                }
            }
        }
        Ok(())
    }
}

/// Admission filter (§7): reject the candidate evidence if the frame's
/// bytecode is too large, or an arg-guard already routes this (callsite,
/// type-tuple) shape to a candidate. Returns whether the entry was admitted.
#[allow(clippy::too_many_arguments)]
fn add_planned(
    plan: &mut Plan,
    arg_guard: &crate::static_frame::ArgGuardTree,
    kind: PlannedKind,
    sf: crate::static_frame::StaticFrameId,
    cs_stats: &StatsByCallsite,
    type_tuple: Option<crate::plan::stats::TypeTuple>,
    type_stats: Vec<StatsByType>,
    max_bytecode_size: u32,
    bytecode_size: u32,
) -> bool {
    if bytecode_size > max_bytecode_size
        || arg_guard.exists(cs_stats.cs.as_ref(), type_tuple.as_ref())
    {
        return false;
    }

    let max_depth = if let Some(first) = type_stats.first() {
        type_stats
            .iter()
            .skip(1)
            .fold(first.max_depth, |acc, ts| acc.max(ts.max_depth))
    } else {
        cs_stats.max_depth
    };

    plan.planned.push(Planned {
        kind,
        sf,
        cs: cs_stats.cs.clone(),
        type_tuple,
        type_stats,
        max_depth,
    });
    true
}

/// Call-depth reconciliation (§4.4): boosts a planned callee's `max_depth`
/// past its planned caller's whenever the stack-depth heuristic alone would
/// have ranked the callee at or above the caller.
pub fn twiddle_stack_depths(planned: &mut [Planned]) {
    let n = planned.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let depth = planned[i].max_depth;
        let invoked: Vec<crate::static_frame::StaticFrameId> = planned[i]
            .type_stats
            .iter()
            .flat_map(|sbt| sbt.by_offset.iter())
            .flat_map(|sbo| sbo.invokes.iter())
            .map(|rec| rec.sf)
            .collect();
        for invoked_sf in invoked {
            for m in 0..n {
                if planned[m].sf == invoked_sf {
                    planned[m].max_depth = depth + 1;
                }
            }
        }
    }
}

/// Recursive in-place Hoare-partition quicksort in descending `max_depth`
/// order. Preserved structurally (same pivot and partition shape as the
/// original) rather than replaced with `slice::sort_unstable_by`, since the
/// degenerate-case tests in this crate's test suite exercise this exact
/// algorithm's termination behavior at small, equal-keyed inputs.
pub fn sort_plan(planned: &mut [Planned]) {
    let n = planned.len();
    if n < 2 {
        return;
    }
    let pivot_depth = planned[n / 2].max_depth;
    let mut i: isize = 0;
    let mut j: isize = n as isize - 1;
    loop {
        while planned[i as usize].max_depth > pivot_depth {
            i += 1;
        }
        while planned[j as usize].max_depth < pivot_depth {
            j -= 1;
        }
        if i >= j {
            break;
        }
        planned.swap(i as usize, j as usize);
        i += 1;
        j -= 1;
    }
    let split = i as usize;
    let (left, right) = planned.split_at_mut(split);
    sort_plan(left);
    sort_plan(right);
}
