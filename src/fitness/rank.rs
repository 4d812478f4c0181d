//! Wasted-effort fitness over fault instances
//!
//! The cost of a formula on one instance is the best (minimum) 1-based rank
//! of any faulty element after sorting all elements by descending
//! suspiciousness. Ties keep first-seen order. Elements whose score comes out
//! non-finite rank last, and an instance whose faulty elements are absent
//! from the mapping costs `n + 1`.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use crate::error::{EvoResult, EvolutionError};
use crate::formula::Formula;
use crate::spectrum::FaultInstance;

use super::Fitness;

#[derive(Debug, Clone, Copy)]
struct SampleConfig {
    size: usize,
    seed: u64,
}

/// Mean wasted-effort fitness over a set of fault instances. Lower is better.
#[derive(Debug, Clone)]
pub struct RankFitness {
    instances: Vec<FaultInstance>,
    top1_penalty: Option<f64>,
    sample: Option<SampleConfig>,
    active: Vec<usize>,
}

impl RankFitness {
    /// Builds the fitness function over a non-empty instance set.
    pub fn new(instances: Vec<FaultInstance>) -> EvoResult<Self> {
        if instances.is_empty() {
            return Err(EvolutionError::EmptyInstanceSet);
        }
        let active = (0..instances.len()).collect();
        Ok(Self {
            instances,
            top1_penalty: None,
            sample: None,
            active,
        })
    }

    /// Adds a flat penalty to every instance whose best faulty rank is not 1,
    /// sharpening selection pressure toward top-1 localization.
    pub fn with_top1_penalty(mut self, penalty: f64) -> Self {
        self.top1_penalty = Some(penalty);
        self
    }

    /// Evaluates each generation against a random sample of `size` instances
    /// instead of the full set. The sample is re-drawn per generation from a
    /// seed derived from `seed` and the generation index, so runs remain
    /// reproducible and all individuals of one generation see the same data.
    pub fn with_sampling(mut self, size: usize, seed: u64) -> Self {
        let size = size.clamp(1, self.instances.len());
        self.sample = Some(SampleConfig { size, seed });
        self
    }

    pub fn instances(&self) -> &[FaultInstance] {
        &self.instances
    }

    /// Best 1-based rank of a faulty element, `n + 1` when no faulty element
    /// is ranked (absent from the mapping, or all faulty scores non-finite
    /// in a way that leaves nothing better).
    fn best_faulty_rank(formula: &Formula, instance: &FaultInstance) -> usize {
        let n = instance.len();
        if n == 0 {
            return 1;
        }

        let mut scored: Vec<(usize, f64)> = Vec::with_capacity(n);
        let mut failed = vec![false; n];
        for (i, (name, record)) in instance.elements().iter().enumerate() {
            let score = formula.evaluate(record);
            if score.is_finite() {
                scored.push((i, score));
            } else {
                debug!(
                    instance = instance.id(),
                    element = name.as_str(),
                    "non-finite suspiciousness score, ranking element last"
                );
                failed[i] = true;
                // Sinks below every finite score while keeping the slot so
                // ranks of the other elements stay 1-based over n.
                scored.push((i, f64::NEG_INFINITY));
            }
        }

        // Stable sort: equal scores keep first-seen order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut best: Option<usize> = None;
        for (position, (i, _)) in scored.iter().enumerate() {
            let (name, _) = &instance.elements()[*i];
            if instance.is_faulty(name) {
                let rank = if failed[*i] { n + 1 } else { position + 1 };
                best = Some(best.map_or(rank, |b| b.min(rank)));
            }
        }
        best.unwrap_or(n + 1)
    }

    /// Cost of one instance: the best faulty rank plus the optional top-1
    /// penalty.
    pub fn instance_cost(&self, formula: &Formula, instance: &FaultInstance) -> f64 {
        let rank = Self::best_faulty_rank(formula, instance);
        let mut cost = rank as f64;
        if let Some(penalty) = self.top1_penalty {
            if rank != 1 {
                cost += penalty;
            }
        }
        cost
    }

    /// Localization accuracy of a fixed formula over the full instance set,
    /// ignoring sampling and the top-1 penalty. This is the reporting side:
    /// acc@k counts instances whose best faulty rank is within k.
    pub fn accuracy(&self, formula: &Formula) -> AccuracyReport {
        let mut report = AccuracyReport {
            instances: self.instances.len(),
            ..AccuracyReport::default()
        };
        let mut total_rank = 0usize;
        for instance in &self.instances {
            let rank = Self::best_faulty_rank(formula, instance);
            total_rank += rank;
            if rank <= 1 {
                report.acc_at_1 += 1;
            }
            if rank <= 3 {
                report.acc_at_3 += 1;
            }
            if rank <= 5 {
                report.acc_at_5 += 1;
            }
        }
        report.mean_wasted_effort = total_rank as f64 / self.instances.len() as f64;
        report
    }
}

impl Fitness for RankFitness {
    fn begin_generation(&mut self, generation: usize) {
        if let Some(config) = self.sample {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(generation as u64));
            let indices: Vec<usize> = (0..self.instances.len()).collect();
            self.active = indices
                .choose_multiple(&mut rng, config.size)
                .copied()
                .collect();
        }
    }

    fn evaluate(&self, formula: &Formula) -> f64 {
        let total: f64 = self
            .active
            .iter()
            .map(|&i| self.instance_cost(formula, &self.instances[i]))
            .sum();
        total / self.active.len() as f64
    }
}

/// Localization accuracy of one formula over an instance set.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AccuracyReport {
    /// Instances where a faulty element ranked first
    pub acc_at_1: usize,
    /// Instances where a faulty element ranked in the top 3
    pub acc_at_3: usize,
    /// Instances where a faulty element ranked in the top 5
    pub acc_at_5: usize,
    /// Mean best faulty rank over all instances
    pub mean_wasted_effort: f64,
    /// Number of instances scored
    pub instances: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{BinaryOp, ExprNode, Terminal};
    use crate::spectrum::SpectrumRecord;

    fn ef_formula() -> Formula {
        Formula::new(ExprNode::Terminal(Terminal::Ef), 4)
    }

    fn instance(scores: &[(&str, u32)], faulty: &[&str]) -> FaultInstance {
        let mut out = FaultInstance::new("test-bug");
        for (name, e_f) in scores {
            out.push_element(*name, SpectrumRecord::new(*e_f, 0, 0, 0));
        }
        for name in faulty {
            out.mark_faulty(*name);
        }
        out
    }

    #[test]
    fn test_highest_score_ranks_first() {
        let instance = instance(&[("a", 0), ("b", 5), ("c", 2)], &["b"]);
        let fitness = RankFitness::new(vec![instance]).unwrap();
        assert_eq!(fitness.evaluate(&ef_formula()), 1.0);
    }

    #[test]
    fn test_ties_break_on_first_seen_order() {
        // b and c tie; b was inserted first so it keeps the better rank.
        let instance = instance(&[("a", 9), ("b", 5), ("c", 5)], &["c"]);
        let fitness = RankFitness::new(vec![instance]).unwrap();
        assert_eq!(fitness.evaluate(&ef_formula()), 3.0);
    }

    #[test]
    fn test_multiple_faulty_takes_best_rank() {
        let instance = instance(&[("a", 9), ("b", 5), ("c", 1)], &["b", "c"]);
        let fitness = RankFitness::new(vec![instance]).unwrap();
        assert_eq!(fitness.evaluate(&ef_formula()), 2.0);
    }

    #[test]
    fn test_missing_faulty_costs_n_plus_one() {
        let instance = instance(&[("a", 9), ("b", 5)], &["ghost"]);
        let fitness = RankFitness::new(vec![instance]).unwrap();
        assert_eq!(fitness.evaluate(&ef_formula()), 3.0);
    }

    #[test]
    fn test_mean_over_instances() {
        let first = instance(&[("a", 0), ("b", 5)], &["b"]); // rank 1
        let second = instance(&[("a", 9), ("b", 5), ("c", 1)], &["c"]); // rank 3
        let fitness = RankFitness::new(vec![first, second]).unwrap();
        assert_eq!(fitness.evaluate(&ef_formula()), 2.0);
    }

    #[test]
    fn test_non_finite_scores_rank_last() {
        let mut instance = FaultInstance::new("overflow");
        instance.push_element("a", SpectrumRecord::new(10, 0, 0, 0));
        instance.push_element("b", SpectrumRecord::new(3, 0, 0, 0));
        instance.mark_faulty("a");

        // (e_f / 1e-200) * (e_f / 1e-200) overflows f64 for any e_f >= 1, so
        // both elements score inf and sink; faulty "a" gets rank n + 1 = 3.
        let big = |t| {
            ExprNode::Binary(
                BinaryOp::Div,
                Box::new(ExprNode::Terminal(t)),
                Box::new(ExprNode::Terminal(Terminal::Const(1e-200))),
            )
        };
        let overflowing = Formula::new(
            ExprNode::Binary(
                BinaryOp::Mul,
                Box::new(big(Terminal::Ef)),
                Box::new(big(Terminal::Ef)),
            ),
            4,
        );

        let fitness = RankFitness::new(vec![instance]).unwrap();
        assert_eq!(fitness.evaluate(&overflowing), 3.0);
    }

    #[test]
    fn test_top1_penalty_applies_off_rank_one() {
        let miss = instance(&[("a", 9), ("b", 5)], &["b"]); // rank 2
        let fitness = RankFitness::new(vec![miss]).unwrap().with_top1_penalty(10.0);
        assert_eq!(fitness.evaluate(&ef_formula()), 12.0);

        let hit = instance(&[("a", 9), ("b", 5)], &["a"]); // rank 1
        let fitness = RankFitness::new(vec![hit]).unwrap().with_top1_penalty(10.0);
        assert_eq!(fitness.evaluate(&ef_formula()), 1.0);
    }

    #[test]
    fn test_sampling_is_stable_within_a_generation() {
        // Instances have different costs so different samples would show up.
        let instances: Vec<FaultInstance> = (0..10)
            .map(|i| {
                let mut inst = FaultInstance::new(format!("bug-{}", i));
                for j in 0..5 {
                    inst.push_element(format!("m{}", j), SpectrumRecord::new(5 - j, 0, 0, 0));
                }
                inst.mark_faulty(format!("m{}", i % 5));
                inst
            })
            .collect();
        let mut fitness = RankFitness::new(instances).unwrap().with_sampling(4, 99);

        fitness.begin_generation(3);
        let first = fitness.evaluate(&ef_formula());
        let second = fitness.evaluate(&ef_formula());
        assert_eq!(first, second);

        // Same generation index re-draws the same sample.
        let value_at_gen3 = first;
        fitness.begin_generation(4);
        fitness.begin_generation(3);
        assert_eq!(fitness.evaluate(&ef_formula()), value_at_gen3);
    }

    #[test]
    fn test_accuracy_report() {
        let rank1 = instance(&[("a", 0), ("b", 5)], &["b"]);
        let rank2 = instance(&[("a", 9), ("b", 5)], &["b"]);
        let rank4 = instance(&[("a", 9), ("b", 7), ("c", 6), ("d", 5)], &["d"]);
        let fitness = RankFitness::new(vec![rank1, rank2, rank4]).unwrap();

        let report = fitness.accuracy(&ef_formula());
        assert_eq!(report.instances, 3);
        assert_eq!(report.acc_at_1, 1);
        assert_eq!(report.acc_at_3, 2);
        assert_eq!(report.acc_at_5, 3);
        assert!((report.mean_wasted_effort - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_instance_set_rejected() {
        assert!(matches!(
            RankFitness::new(Vec::new()),
            Err(EvolutionError::EmptyInstanceSet)
        ));
    }
}
