//! Population container and evaluation

use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::fitness::Fitness;
use crate::formula::Formula;

use super::individual::Individual;

/// An ordered, fixed-capacity collection of individuals with a generation
/// counter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
    generation: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(capacity),
            generation: 0,
        }
    }

    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Random initialization: ramped half-and-half over the depth bound.
    pub fn random<R: Rng>(size: usize, max_depth: usize, rng: &mut R) -> Self {
        let individuals = (0..size)
            .map(|_| Individual::new(Formula::generate_ramped(rng, max_depth)))
            .collect();
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Initialization with hand-authored seeds first, random fill after.
    /// Seed trees are re-bound to this population's depth bound.
    pub fn seeded<R: Rng>(size: usize, max_depth: usize, seeds: &[Formula], rng: &mut R) -> Self {
        let mut individuals: Vec<Individual> = seeds
            .iter()
            .take(size)
            .map(|seed| Individual::new(Formula::new(seed.root().clone(), max_depth)))
            .collect();
        while individuals.len() < size {
            individuals.push(Individual::new(Formula::generate_ramped(rng, max_depth)));
        }
        Self {
            individuals,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn set_generation(&mut self, generation: usize) {
        self.generation = generation;
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    /// Drops individuals past `size`, keeping insertion order.
    pub fn truncate(&mut self, size: usize) {
        self.individuals.truncate(size);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Individual> {
        self.individuals.iter_mut()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Evaluates every unevaluated individual sequentially. Individuals that
    /// already carry a fitness (elites) are left untouched.
    pub fn evaluate<F: Fitness>(&mut self, fitness: &F) -> usize {
        let mut evaluated = 0;
        for individual in &mut self.individuals {
            if !individual.is_evaluated() {
                individual.set_fitness(fitness.evaluate(&individual.formula));
                evaluated += 1;
            }
        }
        evaluated
    }

    /// Parallel evaluation over rayon. Fitness is pure, so results are
    /// identical to the sequential path.
    #[cfg(feature = "parallel")]
    pub fn evaluate_parallel<F: Fitness>(&mut self, fitness: &F) -> usize {
        self.individuals
            .par_iter_mut()
            .map(|individual| {
                if individual.is_evaluated() {
                    0
                } else {
                    individual.set_fitness(fitness.evaluate(&individual.formula));
                    1
                }
            })
            .sum()
    }

    /// Sorts ascending by penalty; best first, unevaluated last.
    pub fn sort_by_fitness(&mut self) {
        self.individuals.sort_by(|a, b| {
            a.fitness_or_worst()
                .partial_cmp(&b.fitness_or_worst())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Best evaluated individual (lowest penalty).
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .filter(|i| i.is_evaluated())
            .min_by(|a, b| {
                a.fitness_or_worst()
                    .partial_cmp(&b.fitness_or_worst())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Worst evaluated individual (highest penalty).
    pub fn worst(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .filter(|i| i.is_evaluated())
            .max_by(|a, b| {
                a.fitness_or_worst()
                    .partial_cmp(&b.fitness_or_worst())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Snapshot of (formula, fitness) pairs for selection. Unevaluated
    /// individuals are skipped.
    pub fn as_fitness_pairs(&self) -> Vec<(Formula, f64)> {
        self.individuals
            .iter()
            .filter_map(|i| i.fitness.map(|f| (i.formula.clone(), f)))
            .collect()
    }

    pub fn mean_fitness(&self) -> Option<f64> {
        let values: Vec<f64> = self.individuals.iter().filter_map(|i| i.fitness).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    pub fn fitness_std(&self) -> Option<f64> {
        let values: Vec<f64> = self.individuals.iter().filter_map(|i| i.fitness).collect();
        if values.len() < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(variance.sqrt())
    }

    /// Mean pairwise structural distance between formulas.
    pub fn diversity(&self) -> f64 {
        let n = self.individuals.len();
        if n < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut pairs = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                total += self.individuals[i]
                    .formula
                    .distance(&self.individuals[j].formula);
                pairs += 1;
            }
        }
        total / pairs as f64
    }
}

impl std::ops::Index<usize> for Population {
    type Output = Individual;

    fn index(&self, index: usize) -> &Self::Output {
        &self.individuals[index]
    }
}

impl IntoIterator for Population {
    type Item = Individual;
    type IntoIter = std::vec::IntoIter<Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl FromIterator<Individual> for Population {
    fn from_iter<T: IntoIterator<Item = Individual>>(iter: T) -> Self {
        Self::from_individuals(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{ExprNode, Terminal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct SizeFitness;

    impl Fitness for SizeFitness {
        fn evaluate(&self, formula: &Formula) -> f64 {
            formula.size() as f64
        }
    }

    fn terminal(t: Terminal) -> Formula {
        Formula::new(ExprNode::Terminal(t), 4)
    }

    #[test]
    fn test_random_population_size_and_depth() {
        let mut rng = StdRng::seed_from_u64(20);
        let population = Population::random(30, 4, &mut rng);
        assert_eq!(population.len(), 30);
        for individual in population.iter() {
            assert!(individual.formula.depth() <= 4);
        }
    }

    #[test]
    fn test_seeded_population_keeps_seeds_first() {
        let mut rng = StdRng::seed_from_u64(21);
        let seeds = vec![crate::formula::catalog::tarantula()];
        let population = Population::seeded(10, 6, &seeds, &mut rng);
        assert_eq!(population.len(), 10);
        assert_eq!(population[0].formula.render(), seeds[0].render());
        assert_eq!(population[0].formula.max_depth(), 6);
    }

    #[test]
    fn test_evaluate_skips_already_evaluated() {
        let mut population = Population::from_individuals(vec![
            Individual::with_fitness(terminal(Terminal::Ef), 42.0),
            Individual::new(terminal(Terminal::Ep)),
        ]);
        let newly = population.evaluate(&SizeFitness);
        assert_eq!(newly, 1);
        // The pre-set fitness is untouched.
        assert_eq!(population[0].fitness, Some(42.0));
        assert_eq!(population[1].fitness, Some(1.0));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_evaluation_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut sequential = Population::random(25, 4, &mut rng);
        let mut parallel = sequential.clone();

        sequential.evaluate(&SizeFitness);
        parallel.evaluate_parallel(&SizeFitness);

        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.fitness, b.fitness);
        }
    }

    #[test]
    fn test_best_and_worst() {
        let population = Population::from_individuals(vec![
            Individual::with_fitness(terminal(Terminal::Ef), 3.0),
            Individual::with_fitness(terminal(Terminal::Ep), 1.0),
            Individual::with_fitness(terminal(Terminal::Nf), 7.0),
            Individual::new(terminal(Terminal::Np)),
        ]);
        assert_eq!(population.best().and_then(|i| i.fitness), Some(1.0));
        assert_eq!(population.worst().and_then(|i| i.fitness), Some(7.0));
    }

    #[test]
    fn test_sort_puts_best_first() {
        let mut population = Population::from_individuals(vec![
            Individual::with_fitness(terminal(Terminal::Ef), 3.0),
            Individual::new(terminal(Terminal::Np)),
            Individual::with_fitness(terminal(Terminal::Ep), 1.0),
        ]);
        population.sort_by_fitness();
        assert_eq!(population[0].fitness, Some(1.0));
        assert_eq!(population[1].fitness, Some(3.0));
        assert_eq!(population[2].fitness, None);
    }

    #[test]
    fn test_statistics() {
        let population = Population::from_individuals(vec![
            Individual::with_fitness(terminal(Terminal::Ef), 2.0),
            Individual::with_fitness(terminal(Terminal::Ep), 4.0),
        ]);
        assert_eq!(population.mean_fitness(), Some(3.0));
        assert_eq!(population.fitness_std(), Some(1.0));
    }

    #[test]
    fn test_empty_population_statistics() {
        let population = Population::new();
        assert!(population.best().is_none());
        assert!(population.mean_fitness().is_none());
        assert_eq!(population.diversity(), 0.0);
    }
}
