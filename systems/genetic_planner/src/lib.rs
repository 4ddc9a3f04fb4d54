#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Genetic round planner.
//!
//! Evolves a population of candidate spawn lists toward a target difficulty
//! score. Each chromosome is a sequence of picks from the allowed archetype
//! set; selection is a size-two tournament, reproduction is single-point
//! crossover, and mutation either replaces one pick or swaps two positions.
//! The search is synchronous and bounded, safe to run to completion inside a
//! single invocation.

use horde_core::{EnemyDescriptor, RoundPlan};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Tuning knobs controlling every adjustable aspect of the evolutionary search.
#[derive(Clone, Copy, Debug)]
pub struct PlannerTuning {
    /// Number of chromosomes kept alive per generation.
    pub population_size: usize,
    /// Number of evolution iterations before the best chromosome is taken.
    pub generations: u32,
    /// Probability that a freshly bred child undergoes one mutation.
    pub mutation_chance: f32,
    /// Multiplier applied to the target when seeding initial chromosomes;
    /// values above 1.0 overshoot so the search can trim back down.
    pub overshoot_factor: f32,
    /// Hard cap on genes per chromosome, guarding against runaway growth
    /// when individual archetype scores are tiny relative to the target.
    pub max_genes: usize,
}

impl Default for PlannerTuning {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_chance: 0.05,
            overshoot_factor: 1.2,
            max_genes: 100,
        }
    }
}

/// Candidate fitness for a plan totalling `total_difficulty` against `target`.
///
/// Always in `(0, 1]`, and exactly `1.0` only when the totals match.
#[must_use]
pub fn fitness(target: f32, total_difficulty: f32) -> f32 {
    1.0 / (1.0 + (target - total_difficulty).abs())
}

/// Genes index into the allowed slice handed to [`GeneticPlanner::generate_round`].
#[derive(Clone, Debug)]
struct Chromosome {
    genes: Vec<usize>,
    fitness: f32,
    total_difficulty: f32,
}

impl Chromosome {
    fn score(&mut self, target: f32, gene_scores: &[f32]) {
        self.total_difficulty = self.genes.iter().map(|&gene| gene_scores[gene]).sum();
        self.fitness = fitness(target, self.total_difficulty);
    }
}

/// Population-based search that composes one round against a difficulty target.
#[derive(Debug)]
pub struct GeneticPlanner {
    tuning: PlannerTuning,
    rng: ChaCha8Rng,
}

impl GeneticPlanner {
    /// Creates a new planner with the provided tuning and deterministic seed.
    #[must_use]
    pub fn new(tuning: PlannerTuning, rng_seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    /// Evolves a spawn list whose summed difficulty approximates `target`.
    ///
    /// An empty `allowed` set yields an empty plan; no input is fatal.
    pub fn generate_round(&mut self, target: f32, allowed: &[EnemyDescriptor]) -> RoundPlan {
        if allowed.is_empty() {
            warn!(target, "round requested without any allowed enemies");
            return RoundPlan::empty();
        }

        let gene_scores: Vec<f32> = allowed
            .iter()
            .map(EnemyDescriptor::difficulty)
            .collect();

        let mut population = self.initialize_population(target, &gene_scores);

        for _ in 0..self.tuning.generations {
            for chromosome in &mut population {
                chromosome.score(target, &gene_scores);
            }
            sort_by_fitness(&mut population);

            let elite_count = (self.tuning.population_size / 10).max(1);
            let mut next_generation: Vec<Chromosome> =
                population.iter().take(elite_count).cloned().collect();

            while next_generation.len() < self.tuning.population_size {
                let parent1 = self.tournament(&population);
                let parent2 = self.tournament(&population);
                let mut child = self.crossover(&population[parent1], &population[parent2]);
                self.mutate(&mut child, gene_scores.len());
                next_generation.push(child);
            }

            population = next_generation;
        }

        for chromosome in &mut population {
            chromosome.score(target, &gene_scores);
        }
        sort_by_fitness(&mut population);

        let Some(best) = population.first() else {
            return RoundPlan::empty();
        };
        debug!(
            target,
            actual = best.total_difficulty,
            fitness = best.fitness,
            "round plan evolved"
        );

        let entries = best.genes.iter().map(|&gene| allowed[gene].id()).collect();
        RoundPlan::new(entries, best.total_difficulty)
    }

    fn initialize_population(&mut self, target: f32, gene_scores: &[f32]) -> Vec<Chromosome> {
        let limit = target * self.tuning.overshoot_factor;
        let mut population = Vec::with_capacity(self.tuning.population_size.max(1));

        for _ in 0..self.tuning.population_size.max(1) {
            let mut genes = Vec::new();
            let mut total = 0.0;
            while total < limit && genes.len() < self.tuning.max_genes {
                let gene = self.rng.gen_range(0..gene_scores.len());
                total += gene_scores[gene];
                genes.push(gene);
            }
            population.push(Chromosome {
                genes,
                fitness: 0.0,
                total_difficulty: 0.0,
            });
        }

        population
    }

    /// Size-two tournament: sample two chromosomes, keep the fitter.
    fn tournament(&mut self, population: &[Chromosome]) -> usize {
        let first = self.rng.gen_range(0..population.len());
        let second = self.rng.gen_range(0..population.len());
        if population[first].fitness > population[second].fitness {
            first
        } else {
            second
        }
    }

    /// Single-point crossover; when either parent is too short to cut, the
    /// fitter parent is cloned instead.
    fn crossover(&mut self, parent1: &Chromosome, parent2: &Chromosome) -> Chromosome {
        let shortest = parent1.genes.len().min(parent2.genes.len());
        if shortest <= 1 {
            let fitter = if parent1.fitness >= parent2.fitness {
                parent1
            } else {
                parent2
            };
            return fitter.clone();
        }

        let cut = self.rng.gen_range(1..shortest);
        let mut genes = Vec::with_capacity(parent2.genes.len());
        genes.extend_from_slice(&parent1.genes[..cut]);
        genes.extend_from_slice(&parent2.genes[cut..]);
        Chromosome {
            genes,
            fitness: 0.0,
            total_difficulty: 0.0,
        }
    }

    fn mutate(&mut self, chromosome: &mut Chromosome, allowed_count: usize) {
        if self.rng.gen::<f32>() >= self.tuning.mutation_chance {
            return;
        }
        if chromosome.genes.is_empty() {
            return;
        }

        if self.rng.gen::<f32>() < 0.5 {
            let index = self.rng.gen_range(0..chromosome.genes.len());
            chromosome.genes[index] = self.rng.gen_range(0..allowed_count);
        } else {
            if chromosome.genes.len() < 2 {
                return;
            }
            let a = self.rng.gen_range(0..chromosome.genes.len());
            let b = self.rng.gen_range(0..chromosome.genes.len());
            chromosome.genes.swap(a, b);
        }
    }
}

/// Stable descending sort by fitness; ties keep their prior population
/// order, which makes replays deterministic.
fn sort_by_fitness(population: &mut [Chromosome]) {
    population.sort_by(|a, b| {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitness_is_maximized_at_exact_match() {
        assert!((fitness(50.0, 50.0) - 1.0).abs() < f32::EPSILON);
        assert!(fitness(50.0, 50.5) < 1.0);
        assert!(fitness(50.0, 0.0) > 0.0);
    }

    #[test]
    fn fitness_is_symmetric_around_the_target() {
        assert!((fitness(100.0, 80.0) - fitness(100.0, 120.0)).abs() < f32::EPSILON);
    }
}
