//! Gene-sequence chromosome for multiprocessor scheduling.
//!
//! # Encoding
//!
//! A chromosome is a [`Solution`]: a permutation of all tasks where every
//! gene carries the processor the task runs on. Projecting the sequence onto
//! one processor gives that processor's queue.
//!
//! # Fitness
//!
//! `fitness = 1 / makespan` (higher = better schedule). Unevaluated
//! chromosomes carry `f64::NEG_INFINITY`.
//!
//! # Reference
//! Hou, Ansari & Ren (1994), "A Genetic Algorithm for Multiprocessor Scheduling"

use rand::Rng;

use crate::models::{Gene, Solution, TaskGraph};
use crate::scheduler::ScheduleEvaluator;

/// Scheduling chromosome with cached evaluation.
#[derive(Debug, Clone)]
pub struct ScheduleChromosome {
    /// Processor-annotated task permutation.
    pub solution: Solution,
    /// Fitness value (higher = better).
    pub fitness: f64,
    /// Makespan of the decoded schedule (valid once evaluated).
    pub makespan: u64,
}

impl ScheduleChromosome {
    /// Wraps a solution; fitness is unset until [`evaluate`](Self::evaluate).
    pub fn new(solution: Solution) -> Self {
        Self {
            solution,
            fitness: f64::NEG_INFINITY,
            makespan: 0,
        }
    }

    /// Genes in sequence order.
    pub fn genes(&self) -> &[Gene] {
        &self.solution.genes
    }

    /// Whether fitness reflects the current genes.
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Clears the cached fitness after the genes changed.
    pub fn invalidate(&mut self) {
        self.fitness = f64::NEG_INFINITY;
        self.makespan = 0;
    }

    /// Decodes the chromosome and caches makespan and fitness.
    pub fn evaluate(&mut self, evaluator: &ScheduleEvaluator<'_>, processors: usize) {
        let schedule = self.solution.to_schedule(processors);
        self.makespan = evaluator.makespan(&schedule);
        self.fitness = fitness_of(self.makespan);
    }

    /// Whether the genes form a valid permutation for `graph`.
    pub fn is_valid(&self, graph: &TaskGraph, processors: usize) -> bool {
        self.solution.is_valid(graph, processors)
    }
}

/// Converts a makespan into fitness (`1 / makespan`).
///
/// A zero makespan maps to `f64::INFINITY`; searches reject graphs whose
/// durations are all zero before evaluating anything.
#[inline]
pub fn fitness_of(makespan: u64) -> f64 {
    1.0 / makespan as f64
}

// ======================== Crossover ========================

/// Two-point ordered crossover (OX).
///
/// Picks a random slice `[start, end]`. Each child keeps its template
/// parent's slice in place and fills the other positions, starting after
/// the slice and wrapping around, with the donor parent's genes in donor
/// order, skipping tasks already present. Processor labels travel with
/// their task. Both children are unevaluated.
///
/// # Reference
/// Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
pub fn ordered_crossover<R: Rng>(
    p1: &ScheduleChromosome,
    p2: &ScheduleChromosome,
    rng: &mut R,
) -> (ScheduleChromosome, ScheduleChromosome) {
    let len = p1.genes().len();
    if len < 2 || len != p2.genes().len() {
        let mut c1 = p1.clone();
        let mut c2 = p2.clone();
        c1.invalidate();
        c2.invalidate();
        return (c1, c2);
    }

    let mut start = rng.random_range(0..len);
    let mut end = rng.random_range(0..len);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    let child1 = ox_build_child(p1.genes(), p2.genes(), start, end);
    let child2 = ox_build_child(p2.genes(), p1.genes(), start, end);

    (
        ScheduleChromosome::new(Solution { genes: child1 }),
        ScheduleChromosome::new(Solution { genes: child2 }),
    )
}

fn ox_build_child(template: &[Gene], donor: &[Gene], start: usize, end: usize) -> Vec<Gene> {
    let len = template.len();
    let bound = template
        .iter()
        .chain(donor)
        .map(|g| g.task.index() + 1)
        .max()
        .unwrap_or(0);

    let mut present = vec![false; bound];
    for gene in &template[start..=end] {
        present[gene.task.index()] = true;
    }

    let mut fill = (0..len)
        .map(|i| donor[(end + 1 + i) % len])
        .filter(|g| !present[g.task.index()]);

    let mut child = template.to_vec();
    for offset in 0..len - (end - start + 1) {
        let pos = (end + 1 + offset) % len;
        if let Some(gene) = fill.next() {
            child[pos] = gene;
        }
    }
    child
}

// ======================== Mutation ========================

/// Processor-swap mutation: exchanges the processor labels of two random genes.
///
/// Task order is untouched, so this explores the allocation dimension only.
pub fn processor_swap_mutation<R: Rng>(chromosome: &mut ScheduleChromosome, rng: &mut R) {
    let len = chromosome.solution.genes.len();
    if len < 2 {
        return;
    }
    let i = rng.random_range(0..len);
    let j = rng.random_range(0..len);
    let genes = &mut chromosome.solution.genes;
    let tmp = genes[i].processor;
    genes[i].processor = genes[j].processor;
    genes[j].processor = tmp;
    chromosome.invalidate();
}

/// Order-swap mutation: exchanges the positions of two random genes.
pub fn order_swap_mutation<R: Rng>(chromosome: &mut ScheduleChromosome, rng: &mut R) {
    let len = chromosome.solution.genes.len();
    if len < 2 {
        return;
    }
    let i = rng.random_range(0..len);
    let j = rng.random_range(0..len);
    chromosome.solution.genes.swap(i, j);
    chromosome.invalidate();
}
