//! Generational genetic search loop.
//!
//! # Algorithm
//!
//! 1. Build `population_size` solutions with the configured constructor and
//!    evaluate them (generation 0).
//! 2. For each generation `g = 1, 2, ...`:
//!    - copy the elites unchanged,
//!    - fill the remaining slots with offspring of selected parents
//!      (ordered crossover with `crossover_probability`, else clones),
//!      each mutated with `mutation_probability`,
//!    - evaluate, rank, report to the observer.
//! 3. Stop on stagnation, at `max_generations`, or when the observer asks.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::chromosome::ScheduleChromosome;
use super::config::GaConfig;
use crate::error::ScheduleError;
use crate::models::{Schedule, Solution, TaskGraph};
use crate::scheduler::{EvaluationMode, ScheduleEvaluator};

/// Progress snapshot emitted after every generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    /// 1-based generation number.
    pub generation: usize,
    /// Best fitness in the generation.
    pub best_fitness: f64,
    /// Makespan of the best chromosome.
    pub best_makespan: u64,
}

/// Receives generation reports and may stop the search early.
///
/// Any `FnMut(&GenerationReport)` closure is an observer that never stops
/// the search.
pub trait GenerationObserver {
    /// Called once per generation, in increasing generation order.
    fn on_generation(&mut self, report: &GenerationReport);

    /// Checked after every report; `true` ends the search.
    fn should_stop(&self) -> bool {
        false
    }
}

impl<F: FnMut(&GenerationReport)> GenerationObserver for F {
    fn on_generation(&mut self, report: &GenerationReport) {
        self(report)
    }
}

struct Silent;

impl GenerationObserver for Silent {
    fn on_generation(&mut self, _report: &GenerationReport) {}
}

/// Why the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Best fitness stopped improving after `min_generations`.
    Stagnation,
    /// `max_generations` was reached.
    MaxGenerations,
    /// The observer requested a stop.
    Stopped,
}

/// Outcome of a genetic search.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Best solution of the final population, re-encoded from `schedule`.
    pub best: Solution,
    /// Processor queues of the best solution in the order they run.
    pub schedule: Schedule,
    /// Fitness of `best`.
    pub best_fitness: f64,
    /// Makespan of `best`.
    pub makespan: u64,
    /// Generations run.
    pub generations: usize,
    /// Best fitness per generation; entry `i` belongs to generation `i + 1`.
    pub fitness_history: Vec<f64>,
    /// Why the search ended.
    pub termination: TerminationReason,
}

/// Genetic search over one task graph and processor count.
///
/// # Example
///
/// ```
/// use u_procsched::ga::{GaConfig, GeneticSearch};
/// use u_procsched::models::{TaskDeclaration, TaskGraph};
///
/// let graph = TaskGraph::from_declarations(&[
///     TaskDeclaration::new("load", 3),
///     TaskDeclaration::new("parse", 4).with_dependency("load"),
///     TaskDeclaration::new("index", 2),
/// ])
/// .unwrap();
///
/// let config = GaConfig::default()
///     .with_population_size(20)
///     .with_stagnation(5, 0.001)
///     .with_seed(42);
/// let result = GeneticSearch::new(&graph, 2, config).unwrap().run().unwrap();
/// assert!(result.makespan >= 7);
/// assert!(result.schedule.is_partition_of(&graph));
/// assert!(graph.is_valid_assignment(&result.schedule));
/// ```
#[derive(Debug, Clone)]
pub struct GeneticSearch<'a> {
    graph: &'a TaskGraph,
    processors: usize,
    config: GaConfig,
    mode: EvaluationMode,
}

impl<'a> GeneticSearch<'a> {
    /// Prepares a search.
    ///
    /// # Errors
    /// - [`ScheduleError::NoTasks`] for an empty graph.
    /// - [`ScheduleError::NoProcessors`] if `processors == 0`.
    /// - [`ScheduleError::DegenerateFitness`] if every duration is zero.
    /// - [`ScheduleError::InvalidConfig`] from [`GaConfig::validate`].
    pub fn new(
        graph: &'a TaskGraph,
        processors: usize,
        config: GaConfig,
    ) -> Result<Self, ScheduleError> {
        if graph.is_empty() {
            return Err(ScheduleError::NoTasks);
        }
        if processors == 0 {
            return Err(ScheduleError::NoProcessors);
        }
        if graph.total_duration() == 0 {
            return Err(ScheduleError::DegenerateFitness);
        }
        config.validate()?;

        Ok(Self {
            graph,
            processors,
            config,
            mode: EvaluationMode::default(),
        })
    }

    /// Selects the makespan evaluation mode.
    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// The search configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Runs with an RNG seeded from the configuration.
    pub fn run(&self) -> Result<GaResult, ScheduleError> {
        self.run_with_observer(&mut Silent)
    }

    /// Runs with an RNG seeded from the configuration, reporting progress.
    pub fn run_with_observer<O: GenerationObserver>(
        &self,
        observer: &mut O,
    ) -> Result<GaResult, ScheduleError> {
        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        self.run_with_rng(&mut rng, observer)
    }

    /// Runs with a caller-supplied RNG.
    pub fn run_with_rng<R: Rng, O: GenerationObserver>(
        &self,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<GaResult, ScheduleError> {
        info!(
            "genetic search: {} tasks, {} processors, population {}",
            self.graph.len(),
            self.processors,
            self.config.population_size
        );

        let evaluator = ScheduleEvaluator::new(self.graph).with_mode(self.mode);
        let stagnation = self.config.stagnation();

        let mut population = self.initial_population(&evaluator, rng)?;
        let mut previous_best = population[0].fitness;
        let mut fitness_history = Vec::new();
        let mut generation = 0;

        let termination = loop {
            generation += 1;
            population = self.next_generation(&population, &evaluator, rng);

            let best = &population[0];
            let report = GenerationReport {
                generation,
                best_fitness: best.fitness,
                best_makespan: best.makespan,
            };
            debug!(
                "generation {generation}: best fitness {:.6}, makespan {}",
                report.best_fitness, report.best_makespan
            );
            fitness_history.push(best.fitness);
            observer.on_generation(&report);

            if stagnation.should_terminate(generation, best.fitness, previous_best) {
                break TerminationReason::Stagnation;
            }
            if self.config.max_generations.is_some_and(|max| generation >= max) {
                break TerminationReason::MaxGenerations;
            }
            if observer.should_stop() {
                break TerminationReason::Stopped;
            }
            previous_best = best.fitness;
        };

        let best = population.swap_remove(0);
        let schedule = evaluator
            .evaluate(&best.solution.to_schedule(self.processors))
            .executed_schedule();
        info!(
            "genetic search finished after {generation} generations ({termination:?}): makespan {}",
            best.makespan
        );

        Ok(GaResult {
            best: Solution::from(&schedule),
            schedule,
            best_fitness: best.fitness,
            makespan: best.makespan,
            generations: generation,
            fitness_history,
            termination,
        })
    }

    /// Builds and evaluates generation 0, sorted best first.
    pub fn initial_population<R: Rng>(
        &self,
        evaluator: &ScheduleEvaluator<'_>,
        rng: &mut R,
    ) -> Result<Vec<ScheduleChromosome>, ScheduleError> {
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let solution = self
                .config
                .construction
                .construct(self.graph, self.processors, rng)?;
            let mut chromosome = ScheduleChromosome::new(solution);
            chromosome.evaluate(evaluator, self.processors);
            population.push(chromosome);
        }
        rank(&mut population);
        Ok(population)
    }

    /// Produces the next generation from a ranked population.
    ///
    /// The result has the same size, is evaluated and ranked best first.
    pub fn next_generation<R: Rng>(
        &self,
        population: &[ScheduleChromosome],
        evaluator: &ScheduleEvaluator<'_>,
        rng: &mut R,
    ) -> Vec<ScheduleChromosome> {
        let size = population.len();
        let elites = self.config.elite_count().min(size);
        let operators = self.config.operators;

        let mut next: Vec<ScheduleChromosome> = population[..elites].to_vec();

        while next.len() < size {
            let (Some(i), Some(j)) = (
                operators.select(population, rng),
                operators.select(population, rng),
            ) else {
                break;
            };

            let (mut c1, mut c2) = if rng.random_bool(self.config.crossover_probability) {
                operators.crossover(&population[i], &population[j], rng)
            } else {
                (population[i].clone(), population[j].clone())
            };

            for child in [&mut c1, &mut c2] {
                if rng.random_bool(self.config.mutation_probability) {
                    operators.mutate(child, rng);
                }
            }

            next.push(c1);
            if next.len() < size {
                next.push(c2);
            }
        }

        for chromosome in next.iter_mut().filter(|c| !c.is_evaluated()) {
            chromosome.evaluate(evaluator, self.processors);
        }
        rank(&mut next);
        next
    }
}

fn rank(population: &mut [ScheduleChromosome]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::operators::{GeneticOperators, MutationType, SelectionType};
    use crate::models::TaskDeclaration;
    use crate::scheduler::ConstructionMethod;

    fn sample_graph() -> TaskGraph {
        TaskGraph::from_declarations(&[
            TaskDeclaration::new("A", 3),
            TaskDeclaration::new("B", 4).with_dependency("A"),
            TaskDeclaration::new("C", 2),
            TaskDeclaration::new("D", 6).with_dependency("C"),
            TaskDeclaration::new("E", 1),
            TaskDeclaration::new("F", 5).with_dependencies(["B", "D"]),
            TaskDeclaration::new("G", 7),
            TaskDeclaration::new("H", 2).with_dependency("G"),
        ])
        .unwrap()
    }

    fn small_config() -> GaConfig {
        GaConfig::default()
            .with_population_size(30)
            .with_stagnation(10, 0.0001)
            .with_max_generations(60)
            .with_seed(42)
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        let empty = TaskGraph::default();
        assert_eq!(
            GeneticSearch::new(&empty, 2, GaConfig::default()).err(),
            Some(ScheduleError::NoTasks)
        );

        let g = sample_graph();
        assert_eq!(
            GeneticSearch::new(&g, 0, GaConfig::default()).err(),
            Some(ScheduleError::NoProcessors)
        );

        let zeros = TaskGraph::from_declarations(&[
            TaskDeclaration::new("A", 0),
            TaskDeclaration::new("B", 0).with_dependency("A"),
        ])
        .unwrap();
        assert_eq!(
            GeneticSearch::new(&zeros, 2, GaConfig::default()).err(),
            Some(ScheduleError::DegenerateFitness)
        );

        let bad = GaConfig::default().with_crossover_probability(2.0);
        assert!(matches!(
            GeneticSearch::new(&g, 2, bad),
            Err(ScheduleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_population_size_is_invariant() {
        let g = sample_graph();
        let search = GeneticSearch::new(&g, 3, small_config().with_population_size(31)).unwrap();
        let evaluator = ScheduleEvaluator::new(&g);
        let mut rng = SmallRng::seed_from_u64(42);

        let mut population = search.initial_population(&evaluator, &mut rng).unwrap();
        assert_eq!(population.len(), 31);
        for _ in 0..20 {
            population = search.next_generation(&population, &evaluator, &mut rng);
            assert_eq!(population.len(), 31);
            assert!(population.iter().all(|c| c.is_evaluated()));
            assert!(population.iter().all(|c| c.is_valid(&g, 3)));
        }
    }

    #[test]
    fn test_best_fitness_never_decreases_with_elitism() {
        let g = sample_graph();
        let search = GeneticSearch::new(&g, 3, small_config()).unwrap();
        let result = search.run().unwrap();

        assert!(!result.fitness_history.is_empty());
        for pair in result.fitness_history.windows(2) {
            assert!(pair[1] >= pair[0], "history regressed: {pair:?}");
        }
        assert_eq!(result.fitness_history.len(), result.generations);
    }

    #[test]
    fn test_result_is_a_partition() {
        let g = sample_graph();
        let result = GeneticSearch::new(&g, 3, small_config())
            .unwrap()
            .run()
            .unwrap();

        assert!(result.best.is_valid(&g, 3));
        assert!(result.schedule.is_partition_of(&g));
        assert_eq!(result.makespan, ScheduleEvaluator::new(&g).makespan(&result.schedule));
        assert!((result.best_fitness - 1.0 / result.makespan as f64).abs() < 1e-12);
        assert!(result.makespan >= crate::scheduler::lower_bound(&g, 3));
    }

    #[test]
    fn test_flat_fitness_stops_at_min_generations() {
        let g = TaskGraph::from_declarations(&[TaskDeclaration::new("only", 5)]).unwrap();
        let config = GaConfig::default().with_population_size(10).with_seed(1);
        let mut seen = Vec::new();
        let result = GeneticSearch::new(&g, 4, config)
            .unwrap()
            .run_with_observer(&mut |r: &GenerationReport| seen.push(r.generation))
            .unwrap();

        assert_eq!(result.generations, 50);
        assert_eq!(result.termination, TerminationReason::Stagnation);
        assert_eq!(result.makespan, 5);
        assert_eq!(seen, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_max_generations_caps_search() {
        let g = sample_graph();
        let config = small_config().with_stagnation(1000, 0.001).with_max_generations(7);
        let result = GeneticSearch::new(&g, 2, config).unwrap().run().unwrap();

        assert_eq!(result.generations, 7);
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
    }

    struct StopAfter {
        limit: usize,
        seen: usize,
    }

    impl GenerationObserver for StopAfter {
        fn on_generation(&mut self, report: &GenerationReport) {
            self.seen = report.generation;
        }

        fn should_stop(&self) -> bool {
            self.seen >= self.limit
        }
    }

    #[test]
    fn test_observer_can_stop_search() {
        let g = sample_graph();
        let config = small_config().with_stagnation(1000, 0.001).with_max_generations(500);
        let mut observer = StopAfter { limit: 3, seen: 0 };
        let result = GeneticSearch::new(&g, 2, config)
            .unwrap()
            .run_with_observer(&mut observer)
            .unwrap();

        assert_eq!(result.generations, 3);
        assert_eq!(result.termination, TerminationReason::Stopped);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let g = sample_graph();
        let a = GeneticSearch::new(&g, 3, small_config()).unwrap().run().unwrap();
        let b = GeneticSearch::new(&g, 3, small_config()).unwrap().run().unwrap();

        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_alternative_operators_and_construction() {
        let g = sample_graph();
        let config = small_config()
            .with_construction(ConstructionMethod::Unconstrained)
            .with_operators(GeneticOperators {
                selection: SelectionType::Tournament { size: 3 },
                mutation: MutationType::OrderSwap,
            });
        let result = GeneticSearch::new(&g, 2, config)
            .unwrap()
            .with_evaluation_mode(EvaluationMode::SinglePass)
            .run()
            .unwrap();

        assert!(result.schedule.is_partition_of(&g));
        assert!(result.makespan > 0);
    }

    fn chain() -> TaskGraph {
        TaskGraph::from_declarations(&[
            TaskDeclaration::new("A", 1),
            TaskDeclaration::new("B", 2).with_dependency("A"),
            TaskDeclaration::new("C", 3).with_dependency("B"),
            TaskDeclaration::new("D", 4).with_dependency("C"),
            TaskDeclaration::new("E", 5).with_dependency("D"),
        ])
        .unwrap()
    }

    #[test]
    fn test_chain_result_is_feasible_for_both_constructors() {
        let g = chain();
        let expected: Vec<_> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|name| g.id_of(name).unwrap())
            .collect();

        for construction in [ConstructionMethod::DependencyAware, ConstructionMethod::Unconstrained] {
            for seed in 0..8 {
                let config = GaConfig::default()
                    .with_population_size(10)
                    .with_max_generations(5)
                    .with_construction(construction)
                    .with_seed(seed);
                let result = GeneticSearch::new(&g, 1, config).unwrap().run().unwrap();

                assert_eq!(result.makespan, 15);
                assert!(g.is_valid_assignment(&result.schedule), "{construction:?} seed {seed}");
                assert_eq!(result.schedule.queue(0), expected.as_slice());
                assert_eq!(result.best.to_schedule(1), result.schedule);
            }
        }
    }

    #[test]
    fn test_result_schedule_is_feasible_on_several_processors() {
        let g = sample_graph();
        for construction in [ConstructionMethod::DependencyAware, ConstructionMethod::Unconstrained] {
            let config = small_config().with_construction(construction);
            let result = GeneticSearch::new(&g, 3, config).unwrap().run().unwrap();

            assert!(g.is_valid_assignment(&result.schedule), "{construction:?}");
            assert_eq!(result.makespan, ScheduleEvaluator::new(&g).makespan(&result.schedule));
        }
    }
}
