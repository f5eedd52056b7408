//! Annealing loop.
//!
//! Energy is the makespan. Each iteration draws a swap neighbor, accepts
//! it when it is not worse or with probability `exp(-delta / T)`, and
//! cools `T` geometrically.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::{AnnealingConfig, Termination};
use super::neighbor::swap_neighbor;
use crate::error::ScheduleError;
use crate::models::{Schedule, TaskGraph};
use crate::scheduler::{EvaluationMode, ScheduleEvaluator};

/// Progress snapshot emitted after every iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Temperature used for this iteration's acceptance test.
    pub temperature: f64,
    /// Energy of the current schedule after the acceptance test.
    pub current_energy: u64,
    /// Best energy so far.
    pub best_energy: u64,
    /// Whether the neighbor was accepted.
    pub accepted: bool,
}

/// Receives iteration reports and may stop the search early.
pub trait AnnealingObserver {
    /// Called once per iteration.
    fn on_iteration(&mut self, report: &IterationReport);

    /// Checked after every report; `true` ends the search.
    fn should_stop(&self) -> bool {
        false
    }
}

impl<F: FnMut(&IterationReport)> AnnealingObserver for F {
    fn on_iteration(&mut self, report: &IterationReport) {
        self(report)
    }
}

struct Silent;

impl AnnealingObserver for Silent {
    fn on_iteration(&mut self, _report: &IterationReport) {}
}

/// Outcome of an annealing run.
#[derive(Debug, Clone)]
pub struct AnnealingResult {
    /// Best schedule found, with each queue in the order it runs.
    pub best: Schedule,
    /// Makespan of `best`.
    pub best_energy: u64,
    /// Iterations run.
    pub iterations: usize,
    /// Neighbors accepted.
    pub accepted_moves: usize,
    /// Temperature after the last cooling step.
    pub final_temperature: f64,
    /// Best energy after each iteration (non-increasing).
    pub energy_trace: Vec<u64>,
}

/// Metropolis acceptance test.
///
/// Improvements and sideways moves (`delta <= 0`) are always accepted;
/// worse moves with probability `exp(-delta / temperature)`.
pub fn accept_move<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    rng.random::<f64>() < (-delta / temperature).exp()
}

/// Simulated annealing over one task graph and processor count.
///
/// # Example
///
/// ```
/// use u_procsched::models::{TaskDeclaration, TaskGraph};
/// use u_procsched::sa::{AnnealingConfig, AnnealingSearch};
///
/// let graph = TaskGraph::from_declarations(&[
///     TaskDeclaration::new("fetch", 5),
///     TaskDeclaration::new("decode", 2).with_dependency("fetch"),
///     TaskDeclaration::new("render", 4),
/// ])
/// .unwrap();
///
/// let search = AnnealingSearch::new(&graph, 2, AnnealingConfig::default().with_seed(3)).unwrap();
/// let result = search.run().unwrap();
/// assert!(graph.is_valid_assignment(&result.best));
/// assert!(result.best_energy >= 7);
/// ```
#[derive(Debug, Clone)]
pub struct AnnealingSearch<'a> {
    graph: &'a TaskGraph,
    processors: usize,
    config: AnnealingConfig,
    mode: EvaluationMode,
}

impl<'a> AnnealingSearch<'a> {
    /// Prepares a search.
    ///
    /// # Errors
    /// - [`ScheduleError::NoTasks`] for an empty graph.
    /// - [`ScheduleError::NoProcessors`] if `processors == 0`.
    /// - [`ScheduleError::InvalidConfig`] from [`AnnealingConfig::validate`].
    pub fn new(
        graph: &'a TaskGraph,
        processors: usize,
        config: AnnealingConfig,
    ) -> Result<Self, ScheduleError> {
        if graph.is_empty() {
            return Err(ScheduleError::NoTasks);
        }
        if processors == 0 {
            return Err(ScheduleError::NoProcessors);
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
    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    /// Runs from a constructed schedule with an RNG seeded from the configuration.
    pub fn run(&self) -> Result<AnnealingResult, ScheduleError> {
        self.run_with_observer(&mut Silent)
    }

    /// Like [`run`](Self::run), reporting every iteration.
    pub fn run_with_observer<O: AnnealingObserver>(
        &self,
        observer: &mut O,
    ) -> Result<AnnealingResult, ScheduleError> {
        let mut rng = self.seeded_rng();
        self.run_with_rng(&mut rng, observer)
    }

    /// Runs from a constructed schedule with a caller-supplied RNG.
    pub fn run_with_rng<R: Rng, O: AnnealingObserver>(
        &self,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<AnnealingResult, ScheduleError> {
        let initial = self
            .config
            .construction
            .construct(self.graph, self.processors, rng)?
            .to_schedule(self.processors);
        self.anneal(initial, rng, observer)
    }

    /// Runs from a caller-supplied starting schedule.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidSchedule`] if `initial` is not a partition of
    /// the graph over this search's processors.
    pub fn run_from<O: AnnealingObserver>(
        &self,
        initial: Schedule,
        observer: &mut O,
    ) -> Result<AnnealingResult, ScheduleError> {
        if !initial.is_partition_of(self.graph) {
            return Err(ScheduleError::InvalidSchedule(
                "every task must be queued exactly once".into(),
            ));
        }
        if initial.processor_count() != self.processors {
            return Err(ScheduleError::InvalidSchedule(format!(
                "expected {} processor queues, found {}",
                self.processors,
                initial.processor_count()
            )));
        }
        let mut rng = self.seeded_rng();
        self.anneal(initial, &mut rng, observer)
    }

    fn seeded_rng(&self) -> SmallRng {
        match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }

    fn anneal<R: Rng, O: AnnealingObserver>(
        &self,
        initial: Schedule,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<AnnealingResult, ScheduleError> {
        let evaluator = ScheduleEvaluator::new(self.graph).with_mode(self.mode);

        let mut current_energy = evaluator.makespan(&initial);
        let mut current = initial;
        let mut best = current.clone();
        let mut best_energy = current_energy;

        let mut temperature = self.config.initial_temperature;
        let mut iterations = 0;
        let mut accepted_moves = 0;
        let mut energy_trace = Vec::new();

        info!(
            "annealing: {} tasks, {} processors, initial makespan {current_energy}",
            self.graph.len(),
            self.processors
        );

        while self.keep_going(iterations, temperature) {
            iterations += 1;

            let neighbor = swap_neighbor(self.graph, &current, rng);
            let energy = evaluator.makespan(&neighbor);
            let delta = energy as f64 - current_energy as f64;

            let accepted = accept_move(delta, temperature, rng);
            if accepted {
                accepted_moves += 1;
                current = neighbor;
                current_energy = energy;
                if current_energy < best_energy {
                    debug!("iteration {iterations}: new best makespan {current_energy} at T={temperature:.3}");
                    best = current.clone();
                    best_energy = current_energy;
                }
            }
            energy_trace.push(best_energy);

            observer.on_iteration(&IterationReport {
                iteration: iterations,
                temperature,
                current_energy,
                best_energy,
                accepted,
            });

            temperature *= self.config.cooling_rate;
            if observer.should_stop() {
                break;
            }
        }

        info!(
            "annealing finished after {iterations} iterations: best makespan {best_energy}, {accepted_moves} moves accepted"
        );

        Ok(AnnealingResult {
            best: evaluator.evaluate(&best).executed_schedule(),
            best_energy,
            iterations,
            accepted_moves,
            final_temperature: temperature,
            energy_trace,
        })
    }

    fn keep_going(&self, iterations: usize, temperature: f64) -> bool {
        match self.config.termination {
            Termination::Iterations(max) => iterations < max,
            Termination::MinTemperature(min) => temperature > min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskDeclaration, TaskId};
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
        ])
        .unwrap()
    }

    #[test]
    fn test_accept_move() {
        let mut rng = SmallRng::seed_from_u64(42);
        assert!(accept_move(-3.0, 1.0, &mut rng));
        assert!(accept_move(0.0, 1e-9, &mut rng));
        assert!(!accept_move(5.0, 0.0, &mut rng));

        // exp(-1000 / 1e-3) underflows to 0.
        assert!((0..100).all(|_| !accept_move(1000.0, 1e-3, &mut rng)));

        let hot = (0..1000).filter(|_| accept_move(1.0, 1e6, &mut rng)).count();
        assert!(hot > 990);
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        let g = sample_graph();
        assert_eq!(
            AnnealingSearch::new(&TaskGraph::default(), 2, AnnealingConfig::default()).err(),
            Some(ScheduleError::NoTasks)
        );
        assert_eq!(
            AnnealingSearch::new(&g, 0, AnnealingConfig::default()).err(),
            Some(ScheduleError::NoProcessors)
        );
        assert!(matches!(
            AnnealingSearch::new(&g, 2, AnnealingConfig::default().with_cooling_rate(0.0)),
            Err(ScheduleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_best_energy_never_increases() {
        let g = sample_graph();
        let config = AnnealingConfig::default()
            .with_termination(Termination::Iterations(500))
            .with_cooling_rate(0.99)
            .with_seed(42);
        let result = AnnealingSearch::new(&g, 3, config).unwrap().run().unwrap();

        assert_eq!(result.iterations, 500);
        assert_eq!(result.energy_trace.len(), 500);
        for pair in result.energy_trace.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(result.energy_trace.last().copied(), Some(result.best_energy));
        assert!(result.best.is_partition_of(&g));
        assert_eq!(
            ScheduleEvaluator::new(&g).makespan(&result.best),
            result.best_energy
        );
        assert!(result.accepted_moves <= result.iterations);
    }

    #[test]
    fn test_min_temperature_termination() {
        let g = sample_graph();
        let config = AnnealingConfig::default()
            .with_initial_temperature(100.0)
            .with_cooling_rate(0.5)
            .with_termination(Termination::MinTemperature(1.0))
            .with_seed(42);
        let result = AnnealingSearch::new(&g, 2, config).unwrap().run().unwrap();

        // 100 * 0.5^7 < 1 <= 100 * 0.5^6
        assert_eq!(result.iterations, 7);
        assert!(result.final_temperature <= 1.0);
    }

    #[test]
    fn test_run_from_rejects_non_partition() {
        let g = sample_graph();
        let search = AnnealingSearch::new(&g, 2, AnnealingConfig::default().with_seed(1)).unwrap();

        let missing = Schedule::from_queues(vec![vec![TaskId(0)], vec![TaskId(1)]]);
        assert!(matches!(
            search.run_from(missing, &mut |_: &IterationReport| {}),
            Err(ScheduleError::InvalidSchedule(_))
        ));

        let wrong_width = Schedule::from_queues(vec![g.ids().collect()]);
        assert!(matches!(
            search.run_from(wrong_width, &mut |_: &IterationReport| {}),
            Err(ScheduleError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_run_from_never_worse_than_start() {
        let g = sample_graph();
        let start = Schedule::from_queues(vec![g.ids().collect(), Vec::new()]);
        let start_energy = ScheduleEvaluator::new(&g).makespan(&start);

        let search = AnnealingSearch::new(&g, 2, AnnealingConfig::default().with_seed(9)).unwrap();
        let mut reports = Vec::new();
        let result = search
            .run_from(start, &mut |r: &IterationReport| reports.push(*r))
            .unwrap();

        assert!(result.best_energy <= start_energy);
        assert_eq!(reports.len(), 100);
        assert_eq!(
            reports.iter().map(|r| r.iteration).collect::<Vec<_>>(),
            (1..=100).collect::<Vec<_>>()
        );
        assert_eq!(
            reports.iter().filter(|r| r.accepted).count(),
            result.accepted_moves
        );
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let g = sample_graph();
        let config = AnnealingConfig::default().with_seed(5);
        let a = AnnealingSearch::new(&g, 3, config.clone()).unwrap().run().unwrap();
        let b = AnnealingSearch::new(&g, 3, config).unwrap().run().unwrap();

        assert_eq!(a.best, b.best);
        assert_eq!(a.energy_trace, b.energy_trace);
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
        let expected: Vec<TaskId> = g.ids().collect();

        for construction in [ConstructionMethod::DependencyAware, ConstructionMethod::Unconstrained] {
            for seed in 0..8 {
                let config = AnnealingConfig::default()
                    .with_construction(construction)
                    .with_seed(seed);
                let result = AnnealingSearch::new(&g, 1, config).unwrap().run().unwrap();

                assert_eq!(result.best_energy, 15);
                assert!(g.is_valid_assignment(&result.best), "{construction:?} seed {seed}");
                assert_eq!(result.best.queue(0), expected.as_slice());
            }
        }
    }

    #[test]
    fn test_run_from_inverted_start_reports_run_order() {
        let g = chain();
        let mut reversed: Vec<TaskId> = g.ids().collect();
        reversed.reverse();
        let inverted = Schedule::from_queues(vec![reversed]);
        assert!(!g.is_valid_assignment(&inverted));

        let search = AnnealingSearch::new(&g, 1, AnnealingConfig::default().with_seed(4)).unwrap();
        let result = search
            .run_from(inverted, &mut |_: &IterationReport| {})
            .unwrap();

        assert_eq!(result.best_energy, 15);
        assert!(g.is_valid_assignment(&result.best));
    }

    #[test]
    fn test_result_schedule_is_feasible_on_several_processors() {
        let g = sample_graph();
        for construction in [ConstructionMethod::DependencyAware, ConstructionMethod::Unconstrained] {
            let config = AnnealingConfig::default()
                .with_termination(Termination::Iterations(300))
                .with_construction(construction)
                .with_seed(11);
            let result = AnnealingSearch::new(&g, 3, config).unwrap().run().unwrap();

            assert!(g.is_valid_assignment(&result.best), "{construction:?}");
            assert_eq!(ScheduleEvaluator::new(&g).makespan(&result.best), result.best_energy);
        }
    }
}
