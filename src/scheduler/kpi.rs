//! Schedule quality metrics (KPIs).
//!
//! Computes standard multiprocessor scheduling indicators from an
//! evaluated schedule.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest finish time |
//! | Total Work | Sum of task durations |
//! | Lower Bound | max(critical path, ⌈total work / P⌉) |
//! | Gap | makespan / lower bound - 1 |
//! | Utilization | busy time / makespan, per processor |
//! | Idle Time | P · makespan - total work |
//!
//! # Reference
//! Graham (1969), "Bounds on Multiprocessing Timing Anomalies"

use crate::models::TaskGraph;
use crate::scheduler::Evaluation;

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Latest finish time.
    pub makespan: u64,
    /// Sum of all task durations.
    pub total_work: u64,
    /// Makespan lower bound for this graph and processor count.
    pub lower_bound: u64,
    /// Relative distance from the lower bound (0.0 = provably optimal).
    pub gap: f64,
    /// Total processor idle time within the makespan.
    pub idle_time: u64,
    /// Busy fraction per processor (0.0..1.0).
    pub utilization_by_processor: Vec<f64>,
    /// Mean utilization over all processors.
    pub avg_utilization: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from an evaluation.
    ///
    /// # Arguments
    /// * `graph` - Task graph the schedule was built for.
    /// * `evaluation` - Result of evaluating the schedule.
    /// * `processors` - Processor count of the schedule.
    pub fn calculate(graph: &TaskGraph, evaluation: &Evaluation, processors: usize) -> Self {
        let makespan = evaluation.makespan();
        let total_work = graph.total_duration();
        let lower_bound = lower_bound(graph, processors);

        let mut busy = vec![0u64; processors];
        for timing in evaluation.timings() {
            if let Some(b) = busy.get_mut(timing.processor) {
                *b = b.saturating_add(timing.finish - timing.start);
            }
        }

        let utilization_by_processor: Vec<f64> = busy
            .iter()
            .map(|&b| {
                if makespan == 0 {
                    0.0
                } else {
                    b as f64 / makespan as f64
                }
            })
            .collect();

        let avg_utilization = if utilization_by_processor.is_empty() {
            0.0
        } else {
            utilization_by_processor.iter().sum::<f64>() / utilization_by_processor.len() as f64
        };

        let gap = if lower_bound == 0 {
            0.0
        } else {
            makespan as f64 / lower_bound as f64 - 1.0
        };

        let capacity = makespan.saturating_mul(processors as u64);
        let busy_total = busy.iter().fold(0u64, |total, &b| total.saturating_add(b));

        Self {
            makespan,
            total_work,
            lower_bound,
            gap,
            idle_time: capacity.saturating_sub(busy_total),
            utilization_by_processor,
            avg_utilization,
        }
    }

    /// Whether the makespan equals the lower bound.
    pub fn is_optimal(&self) -> bool {
        self.makespan == self.lower_bound
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_gap: f64, min_utilization: f64) -> bool {
        self.gap <= max_gap && self.avg_utilization >= min_utilization
    }
}

/// Makespan lower bound: the longer of the critical path and the
/// perfectly balanced load.
pub fn lower_bound(graph: &TaskGraph, processors: usize) -> u64 {
    let balanced = if processors == 0 {
        graph.total_duration()
    } else {
        graph.total_duration().div_ceil(processors as u64)
    };
    graph.critical_path_length().max(balanced)
}
