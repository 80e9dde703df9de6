//! Aggregate execution statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::execution::{Execution, ExecutionStatus};

/// Execution counts for a single system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub total: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    /// Mean creation-to-completion time of terminal executions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_duration_ms: Option<f64>,
}

impl SystemMetrics {
    fn terminal(&self) -> i64 {
        self.completed + self.failed
    }
}

/// Repository-wide execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub total_executions: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    /// Completed executions as a percentage of terminal ones.
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_duration_ms: Option<f64>,
    pub by_system: BTreeMap<String, SystemMetrics>,
}

impl ExecutionMetrics {
    /// Combine per-system rows into repository-wide statistics.
    pub fn from_systems(by_system: BTreeMap<String, SystemMetrics>) -> Self {
        let mut metrics = ExecutionMetrics::default();
        let mut weighted_duration = 0.0;
        let mut timed = 0i64;

        for system in by_system.values() {
            metrics.total_executions += system.total;
            metrics.running += system.running;
            metrics.completed += system.completed;
            metrics.failed += system.failed;

            if let Some(avg) = system.average_duration_ms {
                weighted_duration += avg * system.terminal() as f64;
                timed += system.terminal();
            }
        }

        let terminal = metrics.completed + metrics.failed;
        if terminal > 0 {
            metrics.success_rate = metrics.completed as f64 / terminal as f64 * 100.0;
        }
        if timed > 0 {
            metrics.average_duration_ms = Some(weighted_duration / timed as f64);
        }

        metrics.by_system = by_system;
        metrics
    }

    /// Compute statistics directly from execution records.
    pub fn from_executions<'a>(executions: impl IntoIterator<Item = &'a Execution>) -> Self {
        let mut by_system: BTreeMap<String, SystemMetrics> = BTreeMap::new();
        let mut durations: BTreeMap<String, (f64, i64)> = BTreeMap::new();

        for exec in executions {
            let entry = by_system.entry(exec.system.clone()).or_default();
            entry.total += 1;
            match exec.status {
                ExecutionStatus::Running => entry.running += 1,
                ExecutionStatus::Completed => entry.completed += 1,
                ExecutionStatus::Failed => entry.failed += 1,
            }

            if let Some(ms) = exec.duration_ms() {
                let slot = durations.entry(exec.system.clone()).or_insert((0.0, 0));
                slot.0 += ms as f64;
                slot.1 += 1;
            }
        }

        for (system, (sum, count)) in durations {
            if let Some(entry) = by_system.get_mut(&system) {
                entry.average_duration_ms = Some(sum / count as f64);
            }
        }

        Self::from_systems(by_system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn finished(system: &str, ok: bool, ms: i64) -> Execution {
        let mut exec = Execution::new(system, None, vec![]);
        let done = exec.created_at + Duration::milliseconds(ms);
        if ok {
            exec.complete(done).unwrap();
        } else {
            exec.fail(done, "boom").unwrap();
        }
        exec
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = ExecutionMetrics::from_executions(&Vec::<Execution>::new());
        assert_eq!(metrics.total_executions, 0);
        assert_eq!(metrics.success_rate, 0.0);
        assert!(metrics.average_duration_ms.is_none());
        assert!(metrics.by_system.is_empty());
    }

    #[test]
    fn test_metrics_per_system() {
        let executions = vec![
            finished("hvac-v2", true, 100),
            finished("hvac-v2", false, 300),
            finished("lighting", true, 200),
            Execution::new("lighting", None, vec![]),
        ];

        let metrics = ExecutionMetrics::from_executions(&executions);
        assert_eq!(metrics.total_executions, 4);
        assert_eq!(metrics.running, 1);
        assert_eq!(metrics.completed, 2);
        assert_eq!(metrics.failed, 1);
        assert!((metrics.success_rate - 66.666).abs() < 0.01);
        assert_eq!(metrics.average_duration_ms, Some(200.0));

        let hvac = &metrics.by_system["hvac-v2"];
        assert_eq!(hvac.total, 2);
        assert_eq!(hvac.average_duration_ms, Some(200.0));

        let lighting = &metrics.by_system["lighting"];
        assert_eq!(lighting.running, 1);
        assert_eq!(lighting.average_duration_ms, Some(200.0));
    }
}
