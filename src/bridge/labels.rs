//! Unique labels for batch tasks.

use super::AgentTask;
use std::collections::HashSet;

/// Assign a unique label to every task, in input order.
///
/// Explicit labels are reserved first and kept as given. Unlabelled tasks
/// take their agent name, or `agent-2`, `agent-3`, ... when that is taken.
/// The tasks themselves are not modified.
pub fn assign_labels(tasks: &[AgentTask]) -> Vec<String> {
    let mut reserved: HashSet<String> = tasks.iter().filter_map(|t| t.label.clone()).collect();

    tasks
        .iter()
        .map(|task| {
            if let Some(label) = &task.label {
                return label.clone();
            }

            let base = task.agent.as_str();
            if reserved.insert(base.to_string()) {
                return base.to_string();
            }

            let mut n = 2;
            loop {
                let candidate = format!("{}-{}", base, n);
                if reserved.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}
