//! Output formatting for CLI reports

use crate::{
    grid::{Action, CellKind, GridLayout},
    pipeline::{EvaluationReport, RolloutEnd, TrainingResult},
    q_learning::{PolicyMap, QTable, StateValueMap},
};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// One line per free state: `State (r, c): up=.. down=.. left=.. right=..`
pub fn format_q_values(table: &QTable, layout: &GridLayout) -> Vec<String> {
    layout
        .free_cells()
        .iter()
        .map(|&pos| {
            let values = Action::ALL
                .iter()
                .map(|&action| format!("{}={:.4}", action.label(), table.get(pos, action)))
                .collect::<Vec<_>>()
                .join(" ");
            format!("State {pos}: {values}")
        })
        .collect()
}

pub fn print_layout(layout: &GridLayout) {
    print_subsection("Layout");
    println!("{layout}");
    print_kv("Size", &format!("{} x {}", layout.rows(), layout.cols()));
    print_kv("Free cells", &format_number(layout.free_cells().len()));
    print_kv("Goal cells", &format_number(layout.goal_cells().len()));
    print_kv(
        "Forbidden cells",
        &format_number(layout.count(CellKind::Forbidden)),
    );
}

pub fn print_training_result(result: &TrainingResult) {
    print_subsection("Training");
    print_kv("Episodes", &format_number(result.total_episodes));
    print_kv(
        "Reached goal",
        &format!(
            "{} ({})",
            format_number(result.successes),
            format_percent(result.success_rate)
        ),
    );
    print_kv("Hit step cap", &format_number(result.timeouts));
    print_kv("Mean steps", &format!("{:.2}", result.mean_steps));
    print_kv("Mean return", &format!("{:.3}", result.mean_return));
    print_kv("Final epsilon", &format!("{:.4}", result.final_epsilon));
}

pub fn print_q_values(table: &QTable, layout: &GridLayout) {
    print_subsection("Q-values");
    for line in format_q_values(table, layout) {
        println!("{line}");
    }
}

pub fn print_policy(policy: &PolicyMap) {
    print_subsection("Greedy policy");
    println!("{policy}");
}

pub fn print_state_values(values: &StateValueMap) {
    print_subsection("State values (mean over actions)");
    println!("{values}");
    if let Some((low, high)) = values.range() {
        print_kv("Range", &format!("{low:.3} .. {high:.3}"));
    }
}

pub fn print_evaluation(report: &EvaluationReport) {
    print_subsection("Greedy evaluation");
    print_kv("Starts", &format_number(report.rollouts.len()));
    print_kv("Reach goal", &format_percent(report.success_rate));
    if let Some(mean) = report.mean_steps_to_goal {
        print_kv("Mean steps to goal", &format!("{mean:.2}"));
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("  Starts that never reach the goal:");
        for rollout in failures {
            let reason = match rollout.end {
                RolloutEnd::Cycle => "cycles",
                RolloutEnd::StepLimit => "hits step limit",
                RolloutEnd::ReachedGoal => continue,
            };
            println!("    {} {reason} after {} steps", rollout.start, rollout.steps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(50000), "50,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_q_values_listed_for_free_cells_only() {
        let layout = GridLayout::from_codes(&[[0, -1, 1]]).unwrap();
        let mut table = QTable::zeros(1, 3);
        table.set(GridPos::new(0, 0), Action::Right, 0.5);

        let lines = format_q_values(&table, &layout);
        assert_eq!(
            lines,
            vec!["State (0, 0): up=0.0000 down=0.0000 left=0.0000 right=0.5000".to_string()]
        );
    }
}
