use crate::phrase::LevelStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Total")]
    total: usize,
    #[tabled(rename = "Done")]
    completed: usize,
    #[tabled(rename = "Left")]
    remaining: usize,
    #[tabled(rename = "Progress")]
    progress: String,
}

impl LevelRow {
    fn new(level: String, total: usize, completed: usize) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Self {
            level,
            total,
            completed,
            remaining: total - completed,
            progress: format!("{:.0}%", progress),
        }
    }
}

/// One row per level plus an `All` totals row; empty input gives an empty string
pub fn level_table(stats: &[LevelStats]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let mut rows: Vec<LevelRow> = stats
        .iter()
        .map(|s| LevelRow::new(s.level.to_string(), s.total, s.completed))
        .collect();

    let total = stats.iter().map(|s| s.total).sum();
    let completed = stats.iter().map(|s| s.completed).sum();
    rows.push(LevelRow::new("All".to_string(), total, completed));

    Table::new(rows).with(Style::rounded()).to_string()
}
