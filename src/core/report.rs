use crate::core::grid::count_completed_lines;
use crate::core::roster::{rank, total_collected};
use crate::domain::model::Student;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub lines: usize,
    pub collected: u64,
}

pub fn leaderboard(students: &[Student]) -> Vec<LeaderboardRow> {
    rank(students)
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardRow {
            rank: i + 1,
            id: s.id.to_string(),
            name: s.name.clone(),
            lines: count_completed_lines(&s.card_counts),
            collected: s.total_collected(),
        })
        .collect()
}

pub fn write_csv<W: Write>(rows: &[LeaderboardRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Plain-text leaderboard with the two headline totals.
pub fn render_table(students: &[Student], title: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(title) = title {
        lines.push(title.to_string());
    }
    lines.push(format!(
        "Students: {}  Cards collected: {}",
        students.len(),
        total_collected(students)
    ));
    let rows = leaderboard(students);
    if rows.is_empty() {
        lines.push("No students yet.".to_string());
    }
    for row in rows {
        let badge = if row.lines > 0 {
            format!("  {} LINES!", row.lines)
        } else {
            String::new()
        };
        lines.push(format!(
            "{:>3}. {} [{}]  Collected: {}{}",
            row.rank, row.name, row.id, row.collected, badge
        ));
    }
    lines.join("\n")
}
