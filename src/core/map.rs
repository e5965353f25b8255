use crate::core::grid::winning_positions;
use crate::domain::model::{Position, Student, GRID_SIZE};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCell {
    pub position: Position,
    pub count: u32,
    pub marked: bool,
    pub winner: bool,
}

/// The shared 5x5 overview highlighting one student's card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMap {
    pub label: String,
    pub active: bool,
    cells: Vec<MapCell>,
}

impl GlobalMap {
    pub fn for_student(student: Option<&Student>) -> Self {
        let Some(student) = student else {
            return Self {
                label: "Bingo Map (select a student to view progress)".to_string(),
                active: false,
                cells: Position::all()
                    .map(|position| MapCell {
                        position,
                        count: 0,
                        marked: false,
                        winner: false,
                    })
                    .collect(),
            };
        };

        let winners = winning_positions(&student.card_counts);
        let cells = student
            .card_counts
            .iter()
            .map(|(position, count)| MapCell {
                position,
                count,
                marked: count > 0,
                winner: winners.contains(&position),
            })
            .collect();

        Self {
            label: format!("Viewing Map for: {}", student.name),
            active: true,
            cells,
        }
    }

    pub fn cells(&self) -> &[MapCell] {
        &self.cells
    }

    pub fn cell(&self, position: Position) -> MapCell {
        self.cells[position.index()]
    }

    /// `[ n]` plain, `( n)` collected, `*n*` on a completed line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.label);
        for row in self.cells.chunks(GRID_SIZE) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| {
                    let n = cell.position.number();
                    if cell.winner {
                        format!("*{:>2}*", n)
                    } else if cell.marked {
                        format!("({:>2})", n)
                    } else {
                        format!("[{:>2}]", n)
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StudentId;

    #[test]
    fn test_idle_map() {
        let map = GlobalMap::for_student(None);
        assert!(!map.active);
        assert_eq!(map.cells().len(), 25);
        assert!(map.cells().iter().all(|c| !c.marked && !c.winner));
    }

    #[test]
    fn test_marks_and_winners() {
        let mut student = Student::new(StudentId::from("1"), "Amy");
        for n in [5u8, 9, 13, 17, 21, 2] {
            student.card_counts.increment(Position::try_from(n).unwrap());
        }
        let map = GlobalMap::for_student(Some(&student));
        assert_eq!(map.label, "Viewing Map for: Amy");
        let two = map.cell(Position::try_from(2).unwrap());
        assert!(two.marked && !two.winner);
        assert!(map.cell(Position::try_from(21).unwrap()).winner);

        let rendered = map.render();
        assert!(rendered.contains("* 5*"));
        assert!(rendered.contains("( 2)"));
        assert!(rendered.contains("[ 1]"));
        assert_eq!(rendered.lines().count(), 1 + GRID_SIZE);
    }
}
