use crate::domain::model::{CardCounts, Position, GRID_SIZE};
use std::collections::BTreeSet;

/// Rows, columns and both diagonals.
pub const LINE_COUNT: usize = 2 * GRID_SIZE + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Row(usize),
    Column(usize),
    MainDiagonal,
    AntiDiagonal,
}

#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub kind: LineKind,
    pub positions: [Position; GRID_SIZE],
}

impl Line {
    pub fn is_complete(&self, counts: &CardCounts) -> bool {
        self.positions.iter().all(|&p| counts.is_collected(p))
    }
}

pub static LINES: [Line; LINE_COUNT] = build_lines();

const fn build_lines() -> [Line; LINE_COUNT] {
    let placeholder = Line {
        kind: LineKind::MainDiagonal,
        positions: [Position::from_row_col(0, 0); GRID_SIZE],
    };
    let mut lines = [placeholder; LINE_COUNT];

    let mut r = 0;
    while r < GRID_SIZE {
        let mut row = [Position::from_row_col(0, 0); GRID_SIZE];
        let mut col = [Position::from_row_col(0, 0); GRID_SIZE];
        let mut i = 0;
        while i < GRID_SIZE {
            row[i] = Position::from_row_col(r, i);
            col[i] = Position::from_row_col(i, r);
            i += 1;
        }
        lines[r] = Line {
            kind: LineKind::Row(r),
            positions: row,
        };
        lines[GRID_SIZE + r] = Line {
            kind: LineKind::Column(r),
            positions: col,
        };
        r += 1;
    }

    let mut main = [Position::from_row_col(0, 0); GRID_SIZE];
    let mut anti = [Position::from_row_col(0, 0); GRID_SIZE];
    let mut i = 0;
    while i < GRID_SIZE {
        main[i] = Position::from_row_col(i, i);
        anti[i] = Position::from_row_col(i, GRID_SIZE - 1 - i);
        i += 1;
    }
    lines[2 * GRID_SIZE] = Line {
        kind: LineKind::MainDiagonal,
        positions: main,
    };
    lines[2 * GRID_SIZE + 1] = Line {
        kind: LineKind::AntiDiagonal,
        positions: anti,
    };
    lines
}

pub fn completed_lines(counts: &CardCounts) -> impl Iterator<Item = &'static Line> + '_ {
    LINES.iter().filter(move |line| line.is_complete(counts))
}

/// 完成的連線數 (0..=12)
pub fn count_completed_lines(counts: &CardCounts) -> usize {
    completed_lines(counts).count()
}

/// Every position that sits on at least one completed line.
pub fn winning_positions(counts: &CardCounts) -> BTreeSet<Position> {
    completed_lines(counts)
        .flat_map(|line| line.positions.iter().copied())
        .collect()
}
