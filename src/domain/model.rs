use crate::utils::error::TrackerError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 棋盤邊長
pub const GRID_SIZE: usize = 5;
/// 格子總數
pub const POSITION_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// One numbered cell of the 5x5 card, always in `1..=25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct Position(u8);

impl Position {
    /// `p = r * N + c + 1`, rows and columns 0-indexed.
    pub const fn from_row_col(row: usize, col: usize) -> Position {
        assert!(row < GRID_SIZE && col < GRID_SIZE);
        Position((row * GRID_SIZE + col + 1) as u8)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn row(self) -> usize {
        (self.0 as usize - 1) / GRID_SIZE
    }

    pub fn col(self) -> usize {
        (self.0 as usize - 1) % GRID_SIZE
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (1..=POSITION_COUNT as u8).map(Position)
    }
}

impl TryFrom<u8> for Position {
    type Error = TrackerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=POSITION_COUNT as u8).contains(&value) {
            Ok(Position(value))
        } else {
            Err(TrackerError::ValidationError {
                message: format!("Position {} is outside 1..={}", value, POSITION_COUNT),
            })
        }
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> u8 {
        position.0
    }
}

impl FromStr for Position {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| TrackerError::ValidationError {
            message: format!("'{}' is not a card number", s),
        })?;
        Position::try_from(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-position collection counters. All 25 positions are always present.
///
/// Stored as `{"1": 0, ..., "25": 0}`. Keys outside the card are dropped and
/// missing ones read as zero, so a hand-edited blob cannot break the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>", into = "BTreeMap<u8, u32>")]
pub struct CardCounts([u32; POSITION_COUNT]);

impl CardCounts {
    pub fn new() -> Self {
        CardCounts([0; POSITION_COUNT])
    }

    pub fn get(&self, position: Position) -> u32 {
        self.0[position.index()]
    }

    pub fn is_collected(&self, position: Position) -> bool {
        self.get(position) > 0
    }

    pub fn increment(&mut self, position: Position) {
        let slot = &mut self.0[position.index()];
        *slot = slot.saturating_add(1);
    }

    /// Returns false when the count was already zero.
    pub fn decrement(&mut self, position: Position) -> bool {
        let slot = &mut self.0[position.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::all().map(move |p| (p, self.get(p)))
    }
}

impl Default for CardCounts {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for CardCounts {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        let mut counts = CardCounts::new();
        for (key, value) in map {
            let position = key.trim().parse::<u8>().ok().and_then(|n| Position::try_from(n).ok());
            let Some(position) = position else {
                tracing::debug!("Dropping out-of-range card key {}", key);
                continue;
            };
            match count_from_json(&value) {
                Some(count) => counts.0[position.index()] = count,
                None => tracing::debug!("Dropping unreadable count {} for card {}", value, key),
            }
        }
        counts
    }
}

// 非負整數才算數；2.0 這種整數值的浮點數也接受
fn count_from_json(value: &serde_json::Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then(|| f.min(u32::MAX as f64) as u32)
}

impl From<CardCounts> for BTreeMap<u8, u32> {
    fn from(counts: CardCounts) -> Self {
        counts.iter().map(|(p, c)| (p.number(), c)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        StudentId(value.to_string())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        StudentId(value)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(rename = "cardCounts", default)]
    pub card_counts: CardCounts,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            card_counts: CardCounts::new(),
        }
    }

    pub fn total_collected(&self) -> u64 {
        self.card_counts.total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Guest,
    Admin,
}

/// One day of the weight calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub weight: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub bmi: f64,
}

// 舊資料的 bmi 是 toFixed(1) 產生的字串
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
