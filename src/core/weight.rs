use crate::domain::model::WeightEntry;
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

pub const DEFAULT_HEIGHT_CM: f64 = 173.0;

/// BMI rounded to one decimal. `None` for a missing or non-positive weight.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    Some((bmi * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 24.9 {
            BmiCategory::Normal
        } else if bmi < 29.9 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Badge colour.
    pub fn color(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "#facc15",
            BmiCategory::Normal => "#22c55e",
            BmiCategory::Overweight => "#f97316",
            BmiCategory::Obese => "#ef4444",
        }
    }
}

/// 距離目標日還有幾天；過了就是 None
pub fn days_remaining(day: NaiveDate, target: NaiveDate) -> Option<i64> {
    let days = (target - day).num_days();
    (days >= 0).then_some(days)
}

pub fn date_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub days_left: Option<i64>,
    pub is_today: bool,
    pub entry: Option<WeightEntry>,
}

/// One calendar page, weeks starting on Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthView {
    pub title: String,
    pub leading_blanks: usize,
    pub days: Vec<DayCell>,
}

impl MonthView {
    pub fn build(
        year: i32,
        month: u32,
        today: NaiveDate,
        target: NaiveDate,
        entries: &BTreeMap<String, WeightEntry>,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = first.checked_add_months(Months::new(1))?;

        let days = first
            .iter_days()
            .take_while(|d| *d < next)
            .map(|date| DayCell {
                date,
                days_left: days_remaining(date, target),
                is_today: date == today,
                entry: entries.get(&date_key(date)).copied(),
            })
            .collect();

        Some(Self {
            title: first.format("%B %Y").to_string(),
            leading_blanks: first.weekday().num_days_from_sunday() as usize,
            days,
        })
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title.clone()];
        for day in &self.days {
            let mut line = format!("{:>2}", day.date.day());
            if day.is_today {
                line.push_str(" (today)");
            }
            if let Some(left) = day.days_left {
                line.push_str(&format!("  {} days", left));
            }
            if let Some(entry) = day.entry {
                line.push_str(&format!(
                    "  {}kg BMI {:.1} {}",
                    entry.weight,
                    entry.bmi,
                    BmiCategory::classify(entry.bmi).label()
                ));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calculate_bmi() {
        assert_eq!(calculate_bmi(70.0, 173.0), Some(23.4));
        assert_eq!(calculate_bmi(0.0, 173.0), None);
        assert_eq!(calculate_bmi(-3.0, 173.0), None);
        assert_eq!(calculate_bmi(f64::NAN, 173.0), None);
    }

    #[test]
    fn test_bmi_thresholds() {
        assert_eq!(BmiCategory::classify(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::classify(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::classify(24.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::classify(29.9), BmiCategory::Obese);
        assert_eq!(BmiCategory::Normal.color(), "#22c55e");
    }

    #[test]
    fn test_days_remaining() {
        let target = day(2026, 7, 25);
        assert_eq!(days_remaining(day(2026, 7, 25), target), Some(0));
        assert_eq!(days_remaining(day(2026, 7, 1), target), Some(24));
        assert_eq!(days_remaining(day(2025, 12, 31), target), Some(206));
        assert_eq!(days_remaining(day(2026, 7, 26), target), None);
    }

    #[test]
    fn test_date_key_round_trip() {
        assert_eq!(date_key(day(2026, 3, 9)), "2026-03-09");
        assert_eq!(parse_date_key("2026-03-09"), Some(day(2026, 3, 9)));
        assert_eq!(parse_date_key("03/09/2026"), None);
    }

    #[test]
    fn test_month_view_layout() {
        let mut entries = BTreeMap::new();
        entries.insert(
            "2026-07-04".to_string(),
            WeightEntry { weight: 70.0, bmi: 23.4 },
        );
        let view = MonthView::build(2026, 7, day(2026, 7, 4), day(2026, 7, 25), &entries).unwrap();
        assert_eq!(view.title, "July 2026");
        // 2026-07-01 is a Wednesday
        assert_eq!(view.leading_blanks, 3);
        assert_eq!(view.days.len(), 31);
        assert!(view.days[3].is_today);
        assert!(view.days[3].entry.is_some());
        assert_eq!(view.days[24].days_left, Some(0));
        assert_eq!(view.days[25].days_left, None);
        assert!(MonthView::build(2026, 13, day(2026, 7, 4), day(2026, 7, 25), &entries).is_none());
    }
}
