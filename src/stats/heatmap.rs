use chrono::{Datelike, TimeZone, Timelike};

use crate::models::Transaction;

pub const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const FULL_DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Row index for a weekday name: any prefix of the full name from three
/// letters up, in any case (`mon`, `Tues`, `sunday`).
pub fn day_index(name: &str) -> Option<usize> {
    let name = name.trim().to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    FULL_DAY_NAMES.iter().position(|day| day.starts_with(&name))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatCell {
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Intensity {
    /// `ratio` is a cell count divided by the busiest cell's count.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 0.0 {
            Intensity::None
        } else if ratio <= 0.2 {
            Intensity::Low
        } else if ratio <= 0.4 {
            Intensity::Medium
        } else if ratio <= 0.6 {
            Intensity::High
        } else {
            Intensity::VeryHigh
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Intensity::None => "#ebedf0",
            Intensity::Low => "#c6e48b",
            Intensity::Medium => "#7bc96f",
            Intensity::High => "#239a3b",
            Intensity::VeryHigh => "#196127",
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Intensity::None => '.',
            Intensity::Low => '░',
            Intensity::Medium => '▒',
            Intensity::High => '▓',
            Intensity::VeryHigh => '█',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Intensity::None => "No activity",
            Intensity::Low => "Low",
            Intensity::Medium => "Medium",
            Intensity::High => "High",
            Intensity::VeryHigh => "Very High",
        }
    }

    pub const ALL: [Intensity; 5] = [
        Intensity::None,
        Intensity::Low,
        Intensity::Medium,
        Intensity::High,
        Intensity::VeryHigh,
    ];
}

/// 7x24 activity grid, rows are Monday-first weekdays and columns hours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heatmap {
    cells: [[HeatCell; 24]; 7],
}

impl Heatmap {
    pub fn build<Tz: TimeZone>(transactions: &[Transaction], tz: &Tz) -> Self {
        let mut heatmap = Heatmap::default();
        for tx in transactions {
            let local = tx.created_at.with_timezone(tz);
            let day = local.weekday().num_days_from_monday() as usize;
            let hour = local.hour() as usize;
            let cell = &mut heatmap.cells[day][hour];
            cell.count += 1;
            cell.transactions.push(tx.clone());
        }
        heatmap
    }

    pub fn cell(&self, day: usize, hour: usize) -> Option<&HeatCell> {
        self.cells.get(day).and_then(|row| row.get(hour))
    }

    pub fn rows(&self) -> &[[HeatCell; 24]; 7] {
        &self.cells
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().map(|cell| cell.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .map(|cell| cell.count)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Weekday index with the most activity; the earliest day wins ties.
    pub fn peak_day(&self) -> usize {
        let mut best = (0, 0);
        for (day, row) in self.cells.iter().enumerate() {
            let sum: usize = row.iter().map(|cell| cell.count).sum();
            if sum > best.1 {
                best = (day, sum);
            }
        }
        best.0
    }

    /// Hour of the single busiest cell; the first cell scanned wins ties.
    pub fn peak_hour(&self) -> usize {
        let mut best = (0, 0);
        for row in &self.cells {
            for (hour, cell) in row.iter().enumerate() {
                if cell.count > best.1 {
                    best = (hour, cell.count);
                }
            }
        }
        best.0
    }

    pub fn intensity(&self, day: usize, hour: usize) -> Intensity {
        let max = self.max_count();
        let count = self.cell(day, hour).map(|cell| cell.count).unwrap_or(0);
        if max == 0 {
            return Intensity::None;
        }
        Intensity::from_ratio(count as f64 / max as f64)
    }
}
