use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::stats::heatmap::{Heatmap, DAY_NAMES};
use crate::stats::progress::DailyXp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dataset {
    /// Daily and cumulative XP
    Xp,
    /// Weekday by hour activity counts
    Heatmap,
}

#[derive(Serialize)]
struct DailyXpRow {
    date: String,
    daily_xp: f64,
    cumulative_xp: f64,
    transactions: usize,
}

#[derive(Serialize)]
struct HeatCellRow {
    day: &'static str,
    hour: usize,
    count: usize,
    intensity: &'static str,
    color: &'static str,
}

pub fn write_progress<W: Write>(writer: W, series: &[DailyXp]) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for day in series {
        csv_writer.serialize(DailyXpRow {
            date: day.date.to_string(),
            daily_xp: day.daily_xp,
            cumulative_xp: day.cumulative_xp,
            transactions: day.transactions.len(),
        })?;
    }
    csv_writer.flush()?;
    Ok(series.len())
}

/// One row per cell, all 168 of them, Monday 00 first.
pub fn write_heatmap<W: Write>(writer: W, heatmap: &Heatmap) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for (day, row) in heatmap.rows().iter().enumerate() {
        for (hour, cell) in row.iter().enumerate() {
            let intensity = heatmap.intensity(day, hour);
            csv_writer.serialize(HeatCellRow {
                day: DAY_NAMES[day],
                hour,
                count: cell.count,
                intensity: intensity.label(),
                color: intensity.color(),
            })?;
            rows += 1;
        }
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn create_file(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))
}
