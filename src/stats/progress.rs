use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};

use crate::models::Transaction;

/// One point of the cumulative XP curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyXp {
    pub date: NaiveDate,
    pub daily_xp: f64,
    pub cumulative_xp: f64,
    pub transactions: Vec<Transaction>,
}

/// Groups xp transactions by calendar day in `tz` and produces a running total
/// over the days in ascending order.
pub fn cumulative_xp<Tz: TimeZone>(transactions: &[Transaction], tz: &Tz) -> Vec<DailyXp> {
    let mut days: BTreeMap<NaiveDate, (f64, Vec<Transaction>)> = BTreeMap::new();

    for tx in transactions.iter().filter(|tx| tx.is_xp()) {
        let date = tx.created_at.with_timezone(tz).date_naive();
        let entry = days.entry(date).or_insert_with(|| (0.0, Vec::new()));
        entry.0 += tx.xp();
        entry.1.push(tx.clone());
    }

    let mut running = 0.0;
    days.into_iter()
        .map(|(date, (daily_xp, mut transactions))| {
            transactions.sort_by_key(|tx| tx.created_at);
            running += daily_xp;
            DailyXp {
                date,
                daily_xp,
                cumulative_xp: running,
                transactions,
            }
        })
        .collect()
}

pub fn total_xp(series: &[DailyXp]) -> f64 {
    series.last().map(|day| day.cumulative_xp).unwrap_or(0.0)
}

/// Mean of the daily sums, rounded. Zero for an empty series.
pub fn average_daily_xp(series: &[DailyXp]) -> i64 {
    if series.is_empty() {
        return 0;
    }
    let total: f64 = series.iter().map(|day| day.daily_xp).sum();
    (total / series.len() as f64).round() as i64
}

pub fn day(series: &[DailyXp], date: NaiveDate) -> Option<&DailyXp> {
    series
        .binary_search_by_key(&date, |day| day.date)
        .ok()
        .map(|index| &series[index])
}
