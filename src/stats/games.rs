use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::{GameLevel, GameRecord};

/// Mini-games recorded on the games result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Game {
    Memory,
    Zzle,
}

impl Game {
    pub const ALL: [Game; 2] = [Game::Memory, Game::Zzle];

    /// Name the platform stores the game under.
    pub fn name(self) -> &'static str {
        match self {
            Game::Memory => "memory",
            Game::Zzle => "zzle",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Game::Memory => "Memory Game",
            Game::Zzle => "Zzle Game",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
    pub name: String,
    pub max_level: u32,
    pub total_attempts: u64,
    pub distinct_levels: usize,
    pub duration_minutes: Option<i64>,
    pub points: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub levels: Vec<GameLevel>,
}

impl GameStats {
    pub fn avg_attempts_per_level(&self) -> f64 {
        if self.distinct_levels == 0 {
            return 0.0;
        }
        self.total_attempts as f64 / self.distinct_levels as f64
    }

    pub fn avg_attempts_label(&self) -> String {
        format!("{:.1}", self.avg_attempts_per_level())
    }
}

/// Statistics for `game`, or `None` when it was never played.
pub fn game_stats(games: &[GameRecord], game: Game) -> Option<GameStats> {
    let game = games.iter().find(|record| record.name == game.name())?;
    let max_level = game.results.iter().map(|result| result.level).max()?;

    let distinct: BTreeSet<u32> = game.results.iter().map(|result| result.level).collect();
    Some(GameStats {
        name: game.name.clone(),
        max_level,
        total_attempts: game
            .results
            .iter()
            .map(|result| u64::from(result.attempts))
            .sum(),
        distinct_levels: distinct.len(),
        duration_minutes: game
            .duration
            .map(|seconds| (seconds / 60.0).round() as i64),
        points: game.points,
        started_at: game.started_at,
        levels: game.results.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(results: &[(u32, u32)], duration: Option<f64>) -> GameRecord {
        GameRecord {
            name: Game::Memory.name().to_string(),
            results: results
                .iter()
                .map(|&(level, attempts)| GameLevel { level, attempts })
                .collect(),
            duration,
            points: Some(120.0),
            started_at: None,
        }
    }

    #[test]
    fn summarises_levels_and_attempts() {
        let games = vec![memory(&[(1, 1), (2, 3), (3, 2)], Some(630.0))];
        let stats = game_stats(&games, Game::Memory).unwrap();

        assert_eq!(stats.max_level, 3);
        assert_eq!(stats.total_attempts, 6);
        assert_eq!(stats.avg_attempts_label(), "2.0");
        assert_eq!(stats.duration_minutes, Some(11));
    }

    #[test]
    fn average_divides_by_distinct_levels() {
        let games = vec![memory(&[(1, 2), (1, 3), (2, 2)], None)];
        let stats = game_stats(&games, Game::Memory).unwrap();

        assert_eq!(stats.distinct_levels, 2);
        assert_eq!(stats.avg_attempts_label(), "3.5");
        assert_eq!(stats.duration_minutes, None);
    }

    #[test]
    fn missing_or_empty_games_yield_none() {
        let games = vec![memory(&[], Some(60.0))];
        assert!(game_stats(&games, Game::Memory).is_none());
        assert!(game_stats(&games, Game::Zzle).is_none());
        assert!(game_stats(&[], Game::Memory).is_none());
    }
}
