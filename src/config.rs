use std::path::PathBuf;

use crate::stats::programs::ProgramRules;

pub const DEFAULT_DOMAIN: &str = "01.tomorrow-school.ai";
pub const DEFAULT_GAMES_RESULT_ID: i64 = 14389;

#[derive(Debug, Clone)]
pub struct Config {
    pub domain: String,
    pub campus: String,
    pub session_path: PathBuf,
    pub games_result_id: i64,
}

impl Config {
    pub fn new(domain: impl Into<String>, campus: impl Into<String>, session_path: PathBuf) -> Self {
        Self {
            domain: domain.into(),
            campus: campus.into(),
            session_path,
            games_result_id: DEFAULT_GAMES_RESULT_ID,
        }
    }

    pub fn with_games_result_id(mut self, games_result_id: i64) -> Self {
        self.games_result_id = games_result_id;
        self
    }

    /// Accepts either a bare host or a full origin.
    fn origin(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    pub fn auth_url(&self) -> String {
        format!("{}/api/auth/signin", self.origin())
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/api/graphql-engine/v1/graphql", self.origin())
    }

    pub fn program_rules(&self) -> ProgramRules {
        ProgramRules::for_campus(&self.campus)
    }
}

/// `<config dir>/learner-dashboard/session.json`, relative to the working
/// directory when the platform has no config directory.
pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join("learner-dashboard")
        .join("session.json")
}
