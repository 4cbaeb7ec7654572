use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};

use crate::dashboard::{Dashboard, Loaded};
use crate::models::{GameRecord, ProgressRecord, Profile, PublicUser, Transaction};
use crate::stats::audits::{AuditBreakdown, AuditCounts};
use crate::stats::games::{self, Game, GameStats};
use crate::stats::heatmap::{Heatmap, Intensity, DAY_NAMES};
use crate::stats::programs::{Program, ProgramStats};
use crate::stats::progress::{self, DailyXp};
use crate::stats::projects::{self, ProjectOutcomes};
use crate::stats::skills::Skill;
use crate::stats::teamwork::Teamwork;

pub const ERROR_LOADING: &str = "Error loading data";
const DEGRADED: &str = "--";
const MISSING: &str = "—";
const NOT_SPECIFIED: &str = "Not specified";

const PROFILE_ATTRS: [(&str, &str); 8] = [
    ("phone", "Phone"),
    ("gender", "Gender"),
    ("dateOfBirth", "Date of birth"),
    ("placeOfBirth", "Place of birth"),
    ("addressCountry", "Country"),
    ("addressCity", "City"),
    ("addressStreet", "Street"),
    ("firstNameCyr", "Name (Cyrillic)"),
];

/// Which part of a program the `show program` view focuses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProgramView {
    Xp,
    Level,
    Transactions,
}

/// Whole amount with thousands separators, e.g. `1,234,567`.
pub fn format_amount(value: f64) -> String {
    let whole = value.floor() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

fn format_optional_date(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp
        .map(format_date)
        .unwrap_or_else(|| MISSING.to_string())
}

/// `dd.mm.yyyy` for ISO dates, anything else verbatim.
fn format_birth_date(raw: &str) -> String {
    raw.get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio
        .map(|ratio| format!("{ratio:.1}"))
        .unwrap_or_else(|| MISSING.to_string())
}

fn degraded(output: &mut String, labels: &[&str]) {
    let _ = writeln!(output, "_{ERROR_LOADING}_");
    for label in labels {
        let _ = writeln!(output, "- {label}: {DEGRADED}");
    }
}

fn write_profile(output: &mut String, profile: &Loaded<Profile>) {
    let _ = writeln!(output, "## Profile");
    let profile = match profile {
        Ok(profile) => profile,
        Err(_) => {
            degraded(output, &["Login", "Name", "Email"]);
            return;
        }
    };

    let name = profile.full_name();
    let _ = writeln!(output, "- Login: {}", profile.login);
    let _ = writeln!(
        output,
        "- Name: {}",
        if name.is_empty() { MISSING } else { name.as_str() }
    );
    let _ = writeln!(
        output,
        "- Email: {}",
        profile.email.as_deref().unwrap_or(NOT_SPECIFIED)
    );
    let _ = writeln!(
        output,
        "- Member since: {}",
        format_optional_date(profile.created_at.as_ref())
    );
    for (key, label) in PROFILE_ATTRS {
        let value = match profile.attr(key) {
            Some(raw) if key == "dateOfBirth" => format_birth_date(raw),
            Some(raw) => raw.to_string(),
            None => NOT_SPECIFIED.to_string(),
        };
        let _ = writeln!(output, "- {label}: {value}");
    }

    let emergency = [
        profile.attr("emergencyFirstName"),
        profile.attr("emergencyLastName"),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    let _ = writeln!(
        output,
        "- Emergency contact: {}",
        if emergency.is_empty() {
            NOT_SPECIFIED
        } else {
            emergency.as_str()
        }
    );
}

fn write_programs(output: &mut String, programs: &[(Program, Loaded<ProgramStats>)]) {
    let _ = writeln!(output, "## Programs");
    for (program, stats) in programs {
        match stats {
            Ok(stats) => {
                let _ = writeln!(
                    output,
                    "- {}: level {}, {} XP across {} transactions",
                    program.title(),
                    stats.level,
                    format_amount(stats.xp),
                    stats.transactions
                );
            }
            Err(_) => {
                let _ = writeln!(
                    output,
                    "- {}: level {DEGRADED}, {DEGRADED} XP ({ERROR_LOADING})",
                    program.title()
                );
            }
        }
    }
}

fn write_global_stats(
    output: &mut String,
    breakdown: &Loaded<AuditBreakdown>,
    counts: &Loaded<AuditCounts>,
    outcomes: &Loaded<ProjectOutcomes>,
) {
    let _ = writeln!(output, "## Global Stats");

    match breakdown {
        Ok(breakdown) => {
            let _ = writeln!(
                output,
                "- Audit ratio: {} (done {}, received {})",
                format_ratio(breakdown.ratio),
                format_amount(breakdown.done),
                format_amount(breakdown.received)
            );
        }
        Err(_) => {
            let _ = writeln!(output, "- Audit ratio: {DEGRADED} ({ERROR_LOADING})");
        }
    }

    match counts {
        Ok(counts) => {
            let _ = writeln!(
                output,
                "- Audits: {} total, {} succeeded, {} failed ({}% success)",
                counts.total(),
                counts.succeeded,
                counts.failed,
                counts.success_rate_label()
            );
        }
        Err(_) => {
            let _ = writeln!(output, "- Audits: {DEGRADED} ({ERROR_LOADING})");
        }
    }

    match outcomes {
        Ok(outcomes) => {
            let groups = projects::group_failures(&outcomes.failed);
            let _ = writeln!(
                output,
                "- Successful projects: {}",
                outcomes.succeeded.len()
            );
            let _ = writeln!(
                output,
                "- Failed projects: {} attempts across {} projects",
                outcomes.failed.len(),
                groups.len()
            );
        }
        Err(_) => {
            let _ = writeln!(output, "- Successful projects: {DEGRADED}");
            let _ = writeln!(output, "- Failed projects: {DEGRADED} ({ERROR_LOADING})");
        }
    }
}

fn write_games(output: &mut String, records: &Loaded<Vec<GameRecord>>) {
    let _ = writeln!(output, "## Games");
    let records = match records {
        Ok(records) => records,
        Err(_) => {
            degraded(output, &[Game::Memory.title(), Game::Zzle.title()]);
            return;
        }
    };

    for game in Game::ALL {
        match games::game_stats(records, game) {
            Some(stats) => {
                let _ = writeln!(
                    output,
                    "- {}: level {}, {} attempts ({} per level)",
                    game.title(),
                    stats.max_level,
                    stats.total_attempts,
                    stats.avg_attempts_label()
                );
            }
            None => {
                let _ = writeln!(output, "- {}: No game data available", game.title());
            }
        }
    }
}

fn write_skills(output: &mut String, skills: &Loaded<Vec<Skill>>) {
    let _ = writeln!(output, "## Skills");
    match skills {
        Ok(skills) if skills.is_empty() => {
            let _ = writeln!(output, "No skills data available.");
        }
        Ok(skills) => {
            for skill in skills {
                let _ = writeln!(output, "- {}: {}%", skill.label(), skill.amount);
            }
        }
        Err(_) => degraded(output, &["Skills"]),
    }
}

/// ASCII rendition of the weekday by hour grid, one glyph per intensity step.
pub fn heatmap_grid(heatmap: &Heatmap) -> String {
    let mut output = String::new();
    let _ = write!(output, "     ");
    for hour in 0..24 {
        let _ = write!(output, "{hour:02} ");
    }
    let _ = writeln!(output);

    for (day, name) in DAY_NAMES.iter().enumerate() {
        let _ = write!(output, "{name:<5}");
        for hour in 0..24 {
            let _ = write!(output, "{:>2} ", heatmap.intensity(day, hour).glyph());
        }
        let _ = writeln!(output);
    }

    let legend: Vec<String> = Intensity::ALL
        .iter()
        .map(|step| step.glyph().to_string())
        .collect();
    let _ = writeln!(output, "Less {} More", legend.join(" "));
    output
}

fn write_heatmap(output: &mut String, heatmap: &Loaded<Heatmap>) {
    let _ = writeln!(output, "## Activity Heatmap");
    let heatmap = match heatmap {
        Ok(heatmap) => heatmap,
        Err(_) => {
            degraded(output, &["Peak day", "Peak hour"]);
            return;
        }
    };
    if heatmap.is_empty() {
        let _ = writeln!(output, "No activity data available.");
        return;
    }

    let _ = writeln!(output, "```text");
    let _ = write!(output, "{}", heatmap_grid(heatmap));
    let _ = writeln!(output, "```");
    let _ = writeln!(
        output,
        "Peak day {}, peak hour {:02}:00, {} transactions in total.",
        DAY_NAMES[heatmap.peak_day()],
        heatmap.peak_hour(),
        heatmap.total()
    );
}

fn write_progress(output: &mut String, series: &Loaded<Vec<DailyXp>>) {
    let _ = writeln!(output, "## XP Progress");
    let series = match series {
        Ok(series) => series,
        Err(_) => {
            degraded(output, &["Total XP", "Data points", "Avg XP/day"]);
            return;
        }
    };
    if series.is_empty() {
        let _ = writeln!(output, "No XP progress data available.");
        return;
    }

    let _ = writeln!(
        output,
        "- Total XP: {}",
        format_amount(progress::total_xp(series))
    );
    let _ = writeln!(output, "- Data points: {}", series.len());
    let _ = writeln!(
        output,
        "- Avg XP/day: {}",
        format_amount(progress::average_daily_xp(series) as f64)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Date | Daily XP | Cumulative XP |");
    let _ = writeln!(output, "|---|---:|---:|");
    let recent = series.len().saturating_sub(10);
    for day in &series[recent..] {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            day.date,
            format_amount(day.daily_xp),
            format_amount(day.cumulative_xp)
        );
    }
}

fn write_teamwork(output: &mut String, teamwork: &Loaded<Teamwork>) {
    let _ = writeln!(output, "## Teamwork");
    let teamwork = match teamwork {
        Ok(teamwork) => teamwork,
        Err(_) => {
            degraded(output, &["Unique teammates", "Team projects", "Solo projects"]);
            return;
        }
    };
    if teamwork.is_empty() {
        let _ = writeln!(output, "No teamwork data available.");
        return;
    }

    let _ = writeln!(output, "- Unique teammates: {}", teamwork.unique_teammates());
    let _ = writeln!(output, "- Team projects: {}", teamwork.team_project_count());
    let _ = writeln!(output, "- Solo projects: {}", teamwork.solo_project_count());
    let _ = writeln!(
        output,
        "- Collaborations: {}",
        teamwork.total_collaborations
    );
    for teammate in teamwork.teammates.iter().take(5) {
        let _ = writeln!(
            output,
            "  - {} ({} projects)",
            teammate.user.login,
            teammate.projects.len()
        );
    }
}

/// Full markdown dashboard. Failed widgets render degraded, never abort.
pub fn build_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let subject = dashboard
        .subject
        .login
        .clone()
        .unwrap_or_else(|| format!("user #{}", dashboard.subject.user_id));

    let _ = writeln!(output, "# Learner Dashboard");
    let _ = writeln!(output, "Activity, progress and teamwork for {subject}");
    let _ = writeln!(output);
    write_profile(&mut output, &dashboard.profile);
    let _ = writeln!(output);
    write_programs(&mut output, &dashboard.programs);
    let _ = writeln!(output);
    write_global_stats(
        &mut output,
        &dashboard.audit_breakdown,
        &dashboard.audit_counts,
        &dashboard.projects,
    );
    let _ = writeln!(output);
    write_games(&mut output, &dashboard.games);
    let _ = writeln!(output);
    write_skills(&mut output, &dashboard.skills);
    let _ = writeln!(output);
    write_heatmap(&mut output, &dashboard.heatmap);
    let _ = writeln!(output);
    write_progress(&mut output, &dashboard.progress);
    let _ = writeln!(output);
    write_teamwork(&mut output, &dashboard.teamwork);

    output
}

pub fn profile_view(profile: &Profile) -> String {
    let mut output = String::new();
    write_profile(&mut output, &Ok(profile.clone()));
    output
}

/// `transactions` are the program's xp rows in any order.
pub fn program_view(view: ProgramView, stats: &ProgramStats, transactions: &[&Transaction]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", stats.program.title());
    match view {
        ProgramView::Xp => {
            let _ = writeln!(output, "- Total XP: {}", format_amount(stats.xp));
            let _ = writeln!(output, "- Transactions: {}", stats.transactions);
        }
        ProgramView::Level => {
            let _ = writeln!(output, "- Current level: {}", stats.level);
        }
        ProgramView::Transactions => {
            if transactions.is_empty() {
                let _ = writeln!(output, "No transactions data available.");
                return output;
            }
            let mut recent = transactions.to_vec();
            recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            for transaction in recent {
                let _ = writeln!(
                    output,
                    "- {} +{} XP on {}",
                    transaction.display_name(),
                    format_amount(transaction.xp()),
                    format_date(&transaction.created_at)
                );
            }
        }
    }
    output
}

pub fn audit_ratio_view(breakdown: &AuditBreakdown) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Audit Ratio");
    let _ = writeln!(output, "- Ratio: {}", format_ratio(breakdown.ratio));
    let _ = writeln!(output, "- Done: {}", format_amount(breakdown.done));
    let _ = writeln!(output, "- Bonus: {}", format_amount(breakdown.bonus));
    let _ = writeln!(output, "- Received: {}", format_amount(breakdown.received));
    output
}

pub fn audits_view(counts: &AuditCounts) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Audits");
    let _ = writeln!(output, "- Total: {}", counts.total());
    let _ = writeln!(output, "- Succeeded: {}", counts.succeeded);
    let _ = writeln!(output, "- Failed: {}", counts.failed);
    let _ = writeln!(output, "- Success rate: {}%", counts.success_rate_label());
    output
}

pub fn succeeded_projects_view(succeeded: &[ProgressRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Successful Projects");
    if succeeded.is_empty() {
        let _ = writeln!(output, "No successful projects data available.");
        return output;
    }
    for record in succeeded {
        let _ = writeln!(
            output,
            "- {} (grade {}) on {}",
            record.project_name(),
            record
                .grade
                .map(|grade| format!("{grade:.2}"))
                .unwrap_or_else(|| MISSING.to_string()),
            format_date(&record.last_touched())
        );
    }
    output
}

pub fn failed_projects_view(failed: &[ProgressRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Failed Projects");
    let groups = projects::group_failures(failed);
    if groups.is_empty() {
        let _ = writeln!(output, "No failed projects data available.");
        return output;
    }
    for group in groups {
        let _ = writeln!(
            output,
            "- {}: {} attempts, last on {} (grade {})",
            group.name,
            group.attempts,
            format_date(&group.latest.created_at),
            group
                .latest
                .grade
                .map(|grade| format!("{grade:.2}"))
                .unwrap_or_else(|| MISSING.to_string())
        );
    }
    output
}

pub fn game_view(game: Game, stats: Option<&GameStats>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", game.title());
    let stats = match stats {
        Some(stats) => stats,
        None => {
            let _ = writeln!(output, "No game data available.");
            return output;
        }
    };

    let _ = writeln!(output, "- Max level: {}", stats.max_level);
    let _ = writeln!(output, "- Total attempts: {}", stats.total_attempts);
    let _ = writeln!(output, "- Avg attempts per level: {}", stats.avg_attempts_label());
    let _ = writeln!(
        output,
        "- Duration: {}",
        stats
            .duration_minutes
            .map(|minutes| format!("{minutes} min"))
            .unwrap_or_else(|| MISSING.to_string())
    );
    let _ = writeln!(
        output,
        "- Points: {}",
        stats
            .points
            .map(format_amount)
            .unwrap_or_else(|| MISSING.to_string())
    );
    let _ = writeln!(
        output,
        "- Started: {}",
        format_optional_date(stats.started_at.as_ref())
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Level | Attempts |");
    let _ = writeln!(output, "|---:|---:|");
    for level in &stats.levels {
        let _ = writeln!(output, "| {} | {} |", level.level, level.attempts);
    }
    output
}

pub fn teammates_view(teamwork: &Teamwork) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Unique Teammates");
    if teamwork.teammates.is_empty() {
        let _ = writeln!(output, "No teammates data available.");
        return output;
    }
    for teammate in &teamwork.teammates {
        let name = teammate.user.full_name();
        let mut projects: Vec<&str> = teammate
            .projects
            .iter()
            .map(|group| group.project_name())
            .collect();
        projects.sort_unstable();
        projects.dedup();
        let _ = writeln!(
            output,
            "- {}{}: {}",
            teammate.user.login,
            if name.is_empty() {
                String::new()
            } else {
                format!(" ({name})")
            },
            projects.join(", ")
        );
    }
    output
}

pub fn team_projects_view(teamwork: &Teamwork) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Team Projects");
    if teamwork.team_projects.is_empty() {
        let _ = writeln!(output, "No team projects data available.");
        return output;
    }
    for name in &teamwork.team_projects {
        let _ = writeln!(output, "- {name}");
    }
    output
}

pub fn solo_projects_view(teamwork: &Teamwork) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Solo Projects");
    if teamwork.solo_projects.is_empty() {
        let _ = writeln!(output, "No solo projects data available.");
        return output;
    }
    for project in &teamwork.solo_projects {
        let _ = writeln!(
            output,
            "- {} ({}) on {}",
            project.name,
            if project.status.is_empty() {
                MISSING
            } else {
                project.status.as_str()
            },
            format_optional_date(project.updated_at.as_ref())
        );
    }
    output
}

/// One heatmap cell and the transactions that fell into it.
pub fn heat_cell_view(heatmap: &Heatmap, day: usize, hour: usize) -> String {
    let mut output = String::new();
    let cell = match (DAY_NAMES.get(day), heatmap.cell(day, hour)) {
        (Some(name), Some(cell)) => {
            let _ = writeln!(output, "# Activity on {name} at {hour:02}:00");
            cell
        }
        _ => {
            let _ = writeln!(output, "No activity data available.");
            return output;
        }
    };

    let _ = writeln!(output, "- Transactions: {}", cell.count);
    let _ = writeln!(
        output,
        "- Intensity: {}",
        heatmap.intensity(day, hour).label()
    );
    let mut recent: Vec<&Transaction> = cell.transactions.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    for transaction in recent {
        let _ = writeln!(
            output,
            "  - {} +{} XP on {}",
            transaction.display_name(),
            format_amount(transaction.xp()),
            format_date(&transaction.created_at)
        );
    }
    output
}

pub fn day_view(date: NaiveDate, day: Option<&DailyXp>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# XP on {date}");
    let day = match day {
        Some(day) => day,
        None => {
            let _ = writeln!(output, "No XP progress data available.");
            return output;
        }
    };

    let _ = writeln!(output, "- Daily XP: {}", format_amount(day.daily_xp));
    let _ = writeln!(output, "- Cumulative XP: {}", format_amount(day.cumulative_xp));
    for transaction in &day.transactions {
        let _ = writeln!(
            output,
            "  - {} +{}",
            transaction.display_name(),
            format_amount(transaction.xp())
        );
    }
    output
}

pub fn search_view(term: &str, matches: &[&PublicUser]) -> String {
    let mut output = String::new();
    if term.trim().is_empty() {
        let _ = writeln!(output, "Enter a login or name to search.");
        return output;
    }
    if matches.is_empty() {
        let _ = writeln!(output, "No participants match \"{}\".", term.trim());
        return output;
    }
    let _ = writeln!(output, "# Participants matching \"{}\"", term.trim());
    for user in matches {
        let name = user.full_name();
        let _ = writeln!(
            output,
            "- {} ({})",
            user.login,
            if name.is_empty() { MISSING } else { name.as_str() }
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Subject;
    use crate::graphql::GraphqlError;
    use crate::stats::teamwork::{SoloProject, Teammate};
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn err<T>() -> Loaded<T> {
        Err(GraphqlError::Status(502))
    }

    fn failed_dashboard() -> Dashboard {
        Dashboard {
            subject: Subject {
                user_id: 7,
                login: None,
            },
            profile: err(),
            programs: Program::ALL.iter().map(|program| (*program, err())).collect(),
            audit_breakdown: err(),
            audit_counts: err(),
            projects: err(),
            games: err(),
            skills: err(),
            heatmap: err(),
            progress: err(),
            teamwork: err(),
        }
    }

    #[test]
    fn amounts_use_thousands_separators() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.9), "999");
        assert_eq!(format_amount(1_234_567.0), "1,234,567");
        assert_eq!(format_amount(-2500.0), "-2,500");
    }

    #[test]
    fn birth_dates_render_day_first() {
        assert_eq!(format_birth_date("1999-05-04T00:00:00Z"), "04.05.1999");
        assert_eq!(format_birth_date("someday"), "someday");
    }

    #[test]
    fn failed_widgets_degrade_without_aborting() {
        let report = build_report(&failed_dashboard());

        assert!(report.contains("Activity, progress and teamwork for user #7"));
        assert!(report.contains("## Teamwork"));
        assert!(report.contains(ERROR_LOADING));
        assert!(report.contains("- Audit ratio: -- (Error loading data)"));
        assert!(report.contains("- Core Education: level --, -- XP"));
    }

    #[test]
    fn empty_widgets_show_empty_states() {
        let mut dashboard = failed_dashboard();
        dashboard.heatmap = Ok(Heatmap::build(&[], &Utc));
        dashboard.progress = Ok(Vec::new());
        dashboard.teamwork = Ok(Teamwork::default());
        dashboard.skills = Ok(Vec::new());
        dashboard.games = Ok(Vec::new());

        let report = build_report(&dashboard);
        assert!(report.contains("No activity data available."));
        assert!(report.contains("No XP progress data available."));
        assert!(report.contains("No teamwork data available."));
        assert!(report.contains("No skills data available."));
        assert!(report.contains("- Memory Game: No game data available"));
    }

    #[test]
    fn profile_lists_unset_attributes() {
        let profile: Profile = serde_json::from_value(json!({
            "id": 1,
            "login": "avery",
            "firstName": "Avery",
            "lastName": "Lee",
            "email": "avery@example.org",
            "attrs": { "dateOfBirth": "2001-12-31T00:00:00Z", "gender": "" }
        }))
        .unwrap();
        let view = profile_view(&profile);

        assert!(view.contains("- Name: Avery Lee"));
        assert!(view.contains("- Date of birth: 31.12.2001"));
        assert!(view.contains("- Gender: Not specified"));
        assert!(view.contains("- Emergency contact: Not specified"));
        assert!(view.contains("- Member since: —"));
    }

    #[test]
    fn audits_view_shows_rate() {
        let view = audits_view(&AuditCounts {
            succeeded: 7,
            failed: 3,
        });
        assert!(view.contains("- Total: 10"));
        assert!(view.contains("- Success rate: 70.0%"));
    }

    #[test]
    fn heatmap_grid_marks_busy_cells() {
        // 2024-03-04 is a Monday.
        let transactions: Vec<Transaction> = (0..3)
            .map(|minute| {
                serde_json::from_value(json!({
                    "type": "xp",
                    "amount": 10,
                    "createdAt": Utc
                        .with_ymd_and_hms(2024, 3, 4, 9, minute, 0)
                        .unwrap()
                        .to_rfc3339()
                }))
                .unwrap()
            })
            .collect();
        let heatmap = Heatmap::build(&transactions, &Utc);
        let grid = heatmap_grid(&heatmap);
        let monday = grid.lines().nth(1).unwrap();

        assert!(monday.starts_with("Mon"));
        assert_eq!(monday.chars().filter(|ch| *ch == '█').count(), 1);
        assert!(grid.ends_with("Less . ░ ▒ ▓ █ More\n"));
    }

    #[test]
    fn program_transactions_are_newest_first() {
        let older: Transaction = serde_json::from_value(json!({
            "type": "xp",
            "amount": 500,
            "createdAt": at(1, 10).to_rfc3339(),
            "path": "/astanahub/module/go-reloaded"
        }))
        .unwrap();
        let newer: Transaction = serde_json::from_value(json!({
            "type": "xp",
            "amount": 1500,
            "createdAt": at(2, 10).to_rfc3339(),
            "object": { "name": "ascii-art" }
        }))
        .unwrap();
        let stats = ProgramStats {
            program: Program::CoreEducation,
            xp: 2000.0,
            level: 4.0,
            transactions: 2,
        };

        let view = program_view(ProgramView::Transactions, &stats, &[&older, &newer]);
        let ascii = view.find("ascii-art +1,500 XP on 2024-03-02").unwrap();
        let reloaded = view.find("go-reloaded +500 XP").unwrap();
        assert!(ascii < reloaded);

        assert!(program_view(ProgramView::Level, &stats, &[]).contains("- Current level: 4"));
    }

    #[test]
    fn failed_view_groups_attempts() {
        let attempt = |grade: f64, day: u32| -> ProgressRecord {
            serde_json::from_value(json!({
                "id": day,
                "grade": grade,
                "createdAt": at(day, 12).to_rfc3339(),
                "object": { "name": "A" }
            }))
            .unwrap()
        };
        let view = failed_projects_view(&[attempt(0.5, 1), attempt(0.8, 2)]);

        assert!(view.contains("- A: 2 attempts, last on 2024-03-02 (grade 0.80)"));
        assert!(failed_projects_view(&[]).contains("No failed projects data available."));
    }

    #[test]
    fn teamwork_views() {
        let teamwork = Teamwork {
            teammates: vec![Teammate {
                user: PublicUser {
                    id: 2,
                    login: "mate".to_string(),
                    first_name: Some("Sam".to_string()),
                    last_name: None,
                },
                projects: Vec::new(),
            }],
            team_projects: vec!["forum".to_string()],
            solo_projects: vec![SoloProject {
                name: "ascii-art".to_string(),
                status: "finished".to_string(),
                updated_at: Some(at(5, 8)),
            }],
            total_collaborations: 2,
        };

        assert!(teammates_view(&teamwork).contains("- mate (Sam): "));
        assert!(team_projects_view(&teamwork).contains("- forum"));
        assert!(solo_projects_view(&teamwork).contains("- ascii-art (finished) on 2024-03-05"));
    }

    #[test]
    fn heat_cell_view_lists_the_cell_transactions() {
        // 2024-03-04 is a Monday.
        let transactions: Vec<Transaction> = [("go-reloaded", 4), ("ascii-art", 11)]
            .iter()
            .map(|(name, day)| {
                serde_json::from_value(json!({
                    "type": "xp",
                    "amount": 2500,
                    "createdAt": Utc.with_ymd_and_hms(2024, 3, *day, 9, 30, 0).unwrap().to_rfc3339(),
                    "object": { "name": name }
                }))
                .unwrap()
            })
            .collect();
        let heatmap = Heatmap::build(&transactions, &Utc);

        let view = heat_cell_view(&heatmap, 0, 9);
        assert!(view.contains("# Activity on Mon at 09:00"));
        assert!(view.contains("- Transactions: 2"));
        let newer = view.find("ascii-art +2,500 XP on 2024-03-11").unwrap();
        let older = view.find("go-reloaded +2,500 XP on 2024-03-04").unwrap();
        assert!(newer < older);

        assert!(heat_cell_view(&heatmap, 1, 9).contains("- Transactions: 0"));
        assert!(heat_cell_view(&heatmap, 7, 0).contains("No activity data available."));
    }

    #[test]
    fn search_needs_a_term() {
        assert!(search_view("  ", &[]).contains("Enter a login"));
        assert!(search_view("zz", &[]).contains("No participants match \"zz\""));
    }

    #[test]
    fn missing_game_renders_empty_state() {
        assert!(game_view(Game::Zzle, None).contains("No game data available."));
    }
}
