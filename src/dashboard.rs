use chrono::TimeZone;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::graphql::{GraphqlClient, GraphqlError};
use crate::models::{
    AuditTotals, GameAttrs, GameRecord, GroupMembership, ProgressRecord, Profile, PublicUser,
    Transaction,
};
use crate::queries;
use crate::stats::audits::{self, AuditBreakdown, AuditCounts};
use crate::stats::heatmap::Heatmap;
use crate::stats::programs::{self, Program, ProgramRules, ProgramStats};
use crate::stats::progress::{self, DailyXp};
use crate::stats::projects::{self, ProjectOutcomes};
use crate::stats::skills::{self, Skill};
use crate::stats::teamwork::{self, Teamwork, TeamworkFilter};

pub type Loaded<T> = Result<T, GraphqlError>;

#[derive(Deserialize)]
struct UserRows<T> {
    user: Vec<T>,
}

#[derive(Deserialize)]
struct UserTransactions {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
struct TransactionRows {
    transaction: Vec<Transaction>,
}

#[derive(Deserialize)]
struct ProgressRows {
    progress: Vec<ProgressRecord>,
}

#[derive(Deserialize)]
struct AuditCountRow {
    succeeded_audits: Aggregate,
    failed_audits: Aggregate,
}

#[derive(Deserialize)]
struct Aggregate {
    aggregate: Count,
}

#[derive(Deserialize)]
struct Count {
    count: u64,
}

#[derive(Deserialize)]
struct GameRows {
    result: Vec<GameRow>,
}

#[derive(Deserialize)]
struct GameRow {
    #[serde(default)]
    attrs: Option<GameAttrs>,
}

#[derive(Deserialize)]
struct ParticipantRows {
    user_public_view: Vec<PublicUser>,
}

#[derive(Deserialize)]
struct GroupRows {
    group: Vec<GroupId>,
}

#[derive(Deserialize)]
struct GroupId {
    id: i64,
}

#[derive(Deserialize)]
struct MembershipRows {
    group_user: Vec<GroupMembership>,
}

async fn first_user<T: DeserializeOwned>(
    client: &GraphqlClient,
    token: &str,
    query: &str,
) -> Loaded<T> {
    let rows: UserRows<T> = client.execute(query, json!({}), token).await?;
    rows.user.into_iter().next().ok_or(GraphqlError::MissingData)
}

pub async fn fetch_profile(client: &GraphqlClient, token: &str) -> Loaded<Profile> {
    first_user(client, token, queries::PROFILE).await
}

pub async fn fetch_audit_totals(client: &GraphqlClient, token: &str) -> Loaded<AuditTotals> {
    first_user(client, token, queries::AUDIT_RATIO).await
}

pub async fn fetch_audit_counts(client: &GraphqlClient, token: &str) -> Loaded<AuditCounts> {
    let row: AuditCountRow = first_user(client, token, queries::AUDIT_COUNTS).await?;
    Ok(AuditCounts {
        succeeded: row.succeeded_audits.aggregate.count,
        failed: row.failed_audits.aggregate.count,
    })
}

pub async fn fetch_progress(client: &GraphqlClient, token: &str) -> Loaded<Vec<ProgressRecord>> {
    let rows: ProgressRows = client.execute(queries::PROJECTS, json!({}), token).await?;
    Ok(rows.progress)
}

async fn fetch_own_transactions(
    client: &GraphqlClient,
    token: &str,
    query: &str,
) -> Loaded<Vec<Transaction>> {
    let rows: UserRows<UserTransactions> = client.execute(query, json!({}), token).await?;
    Ok(rows
        .user
        .into_iter()
        .next()
        .map(|user| user.transactions)
        .unwrap_or_default())
}

/// Signed-in user's xp transactions, newest first.
pub async fn fetch_xp_transactions(client: &GraphqlClient, token: &str) -> Loaded<Vec<Transaction>> {
    fetch_own_transactions(client, token, queries::XP_TRANSACTIONS).await
}

pub async fn fetch_skill_transactions(
    client: &GraphqlClient,
    token: &str,
) -> Loaded<Vec<Transaction>> {
    fetch_own_transactions(client, token, queries::SKILLS).await
}

pub async fn fetch_levels(
    client: &GraphqlClient,
    token: &str,
    program: Program,
) -> Loaded<Vec<Transaction>> {
    let rows: TransactionRows = client
        .execute(&queries::level_query(program), json!({}), token)
        .await?;
    Ok(rows.transaction)
}

/// Any user's xp transactions, oldest first.
pub async fn fetch_user_xp(
    client: &GraphqlClient,
    token: &str,
    user_id: i64,
) -> Loaded<Vec<Transaction>> {
    let rows: TransactionRows = client
        .execute(
            queries::USER_XP_TRANSACTIONS,
            json!({ "userId": user_id }),
            token,
        )
        .await?;
    Ok(rows.transaction)
}

pub async fn fetch_games(
    client: &GraphqlClient,
    token: &str,
    result_id: i64,
) -> Loaded<Vec<GameRecord>> {
    let rows: GameRows = client
        .execute(queries::GAMES, json!({ "resultId": result_id }), token)
        .await?;
    Ok(rows
        .result
        .into_iter()
        .next()
        .and_then(|row| row.attrs)
        .map(|attrs| attrs.games)
        .unwrap_or_default())
}

pub async fn fetch_participants(client: &GraphqlClient, token: &str) -> Loaded<Vec<PublicUser>> {
    let rows: ParticipantRows = client
        .execute(queries::PARTICIPANTS, json!({}), token)
        .await?;
    Ok(rows.user_public_view)
}

/// Membership rows of every finished group `user_id` belongs to.
pub async fn fetch_group_memberships(
    client: &GraphqlClient,
    token: &str,
    user_id: i64,
) -> Loaded<Vec<GroupMembership>> {
    let groups: GroupRows = client
        .execute(queries::FINISHED_GROUPS, json!({ "userId": user_id }), token)
        .await?;
    let group_ids: Vec<i64> = groups.group.into_iter().map(|group| group.id).collect();
    if group_ids.is_empty() {
        info!(user_id, "no finished groups");
        return Ok(Vec::new());
    }

    let rows: MembershipRows = client
        .execute(queries::TEAMWORK, json!({ "groupIds": group_ids }), token)
        .await?;
    Ok(rows.group_user)
}

/// Program XP and level. The two queries run concurrently; a failed level
/// query degrades to level 0 unless the session expired.
pub async fn load_program(
    client: &GraphqlClient,
    token: &str,
    rules: &ProgramRules,
    program: Program,
) -> Loaded<ProgramStats> {
    let (transactions, levels) = tokio::join!(
        fetch_xp_transactions(client, token),
        fetch_levels(client, token, program)
    );
    let transactions = transactions?;
    let levels = match levels {
        Ok(levels) => levels,
        Err(err) if err.is_unauthenticated() => return Err(err),
        Err(err) => {
            warn!(program = program.slug(), "level query failed: {err}");
            Vec::new()
        }
    };
    Ok(programs::program_stats(rules, program, &transactions, &levels))
}

pub async fn load_audit_breakdown(client: &GraphqlClient, token: &str) -> Loaded<AuditBreakdown> {
    let totals = fetch_audit_totals(client, token).await?;
    Ok(audits::breakdown(&totals))
}

pub async fn load_projects(client: &GraphqlClient, token: &str) -> Loaded<ProjectOutcomes> {
    let records = fetch_progress(client, token).await?;
    Ok(projects::classify(&records))
}

pub async fn load_skills(client: &GraphqlClient, token: &str) -> Loaded<Vec<Skill>> {
    let transactions = fetch_skill_transactions(client, token).await?;
    Ok(skills::top_skills(&transactions))
}

pub async fn load_teamwork(
    client: &GraphqlClient,
    token: &str,
    user_id: i64,
    filter: TeamworkFilter,
) -> Loaded<Teamwork> {
    let rows = fetch_group_memberships(client, token, user_id).await?;
    Ok(teamwork::teamwork(&rows, user_id, filter))
}

/// Whose activity, progress and teamwork the dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub user_id: i64,
    pub login: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub games_result_id: i64,
    pub teamwork_filter: TeamworkFilter,
}

/// Every widget of the report, each loaded and failing on its own.
#[derive(Debug)]
pub struct Dashboard {
    pub subject: Subject,
    pub profile: Loaded<Profile>,
    pub programs: Vec<(Program, Loaded<ProgramStats>)>,
    pub audit_breakdown: Loaded<AuditBreakdown>,
    pub audit_counts: Loaded<AuditCounts>,
    pub projects: Loaded<ProjectOutcomes>,
    pub games: Loaded<Vec<GameRecord>>,
    pub skills: Loaded<Vec<Skill>>,
    pub heatmap: Loaded<Heatmap>,
    pub progress: Loaded<Vec<DailyXp>>,
    pub teamwork: Loaded<Teamwork>,
}

impl Dashboard {
    fn errors(&self) -> Vec<&GraphqlError> {
        let mut errors: Vec<&GraphqlError> = Vec::new();
        errors.extend(self.profile.as_ref().err());
        errors.extend(self.programs.iter().filter_map(|(_, stats)| stats.as_ref().err()));
        errors.extend(self.audit_breakdown.as_ref().err());
        errors.extend(self.audit_counts.as_ref().err());
        errors.extend(self.projects.as_ref().err());
        errors.extend(self.games.as_ref().err());
        errors.extend(self.skills.as_ref().err());
        errors.extend(self.heatmap.as_ref().err());
        errors.extend(self.progress.as_ref().err());
        errors.extend(self.teamwork.as_ref().err());
        errors
    }

    pub fn session_expired(&self) -> bool {
        self.errors().iter().any(|err| err.is_unauthenticated())
    }

    pub fn failed_widgets(&self) -> usize {
        self.errors().len()
    }
}

fn logged<T>(widget: &str, result: Loaded<T>) -> Loaded<T> {
    if let Err(err) = &result {
        warn!(widget, "widget failed to load: {err}");
    }
    result
}

/// Loads every widget one after another. Day and hour buckets use `tz`.
pub async fn load_dashboard<Tz: TimeZone>(
    client: &GraphqlClient,
    token: &str,
    rules: &ProgramRules,
    subject: Subject,
    options: &DashboardOptions,
    tz: &Tz,
) -> Dashboard {
    let profile = logged("profile", fetch_profile(client, token).await);

    let mut program_stats = Vec::with_capacity(Program::ALL.len());
    for program in Program::ALL {
        let stats = logged(program.slug(), load_program(client, token, rules, program).await);
        program_stats.push((program, stats));
    }

    let audit_breakdown = logged("audit-ratio", load_audit_breakdown(client, token).await);
    let audit_counts = logged("audits", fetch_audit_counts(client, token).await);
    let projects = logged("projects", load_projects(client, token).await);
    let games = logged(
        "games",
        fetch_games(client, token, options.games_result_id).await,
    );
    let skills = logged("skills", load_skills(client, token).await);

    let activity = logged(
        "activity",
        fetch_user_xp(client, token, subject.user_id).await,
    );
    let (heatmap, progress) = match activity {
        Ok(transactions) => (
            Ok(Heatmap::build(&transactions, tz)),
            Ok(progress::cumulative_xp(&transactions, tz)),
        ),
        Err(err) => {
            let progress_err = duplicate(&err);
            (Err(err), Err(progress_err))
        }
    };

    let teamwork = logged(
        "teamwork",
        load_teamwork(client, token, subject.user_id, options.teamwork_filter).await,
    );

    Dashboard {
        subject,
        profile,
        programs: program_stats,
        audit_breakdown,
        audit_counts,
        projects,
        games,
        skills,
        heatmap,
        progress,
        teamwork,
    }
}

/// The heatmap and the progress chart share one query, so they share its failure.
fn duplicate(err: &GraphqlError) -> GraphqlError {
    match err {
        GraphqlError::Unauthenticated(message) => GraphqlError::Unauthenticated(message.clone()),
        GraphqlError::Status(code) => GraphqlError::Status(*code),
        GraphqlError::Query(messages) => GraphqlError::Query(messages.clone()),
        GraphqlError::MissingData => GraphqlError::MissingData,
        other => GraphqlError::Query(vec![other.to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_count_rows_decode() {
        let row: UserRows<AuditCountRow> = serde_json::from_value(json!({
            "user": [{
                "succeeded_audits": { "aggregate": { "count": 7 } },
                "failed_audits": { "aggregate": { "count": 3 } }
            }]
        }))
        .unwrap();
        let row = row.user.into_iter().next().unwrap();

        assert_eq!(row.succeeded_audits.aggregate.count, 7);
        assert_eq!(row.failed_audits.aggregate.count, 3);
    }

    #[test]
    fn game_rows_tolerate_null_attrs() {
        let rows: GameRows = serde_json::from_value(json!({ "result": [{ "attrs": null }] })).unwrap();
        assert!(rows.result[0].attrs.is_none());

        let rows: GameRows = serde_json::from_value(json!({
            "result": [{ "attrs": { "games": [{ "name": "memory", "results": [{ "level": 2, "attempts": 4 }] }] } }]
        }))
        .unwrap();
        let attrs = rows.result.into_iter().next().unwrap().attrs.unwrap();
        assert_eq!(attrs.games[0].results[0].attempts, 4);
    }

    #[test]
    fn membership_rows_decode() {
        let rows: MembershipRows = serde_json::from_value(json!({
            "group_user": [{
                "user": { "id": 2, "login": "mate", "firstName": null, "lastName": null },
                "group": {
                    "id": 10,
                    "status": "finished",
                    "updatedAt": "2024-04-01T12:00:00+00:00",
                    "object": { "name": "forum" },
                    "audits": [{ "closureType": "succeeded" }]
                }
            }]
        }))
        .unwrap();

        assert_eq!(rows.group_user.len(), 1);
        assert_eq!(rows.group_user[0].group.project_name(), "forum");
    }

    #[test]
    fn rows_with_null_fields_still_decode() {
        let games: GameRows = serde_json::from_value(json!({
            "result": [{ "attrs": { "games": [{ "name": "memory", "results": [{ "level": 1, "attempts": null }] }] } }]
        }))
        .unwrap();
        let attrs = games.result.into_iter().next().unwrap().attrs.unwrap();
        assert_eq!(attrs.games[0].results[0].attempts, 0);

        let rows: MembershipRows = serde_json::from_value(json!({
            "group_user": [{
                "user": { "id": 2, "login": "mate" },
                "group": { "id": 10, "status": null, "object": { "name": "forum" } }
            }]
        }))
        .unwrap();
        let teamwork = teamwork::teamwork(&rows.group_user, 2, TeamworkFilter::AllFinished);
        assert!(teamwork.is_empty());
    }

    #[test]
    fn duplicated_errors_keep_the_session_signal() {
        let err = GraphqlError::Unauthenticated("JWTExpired".to_string());
        assert!(duplicate(&err).is_unauthenticated());
        assert!(!duplicate(&GraphqlError::MissingData).is_unauthenticated());
    }
}
