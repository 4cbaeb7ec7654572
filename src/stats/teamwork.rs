use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::models::{GroupMembership, ProjectGroup, PublicUser};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeamworkFilter {
    /// Every finished group counts.
    #[default]
    AllFinished,
    /// Finished groups with a failed or auto-failed audit are dropped.
    SucceededOnly,
}

impl TeamworkFilter {
    pub fn admits(self, group: &ProjectGroup) -> bool {
        group.is_finished()
            && match self {
                TeamworkFilter::AllFinished => true,
                TeamworkFilter::SucceededOnly => !group.has_failed_audit(),
            }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Teammate {
    pub user: PublicUser,
    pub projects: Vec<ProjectGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoloProject {
    pub name: String,
    pub status: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Teamwork {
    /// Most shared projects first.
    pub teammates: Vec<Teammate>,
    /// Distinct project names among team groups, sorted.
    pub team_projects: Vec<String>,
    /// One entry per distinct solo project name, newest first.
    pub solo_projects: Vec<SoloProject>,
    /// Member rows belonging to team groups.
    pub total_collaborations: usize,
}

impl Teamwork {
    pub fn unique_teammates(&self) -> usize {
        self.teammates.len()
    }

    pub fn team_project_count(&self) -> usize {
        self.team_projects.len()
    }

    pub fn solo_project_count(&self) -> usize {
        self.solo_projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teammates.is_empty() && self.team_projects.is_empty() && self.solo_projects.is_empty()
    }
}

/// Classifies the target user's groups as solo or team and collects teammates.
///
/// Only groups that pass `filter` and list `target_user` as a member are
/// considered. A group is solo when its member set has one id and team when it
/// has more, so no group is ever counted as both.
pub fn teamwork(rows: &[GroupMembership], target_user: i64, filter: TeamworkFilter) -> Teamwork {
    let eligible: Vec<&GroupMembership> = rows
        .iter()
        .filter(|row| filter.admits(&row.group))
        .collect();

    let mut members: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for row in &eligible {
        members.entry(row.group.id).or_default().insert(row.user.id);
    }
    members.retain(|_, ids| ids.contains(&target_user));

    let is_team = |group_id: i64| members.get(&group_id).is_some_and(|ids| ids.len() > 1);
    let is_solo = |group_id: i64| members.get(&group_id).is_some_and(|ids| ids.len() == 1);

    let mut teammates: BTreeMap<i64, Teammate> = BTreeMap::new();
    let mut team_projects: BTreeSet<String> = BTreeSet::new();
    let mut solo_projects: BTreeMap<String, SoloProject> = BTreeMap::new();
    let mut total_collaborations = 0;

    for row in &eligible {
        let group = &row.group;
        if is_team(group.id) {
            total_collaborations += 1;
            team_projects.insert(group.project_name().to_string());

            if row.user.id == target_user {
                continue;
            }
            let teammate = teammates.entry(row.user.id).or_insert_with(|| Teammate {
                user: row.user.clone(),
                projects: Vec::new(),
            });
            if !teammate.projects.iter().any(|project| project.id == group.id) {
                teammate.projects.push(group.clone());
            }
        } else if is_solo(group.id) {
            let name = group.project_name().to_string();
            let candidate = SoloProject {
                name: name.clone(),
                status: group.status.clone(),
                updated_at: group.updated_at,
            };
            solo_projects
                .entry(name)
                .and_modify(|existing| {
                    if candidate.updated_at > existing.updated_at {
                        *existing = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }
    }

    let mut teammates: Vec<Teammate> = teammates.into_values().collect();
    teammates.sort_by(|a, b| {
        b.projects
            .len()
            .cmp(&a.projects.len())
            .then_with(|| a.user.login.cmp(&b.user.login))
    });

    let mut solo_projects: Vec<SoloProject> = solo_projects.into_values().collect();
    solo_projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    Teamwork {
        teammates,
        team_projects: team_projects.into_iter().collect(),
        solo_projects,
        total_collaborations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditClosure, GroupAudit, ObjectRef};

    fn user(id: i64, login: &str) -> PublicUser {
        PublicUser {
            id,
            login: login.to_string(),
            first_name: None,
            last_name: None,
        }
    }

    fn group(id: i64, name: &str, status: &str, closures: &[AuditClosure]) -> ProjectGroup {
        ProjectGroup {
            id,
            status: status.to_string(),
            updated_at: format!("2024-0{}-01T00:00:00Z", id.clamp(1, 9)).parse().ok(),
            object: Some(ObjectRef {
                name: Some(name.to_string()),
                kind: Some("project".to_string()),
            }),
            audits: closures
                .iter()
                .map(|closure| GroupAudit {
                    closure_type: Some(*closure),
                })
                .collect(),
        }
    }

    fn row(user: &PublicUser, group: &ProjectGroup) -> GroupMembership {
        GroupMembership {
            user: user.clone(),
            group: group.clone(),
        }
    }

    #[test]
    fn finished_pair_counts_as_one_team_project() {
        let me = user(1, "me");
        let mate = user(2, "mate");
        let forum = group(10, "forum", "finished", &[AuditClosure::Succeeded]);
        let rows = vec![row(&me, &forum), row(&mate, &forum)];

        let result = teamwork(&rows, 1, TeamworkFilter::AllFinished);
        assert_eq!(result.team_project_count(), 1);
        assert_eq!(result.unique_teammates(), 1);
        assert_eq!(result.teammates[0].user.login, "mate");
        assert_eq!(result.solo_project_count(), 0);
        assert_eq!(result.total_collaborations, 2);
    }

    #[test]
    fn succeeded_only_drops_groups_with_failed_audits() {
        let me = user(1, "me");
        let mate = user(2, "mate");
        let forum = group(10, "forum", "finished", &[AuditClosure::Failed]);
        let rows = vec![row(&me, &forum), row(&mate, &forum)];

        assert_eq!(
            teamwork(&rows, 1, TeamworkFilter::AllFinished).team_project_count(),
            1
        );
        let strict = teamwork(&rows, 1, TeamworkFilter::SucceededOnly);
        assert!(strict.is_empty());
        assert_eq!(strict.total_collaborations, 0);
    }

    #[test]
    fn target_is_never_their_own_teammate() {
        let me = user(1, "me");
        let a = user(2, "a");
        let b = user(3, "b");
        let forum = group(1, "forum", "finished", &[]);
        let tetris = group(2, "make-your-game", "finished", &[]);
        let rows = vec![
            row(&me, &forum),
            row(&a, &forum),
            row(&b, &forum),
            row(&me, &tetris),
            row(&a, &tetris),
        ];

        let result = teamwork(&rows, 1, TeamworkFilter::AllFinished);
        assert!(result.teammates.iter().all(|mate| mate.user.id != 1));
        assert_eq!(result.unique_teammates(), 2);
        assert_eq!(result.teammates[0].user.login, "a");
        assert_eq!(result.teammates[0].projects.len(), 2);
        assert_eq!(result.team_projects, vec!["forum", "make-your-game"]);
    }

    #[test]
    fn solo_and_team_are_disjoint_and_deduplicated_by_name() {
        let me = user(1, "me");
        let mate = user(2, "mate");
        let first = group(3, "ascii-art", "finished", &[]);
        let retry = group(5, "ascii-art", "finished", &[]);
        let team = group(4, "forum", "finished", &[]);
        let rows = vec![
            row(&me, &first),
            row(&me, &retry),
            row(&me, &team),
            row(&mate, &team),
        ];

        let result = teamwork(&rows, 1, TeamworkFilter::AllFinished);
        assert_eq!(result.solo_project_count(), 1);
        assert_eq!(result.solo_projects[0].updated_at, retry.updated_at);
        assert!(!result.team_projects.contains(&"ascii-art".to_string()));
        assert_eq!(result.team_projects, vec!["forum"]);
    }

    #[test]
    fn unfinished_and_foreign_groups_are_ignored() {
        let me = user(1, "me");
        let a = user(2, "a");
        let b = user(3, "b");
        let working = group(1, "forum", "working", &[]);
        let foreign = group(2, "lem-in", "finished", &[]);
        let rows = vec![
            row(&me, &working),
            row(&a, &working),
            row(&a, &foreign),
            row(&b, &foreign),
        ];

        assert!(teamwork(&rows, 1, TeamworkFilter::AllFinished).is_empty());
        assert!(teamwork(&[], 1, TeamworkFilter::SucceededOnly).is_empty());
    }
}
