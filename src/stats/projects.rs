use std::collections::HashMap;

use crate::models::{Outcome, ProgressRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectOutcomes {
    /// Newest `updatedAt` first.
    pub succeeded: Vec<ProgressRecord>,
    /// Newest `createdAt` first.
    pub failed: Vec<ProgressRecord>,
}

/// Every failed attempt of one project, represented by the latest attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedProject {
    pub name: String,
    pub attempts: usize,
    pub latest: ProgressRecord,
}

/// Splits graded records into passed and failed. Ungraded records land in neither.
pub fn classify(records: &[ProgressRecord]) -> ProjectOutcomes {
    let mut outcomes = ProjectOutcomes::default();
    for record in records {
        match record.outcome() {
            Some(Outcome::Passed) => outcomes.succeeded.push(record.clone()),
            Some(Outcome::Failed) => outcomes.failed.push(record.clone()),
            None => {}
        }
    }

    outcomes
        .succeeded
        .sort_by(|a, b| b.last_touched().cmp(&a.last_touched()));
    outcomes.failed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    outcomes
}

/// Groups failed records by project name. Groups come out newest attempt first.
pub fn group_failures(failed: &[ProgressRecord]) -> Vec<FailedProject> {
    let mut sorted: Vec<&ProgressRecord> = failed.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<FailedProject> = Vec::new();

    for record in sorted {
        let name = record.project_name();
        match index.get(name) {
            Some(&position) => groups[position].attempts += 1,
            None => {
                index.insert(name, groups.len());
                groups.push(FailedProject {
                    name: name.to_string(),
                    attempts: 1,
                    latest: record.clone(),
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectRef;
    use chrono::{DateTime, Utc};

    fn record(id: i64, name: Option<&str>, grade: Option<f64>, at: &str) -> ProgressRecord {
        ProgressRecord {
            id,
            user_id: Some(42),
            grade,
            created_at: at.parse::<DateTime<Utc>>().unwrap(),
            updated_at: None,
            path: None,
            object: name.map(|name| ObjectRef {
                name: Some(name.to_string()),
                kind: Some("project".to_string()),
            }),
        }
    }

    #[test]
    fn classification_is_total_over_graded_records() {
        let records = vec![
            record(1, Some("a"), Some(1.0), "2024-01-01T00:00:00Z"),
            record(2, Some("b"), Some(1.4), "2024-01-02T00:00:00Z"),
            record(3, Some("c"), Some(0.99), "2024-01-03T00:00:00Z"),
            record(4, Some("d"), Some(0.0), "2024-01-04T00:00:00Z"),
            record(5, Some("e"), None, "2024-01-05T00:00:00Z"),
        ];

        let outcomes = classify(&records);
        assert_eq!(outcomes.succeeded.len(), 2);
        assert_eq!(outcomes.failed.len(), 2);
        assert!(outcomes
            .succeeded
            .iter()
            .chain(outcomes.failed.iter())
            .all(|record| record.id != 5));
        assert_eq!(outcomes.succeeded[0].id, 2);
        assert_eq!(outcomes.failed[0].id, 4);
    }

    #[test]
    fn retries_collapse_onto_the_latest_attempt() {
        let failed = vec![
            record(1, Some("A"), Some(0.5), "2024-01-01T00:00:00Z"),
            record(2, Some("A"), Some(0.8), "2024-02-01T00:00:00Z"),
        ];

        let groups = group_failures(&failed);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "A");
        assert_eq!(groups[0].attempts, 2);
        assert_eq!(groups[0].latest.id, 2);
        assert_eq!(groups[0].latest.grade, Some(0.8));
    }

    #[test]
    fn unnamed_failures_share_a_placeholder_group() {
        let failed = vec![
            record(1, None, Some(0.1), "2024-03-01T00:00:00Z"),
            record(2, Some("forum"), Some(0.2), "2024-01-01T00:00:00Z"),
            record(3, None, Some(0.3), "2024-02-01T00:00:00Z"),
        ];

        let groups = group_failures(&failed);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Unknown Project");
        assert_eq!(groups[0].attempts, 2);
        assert_eq!(groups[0].latest.id, 1);
        assert_eq!(groups[1].name, "forum");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(classify(&[]), ProjectOutcomes::default());
        assert!(group_failures(&[]).is_empty());
    }
}
