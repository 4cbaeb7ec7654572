//! GraphQL documents sent to the platform. Row permissions on the backend
//! scope the unparameterised ones to the signed-in user.

use crate::stats::programs::Program;

pub const PROFILE: &str = r#"
{
  user {
    id
    login
    firstName
    lastName
    email
    createdAt
    attrs
  }
}"#;

pub const AUDIT_RATIO: &str = r#"
{
  user {
    auditRatio
    totalUp
    totalDown
    totalUpBonus
  }
}"#;

pub const AUDIT_COUNTS: &str = r#"
{
  user {
    succeeded_audits: audits_aggregate(where: {closureType: {_eq: succeeded}}) {
      aggregate {
        count
      }
    }
    failed_audits: audits_aggregate(where: {closureType: {_eq: failed}}) {
      aggregate {
        count
      }
    }
  }
}"#;

pub const PROJECTS: &str = r#"
{
  progress(where: {object: {type: {_eq: "project"}}}) {
    id
    userId
    grade
    createdAt
    updatedAt
    path
    object {
      name
      type
    }
  }
}"#;

pub const XP_TRANSACTIONS: &str = r#"
{
  user {
    transactions(where: {type: {_eq: "xp"}}, order_by: {createdAt: desc}) {
      id
      type
      amount
      createdAt
      path
      object {
        name
      }
    }
  }
}"#;

pub const SKILLS: &str = r#"
{
  user {
    transactions(where: {type: {_nin: ["xp", "level", "up", "down"]}}) {
      type
      amount
      createdAt
    }
  }
}"#;

pub const USER_XP_TRANSACTIONS: &str = r#"
query UserTransactions($userId: Int!) {
  transaction(
    where: {_and: [{userId: {_eq: $userId}}, {type: {_eq: "xp"}}]}
    order_by: {createdAt: asc}
  ) {
    id
    type
    amount
    createdAt
    path
    object {
      name
    }
  }
}"#;

pub const GAMES: &str = r#"
query Games($resultId: Int!) {
  result(where: {id: {_eq: $resultId}}) {
    attrs
  }
}"#;

pub const PARTICIPANTS: &str = r#"
{
  user_public_view {
    id
    login
    firstName
    lastName
  }
}"#;

pub const FINISHED_GROUPS: &str = r#"
query FinishedGroups($userId: Int!) {
  group(
    where: {_and: [{status: {_eq: finished}}, {members: {userId: {_eq: $userId}}}]}
  ) {
    id
  }
}"#;

pub const TEAMWORK: &str = r#"
query Teamwork($groupIds: [Int!]!) {
  group_user(where: {groupId: {_in: $groupIds}}) {
    user {
      id
      login
      firstName
      lastName
    }
    group {
      id
      status
      updatedAt
      object {
        name
      }
      audits {
        closureType
      }
    }
  }
}"#;

/// Highest `level` transaction recorded for `program`.
pub fn level_query(program: Program) -> String {
    let filter = match program {
        Program::CoreEducation => r#"{event: {object: {name: {_eq: "Module"}}}}"#,
        Program::PiscineJs => r#"{event: {object: {name: {_eq: "Piscine JS"}}}}"#,
        Program::PiscineGo => r#"{path: {_like: "%piscinego%"}}"#,
    };
    format!(
        r#"
{{
  transaction(
    where: {{_and: [{{type: {{_eq: "level"}}}}, {filter}]}}
    order_by: {{amount: desc}}
    limit: 1
  ) {{
    type
    amount
    createdAt
    path
  }}
}}"#
    )
}
