use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The curriculum object a row points at (`object { name type }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub object: Option<ObjectRef>,
}

impl Transaction {
    pub fn is_xp(&self) -> bool {
        self.kind == "xp"
    }

    pub fn is_level(&self) -> bool {
        self.kind == "level"
    }

    /// Skill scores are every type that is not xp, level or an audit up/down.
    pub fn is_skill(&self) -> bool {
        !matches!(self.kind.as_str(), "xp" | "level" | "up" | "down")
    }

    /// Null amounts count as zero.
    pub fn xp(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    pub fn object_name(&self) -> Option<&str> {
        self.object.as_ref().and_then(|object| object.name.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.object_name()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.path
                    .as_deref()
                    .and_then(|path| path.rsplit('/').find(|segment| !segment.is_empty()))
            })
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub grade: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub object: Option<ObjectRef>,
}

impl ProgressRecord {
    /// `None` while the project is still in progress (no grade yet).
    pub fn outcome(&self) -> Option<Outcome> {
        let grade = self.grade?;
        if grade >= 1.0 {
            Some(Outcome::Passed)
        } else {
            Some(Outcome::Failed)
        }
    }

    pub fn project_name(&self) -> &str {
        self.object
            .as_ref()
            .and_then(|object| object.name.as_deref())
            .unwrap_or("Unknown Project")
    }

    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl PublicUser {
    pub fn full_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditClosure {
    Succeeded,
    Failed,
    AutoFailed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAudit {
    #[serde(default)]
    pub closure_type: Option<AuditClosure>,
}

/// One project attempt, owned by one or more members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub object: Option<ObjectRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audits: Vec<GroupAudit>,
}

impl ProjectGroup {
    pub fn project_name(&self) -> &str {
        self.object
            .as_ref()
            .and_then(|object| object.name.as_deref())
            .unwrap_or("Unknown Project")
    }

    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }

    pub fn has_failed_audit(&self) -> bool {
        self.audits.iter().any(|audit| {
            matches!(
                audit.closure_type,
                Some(AuditClosure::Failed | AuditClosure::AutoFailed)
            )
        })
    }
}

/// A `group_user` join row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user: PublicUser,
    pub group: ProjectGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attrs: serde_json::Value,
}

impl Profile {
    pub fn full_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    /// String attribute from the free-form `attrs` blob, if present and non-empty.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .get(key)
            .and_then(|value| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTotals {
    #[serde(default)]
    pub audit_ratio: Option<f64>,
    #[serde(default)]
    pub total_up: Option<f64>,
    #[serde(default)]
    pub total_down: Option<f64>,
    #[serde(default)]
    pub total_up_bonus: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLevel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<GameLevel>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// The `attrs` blob of a game `result` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameAttrs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub games: Vec<GameRecord>,
}

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or(""), last.unwrap_or(""))
        .trim()
        .to_string()
}
