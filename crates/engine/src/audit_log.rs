//! Append-only audit trail.
//!
//! One [`AuditLogEntry`] per state-changing operation, written inside the
//! same database transaction as the primary write. Subjects are referenced by
//! kind + id with no foreign key, so the trail survives its subject.
//!
//! `previous_value` / `new_value` hold JSON snapshots of the subject around
//! the change; entries written before a schema change stay readable because
//! snapshots are parsed tolerantly.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Modified,
    Disabled,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Disabled => "disabled",
        }
    }
}

impl TryFrom<&str> for AuditAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(Self::Created),
            "modified" => Ok(Self::Modified),
            "disabled" => Ok(Self::Disabled),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid audit action: {other}"
            ))),
        }
    }
}

/// What an audit entry is about.
///
/// Memberships have a composite key, so their id part joins the pair with a
/// colon; the other subjects use the row uuid directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum AuditSubject {
    Member { member_id: Uuid },
    Association { association_id: Uuid },
    Membership { association_id: Uuid, member_id: Uuid },
    Fee { fee_id: Uuid },
    Family { family_id: Uuid },
}

impl AuditSubject {
    pub(crate) fn kind(self) -> &'static str {
        match self {
            Self::Member { .. } => "member",
            Self::Association { .. } => "association",
            Self::Membership { .. } => "membership",
            Self::Fee { .. } => "fee",
            Self::Family { .. } => "family",
        }
    }

    pub(crate) fn subject_id(self) -> String {
        match self {
            Self::Member { member_id } => member_id.to_string(),
            Self::Association { association_id } => association_id.to_string(),
            Self::Membership {
                association_id,
                member_id,
            } => format!("{association_id}:{member_id}"),
            Self::Fee { fee_id } => fee_id.to_string(),
            Self::Family { family_id } => family_id.to_string(),
        }
    }

    fn from_parts(kind: &str, id: &str) -> ResultEngine<Self> {
        let not_exists = || EngineError::KeyNotFound("audit subject not exists".to_string());
        match kind {
            "member" => Ok(Self::Member {
                member_id: Uuid::parse_str(id).map_err(|_| not_exists())?,
            }),
            "association" => Ok(Self::Association {
                association_id: Uuid::parse_str(id).map_err(|_| not_exists())?,
            }),
            "membership" => {
                let (association, member) = id.split_once(':').ok_or_else(not_exists)?;
                Ok(Self::Membership {
                    association_id: Uuid::parse_str(association).map_err(|_| not_exists())?,
                    member_id: Uuid::parse_str(member).map_err(|_| not_exists())?,
                })
            }
            "fee" => Ok(Self::Fee {
                fee_id: Uuid::parse_str(id).map_err(|_| not_exists())?,
            }),
            "family" => Ok(Self::Family {
                family_id: Uuid::parse_str(id).map_err(|_| not_exists())?,
            }),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid audit subject kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub subject: AuditSubject,
    pub action: AuditAction,
    pub performed_by: Uuid,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub comment: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(subject: AuditSubject, action: AuditAction, performed_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject,
            action,
            performed_by,
            previous_value: None,
            new_value: None,
            comment: None,
            logged_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn previous(mut self, value: Option<serde_json::Value>) -> Self {
        self.previous_value = value;
        self
    }

    #[must_use]
    pub fn new_value(mut self, value: Option<serde_json::Value>) -> Self {
        self.new_value = value;
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject_kind: String,
    pub subject_id: String,
    pub action: String,
    pub performed_by: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub comment: Option<String>,
    pub logged_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AuditLogEntry> for ActiveModel {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            subject_kind: ActiveValue::Set(entry.subject.kind().to_string()),
            subject_id: ActiveValue::Set(entry.subject.subject_id()),
            action: ActiveValue::Set(entry.action.as_str().to_string()),
            performed_by: ActiveValue::Set(entry.performed_by.to_string()),
            previous_value: ActiveValue::Set(entry.previous_value.as_ref().map(ToString::to_string)),
            new_value: ActiveValue::Set(entry.new_value.as_ref().map(ToString::to_string)),
            comment: ActiveValue::Set(entry.comment.clone()),
            logged_at: ActiveValue::Set(entry.logged_at),
        }
    }
}

impl TryFrom<Model> for AuditLogEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("audit entry not exists".to_string()))?,
            subject: AuditSubject::from_parts(&model.subject_kind, &model.subject_id)?,
            action: AuditAction::try_from(model.action.as_str())?,
            performed_by: Uuid::parse_str(&model.performed_by)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            previous_value: model
                .previous_value
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            new_value: model
                .new_value
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            comment: model.comment,
            logged_at: model.logged_at,
        })
    }
}
