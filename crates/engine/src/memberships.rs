//! Membership records.
//!
//! A [`Membership`] binds one member to one association, keyed by the pair
//! (association, member), and tracks the maker/checker lifecycle: the member
//! files the request (maker), a committee member settles it (checker). There
//! is at most one membership row per pair; re-joining reuses the row.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Active,
    Rejected,
    Cancelled,
    Blocked,
    NotActive,
    Leaved,
}

impl MembershipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Blocked => "blocked",
            Self::NotActive => "not_active",
            Self::Leaved => "leaved",
        }
    }

    /// A settled membership can be re-opened by a new join request. Pending
    /// and active rows cannot, and blocked members are turned away.
    pub fn can_rejoin(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Cancelled | Self::NotActive | Self::Leaved
        )
    }
}

impl TryFrom<&str> for MembershipStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "blocked" => Ok(Self::Blocked),
            "not_active" => Ok(Self::NotActive),
            "leaved" => Ok(Self::Leaved),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid membership status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub association_id: Uuid,
    pub member_id: Uuid,
    pub status: MembershipStatus,
    pub is_committee: bool,
    /// Member who filed the request.
    pub maker: Uuid,
    /// Committee member who settled it, once reviewed.
    pub checker: Option<Uuid>,
    pub reason: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(
        association_id: Uuid,
        member_id: Uuid,
        status: MembershipStatus,
        maker: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            association_id,
            member_id,
            status,
            is_committee: false,
            maker,
            checker: None,
            reason: None,
            joined_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub association_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub status: String,
    pub is_committee: bool,
    pub maker: String,
    pub checker: Option<String>,
    pub reason: Option<String>,
    pub joined_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::associations::Entity",
        from = "Column::AssociationId",
        to = "super::associations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Associations,
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Members,
}

impl Related<super::associations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Associations.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Membership> for ActiveModel {
    fn from(membership: &Membership) -> Self {
        Self {
            association_id: ActiveValue::Set(membership.association_id.to_string()),
            member_id: ActiveValue::Set(membership.member_id.to_string()),
            status: ActiveValue::Set(membership.status.as_str().to_string()),
            is_committee: ActiveValue::Set(membership.is_committee),
            maker: ActiveValue::Set(membership.maker.to_string()),
            checker: ActiveValue::Set(membership.checker.map(|id| id.to_string())),
            reason: ActiveValue::Set(membership.reason.clone()),
            joined_at: ActiveValue::Set(membership.joined_at),
            updated_at: ActiveValue::Set(membership.updated_at),
        }
    }
}

impl TryFrom<Model> for Membership {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            association_id: Uuid::parse_str(&model.association_id)
                .map_err(|_| EngineError::KeyNotFound("association not exists".to_string()))?,
            member_id: Uuid::parse_str(&model.member_id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            status: MembershipStatus::try_from(model.status.as_str())?,
            is_committee: model.is_committee,
            maker: Uuid::parse_str(&model.maker)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            checker: model.checker.and_then(|s| Uuid::parse_str(&s).ok()),
            reason: model.reason,
            joined_at: model.joined_at,
            updated_at: model.updated_at,
        })
    }
}
