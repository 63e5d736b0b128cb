//! Family dependents.
//!
//! A [`Family`] row is one dependent declared by a member: the people the
//! association supports when something happens to the household. Rows are
//! owned by the declaring member and soft-deleted like every other record.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, RecordStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl TryFrom<&str> for Gender {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid gender: {other}"
            ))),
        }
    }
}

/// How a dependent relates to the declaring member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyRelationship {
    Partner,
    Child,
    Parent,
    Sibling,
    PartnerParent,
    PartnerSibling,
}

impl FamilyRelationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Child => "child",
            Self::Parent => "parent",
            Self::Sibling => "sibling",
            Self::PartnerParent => "partner_parent",
            Self::PartnerSibling => "partner_sibling",
        }
    }
}

impl TryFrom<&str> for FamilyRelationship {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "partner" => Ok(Self::Partner),
            "child" => Ok(Self::Child),
            "parent" => Ok(Self::Parent),
            "sibling" => Ok(Self::Sibling),
            "partner_parent" => Ok(Self::PartnerParent),
            "partner_sibling" => Ok(Self::PartnerSibling),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid family relationship: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Family {
    pub id: Uuid,
    pub member_id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub relationship: FamilyRelationship,
    pub profession: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Family {
    pub fn new(
        member_id: Uuid,
        full_name: String,
        gender: Gender,
        relationship: FamilyRelationship,
        profession: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            member_id,
            full_name,
            gender,
            relationship,
            profession,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "families")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_id: String,
    pub full_name: String,
    pub gender: String,
    pub relationship: String,
    pub profession: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Members,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Family> for ActiveModel {
    fn from(family: &Family) -> Self {
        Self {
            id: ActiveValue::Set(family.id.to_string()),
            member_id: ActiveValue::Set(family.member_id.to_string()),
            full_name: ActiveValue::Set(family.full_name.clone()),
            gender: ActiveValue::Set(family.gender.as_str().to_string()),
            relationship: ActiveValue::Set(family.relationship.as_str().to_string()),
            profession: ActiveValue::Set(family.profession.clone()),
            status: ActiveValue::Set(family.status.as_str().to_string()),
            created_at: ActiveValue::Set(family.created_at),
            updated_at: ActiveValue::Set(family.updated_at),
        }
    }
}

impl TryFrom<Model> for Family {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("family member not exists".to_string()))?,
            member_id: Uuid::parse_str(&model.member_id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            full_name: model.full_name,
            gender: Gender::try_from(model.gender.as_str())?,
            relationship: FamilyRelationship::try_from(model.relationship.as_str())?,
            profession: model.profession,
            status: RecordStatus::try_from(model.status.as_str()).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
