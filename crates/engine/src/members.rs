//! Member identities.
//!
//! A [`Member`] is a person known to the platform. The phone number is the
//! login identity (Basic auth username) and is unique across the store.
//! Per-association state lives in [`memberships`](crate::memberships).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, RecordStatus, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    /// Login secret. Never serialized, so it cannot leak into audit
    /// snapshots or API payloads.
    #[serde(skip_serializing)]
    pub password: String,
    pub is_staff: bool,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(full_name: String, phone: String, password: String) -> ResultEngine<Self> {
        if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::InvalidPhone(format!(
                "phone must contain digits only, got {phone:?}"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            full_name,
            phone,
            password,
            is_staff: false,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub is_staff: bool,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::fee_assignments::Entity")]
    FeeAssignments,
    #[sea_orm(has_many = "super::families::Entity")]
    Families,
}

impl Related<super::memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::fee_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeAssignments.def()
    }
}

impl Related<super::families::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Families.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Member> for ActiveModel {
    fn from(member: &Member) -> Self {
        Self {
            id: ActiveValue::Set(member.id.to_string()),
            full_name: ActiveValue::Set(member.full_name.clone()),
            phone: ActiveValue::Set(member.phone.clone()),
            password: ActiveValue::Set(member.password.clone()),
            is_staff: ActiveValue::Set(member.is_staff),
            status: ActiveValue::Set(member.status.as_str().to_string()),
            created_at: ActiveValue::Set(member.created_at),
            updated_at: ActiveValue::Set(member.updated_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            full_name: model.full_name,
            phone: model.phone,
            password: model.password,
            is_staff: model.is_staff,
            status: RecordStatus::try_from(model.status.as_str()).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
