//! Mutual-aid associations.
//!
//! An [`Association`] is one savings group (an edir): it owns a roster of
//! memberships, a set of fee definitions and the bank accounts payments land
//! on. `monthly_fee` is the regular dues amount the group agreed on.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, RecordStatus, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Association {
    pub id: Uuid,
    pub name: String,
    pub monthly_fee: MoneyCents,
    pub city: Option<String>,
    pub meeting_place: Option<String>,
    pub status: RecordStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Association {
    pub fn new(
        name: String,
        monthly_fee: MoneyCents,
        city: Option<String>,
        meeting_place: Option<String>,
        created_by: Uuid,
    ) -> ResultEngine<Self> {
        if monthly_fee.is_negative() {
            return Err(EngineError::InvalidAmount(
                "monthly fee must not be negative".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            monthly_fee,
            city,
            meeting_place,
            status: RecordStatus::Active,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "associations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub monthly_fee: i64,
    pub city: Option<String>,
    pub meeting_place: Option<String>,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::fees::Entity")]
    Fees,
    #[sea_orm(has_many = "super::banks::Entity")]
    Banks,
}

impl Related<super::memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::fees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fees.def()
    }
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Association> for ActiveModel {
    fn from(association: &Association) -> Self {
        Self {
            id: ActiveValue::Set(association.id.to_string()),
            name: ActiveValue::Set(association.name.clone()),
            monthly_fee: ActiveValue::Set(association.monthly_fee.cents()),
            city: ActiveValue::Set(association.city.clone()),
            meeting_place: ActiveValue::Set(association.meeting_place.clone()),
            status: ActiveValue::Set(association.status.as_str().to_string()),
            created_by: ActiveValue::Set(association.created_by.to_string()),
            created_at: ActiveValue::Set(association.created_at),
            updated_at: ActiveValue::Set(association.updated_at),
        }
    }
}

impl TryFrom<Model> for Association {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("association not exists".to_string()))?,
            name: model.name,
            monthly_fee: MoneyCents::new(model.monthly_fee),
            city: model.city,
            meeting_place: model.meeting_place,
            status: RecordStatus::try_from(model.status.as_str()).unwrap_or_default(),
            created_by: Uuid::parse_str(&model.created_by)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
