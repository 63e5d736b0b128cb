//! Bank accounts payments are received on.
//!
//! Rows are provisioned by operators through the admin CLI; the engine only
//! reads them, to stamp a payment batch with the account it landed on.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, RecordStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bank {
    pub id: Uuid,
    pub association_id: Uuid,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bank {
    pub fn new(
        association_id: Uuid,
        bank_name: String,
        account_name: String,
        account_number: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            association_id,
            bank_name,
            account_name,
            account_number,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub association_id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub status: String,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::fee_assignments::Entity")]
    FeeAssignments,
}

impl Related<super::associations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Associations.def()
    }
}

impl Related<super::fee_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Bank> for ActiveModel {
    fn from(bank: &Bank) -> Self {
        Self {
            id: ActiveValue::Set(bank.id.to_string()),
            association_id: ActiveValue::Set(bank.association_id.to_string()),
            bank_name: ActiveValue::Set(bank.bank_name.clone()),
            account_name: ActiveValue::Set(bank.account_name.clone()),
            account_number: ActiveValue::Set(bank.account_number.clone()),
            status: ActiveValue::Set(bank.status.as_str().to_string()),
            created_at: ActiveValue::Set(bank.created_at),
            updated_at: ActiveValue::Set(bank.updated_at),
        }
    }
}

impl TryFrom<Model> for Bank {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("bank not exists".to_string()))?,
            association_id: Uuid::parse_str(&model.association_id)
                .map_err(|_| EngineError::KeyNotFound("association not exists".to_string()))?,
            bank_name: model.bank_name,
            account_name: model.account_name,
            account_number: model.account_number,
            status: RecordStatus::try_from(model.status.as_str()).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
