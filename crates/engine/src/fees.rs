//! Fee definitions.
//!
//! A [`Fee`] is one money event declared against an association: regular
//! dues, a funeral contribution, an expense paid out of the till. The fee
//! itself carries no payment state; that lives in the per-target rows under
//! [`fee_assignments`](crate::fee_assignments). Deposits collect money from
//! members, withdrawals record money leaving.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, RecordStatus, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    MonthlyFee,
    FuneralContribution,
    SicknessSupport,
    RegistrationFee,
    #[default]
    Other,
}

impl FeeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MonthlyFee => "monthly_fee",
            Self::FuneralContribution => "funeral_contribution",
            Self::SicknessSupport => "sickness_support",
            Self::RegistrationFee => "registration_fee",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for FeeCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly_fee" => Ok(Self::MonthlyFee),
            "funeral_contribution" => Ok(Self::FuneralContribution),
            "sickness_support" => Ok(Self::SicknessSupport),
            "registration_fee" => Ok(Self::RegistrationFee),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid fee category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fee {
    pub id: Uuid,
    pub association_id: Uuid,
    pub name: String,
    pub category: FeeCategory,
    /// Amount each target owes (deposit) or the amount paid out (withdrawal).
    pub amount: MoneyCents,
    pub reason: Option<String>,
    pub transaction_type: TransactionType,
    pub due_date: Option<DateTime<Utc>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fee {
    pub fn new(
        association_id: Uuid,
        name: String,
        category: FeeCategory,
        amount: MoneyCents,
        reason: Option<String>,
        transaction_type: TransactionType,
        due_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "fee amount must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            association_id,
            name,
            category,
            amount,
            reason,
            transaction_type,
            due_date,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub association_id: String,
    pub name: String,
    pub category: String,
    pub amount: i64,
    pub reason: Option<String>,
    pub transaction_type: String,
    pub due_date: Option<DateTimeUtc>,
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

impl From<&Fee> for ActiveModel {
    fn from(fee: &Fee) -> Self {
        Self {
            id: ActiveValue::Set(fee.id.to_string()),
            association_id: ActiveValue::Set(fee.association_id.to_string()),
            name: ActiveValue::Set(fee.name.clone()),
            category: ActiveValue::Set(fee.category.as_str().to_string()),
            amount: ActiveValue::Set(fee.amount.cents()),
            reason: ActiveValue::Set(fee.reason.clone()),
            transaction_type: ActiveValue::Set(fee.transaction_type.as_str().to_string()),
            due_date: ActiveValue::Set(fee.due_date),
            status: ActiveValue::Set(fee.status.as_str().to_string()),
            created_at: ActiveValue::Set(fee.created_at),
            updated_at: ActiveValue::Set(fee.updated_at),
        }
    }
}

impl TryFrom<Model> for Fee {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("fee not exists".to_string()))?,
            association_id: Uuid::parse_str(&model.association_id)
                .map_err(|_| EngineError::KeyNotFound("association not exists".to_string()))?,
            name: model.name,
            category: FeeCategory::try_from(model.category.as_str()).unwrap_or_default(),
            amount: MoneyCents::new(model.amount),
            reason: model.reason,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            due_date: model.due_date,
            status: RecordStatus::try_from(model.status.as_str()).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
