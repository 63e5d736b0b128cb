//! Fee assignments.
//!
//! A [`FeeAssignment`] binds one [`Fee`](crate::Fee) to a single target (a
//! member, or the association itself for expenses) and carries the payment
//! state of that binding. In the engine, *every* paid/unpaid transition
//! happens on assignments, never on the fee row.
//!
//! Assignments settled together share a `trx_ref`, an opaque 12-character
//! batch reference.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AssignmentTargetKind {
    Member,
    Association,
}

impl AssignmentTargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Association => "association",
        }
    }
}

impl TryFrom<&str> for AssignmentTargetKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "member" => Ok(Self::Member),
            "association" => Ok(Self::Association),
            other => Err(EngineError::InvalidTarget(format!(
                "invalid assignment target kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum AssignmentTarget {
    Member { member_id: Uuid },
    Association,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created but not yet owed (withdrawal rows start here when unsettled).
    Pending,
    Paid,
    /// Owed and outstanding; the only state `pay` transitions from.
    NotPaid,
    /// Covered by the association on the member's behalf.
    ForYou,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::NotPaid => "not_paid",
            Self::ForYou => "for_you",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "not_paid" => Ok(Self::NotPaid),
            "for_you" => Ok(Self::ForYou),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeeAssignment {
    pub id: Uuid,
    pub fee_id: Uuid,
    pub target: AssignmentTarget,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    /// Batch reference shared by every assignment settled in one call.
    pub trx_ref: Option<String>,
    pub bank_id: Option<Uuid>,
    pub proof_image: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeeAssignment {
    pub fn new(fee_id: Uuid, target: AssignmentTarget, payment_status: PaymentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fee_id,
            target,
            payment_status,
            payment_method: None,
            trx_ref: None,
            bank_id: None,
            proof_image: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The member this assignment targets, if any.
    pub fn member_id(&self) -> Option<Uuid> {
        match self.target {
            AssignmentTarget::Member { member_id } => Some(member_id),
            AssignmentTarget::Association => None,
        }
    }

    fn target_kind(&self) -> AssignmentTargetKind {
        match self.target {
            AssignmentTarget::Member { .. } => AssignmentTargetKind::Member,
            AssignmentTarget::Association => AssignmentTargetKind::Association,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fee_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub fee_id: String,
    pub target_kind: String,
    pub member_id: Option<String>,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub trx_ref: Option<String>,
    pub bank_id: Option<String>,
    pub proof_image: Option<String>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fees::Entity",
        from = "Column::FeeId",
        to = "super::fees::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Fees,
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Banks,
}

impl Related<super::fees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fees.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FeeAssignment> for ActiveModel {
    fn from(assignment: &FeeAssignment) -> Self {
        Self {
            id: ActiveValue::Set(assignment.id.to_string()),
            fee_id: ActiveValue::Set(assignment.fee_id.to_string()),
            target_kind: ActiveValue::Set(assignment.target_kind().as_str().to_string()),
            member_id: ActiveValue::Set(assignment.member_id().map(|id| id.to_string())),
            payment_status: ActiveValue::Set(assignment.payment_status.as_str().to_string()),
            payment_method: ActiveValue::Set(assignment.payment_method.clone()),
            trx_ref: ActiveValue::Set(assignment.trx_ref.clone()),
            bank_id: ActiveValue::Set(assignment.bank_id.map(|id| id.to_string())),
            proof_image: ActiveValue::Set(assignment.proof_image.clone()),
            paid_at: ActiveValue::Set(assignment.paid_at),
            created_at: ActiveValue::Set(assignment.created_at),
            updated_at: ActiveValue::Set(assignment.updated_at),
        }
    }
}

impl TryFrom<Model> for FeeAssignment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let target_kind = AssignmentTargetKind::try_from(model.target_kind.as_str())?;
        let target = match target_kind {
            AssignmentTargetKind::Member => {
                let raw = model
                    .member_id
                    .as_deref()
                    .ok_or_else(|| EngineError::InvalidTarget("assignment without member".to_string()))?;
                let member_id = Uuid::parse_str(raw)
                    .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?;
                AssignmentTarget::Member { member_id }
            }
            AssignmentTargetKind::Association => AssignmentTarget::Association,
        };

        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("fee assignment not exists".to_string()))?,
            fee_id: Uuid::parse_str(&model.fee_id)
                .map_err(|_| EngineError::KeyNotFound("fee not exists".to_string()))?,
            target,
            payment_status: PaymentStatus::try_from(model.payment_status.as_str())?,
            payment_method: model.payment_method,
            trx_ref: model.trx_ref,
            bank_id: model.bank_id.and_then(|s| Uuid::parse_str(&s).ok()),
            proof_image: model.proof_image,
            paid_at: model.paid_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
