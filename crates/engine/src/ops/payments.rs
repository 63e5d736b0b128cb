use base64::Engine as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    AdminPayFeesCmd, AssignmentTarget, AuditAction, AuditLogEntry, AuditSubject, EngineError, Fee,
    FeeAssignment, PayFeesCmd, PaymentStatus, ResultEngine, TransactionType, UpdateExpenseCmd,
    WithdrawCmd, banks, fee_assignments, fees, members,
};

use super::{
    Engine, FeeOutcome, audit::snapshot, normalize_optional_text, normalize_required_method,
    normalize_required_name, with_tx,
};

/// Result of one settle/revert batch. Rows that could not transition are
/// reported, never turned into an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
    /// The shared reference of this batch; `None` on reverts by id list.
    pub trx_ref: Option<String>,
}

/// Opaque 12-character batch reference.
fn new_trx_ref() -> String {
    let id = Uuid::new_v4();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&id.as_bytes()[..9])
}

fn dedupe(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl Engine {
    /// Flips `not_paid` rows to `paid`, one conditional `UPDATE` per row.
    ///
    /// The status guard in the `WHERE` clause makes the transition
    /// at-most-once even under concurrent duplicate calls: whoever loses the
    /// race affects zero rows and reports the id as skipped.
    async fn mark_paid(
        &self,
        db: &DatabaseTransaction,
        assignment_ids: &[Uuid],
        method: &str,
        trx_ref: &str,
        paid_at: chrono::DateTime<Utc>,
        bank_id: Option<Uuid>,
        proof_image: Option<&str>,
    ) -> ResultEngine<(Vec<Uuid>, Vec<Uuid>)> {
        let mut succeeded = Vec::new();
        let mut skipped = Vec::new();
        for id in dedupe(assignment_ids) {
            let result = fee_assignments::Entity::update_many()
                .col_expr(
                    fee_assignments::Column::PaymentStatus,
                    Expr::value(PaymentStatus::Paid.as_str()),
                )
                .col_expr(
                    fee_assignments::Column::PaymentMethod,
                    Expr::value(Some(method.to_string())),
                )
                .col_expr(
                    fee_assignments::Column::TrxRef,
                    Expr::value(Some(trx_ref.to_string())),
                )
                .col_expr(
                    fee_assignments::Column::BankId,
                    Expr::value(bank_id.map(|id| id.to_string())),
                )
                .col_expr(
                    fee_assignments::Column::ProofImage,
                    Expr::value(proof_image.map(ToString::to_string)),
                )
                .col_expr(fee_assignments::Column::PaidAt, Expr::value(Some(paid_at)))
                .col_expr(fee_assignments::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(fee_assignments::Column::Id.eq(id.to_string()))
                .filter(
                    fee_assignments::Column::PaymentStatus.eq(PaymentStatus::NotPaid.as_str()),
                )
                .exec(db)
                .await?;
            if result.rows_affected == 1 {
                succeeded.push(id);
            } else {
                skipped.push(id);
            }
        }
        Ok((succeeded, skipped))
    }

    /// Reverts `paid` rows to `not_paid`, clearing every payment field.
    /// Same per-row guard as [`Engine::mark_paid`], in the other direction.
    async fn mark_unpaid(
        &self,
        db: &DatabaseTransaction,
        assignment_ids: &[Uuid],
    ) -> ResultEngine<(Vec<Uuid>, Vec<Uuid>)> {
        let mut succeeded = Vec::new();
        let mut skipped = Vec::new();
        for id in dedupe(assignment_ids) {
            let result = fee_assignments::Entity::update_many()
                .col_expr(
                    fee_assignments::Column::PaymentStatus,
                    Expr::value(PaymentStatus::NotPaid.as_str()),
                )
                .col_expr(
                    fee_assignments::Column::PaymentMethod,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    fee_assignments::Column::TrxRef,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    fee_assignments::Column::BankId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    fee_assignments::Column::ProofImage,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    fee_assignments::Column::PaidAt,
                    Expr::value(Option::<DateTimeUtc>::None),
                )
                .col_expr(fee_assignments::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(fee_assignments::Column::Id.eq(id.to_string()))
                .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
                .exec(db)
                .await?;
            if result.rows_affected == 1 {
                succeeded.push(id);
            } else {
                skipped.push(id);
            }
        }
        Ok((succeeded, skipped))
    }

    /// A bank id is only stored when the row actually exists; a stale or
    /// foreign id degrades to "no bank" instead of failing the payment.
    async fn resolve_bank(
        &self,
        db: &DatabaseTransaction,
        bank_id: Option<Uuid>,
    ) -> ResultEngine<Option<Uuid>> {
        let Some(bank_id) = bank_id else {
            return Ok(None);
        };
        let row = banks::Entity::find_by_id(bank_id.to_string()).one(db).await?;
        Ok(row.map(|_| bank_id))
    }

    /// Reverting payments needs staff, or committee in every association the
    /// batch touches.
    async fn require_payment_authority(
        &self,
        db: &DatabaseTransaction,
        actor: &members::Model,
        rows: &[fee_assignments::Model],
    ) -> ResultEngine<()> {
        if actor.is_staff {
            return Ok(());
        }
        let fee_ids: Vec<String> = {
            let mut seen = HashSet::new();
            rows.iter()
                .filter(|row| seen.insert(row.fee_id.clone()))
                .map(|row| row.fee_id.clone())
                .collect()
        };
        let fee_rows = fees::Entity::find()
            .filter(fees::Column::Id.is_in(fee_ids))
            .all(db)
            .await?;
        let mut associations = HashSet::new();
        for fee in &fee_rows {
            associations.insert(super::parse_uuid(&fee.association_id, "association")?);
        }
        for association_id in associations {
            if !self.is_committee(db, association_id, actor).await? {
                return Err(EngineError::Forbidden(
                    "committee role required".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Marks a batch of assignments paid under one shared trx_ref.
    ///
    /// Any member can settle any open row (paying on behalf of family is
    /// normal practice); double payment is impossible thanks to the status
    /// guard. Rows not currently `not_paid` are skipped and reported.
    pub async fn pay_fees(&self, cmd: PayFeesCmd) -> ResultEngine<BatchOutcome> {
        let method = normalize_required_method(&cmd.method)?;
        let trx_ref = match normalize_optional_text(cmd.trx_ref.as_deref()) {
            Some(reference) => reference,
            None => new_trx_ref(),
        };
        let paid_at = cmd.paid_at.unwrap_or_else(Utc::now);

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, cmd.performed_by).await?;
            let bank_id = self.resolve_bank(&db_tx, cmd.bank_id).await?;
            let (succeeded, skipped) = self
                .mark_paid(
                    &db_tx,
                    &cmd.assignment_ids,
                    &method,
                    &trx_ref,
                    paid_at,
                    bank_id,
                    cmd.proof_image.as_deref(),
                )
                .await?;
            Ok(BatchOutcome {
                succeeded,
                skipped,
                trx_ref: Some(trx_ref),
            })
        })
    }

    /// Staff-only settlement for out-of-band collections; records neither
    /// bank nor proof image.
    pub async fn admin_pay_fees(&self, cmd: AdminPayFeesCmd) -> ResultEngine<BatchOutcome> {
        let method = normalize_required_method(&cmd.method)?;
        let trx_ref = match normalize_optional_text(cmd.trx_ref.as_deref()) {
            Some(reference) => reference,
            None => new_trx_ref(),
        };
        let paid_at = cmd.paid_at.unwrap_or_else(Utc::now);

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            super::access::require_staff(&actor)?;
            let (succeeded, skipped) = self
                .mark_paid(
                    &db_tx,
                    &cmd.assignment_ids,
                    &method,
                    &trx_ref,
                    paid_at,
                    None,
                    None,
                )
                .await?;
            Ok(BatchOutcome {
                succeeded,
                skipped,
                trx_ref: Some(trx_ref),
            })
        })
    }

    /// Reverts an explicit list of paid assignments to `not_paid`.
    pub async fn unpay_fees(
        &self,
        assignment_ids: &[Uuid],
        performed_by: Uuid,
    ) -> ResultEngine<BatchOutcome> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, performed_by).await?;
            let id_strings: Vec<String> =
                assignment_ids.iter().map(ToString::to_string).collect();
            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::Id.is_in(id_strings))
                .all(&db_tx)
                .await?;
            self.require_payment_authority(&db_tx, &actor, &rows).await?;

            let (succeeded, skipped) = self.mark_unpaid(&db_tx, assignment_ids).await?;
            Ok(BatchOutcome {
                succeeded,
                skipped,
                trx_ref: None,
            })
        })
    }

    /// Reverts every assignment settled under one trx_ref.
    ///
    /// An unknown or already-reverted reference yields an empty outcome, so
    /// repeating the call is harmless.
    pub async fn remove_payment(
        &self,
        trx_ref: &str,
        performed_by: Uuid,
    ) -> ResultEngine<BatchOutcome> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, performed_by).await?;
            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::TrxRef.eq(trx_ref))
                .all(&db_tx)
                .await?;
            if rows.is_empty() {
                return Ok(BatchOutcome {
                    succeeded: Vec::new(),
                    skipped: Vec::new(),
                    trx_ref: Some(trx_ref.to_string()),
                });
            }
            self.require_payment_authority(&db_tx, &actor, &rows).await?;

            let mut ids = Vec::with_capacity(rows.len());
            for row in &rows {
                ids.push(super::parse_uuid(&row.id, "fee assignment")?);
            }
            let (succeeded, skipped) = self.mark_unpaid(&db_tx, &ids).await?;
            Ok(BatchOutcome {
                succeeded,
                skipped,
                trx_ref: Some(trx_ref.to_string()),
            })
        })
    }

    /// Records money leaving the till: a withdrawal fee settled at creation.
    ///
    /// The single assignment is born `paid` with its own trx_ref; the
    /// beneficiary is a member (support payout) or the association itself.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<FeeOutcome> {
        let name = normalize_required_name(&cmd.name, "fee")?;
        let reason = normalize_optional_text(cmd.reason.as_deref());
        let method = normalize_optional_text(cmd.method.as_deref());

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            self.require_active_association(&db_tx, cmd.association_id)
                .await?;
            self.require_committee(&db_tx, cmd.association_id, &actor)
                .await?;
            if let AssignmentTarget::Member { member_id } = cmd.target
                && !self.member_exists(&db_tx, member_id).await?
            {
                return Err(EngineError::InvalidTarget(
                    "target member not exists".to_string(),
                ));
            }

            let fee = Fee::new(
                cmd.association_id,
                name,
                cmd.category,
                cmd.amount,
                reason,
                TransactionType::Withdrawal,
                cmd.due_date,
            )?;
            fees::ActiveModel::from(&fee).insert(&db_tx).await?;

            let bank_id = self.resolve_bank(&db_tx, cmd.bank_id).await?;
            let mut assignment = FeeAssignment::new(fee.id, cmd.target, PaymentStatus::Paid);
            assignment.payment_method = method;
            assignment.trx_ref = Some(new_trx_ref());
            assignment.bank_id = bank_id;
            assignment.proof_image = cmd.proof_image;
            assignment.paid_at = Some(Utc::now());
            fee_assignments::ActiveModel::from(&assignment)
                .insert(&db_tx)
                .await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Fee { fee_id: fee.id },
                AuditAction::Created,
                cmd.performed_by,
            )
            .new_value(snapshot(&fee));
            self.record_audit(&db_tx, entry).await?;

            Ok(FeeOutcome {
                fee,
                assignments: vec![assignment],
                skipped: Vec::new(),
            })
        })
    }

    /// Rewrites an existing withdrawal: patches the fee row, drops every old
    /// assignment and re-settles exactly one for the new target.
    pub async fn update_expense(&self, cmd: UpdateExpenseCmd) -> ResultEngine<FeeOutcome> {
        let method = normalize_optional_text(cmd.method.as_deref());

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            let model = self.require_fee(&db_tx, cmd.fee_id).await?;
            let mut fee = Fee::try_from(model)?;
            self.require_committee(&db_tx, fee.association_id, &actor)
                .await?;
            if fee.transaction_type != TransactionType::Withdrawal {
                return Err(EngineError::InvalidStatus(
                    "not a withdrawal fee".to_string(),
                ));
            }
            if let AssignmentTarget::Member { member_id } = cmd.target
                && !self.member_exists(&db_tx, member_id).await?
            {
                return Err(EngineError::InvalidTarget(
                    "target member not exists".to_string(),
                ));
            }
            let previous = snapshot(&fee);

            fee_assignments::Entity::delete_many()
                .filter(fee_assignments::Column::FeeId.eq(fee.id.to_string()))
                .exec(&db_tx)
                .await?;

            if let Some(name) = cmd.name.as_deref() {
                fee.name = normalize_required_name(name, "fee")?;
            }
            if let Some(category) = cmd.category {
                fee.category = category;
            }
            if let Some(amount) = cmd.amount {
                if !amount.is_positive() {
                    return Err(EngineError::InvalidAmount(
                        "fee amount must be > 0".to_string(),
                    ));
                }
                fee.amount = amount;
            }
            if let Some(reason) = cmd.reason.as_deref() {
                fee.reason = normalize_optional_text(Some(reason));
            }
            if let Some(due_date) = cmd.due_date {
                fee.due_date = Some(due_date);
            }
            fee.updated_at = Utc::now();
            fees::ActiveModel::from(&fee).update(&db_tx).await?;

            let bank_id = self.resolve_bank(&db_tx, cmd.bank_id).await?;
            let mut assignment = FeeAssignment::new(fee.id, cmd.target, PaymentStatus::Paid);
            assignment.payment_method = method;
            assignment.trx_ref = Some(new_trx_ref());
            assignment.bank_id = bank_id;
            assignment.proof_image = cmd.proof_image;
            assignment.paid_at = Some(Utc::now());
            fee_assignments::ActiveModel::from(&assignment)
                .insert(&db_tx)
                .await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Fee { fee_id: fee.id },
                AuditAction::Modified,
                cmd.performed_by,
            )
            .previous(previous)
            .new_value(snapshot(&fee));
            self.record_audit(&db_tx, entry).await?;

            Ok(FeeOutcome {
                fee,
                assignments: vec![assignment],
                skipped: Vec::new(),
            })
        })
    }
}
