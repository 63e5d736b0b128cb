use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    AssignmentTarget, EngineError, Fee, FeeAssignment, FeeCategory, MoneyCents, PaymentStatus,
    RecordStatus, ResultEngine, TransactionType, banks, fee_assignments, fees, members,
};

use super::{Engine, with_tx};

/// Narrowing for deposit detail queries; both filters are optional.
#[derive(Clone, Debug, Default)]
pub struct DepositFilter {
    pub method: Option<String>,
    pub date: Option<NaiveDate>,
}

/// One outstanding obligation with the fee it stems from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpaidEntry {
    pub assignment: FeeAssignment,
    pub fee: Fee,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpaidSummary {
    pub entries: Vec<UnpaidEntry>,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositItem {
    pub assignment_id: Uuid,
    pub fee_id: Uuid,
    pub fee_name: String,
    pub amount: MoneyCents,
    pub method: Option<String>,
    pub trx_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Paid deposits of one target, itemized. The association-level target (an
/// expense settled against the till) gets its own bucket with no member name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositGroup {
    pub target: AssignmentTarget,
    pub member_name: Option<String>,
    pub total: MoneyCents,
    pub items: Vec<DepositItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositSummaryRow {
    pub day: NaiveDate,
    pub method: String,
    pub total: MoneyCents,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalRecord {
    pub fee: Fee,
    pub assignments: Vec<FeeAssignment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentBatchFee {
    pub fee_id: Uuid,
    pub name: String,
    pub amount: MoneyCents,
    pub category: FeeCategory,
}

/// Everything settled under one trx_ref: shared metadata plus the itemized
/// fees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentBatch {
    pub trx_ref: String,
    pub method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub bank_name: Option<String>,
    pub proof_image: Option<String>,
    pub total: MoneyCents,
    pub fees: Vec<PaymentBatchFee>,
}

/// One row of a member's payment history: a whole batch collapsed to its
/// totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentGroup {
    pub trx_ref: String,
    pub total: MoneyCents,
    pub method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_type: TransactionType,
    pub fee_count: u64,
}

fn total_overflow() -> EngineError {
    EngineError::InvalidAmount("amount total overflow".to_string())
}

/// `[00:00 of day, 00:00 of next day)` in UTC.
fn day_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

impl Engine {
    /// Open obligations of one member in one association, with the sum.
    ///
    /// Only assignments whose fee is an active deposit count; disabled fees
    /// drop out of the debt the moment they are deactivated.
    pub(super) async fn unpaid_for_member(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<UnpaidSummary> {
        let rows = fee_assignments::Entity::find()
            .filter(fee_assignments::Column::MemberId.eq(member_id.to_string()))
            .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::NotPaid.as_str()))
            .find_also_related(fees::Entity)
            .filter(fees::Column::AssociationId.eq(association_id.to_string()))
            .filter(fees::Column::Status.eq(RecordStatus::Active.as_str()))
            .filter(fees::Column::TransactionType.eq(TransactionType::Deposit.as_str()))
            .order_by_desc(fees::Column::CreatedAt)
            .all(db)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        let mut total = MoneyCents::ZERO;
        for (assignment_model, fee_model) in rows {
            let Some(fee_model) = fee_model else {
                continue;
            };
            let fee = Fee::try_from(fee_model)?;
            total = total.checked_add(fee.amount).ok_or_else(total_overflow)?;
            entries.push(UnpaidEntry {
                assignment: FeeAssignment::try_from(assignment_model)?,
                fee,
            });
        }
        Ok(UnpaidSummary { entries, total })
    }

    /// What a member still owes an association.
    pub async fn unpaid_fees(
        &self,
        association_id: Uuid,
        member_id: Uuid,
        caller: Uuid,
    ) -> ResultEngine<UnpaidSummary> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_self_or_committee(&db_tx, association_id, &actor, member_id)
                .await?;
            self.unpaid_for_member(&db_tx, association_id, member_id)
                .await
        })
    }

    /// Paid deposits of an association grouped per target, oldest payment
    /// first within each group. Committee only; an empty result is reported
    /// as not found so callers can distinguish "no money yet" from "empty
    /// filter combination" the same way.
    pub async fn deposits(
        &self,
        association_id: Uuid,
        filter: DepositFilter,
        caller: Uuid,
    ) -> ResultEngine<Vec<DepositGroup>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_committee(&db_tx, association_id, &actor)
                .await?;

            let mut query = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(fees::Entity)
                .filter(fees::Column::AssociationId.eq(association_id.to_string()))
                .filter(fees::Column::TransactionType.eq(TransactionType::Deposit.as_str()))
                .order_by_asc(fee_assignments::Column::PaidAt);
            if let Some(method) = filter.method.as_deref() {
                query = query.filter(fee_assignments::Column::PaymentMethod.eq(method));
            }
            if let Some(date) = filter.date {
                let (start, end) = day_range(date);
                query = query
                    .filter(fee_assignments::Column::PaidAt.gte(start))
                    .filter(fee_assignments::Column::PaidAt.lt(end));
            }
            let rows = query.all(&db_tx).await?;
            if rows.is_empty() {
                return Err(EngineError::KeyNotFound(
                    "no deposits recorded".to_string(),
                ));
            }

            let mut order: Vec<Option<String>> = Vec::new();
            let mut buckets: HashMap<Option<String>, Vec<(fee_assignments::Model, fees::Model)>> =
                HashMap::new();
            for (assignment, fee) in rows {
                let Some(fee) = fee else {
                    continue;
                };
                let key = assignment.member_id.clone();
                if !buckets.contains_key(&key) {
                    order.push(key.clone());
                }
                buckets.entry(key).or_default().push((assignment, fee));
            }

            let member_ids: Vec<String> = order.iter().flatten().cloned().collect();
            let member_rows = members::Entity::find()
                .filter(members::Column::Id.is_in(member_ids))
                .all(&db_tx)
                .await?;
            let mut names: HashMap<String, String> = HashMap::with_capacity(member_rows.len());
            for model in member_rows {
                names.insert(model.id, model.full_name);
            }

            let mut out = Vec::with_capacity(order.len());
            for key in order {
                let group_rows = buckets.remove(&key).unwrap_or_default();
                let target = match key.as_deref() {
                    Some(raw) => AssignmentTarget::Member {
                        member_id: super::parse_uuid(raw, "member")?,
                    },
                    None => AssignmentTarget::Association,
                };
                let member_name = key.as_ref().and_then(|id| names.get(id).cloned());

                let mut total = MoneyCents::ZERO;
                let mut items = Vec::with_capacity(group_rows.len());
                for (assignment, fee) in group_rows {
                    let amount = MoneyCents::new(fee.amount);
                    total = total.checked_add(amount).ok_or_else(total_overflow)?;
                    items.push(DepositItem {
                        assignment_id: super::parse_uuid(&assignment.id, "fee assignment")?,
                        fee_id: super::parse_uuid(&fee.id, "fee")?,
                        fee_name: fee.name,
                        amount,
                        method: assignment.payment_method,
                        trx_ref: assignment.trx_ref,
                        paid_at: assignment.paid_at,
                    });
                }
                out.push(DepositGroup {
                    target,
                    member_name,
                    total,
                    items,
                });
            }
            Ok(out)
        })
    }

    /// Collection totals per calendar day and payment method, newest day
    /// first, methods alphabetical within a day.
    pub async fn deposit_summary(
        &self,
        association_id: Uuid,
        limit: Option<u64>,
        caller: Uuid,
    ) -> ResultEngine<Vec<DepositSummaryRow>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_committee(&db_tx, association_id, &actor)
                .await?;

            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(fees::Entity)
                .filter(fees::Column::AssociationId.eq(association_id.to_string()))
                .filter(fees::Column::TransactionType.eq(TransactionType::Deposit.as_str()))
                .all(&db_tx)
                .await?;

            let mut order: Vec<(NaiveDate, String)> = Vec::new();
            let mut totals: HashMap<(NaiveDate, String), (MoneyCents, u64)> = HashMap::new();
            for (assignment, fee) in rows {
                let Some(fee) = fee else {
                    continue;
                };
                let Some(paid_at) = assignment.paid_at else {
                    continue;
                };
                let method = assignment
                    .payment_method
                    .unwrap_or_else(|| "unknown".to_string());
                let key = (paid_at.date_naive(), method);
                if !totals.contains_key(&key) {
                    order.push(key.clone());
                }
                let slot = totals.entry(key).or_insert((MoneyCents::ZERO, 0));
                slot.0 = slot
                    .0
                    .checked_add(MoneyCents::new(fee.amount))
                    .ok_or_else(total_overflow)?;
                slot.1 += 1;
            }

            order.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
            let mut out = Vec::with_capacity(order.len());
            for key in order {
                if let Some((total, count)) = totals.remove(&key) {
                    out.push(DepositSummaryRow {
                        day: key.0,
                        method: key.1,
                        total,
                        count,
                    });
                }
            }
            if let Some(limit) = limit {
                out.truncate(limit as usize);
            }
            Ok(out)
        })
    }

    /// Active withdrawal fees with their settlement rows, newest first.
    pub async fn list_withdrawals(
        &self,
        association_id: Uuid,
        limit: Option<u64>,
        caller: Uuid,
    ) -> ResultEngine<Vec<WithdrawalRecord>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_association_member(&db_tx, association_id, &actor)
                .await?;

            let fee_rows = fees::Entity::find()
                .filter(fees::Column::AssociationId.eq(association_id.to_string()))
                .filter(fees::Column::Status.eq(RecordStatus::Active.as_str()))
                .filter(fees::Column::TransactionType.eq(TransactionType::Withdrawal.as_str()))
                .order_by_desc(fees::Column::CreatedAt)
                .limit(limit)
                .all(&db_tx)
                .await?;

            let fee_ids: Vec<String> = fee_rows.iter().map(|f| f.id.clone()).collect();
            let assignment_rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::FeeId.is_in(fee_ids))
                .order_by_asc(fee_assignments::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let mut by_fee: HashMap<String, Vec<FeeAssignment>> = HashMap::new();
            for model in assignment_rows {
                let key = model.fee_id.clone();
                by_fee
                    .entry(key)
                    .or_default()
                    .push(FeeAssignment::try_from(model)?);
            }

            let mut out = Vec::with_capacity(fee_rows.len());
            for model in fee_rows {
                let assignments = by_fee.remove(&model.id).unwrap_or_default();
                out.push(WithdrawalRecord {
                    fee: Fee::try_from(model)?,
                    assignments,
                });
            }
            Ok(out)
        })
    }

    /// Looks one settled batch up by its shared reference.
    ///
    /// Readable by staff, by any member the batch targets, and by committee
    /// of every association the batch touches.
    pub async fn payment_batch(&self, trx_ref: &str, caller: Uuid) -> ResultEngine<PaymentBatch> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::TrxRef.eq(trx_ref))
                .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(fees::Entity)
                .order_by_asc(fee_assignments::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let Some((first, _)) = rows.first() else {
                return Err(EngineError::KeyNotFound(
                    "payment batch not exists".to_string(),
                ));
            };

            let in_batch = rows
                .iter()
                .any(|(a, _)| a.member_id.as_deref() == Some(actor.id.as_str()));
            if !actor.is_staff && !in_batch {
                let mut association_ids = HashSet::new();
                for (_, fee) in &rows {
                    if let Some(fee) = fee {
                        association_ids
                            .insert(super::parse_uuid(&fee.association_id, "association")?);
                    }
                }
                for association_id in association_ids {
                    self.require_committee(&db_tx, association_id, &actor)
                        .await?;
                }
            }

            let method = first.payment_method.clone();
            let paid_at = first.paid_at;
            let proof_image = first.proof_image.clone();
            let bank_name = match first.bank_id.as_deref() {
                Some(raw) => banks::Entity::find_by_id(raw.to_string())
                    .one(&db_tx)
                    .await?
                    .map(|bank| bank.bank_name),
                None => None,
            };

            let mut total = MoneyCents::ZERO;
            let mut batch_fees = Vec::with_capacity(rows.len());
            for (_, fee_model) in rows {
                let Some(fee_model) = fee_model else {
                    continue;
                };
                let fee = Fee::try_from(fee_model)?;
                total = total.checked_add(fee.amount).ok_or_else(total_overflow)?;
                batch_fees.push(PaymentBatchFee {
                    fee_id: fee.id,
                    name: fee.name,
                    amount: fee.amount,
                    category: fee.category,
                });
            }

            Ok(PaymentBatch {
                trx_ref: trx_ref.to_string(),
                method,
                paid_at,
                bank_name,
                proof_image,
                total,
                fees: batch_fees,
            })
        })
    }

    /// A member's settled batches within one association, newest first.
    pub async fn member_payments(
        &self,
        association_id: Uuid,
        member_id: Uuid,
        limit: Option<u64>,
        caller: Uuid,
    ) -> ResultEngine<Vec<PaymentGroup>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_self_or_committee(&db_tx, association_id, &actor, member_id)
                .await?;

            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::MemberId.eq(member_id.to_string()))
                .filter(fee_assignments::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(fees::Entity)
                .filter(fees::Column::AssociationId.eq(association_id.to_string()))
                .order_by_desc(fee_assignments::Column::PaidAt)
                .all(&db_tx)
                .await?;

            let mut order: Vec<String> = Vec::new();
            let mut groups: HashMap<String, PaymentGroup> = HashMap::new();
            for (assignment, fee_model) in rows {
                let Some(fee_model) = fee_model else {
                    continue;
                };
                let Some(trx_ref) = assignment.trx_ref.clone() else {
                    continue;
                };
                let fee = Fee::try_from(fee_model)?;
                if let Some(group) = groups.get_mut(&trx_ref) {
                    group.total = group
                        .total
                        .checked_add(fee.amount)
                        .ok_or_else(total_overflow)?;
                    group.fee_count += 1;
                } else {
                    order.push(trx_ref.clone());
                    groups.insert(
                        trx_ref.clone(),
                        PaymentGroup {
                            trx_ref,
                            total: fee.amount,
                            method: assignment.payment_method.clone(),
                            paid_at: assignment.paid_at,
                            transaction_type: fee.transaction_type,
                            fee_count: 1,
                        },
                    );
                }
            }

            let mut out = Vec::with_capacity(order.len());
            for key in order {
                if let Some(group) = groups.remove(&key) {
                    out.push(group);
                }
            }
            if let Some(limit) = limit {
                out.truncate(limit as usize);
            }
            Ok(out)
        })
    }
}
