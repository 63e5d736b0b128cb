use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    AssignmentPolicy, AssignmentTarget, AuditAction, AuditLogEntry, AuditSubject, CreateFeeCmd,
    EngineError, Fee, FeeAssignment, Member, MembershipStatus, PaymentStatus, RecordStatus,
    ResultEngine, TransactionType, UpdateFeeCmd, fee_assignments, fees, members, memberships,
};

use super::{Engine, audit::snapshot, normalize_optional_text, normalize_required_name, with_tx};

/// A persisted fee plus the obligations this call (re)generated for it.
#[derive(Clone, Debug)]
pub struct FeeOutcome {
    pub fee: Fee,
    pub assignments: Vec<FeeAssignment>,
    /// Custom-list ids that did not resolve to a member.
    pub skipped: Vec<Uuid>,
}

/// One assignment of a fee, with the member row resolved when the target is
/// a member.
#[derive(Clone, Debug)]
pub struct FeeDetailRow {
    pub assignment: FeeAssignment,
    pub member: Option<Member>,
}

#[derive(Clone, Debug)]
pub struct FeeDetail {
    pub fee: Fee,
    pub assignments: Vec<FeeDetailRow>,
}

impl Engine {
    async fn resolve_supported_member(
        &self,
        db: &DatabaseTransaction,
        supported_member: Option<Uuid>,
    ) -> ResultEngine<Option<Uuid>> {
        let Some(member_id) = supported_member else {
            return Ok(None);
        };
        if !self.member_exists(db, member_id).await? {
            return Err(EngineError::InvalidTarget(
                "supported member not exists".to_string(),
            ));
        }
        Ok(Some(member_id))
    }

    /// Computes the assignment rows a policy yields for one fee.
    ///
    /// `already_assigned` members are left alone (fee update keeps their
    /// settled rows). The supported member always ends up with a `ForYou`
    /// row, whether or not the policy would have reached them; unknown ids
    /// in a custom list are reported as skipped, never an error.
    async fn build_assignments(
        &self,
        db: &DatabaseTransaction,
        fee: &Fee,
        policy: &AssignmentPolicy,
        supported_member: Option<Uuid>,
        already_assigned: &HashSet<Uuid>,
    ) -> ResultEngine<(Vec<FeeAssignment>, Vec<Uuid>)> {
        let mut assignments = Vec::new();
        let mut skipped = Vec::new();

        match policy {
            AssignmentPolicy::NoOne => {}
            AssignmentPolicy::AllActiveMembers => {
                let supported = self.resolve_supported_member(db, supported_member).await?;
                let rows = memberships::Entity::find()
                    .filter(memberships::Column::AssociationId.eq(fee.association_id.to_string()))
                    .filter(memberships::Column::Status.eq(MembershipStatus::Active.as_str()))
                    .order_by_asc(memberships::Column::JoinedAt)
                    .all(db)
                    .await?;

                let mut covered_supported = false;
                for row in rows {
                    let member_id = super::parse_uuid(&row.member_id, "member")?;
                    if already_assigned.contains(&member_id) {
                        continue;
                    }
                    let status = if supported == Some(member_id) {
                        covered_supported = true;
                        PaymentStatus::ForYou
                    } else {
                        PaymentStatus::NotPaid
                    };
                    assignments.push(FeeAssignment::new(
                        fee.id,
                        AssignmentTarget::Member { member_id },
                        status,
                    ));
                }
                if let Some(member_id) = supported
                    && !covered_supported
                    && !already_assigned.contains(&member_id)
                {
                    assignments.push(FeeAssignment::new(
                        fee.id,
                        AssignmentTarget::Member { member_id },
                        PaymentStatus::ForYou,
                    ));
                }
            }
            AssignmentPolicy::CustomMemberList(member_ids) => {
                let supported = self.resolve_supported_member(db, supported_member).await?;
                let mut seen: HashSet<Uuid> = HashSet::with_capacity(member_ids.len());
                for member_id in member_ids.iter().copied() {
                    if !seen.insert(member_id) {
                        continue;
                    }
                    if !self.member_exists(db, member_id).await? {
                        skipped.push(member_id);
                        continue;
                    }
                    if already_assigned.contains(&member_id) {
                        continue;
                    }
                    let status = if supported == Some(member_id) {
                        PaymentStatus::ForYou
                    } else {
                        PaymentStatus::NotPaid
                    };
                    assignments.push(FeeAssignment::new(
                        fee.id,
                        AssignmentTarget::Member { member_id },
                        status,
                    ));
                }
                if let Some(member_id) = supported
                    && !seen.contains(&member_id)
                    && !already_assigned.contains(&member_id)
                {
                    assignments.push(FeeAssignment::new(
                        fee.id,
                        AssignmentTarget::Member { member_id },
                        PaymentStatus::ForYou,
                    ));
                }
            }
        }

        Ok((assignments, skipped))
    }

    async fn insert_assignments(
        &self,
        db: &DatabaseTransaction,
        assignments: &[FeeAssignment],
    ) -> ResultEngine<()> {
        for assignment in assignments {
            fee_assignments::ActiveModel::from(assignment)
                .insert(db)
                .await?;
        }
        Ok(())
    }

    /// Creates a deposit fee and fans obligations out per the policy, all in
    /// one transaction.
    pub async fn create_fee(&self, cmd: CreateFeeCmd) -> ResultEngine<FeeOutcome> {
        let name = normalize_required_name(&cmd.name, "fee")?;
        let reason = normalize_optional_text(cmd.reason.as_deref());

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            self.require_active_association(&db_tx, cmd.association_id)
                .await?;
            self.require_committee(&db_tx, cmd.association_id, &actor)
                .await?;

            let fee = Fee::new(
                cmd.association_id,
                name,
                cmd.category,
                cmd.amount,
                reason,
                TransactionType::Deposit,
                cmd.due_date,
            )?;
            fees::ActiveModel::from(&fee).insert(&db_tx).await?;

            let (assignments, skipped) = self
                .build_assignments(
                    &db_tx,
                    &fee,
                    &cmd.policy,
                    cmd.supported_member,
                    &HashSet::new(),
                )
                .await?;
            self.insert_assignments(&db_tx, &assignments).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Fee { fee_id: fee.id },
                AuditAction::Created,
                cmd.performed_by,
            )
            .new_value(snapshot(&fee));
            self.record_audit(&db_tx, entry).await?;

            Ok(FeeOutcome {
                fee,
                assignments,
                skipped,
            })
        })
    }

    /// Updates a deposit fee and regenerates its open obligations.
    ///
    /// Settled rows survive untouched and their members are not re-assigned;
    /// `NotPaid`/`ForYou` rows are dropped and recomputed from the supplied
    /// policy inside the same transaction, so no partial state is ever
    /// visible.
    pub async fn update_fee(&self, cmd: UpdateFeeCmd) -> ResultEngine<FeeOutcome> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            let model = self.require_fee(&db_tx, cmd.fee_id).await?;
            let mut fee = Fee::try_from(model)?;
            self.require_committee(&db_tx, fee.association_id, &actor)
                .await?;
            if fee.transaction_type != TransactionType::Deposit {
                return Err(EngineError::InvalidStatus(
                    "not a deposit fee".to_string(),
                ));
            }
            let previous = snapshot(&fee);

            fee_assignments::Entity::delete_many()
                .filter(fee_assignments::Column::FeeId.eq(fee.id.to_string()))
                .filter(fee_assignments::Column::PaymentStatus.is_in([
                    PaymentStatus::NotPaid.as_str(),
                    PaymentStatus::ForYou.as_str(),
                ]))
                .exec(&db_tx)
                .await?;

            let surviving = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::FeeId.eq(fee.id.to_string()))
                .all(&db_tx)
                .await?;
            let mut already_assigned = HashSet::with_capacity(surviving.len());
            for row in &surviving {
                if let Some(raw) = row.member_id.as_deref() {
                    already_assigned.insert(super::parse_uuid(raw, "member")?);
                }
            }

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

            let (assignments, skipped) = self
                .build_assignments(
                    &db_tx,
                    &fee,
                    &cmd.policy,
                    cmd.supported_member,
                    &already_assigned,
                )
                .await?;
            self.insert_assignments(&db_tx, &assignments).await?;

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
                assignments,
                skipped,
            })
        })
    }

    /// Disables a fee. It drops out of listings and unpaid aggregates while
    /// its assignments stay readable for history. Repeating the call is a
    /// no-op.
    pub async fn deactivate_fee(&self, fee_id: Uuid, performed_by: Uuid) -> ResultEngine<Fee> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, performed_by).await?;
            let model = self.require_fee(&db_tx, fee_id).await?;
            let mut fee = Fee::try_from(model)?;
            self.require_committee(&db_tx, fee.association_id, &actor)
                .await?;

            if fee.status == RecordStatus::NotActive {
                return Ok(fee);
            }
            let previous = snapshot(&fee);

            fee.status = RecordStatus::NotActive;
            fee.updated_at = Utc::now();
            fees::ActiveModel::from(&fee).update(&db_tx).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Fee { fee_id: fee.id },
                AuditAction::Disabled,
                performed_by,
            )
            .previous(previous)
            .new_value(snapshot(&fee));
            self.record_audit(&db_tx, entry).await?;

            Ok(fee)
        })
    }

    /// Active deposit fees of an association, newest first.
    pub async fn list_fees(
        &self,
        association_id: Uuid,
        limit: Option<u64>,
        caller: Uuid,
    ) -> ResultEngine<Vec<Fee>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            self.require_association_member(&db_tx, association_id, &actor)
                .await?;

            let rows = fees::Entity::find()
                .filter(fees::Column::AssociationId.eq(association_id.to_string()))
                .filter(fees::Column::Status.eq(RecordStatus::Active.as_str()))
                .filter(fees::Column::TransactionType.eq(TransactionType::Deposit.as_str()))
                .order_by_desc(fees::Column::CreatedAt)
                .limit(limit)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(Fee::try_from(row)?);
            }
            Ok(out)
        })
    }

    /// One fee with every assignment and the assigned member rows.
    pub async fn fee_detail(&self, fee_id: Uuid, caller: Uuid) -> ResultEngine<FeeDetail> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            let model = self.require_fee(&db_tx, fee_id).await?;
            let fee = Fee::try_from(model)?;
            self.require_association_member(&db_tx, fee.association_id, &actor)
                .await?;

            let rows = fee_assignments::Entity::find()
                .filter(fee_assignments::Column::FeeId.eq(fee.id.to_string()))
                .order_by_asc(fee_assignments::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let member_ids: Vec<String> =
                rows.iter().filter_map(|a| a.member_id.clone()).collect();
            let member_rows = members::Entity::find()
                .filter(members::Column::Id.is_in(member_ids))
                .all(&db_tx)
                .await?;
            let mut by_id: HashMap<String, members::Model> =
                HashMap::with_capacity(member_rows.len());
            for model in member_rows {
                by_id.insert(model.id.clone(), model);
            }

            let mut assignments = Vec::with_capacity(rows.len());
            for row in rows {
                let member = match row.member_id.as_deref() {
                    Some(raw) => match by_id.get(raw) {
                        Some(model) => Some(Member::try_from(model.clone())?),
                        None => None,
                    },
                    None => None,
                };
                assignments.push(FeeDetailRow {
                    assignment: FeeAssignment::try_from(row)?,
                    member,
                });
            }

            Ok(FeeDetail { fee, assignments })
        })
    }
}
