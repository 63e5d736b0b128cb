use chrono::Utc;
use sea_orm::{ActiveModelTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    AuditAction, AuditLogEntry, AuditSubject, EngineError, Member, Membership, MembershipStatus,
    ResultEngine, ReviewMembershipCmd, members, memberships,
};

use super::{Engine, audit::snapshot, normalize_optional_text, with_tx};

/// One roster row: the member plus their membership state.
#[derive(Clone, Debug)]
pub struct RosterEntry {
    pub member: Member,
    pub membership: Membership,
}

impl Engine {
    /// Files a join request as the member themselves (maker side).
    ///
    /// A settled membership (rejected, cancelled, disabled, leaved) is
    /// re-opened in place: same row, back to `Pending`, committee rights
    /// dropped. Pending or active rows refuse a second request and blocked
    /// members are turned away.
    pub async fn join_association(
        &self,
        association_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Membership> {
        with_tx!(self, |db_tx| {
            self.require_active_association(&db_tx, association_id).await?;
            self.require_member(&db_tx, member_id).await?;

            if let Some(row) = self.membership(&db_tx, association_id, member_id).await? {
                let previous = Membership::try_from(row)?;
                match previous.status {
                    MembershipStatus::Pending | MembershipStatus::Active => {
                        Err(EngineError::ExistingKey("membership".to_string()))
                    }
                    MembershipStatus::Blocked => {
                        Err(EngineError::Forbidden("membership blocked".to_string()))
                    }
                    _ => {
                        let membership = Membership::new(
                            association_id,
                            member_id,
                            MembershipStatus::Pending,
                            member_id,
                        );
                        memberships::ActiveModel::from(&membership)
                            .update(&db_tx)
                            .await?;

                        let entry = AuditLogEntry::new(
                            AuditSubject::Membership {
                                association_id,
                                member_id,
                            },
                            AuditAction::Modified,
                            member_id,
                        )
                        .previous(snapshot(&previous))
                        .new_value(snapshot(&membership))
                        .comment("rejoin request");
                        self.record_audit(&db_tx, entry).await?;

                        Ok(membership)
                    }
                }
            } else {
                let membership =
                    Membership::new(association_id, member_id, MembershipStatus::Pending, member_id);
                memberships::ActiveModel::from(&membership)
                    .insert(&db_tx)
                    .await?;

                let entry = AuditLogEntry::new(
                    AuditSubject::Membership {
                        association_id,
                        member_id,
                    },
                    AuditAction::Created,
                    member_id,
                )
                .new_value(snapshot(&membership));
                self.record_audit(&db_tx, entry).await?;

                Ok(membership)
            }
        })
    }

    /// Settles or changes a membership (checker side).
    ///
    /// Any target status except `Pending` is allowed, so the same call
    /// approves, rejects, blocks or retires a member. The reviewer is
    /// stamped as checker.
    pub async fn review_membership(&self, cmd: ReviewMembershipCmd) -> ResultEngine<Membership> {
        if cmd.status == MembershipStatus::Pending {
            return Err(EngineError::InvalidStatus(
                "membership cannot be reset to pending".to_string(),
            ));
        }
        let reason = normalize_optional_text(cmd.reason.as_deref());

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            self.require_association(&db_tx, cmd.association_id).await?;
            self.require_committee(&db_tx, cmd.association_id, &actor)
                .await?;

            let row = self
                .require_membership(&db_tx, cmd.association_id, cmd.member_id)
                .await?;
            let previous = Membership::try_from(row)?;

            let mut membership = previous.clone();
            membership.status = cmd.status;
            membership.checker = Some(cmd.performed_by);
            membership.reason = reason;
            membership.updated_at = Utc::now();
            memberships::ActiveModel::from(&membership)
                .update(&db_tx)
                .await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Membership {
                    association_id: cmd.association_id,
                    member_id: cmd.member_id,
                },
                AuditAction::Modified,
                cmd.performed_by,
            )
            .previous(snapshot(&previous))
            .new_value(snapshot(&membership));
            self.record_audit(&db_tx, entry).await?;

            Ok(membership)
        })
    }

    /// Association roster filtered by membership status (active by default).
    ///
    /// The active roster is visible to every member of the group; any other
    /// filter (pending applications, blocked members) is committee material.
    pub async fn roster(
        &self,
        association_id: Uuid,
        status: Option<MembershipStatus>,
        caller: Uuid,
    ) -> ResultEngine<Vec<RosterEntry>> {
        let status = status.unwrap_or(MembershipStatus::Active);

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_association(&db_tx, association_id).await?;
            if status == MembershipStatus::Active {
                self.require_association_member(&db_tx, association_id, &actor)
                    .await?;
            } else {
                self.require_committee(&db_tx, association_id, &actor)
                    .await?;
            }

            let rows = memberships::Entity::find()
                .filter(memberships::Column::AssociationId.eq(association_id.to_string()))
                .filter(memberships::Column::Status.eq(status.as_str()))
                .order_by_asc(memberships::Column::JoinedAt)
                .all(&db_tx)
                .await?;

            let member_ids: Vec<String> = rows.iter().map(|m| m.member_id.clone()).collect();
            let member_rows = members::Entity::find()
                .filter(members::Column::Id.is_in(member_ids))
                .all(&db_tx)
                .await?;
            let mut by_id: HashMap<String, members::Model> =
                HashMap::with_capacity(member_rows.len());
            for model in member_rows {
                by_id.insert(model.id.clone(), model);
            }

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let Some(member_model) = by_id.remove(&row.member_id) else {
                    continue;
                };
                out.push(RosterEntry {
                    member: Member::try_from(member_model)?,
                    membership: Membership::try_from(row)?,
                });
            }
            Ok(out)
        })
    }
}
