use sea_orm::{
    ActiveModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Association, AuditAction, AuditLogEntry, AuditSubject, CreateAssociationCmd, EngineError,
    Member, Membership, MembershipStatus, MoneyCents, RecordStatus, ResultEngine, associations,
    members, memberships,
};

use super::{Engine, audit::snapshot, normalize_optional_text, normalize_required_name, with_tx};

/// One association with the caller-facing aggregates.
#[derive(Clone, Debug)]
pub struct AssociationDetail {
    pub association: Association,
    /// Members currently holding an active membership.
    pub member_count: u64,
    /// Sum of the caller's own outstanding deposit obligations.
    pub unpaid_total: MoneyCents,
    pub committee: Vec<Member>,
}

impl Engine {
    /// Creates an association and seeds its roster: the creator joins
    /// immediately as an active committee member (their own maker).
    pub async fn create_association(
        &self,
        cmd: CreateAssociationCmd,
    ) -> ResultEngine<Association> {
        let name = normalize_required_name(&cmd.name, "association")?;
        let city = normalize_optional_text(cmd.city.as_deref());
        let meeting_place = normalize_optional_text(cmd.meeting_place.as_deref());

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, cmd.created_by).await?;

            let taken = associations::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name));
            }

            let association =
                Association::new(name, cmd.monthly_fee, city, meeting_place, cmd.created_by)?;
            associations::ActiveModel::from(&association)
                .insert(&db_tx)
                .await?;

            let membership = Membership {
                is_committee: true,
                ..Membership::new(
                    association.id,
                    cmd.created_by,
                    MembershipStatus::Active,
                    cmd.created_by,
                )
            };
            memberships::ActiveModel::from(&membership)
                .insert(&db_tx)
                .await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Association {
                    association_id: association.id,
                },
                AuditAction::Created,
                cmd.created_by,
            )
            .new_value(snapshot(&association));
            self.record_audit(&db_tx, entry).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Membership {
                    association_id: association.id,
                    member_id: cmd.created_by,
                },
                AuditAction::Created,
                cmd.created_by,
            )
            .new_value(snapshot(&membership))
            .comment("founder membership");
            self.record_audit(&db_tx, entry).await?;

            Ok(association)
        })
    }

    /// Active associations, newest first.
    pub async fn list_associations(&self) -> ResultEngine<Vec<Association>> {
        with_tx!(self, |db_tx| {
            let rows = associations::Entity::find()
                .filter(associations::Column::Status.eq(RecordStatus::Active.as_str()))
                .order_by_desc(associations::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(Association::try_from(row)?);
            }
            Ok(out)
        })
    }

    /// One association with member count, committee roster and the caller's
    /// outstanding total. Readable by any authenticated member, so a
    /// prospective joiner can evaluate the group.
    pub async fn association_detail(
        &self,
        association_id: Uuid,
        caller: Uuid,
    ) -> ResultEngine<AssociationDetail> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, caller).await?;
            let model = self.require_association(&db_tx, association_id).await?;
            let association = Association::try_from(model)?;

            let member_count = memberships::Entity::find()
                .filter(memberships::Column::AssociationId.eq(association_id.to_string()))
                .filter(memberships::Column::Status.eq(MembershipStatus::Active.as_str()))
                .count(&db_tx)
                .await?;

            let unpaid_total = self
                .unpaid_for_member(&db_tx, association_id, caller)
                .await?
                .total;

            let committee_rows = memberships::Entity::find()
                .filter(memberships::Column::AssociationId.eq(association_id.to_string()))
                .filter(memberships::Column::Status.eq(MembershipStatus::Active.as_str()))
                .filter(memberships::Column::IsCommittee.eq(true))
                .all(&db_tx)
                .await?;
            let committee_ids: Vec<String> =
                committee_rows.into_iter().map(|m| m.member_id).collect();

            let member_rows = members::Entity::find()
                .filter(members::Column::Id.is_in(committee_ids))
                .order_by_asc(members::Column::FullName)
                .all(&db_tx)
                .await?;
            let mut committee = Vec::with_capacity(member_rows.len());
            for row in member_rows {
                committee.push(Member::try_from(row)?);
            }

            Ok(AssociationDetail {
                association,
                member_count,
                unpaid_total,
                committee,
            })
        })
    }
}
