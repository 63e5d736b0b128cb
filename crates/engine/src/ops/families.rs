use chrono::Utc;
use sea_orm::{ActiveModelTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AddFamilyMemberCmd, AuditAction, AuditLogEntry, AuditSubject, EngineError, Family,
    RecordStatus, ResultEngine, families,
};

use super::{Engine, audit::snapshot, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Declares a dependent on a member's record.
    ///
    /// Family rows are member-owned: only the member themselves (or staff)
    /// may add to the list.
    pub async fn add_family_member(&self, cmd: AddFamilyMemberCmd) -> ResultEngine<Family> {
        let full_name = normalize_required_name(&cmd.full_name, "family member")?;
        let profession = normalize_optional_text(cmd.profession.as_deref());

        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, cmd.performed_by).await?;
            self.require_member(&db_tx, cmd.member_id).await?;
            super::access::require_self_or_staff(&actor, cmd.member_id)?;

            let family = Family::new(
                cmd.member_id,
                full_name,
                cmd.gender,
                cmd.relationship,
                profession,
            );
            families::ActiveModel::from(&family).insert(&db_tx).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Family {
                    family_id: family.id,
                },
                AuditAction::Created,
                cmd.performed_by,
            )
            .new_value(snapshot(&family));
            self.record_audit(&db_tx, entry).await?;

            Ok(family)
        })
    }

    /// Active dependents of a member, oldest first.
    pub async fn family_members(&self, member_id: Uuid, caller: Uuid) -> ResultEngine<Vec<Family>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, caller).await?;
            self.require_member(&db_tx, member_id).await?;
            super::access::require_self_or_staff(&actor, member_id)?;

            let rows = families::Entity::find()
                .filter(families::Column::MemberId.eq(member_id.to_string()))
                .filter(families::Column::Status.eq(RecordStatus::Active.as_str()))
                .order_by_asc(families::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(Family::try_from(row)?);
            }
            Ok(out)
        })
    }

    /// Soft-deletes a dependent. Already-inactive rows come back unchanged.
    pub async fn deactivate_family_member(
        &self,
        family_id: Uuid,
        performed_by: Uuid,
    ) -> ResultEngine<Family> {
        with_tx!(self, |db_tx| {
            let actor = self.require_member(&db_tx, performed_by).await?;
            let model = families::Entity::find_by_id(family_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("family member not exists".to_string()))?;
            let mut family = Family::try_from(model)?;
            super::access::require_self_or_staff(&actor, family.member_id)?;

            if family.status == RecordStatus::NotActive {
                return Ok(family);
            }
            let previous = snapshot(&family);

            family.status = RecordStatus::NotActive;
            family.updated_at = Utc::now();
            families::ActiveModel::from(&family).update(&db_tx).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Family {
                    family_id: family.id,
                },
                AuditAction::Disabled,
                performed_by,
            )
            .previous(previous)
            .new_value(snapshot(&family));
            self.record_audit(&db_tx, entry).await?;

            Ok(family)
        })
    }
}
