use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MembershipStatus, RecordStatus, ResultEngine, associations, fees, members,
    memberships,
};

use super::Engine;

/// Actor must carry the platform staff flag.
pub(super) fn require_staff(actor: &members::Model) -> ResultEngine<()> {
    if actor.is_staff {
        return Ok(());
    }
    Err(EngineError::Forbidden("staff role required".to_string()))
}

/// Member-owned rows: the member themselves or staff.
pub(super) fn require_self_or_staff(actor: &members::Model, member_id: Uuid) -> ResultEngine<()> {
    if actor.id == member_id.to_string() {
        return Ok(());
    }
    require_staff(actor)
}

/// Generates a `require_*` accessor returning the row or `KeyNotFound`.
macro_rules! impl_require_by_id {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_by_id!(
        require_member,
        members::Entity,
        members::Model,
        "member not exists"
    );

    impl_require_by_id!(
        require_association,
        associations::Entity,
        associations::Model,
        "association not exists"
    );

    impl_require_by_id!(require_fee, fees::Entity, fees::Model, "fee not exists");

    pub(super) async fn member_exists(
        &self,
        db: &DatabaseTransaction,
        member_id: Uuid,
    ) -> ResultEngine<bool> {
        members::Entity::find_by_id(member_id.to_string())
            .one(db)
            .await
            .map(|model| model.is_some())
            .map_err(Into::into)
    }

    /// Disabled associations are treated as missing for write paths.
    pub(super) async fn require_active_association(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
    ) -> ResultEngine<associations::Model> {
        let model = self.require_association(db, association_id).await?;
        if model.status != RecordStatus::Active.as_str() {
            return Err(EngineError::KeyNotFound(
                "association not exists".to_string(),
            ));
        }
        Ok(model)
    }

    pub(super) async fn membership(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Option<memberships::Model>> {
        memberships::Entity::find_by_id((association_id.to_string(), member_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_membership(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<memberships::Model> {
        self.membership(db, association_id, member_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))
    }

    pub(super) async fn is_active_member(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<bool> {
        let row = self.membership(db, association_id, member_id).await?;
        Ok(row.is_some_and(|m| m.status == MembershipStatus::Active.as_str()))
    }

    /// Staff count as committee everywhere.
    pub(super) async fn is_committee(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        actor: &members::Model,
    ) -> ResultEngine<bool> {
        if actor.is_staff {
            return Ok(true);
        }
        let row = memberships::Entity::find_by_id((association_id.to_string(), actor.id.clone()))
            .one(db)
            .await?;
        Ok(row.is_some_and(|m| {
            m.is_committee && m.status == MembershipStatus::Active.as_str()
        }))
    }

    pub(super) async fn require_committee(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        actor: &members::Model,
    ) -> ResultEngine<()> {
        if self.is_committee(db, association_id, actor).await? {
            return Ok(());
        }
        Err(EngineError::Forbidden("committee role required".to_string()))
    }

    /// Actor must be staff or hold an active membership in the association.
    pub(super) async fn require_association_member(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        actor: &members::Model,
    ) -> ResultEngine<()> {
        if actor.is_staff {
            return Ok(());
        }
        let member_id = super::parse_uuid(&actor.id, "member")?;
        if self.is_active_member(db, association_id, member_id).await? {
            return Ok(());
        }
        Err(EngineError::Forbidden(
            "association membership required".to_string(),
        ))
    }

    /// Members may read their own rows; anyone else needs committee or staff.
    pub(super) async fn require_self_or_committee(
        &self,
        db: &DatabaseTransaction,
        association_id: Uuid,
        actor: &members::Model,
        member_id: Uuid,
    ) -> ResultEngine<()> {
        if actor.id == member_id.to_string() {
            return Ok(());
        }
        self.require_committee(db, association_id, actor).await
    }
}
