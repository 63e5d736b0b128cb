use sea_orm::{ActiveModelTrait, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    AuditAction, AuditLogEntry, AuditSubject, EngineError, Member, RecordStatus, RegisterMemberCmd,
    ResultEngine, members,
};

use super::{Engine, audit::snapshot, normalize_phone, normalize_required_name, with_tx};

impl Engine {
    /// Registers a new member.
    ///
    /// The phone number doubles as the login identity and must be unique
    /// across the store. This is the one operation open to callers without an
    /// account; the audit entry therefore names the member as their own
    /// actor.
    pub async fn register_member(&self, cmd: RegisterMemberCmd) -> ResultEngine<Member> {
        let full_name = normalize_required_name(&cmd.full_name, "member")?;
        let phone = normalize_phone(&cmd.phone)?;
        if cmd.password.is_empty() {
            return Err(EngineError::MissingField("password".to_string()));
        }

        with_tx!(self, |db_tx| {
            let taken = members::Entity::find()
                .filter(members::Column::Phone.eq(phone.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(phone));
            }

            let member = Member::new(full_name, phone, cmd.password)?;
            members::ActiveModel::from(&member).insert(&db_tx).await?;

            let entry = AuditLogEntry::new(
                AuditSubject::Member {
                    member_id: member.id,
                },
                AuditAction::Created,
                member.id,
            )
            .new_value(snapshot(&member))
            .comment("self registration");
            self.record_audit(&db_tx, entry).await?;

            Ok(member)
        })
    }

    /// Resolves login credentials to the member.
    ///
    /// Unknown phone, wrong password and a disabled account all fail the
    /// same way; the caller never learns which half was wrong.
    pub async fn authenticate(&self, phone: &str, password: &str) -> ResultEngine<Member> {
        let phone = normalize_phone(phone)?;
        with_tx!(self, |db_tx| {
            let model = members::Entity::find()
                .filter(members::Column::Phone.eq(phone.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::Forbidden("invalid credentials".to_string()))?;
            if model.password != password || model.status != RecordStatus::Active.as_str() {
                return Err(EngineError::Forbidden("invalid credentials".to_string()));
            }
            Member::try_from(model)
        })
    }
}
