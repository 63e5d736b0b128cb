use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;

use crate::{AuditLogEntry, AuditSubject, ResultEngine, audit_log};

use super::{Engine, with_tx};

/// Serializes a domain value into an audit snapshot.
///
/// Engine types always serialize; anything that does not is dropped rather
/// than failing the primary write.
pub(super) fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

impl Engine {
    /// Appends one audit row inside the caller's transaction, so the trail
    /// commits and rolls back with the write it describes.
    pub(super) async fn record_audit(
        &self,
        db: &DatabaseTransaction,
        entry: AuditLogEntry,
    ) -> ResultEngine<()> {
        audit_log::ActiveModel::from(&entry).insert(db).await?;
        Ok(())
    }

    /// Full audit trail of one subject, oldest first.
    pub async fn audit_trail(&self, subject: AuditSubject) -> ResultEngine<Vec<AuditLogEntry>> {
        with_tx!(self, |db_tx| {
            let rows = audit_log::Entity::find()
                .filter(audit_log::Column::SubjectKind.eq(subject.kind()))
                .filter(audit_log::Column::SubjectId.eq(subject.subject_id()))
                .order_by_asc(audit_log::Column::LoggedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(AuditLogEntry::try_from(row)?);
            }
            Ok(out)
        })
    }
}
