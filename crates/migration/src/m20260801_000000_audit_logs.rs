use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum AuditLogs {
    Table,
    Id,
    SubjectKind,
    SubjectId,
    Action,
    PerformedBy,
    PreviousValue,
    NewValue,
    Comment,
    LoggedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::SubjectKind).string().not_null())
                    .col(ColumnDef::new(AuditLogs::SubjectId).string().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::PerformedBy).string().not_null())
                    .col(ColumnDef::new(AuditLogs::PreviousValue).string())
                    .col(ColumnDef::new(AuditLogs::NewValue).string())
                    .col(ColumnDef::new(AuditLogs::Comment).string())
                    .col(ColumnDef::new(AuditLogs::LoggedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_logs-subject")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::SubjectKind)
                    .col(AuditLogs::SubjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_logs-performed_by")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::PerformedBy)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}
