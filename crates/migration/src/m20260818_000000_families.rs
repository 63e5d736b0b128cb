use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Families {
    Table,
    Id,
    MemberId,
    FullName,
    Gender,
    Relationship,
    Profession,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Families::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Families::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Families::MemberId).string().not_null())
                    .col(ColumnDef::new(Families::FullName).string().not_null())
                    .col(ColumnDef::new(Families::Gender).string().not_null())
                    .col(ColumnDef::new(Families::Relationship).string().not_null())
                    .col(ColumnDef::new(Families::Profession).string())
                    .col(ColumnDef::new(Families::Status).string().not_null())
                    .col(ColumnDef::new(Families::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Families::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-families-member_id")
                            .from(Families::Table, Families::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-families-member_id")
                    .table(Families::Table)
                    .col(Families::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Families::Table).to_owned())
            .await?;
        Ok(())
    }
}
