//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Mahber:
//!
//! - `members`: people and their login credentials
//! - `associations`: the edirs themselves
//! - `memberships`: who belongs where, maker/checker reviewed
//! - `banks`: association bank accounts
//! - `fees`: money movements (deposits and withdrawals)
//! - `fee_assignments`: per-target obligations and their payment state

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Members {
    Table,
    Id,
    FullName,
    Phone,
    Password,
    IsStaff,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Associations {
    Table,
    Id,
    Name,
    MonthlyFee,
    City,
    MeetingPlace,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Memberships {
    Table,
    AssociationId,
    MemberId,
    Status,
    IsCommittee,
    Maker,
    Checker,
    Reason,
    JoinedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Banks {
    Table,
    Id,
    AssociationId,
    BankName,
    AccountName,
    AccountNumber,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Fees {
    Table,
    Id,
    AssociationId,
    Name,
    Category,
    Amount,
    Reason,
    TransactionType,
    DueDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FeeAssignments {
    Table,
    Id,
    FeeId,
    TargetKind,
    MemberId,
    PaymentStatus,
    PaymentMethod,
    TrxRef,
    BankId,
    ProofImage,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::FullName).string().not_null())
                    .col(ColumnDef::new(Members::Phone).string().not_null())
                    .col(ColumnDef::new(Members::Password).string().not_null())
                    .col(ColumnDef::new(Members::IsStaff).boolean().not_null())
                    .col(ColumnDef::new(Members::Status).string().not_null())
                    .col(ColumnDef::new(Members::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Members::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-phone")
                    .table(Members::Table)
                    .col(Members::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Associations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Associations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Associations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Associations::Name).string().not_null())
                    .col(
                        ColumnDef::new(Associations::MonthlyFee)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Associations::City).string())
                    .col(ColumnDef::new(Associations::MeetingPlace).string())
                    .col(ColumnDef::new(Associations::Status).string().not_null())
                    .col(ColumnDef::new(Associations::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Associations::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Associations::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-associations-created_by")
                    .table(Associations::Table)
                    .col(Associations::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Memberships::AssociationId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Memberships::MemberId).string().not_null())
                    .col(ColumnDef::new(Memberships::Status).string().not_null())
                    .col(
                        ColumnDef::new(Memberships::IsCommittee)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Memberships::Maker).string().not_null())
                    .col(ColumnDef::new(Memberships::Checker).string())
                    .col(ColumnDef::new(Memberships::Reason).string())
                    .col(ColumnDef::new(Memberships::JoinedAt).timestamp().not_null())
                    .col(ColumnDef::new(Memberships::UpdatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(Memberships::AssociationId)
                            .col(Memberships::MemberId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-memberships-association_id")
                            .from(Memberships::Table, Memberships::AssociationId)
                            .to(Associations::Table, Associations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-memberships-member_id")
                            .from(Memberships::Table, Memberships::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-memberships-member_id")
                    .table(Memberships::Table)
                    .col(Memberships::MemberId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Banks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Banks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Banks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Banks::AssociationId).string().not_null())
                    .col(ColumnDef::new(Banks::BankName).string().not_null())
                    .col(ColumnDef::new(Banks::AccountName).string().not_null())
                    .col(ColumnDef::new(Banks::AccountNumber).string().not_null())
                    .col(ColumnDef::new(Banks::Status).string().not_null())
                    .col(ColumnDef::new(Banks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Banks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-banks-association_id")
                            .from(Banks::Table, Banks::AssociationId)
                            .to(Associations::Table, Associations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-banks-association_id")
                    .table(Banks::Table)
                    .col(Banks::AssociationId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Fees
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Fees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Fees::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Fees::AssociationId).string().not_null())
                    .col(ColumnDef::new(Fees::Name).string().not_null())
                    .col(ColumnDef::new(Fees::Category).string().not_null())
                    .col(ColumnDef::new(Fees::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Fees::Reason).string())
                    .col(ColumnDef::new(Fees::TransactionType).string().not_null())
                    .col(ColumnDef::new(Fees::DueDate).timestamp())
                    .col(ColumnDef::new(Fees::Status).string().not_null())
                    .col(ColumnDef::new(Fees::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Fees::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fees-association_id")
                            .from(Fees::Table, Fees::AssociationId)
                            .to(Associations::Table, Associations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fees-association_id-created_at")
                    .table(Fees::Table)
                    .col(Fees::AssociationId)
                    .col(Fees::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Fee assignments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FeeAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeeAssignments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeeAssignments::FeeId).string().not_null())
                    .col(
                        ColumnDef::new(FeeAssignments::TargetKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FeeAssignments::MemberId).string())
                    .col(
                        ColumnDef::new(FeeAssignments::PaymentStatus)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FeeAssignments::PaymentMethod).string())
                    .col(ColumnDef::new(FeeAssignments::TrxRef).string())
                    .col(ColumnDef::new(FeeAssignments::BankId).string())
                    .col(ColumnDef::new(FeeAssignments::ProofImage).string())
                    .col(ColumnDef::new(FeeAssignments::PaidAt).timestamp())
                    .col(
                        ColumnDef::new(FeeAssignments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeeAssignments::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fee_assignments-fee_id")
                            .from(FeeAssignments::Table, FeeAssignments::FeeId)
                            .to(Fees::Table, Fees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fee_assignments-member_id")
                            .from(FeeAssignments::Table, FeeAssignments::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fee_assignments-bank_id")
                            .from(FeeAssignments::Table, FeeAssignments::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fee_assignments-fee_id")
                    .table(FeeAssignments::Table)
                    .col(FeeAssignments::FeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fee_assignments-member_id-payment_status")
                    .table(FeeAssignments::Table)
                    .col(FeeAssignments::MemberId)
                    .col(FeeAssignments::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fee_assignments-trx_ref")
                    .table(FeeAssignments::Table)
                    .col(FeeAssignments::TrxRef)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(FeeAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Banks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Associations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        Ok(())
    }
}
