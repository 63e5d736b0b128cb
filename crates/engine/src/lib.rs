pub use associations::Association;
pub use audit_log::{AuditAction, AuditLogEntry, AuditSubject};
pub use banks::Bank;
pub use commands::{
    AddFamilyMemberCmd, AdminPayFeesCmd, AssignmentPolicy, CreateAssociationCmd, CreateFeeCmd,
    PayFeesCmd, RegisterMemberCmd, ReviewMembershipCmd, UpdateExpenseCmd, UpdateFeeCmd,
    WithdrawCmd,
};
pub use error::EngineError;
pub use families::{Family, FamilyRelationship, Gender};
pub use fee_assignments::{AssignmentTarget, FeeAssignment, PaymentStatus};
pub use fees::{Fee, FeeCategory, TransactionType};
pub use members::Member;
pub use memberships::{Membership, MembershipStatus};
pub use money::MoneyCents;
pub use ops::{
    AssociationDetail, BatchOutcome, DepositFilter, DepositGroup, DepositItem, DepositSummaryRow,
    Engine, EngineBuilder, FeeDetail, FeeDetailRow, FeeOutcome, PaymentBatch, PaymentBatchFee,
    PaymentGroup, RosterEntry, UnpaidEntry, UnpaidSummary, WithdrawalRecord,
};
pub use status::RecordStatus;

pub mod associations;
pub mod audit_log;
pub mod banks;
mod commands;
mod error;
pub mod families;
pub mod fee_assignments;
pub mod fees;
pub mod members;
pub mod memberships;
mod money;
mod ops;
mod status;

pub type ResultEngine<T> = Result<T, EngineError>;
