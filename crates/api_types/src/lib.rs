use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a record is live or disabled. Disabled rows stay in the database
/// but drop out of listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    NotActive,
}

pub mod member {
    use super::*;

    /// Request body for self-registration (the one unauthenticated route).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub full_name: String,
        /// Digits only after separator stripping; unique.
        pub phone: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub full_name: String,
        pub phone: String,
        pub is_staff: bool,
        pub status: RecordStatus,
        pub created_at: DateTime<Utc>,
    }
}

pub mod family {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Gender {
        Male,
        Female,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FamilyRelationship {
        Partner,
        Child,
        Parent,
        Sibling,
        PartnerParent,
        PartnerSibling,
    }

    /// Request body for declaring a dependent on a member's record.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyNew {
        pub full_name: String,
        pub gender: Gender,
        pub relationship: FamilyRelationship,
        pub profession: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyView {
        pub id: Uuid,
        pub member_id: Uuid,
        pub full_name: String,
        pub gender: Gender,
        pub relationship: FamilyRelationship,
        pub profession: Option<String>,
        pub status: RecordStatus,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyResponse {
        pub family: Vec<FamilyView>,
    }
}

pub mod association {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssociationNew {
        pub name: String,
        pub monthly_fee_cents: i64,
        pub city: Option<String>,
        pub meeting_place: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssociationView {
        pub id: Uuid,
        pub name: String,
        pub monthly_fee_cents: i64,
        pub city: Option<String>,
        pub meeting_place: Option<String>,
        pub status: RecordStatus,
        pub created_by: Uuid,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssociationsResponse {
        pub associations: Vec<AssociationView>,
    }

    /// Detail includes aggregates scoped to the caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssociationDetailResponse {
        pub association: AssociationView,
        pub member_count: u64,
        /// The caller's own outstanding deposit total.
        pub unpaid_total_cents: i64,
        pub committee: Vec<super::member::MemberView>,
    }
}

pub mod membership {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MembershipStatus {
        Pending,
        Active,
        Rejected,
        Cancelled,
        Blocked,
        NotActive,
        Leaved,
    }

    /// Committee decision on a pending (or settled) membership.
    ///
    /// `Pending` is not an allowed decision; requests go back to pending
    /// only by the member re-joining.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembershipReview {
        pub status: MembershipStatus,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembershipView {
        pub association_id: Uuid,
        pub member_id: Uuid,
        pub status: MembershipStatus,
        pub is_committee: bool,
        /// Member who filed the request.
        pub maker: Uuid,
        /// Committee member who settled it, once reviewed.
        pub checker: Option<Uuid>,
        pub reason: Option<String>,
        pub joined_at: DateTime<Utc>,
    }

    /// Query for the roster listing; defaults to active members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RosterList {
        pub status: Option<MembershipStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RosterResponse {
        pub members: Vec<RosterEntryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RosterEntryView {
        pub member: super::member::MemberView,
        pub membership: MembershipView,
    }
}

pub mod fee {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FeeCategory {
        MonthlyFee,
        FuneralContribution,
        SicknessSupport,
        RegistrationFee,
        #[default]
        Other,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        Deposit,
        Withdrawal,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        Pending,
        Paid,
        NotPaid,
        ForYou,
    }

    /// Who gets an obligation when a deposit fee is created or updated.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum FeePolicy {
        #[default]
        AllActiveMembers,
        CustomMemberList { member_ids: Vec<Uuid> },
        NoOne,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeNew {
        pub name: String,
        pub category: FeeCategory,
        pub amount_cents: i64,
        pub reason: Option<String>,
        pub due_date: Option<DateTime<Utc>>,
        #[serde(default)]
        pub policy: FeePolicy,
        /// Member the association covers; their row is created as `for_you`.
        pub supported_member_id: Option<Uuid>,
    }

    /// Patch for a deposit fee. Absent fields keep their value; the policy
    /// always re-applies to the still-open assignments.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeUpdate {
        pub name: Option<String>,
        pub category: Option<FeeCategory>,
        pub amount_cents: Option<i64>,
        pub reason: Option<String>,
        pub due_date: Option<DateTime<Utc>>,
        #[serde(default)]
        pub policy: FeePolicy,
        pub supported_member_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeView {
        pub id: Uuid,
        pub association_id: Uuid,
        pub name: String,
        pub category: FeeCategory,
        pub amount_cents: i64,
        pub reason: Option<String>,
        pub transaction_type: TransactionType,
        pub due_date: Option<DateTime<Utc>>,
        pub status: RecordStatus,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignmentView {
        pub id: Uuid,
        pub fee_id: Uuid,
        /// Absent when the association itself is the target.
        pub member_id: Option<Uuid>,
        pub payment_status: PaymentStatus,
        pub payment_method: Option<String>,
        pub trx_ref: Option<String>,
        pub bank_id: Option<Uuid>,
        pub proof_image: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
    }

    /// Result of creating or updating a fee: the fee row, the obligations it
    /// fanned out, and the custom-list ids that resolved to no member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeOutcomeResponse {
        pub fee: FeeView,
        pub assignments: Vec<AssignmentView>,
        pub skipped: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeList {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeesResponse {
        pub fees: Vec<FeeView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeDetailRow {
        pub assignment: AssignmentView,
        pub member: Option<super::member::MemberView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeDetailResponse {
        pub fee: FeeView,
        pub assignments: Vec<FeeDetailRow>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub assignment_ids: Vec<Uuid>,
        pub method: String,
        pub bank_id: Option<Uuid>,
        pub proof_image: Option<String>,
        /// External reference (e.g. from the payment provider); generated
        /// when absent.
        pub trx_ref: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
    }

    /// Staff shortcut for out-of-band collections; no bank or proof image.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminPaymentNew {
        pub assignment_ids: Vec<Uuid>,
        pub method: String,
        pub trx_ref: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnpayRequest {
        pub assignment_ids: Vec<Uuid>,
    }

    /// Outcome of one settle/revert batch. Rows that could not transition
    /// are reported in `skipped`, never as an error.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchResponse {
        pub succeeded: Vec<Uuid>,
        pub skipped: Vec<Uuid>,
        pub trx_ref: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentBatchFeeView {
        pub fee_id: Uuid,
        pub name: String,
        pub amount_cents: i64,
        pub category: super::fee::FeeCategory,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentBatchResponse {
        pub trx_ref: String,
        pub method: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
        pub bank_name: Option<String>,
        pub proof_image: Option<String>,
        pub total_cents: i64,
        pub fees: Vec<PaymentBatchFeeView>,
    }
}

pub mod withdrawal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalNew {
        pub name: String,
        pub category: super::fee::FeeCategory,
        pub amount_cents: i64,
        pub reason: Option<String>,
        pub due_date: Option<DateTime<Utc>>,
        /// Beneficiary member; absent means the association itself.
        pub member_id: Option<Uuid>,
        pub method: Option<String>,
        pub bank_id: Option<Uuid>,
        pub proof_image: Option<String>,
    }

    /// Rewrite of an existing withdrawal. The target is always re-settled,
    /// so `member_id` absent retargets to the association.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub name: Option<String>,
        pub category: Option<super::fee::FeeCategory>,
        pub amount_cents: Option<i64>,
        pub reason: Option<String>,
        pub due_date: Option<DateTime<Utc>>,
        pub member_id: Option<Uuid>,
        pub method: Option<String>,
        pub bank_id: Option<Uuid>,
        pub proof_image: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalList {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalView {
        pub fee: super::fee::FeeView,
        pub assignments: Vec<super::fee::AssignmentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalsResponse {
        pub withdrawals: Vec<WithdrawalView>,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnpaidList {
        pub member_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnpaidEntryView {
        pub assignment: super::fee::AssignmentView,
        pub fee: super::fee::FeeView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnpaidResponse {
        pub entries: Vec<UnpaidEntryView>,
        pub total_cents: i64,
    }

    /// Filters for the deposit detail report; both are optional and
    /// combine.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositList {
        pub method: Option<String>,
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositItemView {
        pub assignment_id: Uuid,
        pub fee_id: Uuid,
        pub fee_name: String,
        pub amount_cents: i64,
        pub method: Option<String>,
        pub trx_ref: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositGroupView {
        /// Absent when the association itself was the paying target.
        pub member_id: Option<Uuid>,
        pub member_name: Option<String>,
        pub total_cents: i64,
        pub items: Vec<DepositItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositsResponse {
        pub deposits: Vec<DepositGroupView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositSummaryList {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositSummaryRowView {
        pub day: NaiveDate,
        pub method: String,
        pub total_cents: i64,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositSummaryResponse {
        pub rows: Vec<DepositSummaryRowView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentHistoryList {
        pub limit: Option<u64>,
    }

    /// One settled batch in a member's history.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentGroupView {
        pub trx_ref: String,
        pub total_cents: i64,
        pub method: Option<String>,
        pub paid_at: Option<DateTime<Utc>>,
        pub transaction_type: super::fee::TransactionType,
        pub fee_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentHistoryResponse {
        pub payments: Vec<PaymentGroupView>,
    }
}
