//! Fee endpoints: creation with assignment fan-out, listing, detail,
//! update and deactivation.
//!
//! The mapping helpers between engine rows and wire views live here and are
//! shared with the withdrawal, payment and report endpoints.

use api_types::fee::{
    AssignmentView, FeeCategory, FeeDetailResponse, FeeDetailRow, FeeList, FeeNew,
    FeeOutcomeResponse, FeePolicy, FeeUpdate, FeeView, FeesResponse, PaymentStatus,
    TransactionType,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{AssignmentPolicy, CreateFeeCmd, MoneyCents, UpdateFeeCmd};
use uuid::Uuid;

use crate::{ServerError, members, record_status_view, server::ServerState};

/// Creates a deposit fee and fans out obligations per the policy.
pub async fn create(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Json(payload): Json<FeeNew>,
) -> Result<Json<FeeOutcomeResponse>, ServerError> {
    let mut cmd = CreateFeeCmd::new(
        association_id,
        member.id,
        payload.name,
        category_to_engine(payload.category),
        MoneyCents::new(payload.amount_cents),
    )
    .policy(policy_to_engine(payload.policy));
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }
    if let Some(due_date) = payload.due_date {
        cmd = cmd.due_date(due_date);
    }
    if let Some(supported) = payload.supported_member_id {
        cmd = cmd.supported_member(supported);
    }

    let outcome = state.engine.create_fee(cmd).await?;
    Ok(Json(outcome_response(outcome)))
}

pub async fn list(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<FeeList>,
) -> Result<Json<FeesResponse>, ServerError> {
    let fees = state
        .engine
        .list_fees(association_id, query.limit, member.id)
        .await?;
    Ok(Json(FeesResponse {
        fees: fees.into_iter().map(fee_view).collect(),
    }))
}

pub async fn detail(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(fee_id): Path<Uuid>,
) -> Result<Json<FeeDetailResponse>, ServerError> {
    let detail = state.engine.fee_detail(fee_id, member.id).await?;
    Ok(Json(FeeDetailResponse {
        fee: fee_view(detail.fee),
        assignments: detail
            .assignments
            .into_iter()
            .map(|row| FeeDetailRow {
                assignment: assignment_view(row.assignment),
                member: row.member.map(members::view),
            })
            .collect(),
    }))
}

/// Patches a deposit fee and regenerates its open obligations. Settled rows
/// are never touched.
pub async fn update(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(fee_id): Path<Uuid>,
    Json(payload): Json<FeeUpdate>,
) -> Result<Json<FeeOutcomeResponse>, ServerError> {
    let mut cmd = UpdateFeeCmd::new(fee_id, member.id).policy(policy_to_engine(payload.policy));
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category_to_engine(category));
    }
    if let Some(amount_cents) = payload.amount_cents {
        cmd = cmd.amount(MoneyCents::new(amount_cents));
    }
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }
    if let Some(due_date) = payload.due_date {
        cmd = cmd.due_date(due_date);
    }
    if let Some(supported) = payload.supported_member_id {
        cmd = cmd.supported_member(supported);
    }

    let outcome = state.engine.update_fee(cmd).await?;
    Ok(Json(outcome_response(outcome)))
}

/// Soft-deletes a fee; its rows stay for the books but drop out of
/// listings and unpaid totals.
pub async fn deactivate(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(fee_id): Path<Uuid>,
) -> Result<Json<FeeView>, ServerError> {
    let fee = state.engine.deactivate_fee(fee_id, member.id).await?;
    Ok(Json(fee_view(fee)))
}

pub(crate) fn category_to_engine(category: FeeCategory) -> engine::FeeCategory {
    match category {
        FeeCategory::MonthlyFee => engine::FeeCategory::MonthlyFee,
        FeeCategory::FuneralContribution => engine::FeeCategory::FuneralContribution,
        FeeCategory::SicknessSupport => engine::FeeCategory::SicknessSupport,
        FeeCategory::RegistrationFee => engine::FeeCategory::RegistrationFee,
        FeeCategory::Other => engine::FeeCategory::Other,
    }
}

pub(crate) fn category_view(category: engine::FeeCategory) -> FeeCategory {
    match category {
        engine::FeeCategory::MonthlyFee => FeeCategory::MonthlyFee,
        engine::FeeCategory::FuneralContribution => FeeCategory::FuneralContribution,
        engine::FeeCategory::SicknessSupport => FeeCategory::SicknessSupport,
        engine::FeeCategory::RegistrationFee => FeeCategory::RegistrationFee,
        engine::FeeCategory::Other => FeeCategory::Other,
    }
}

pub(crate) fn transaction_type_view(transaction_type: engine::TransactionType) -> TransactionType {
    match transaction_type {
        engine::TransactionType::Deposit => TransactionType::Deposit,
        engine::TransactionType::Withdrawal => TransactionType::Withdrawal,
    }
}

fn payment_status_view(status: engine::PaymentStatus) -> PaymentStatus {
    match status {
        engine::PaymentStatus::Pending => PaymentStatus::Pending,
        engine::PaymentStatus::Paid => PaymentStatus::Paid,
        engine::PaymentStatus::NotPaid => PaymentStatus::NotPaid,
        engine::PaymentStatus::ForYou => PaymentStatus::ForYou,
    }
}

fn policy_to_engine(policy: FeePolicy) -> AssignmentPolicy {
    match policy {
        FeePolicy::AllActiveMembers => AssignmentPolicy::AllActiveMembers,
        FeePolicy::CustomMemberList { member_ids } => {
            AssignmentPolicy::CustomMemberList(member_ids)
        }
        FeePolicy::NoOne => AssignmentPolicy::NoOne,
    }
}

pub(crate) fn fee_view(fee: engine::Fee) -> FeeView {
    FeeView {
        id: fee.id,
        association_id: fee.association_id,
        name: fee.name,
        category: category_view(fee.category),
        amount_cents: fee.amount.cents(),
        reason: fee.reason,
        transaction_type: transaction_type_view(fee.transaction_type),
        due_date: fee.due_date,
        status: record_status_view(fee.status),
        created_at: fee.created_at,
    }
}

pub(crate) fn assignment_view(assignment: engine::FeeAssignment) -> AssignmentView {
    let member_id = assignment.member_id();
    AssignmentView {
        id: assignment.id,
        fee_id: assignment.fee_id,
        member_id,
        payment_status: payment_status_view(assignment.payment_status),
        payment_method: assignment.payment_method,
        trx_ref: assignment.trx_ref,
        bank_id: assignment.bank_id,
        proof_image: assignment.proof_image,
        paid_at: assignment.paid_at,
    }
}

pub(crate) fn outcome_response(outcome: engine::FeeOutcome) -> FeeOutcomeResponse {
    FeeOutcomeResponse {
        fee: fee_view(outcome.fee),
        assignments: outcome.assignments.into_iter().map(assignment_view).collect(),
        skipped: outcome.skipped,
    }
}
