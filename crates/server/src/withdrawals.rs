//! Withdrawal endpoints: money leaving the till.

use api_types::fee::FeeOutcomeResponse;
use api_types::withdrawal::{
    ExpenseUpdate, WithdrawalList, WithdrawalNew, WithdrawalView, WithdrawalsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{AssignmentTarget, MoneyCents, UpdateExpenseCmd, WithdrawCmd};
use uuid::Uuid;

use crate::{ServerError, fees, server::ServerState};

fn target_for(member_id: Option<Uuid>) -> AssignmentTarget {
    match member_id {
        Some(member_id) => AssignmentTarget::Member { member_id },
        None => AssignmentTarget::Association,
    }
}

/// Records a withdrawal: a fee settled on creation against its beneficiary.
pub async fn create(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Json(payload): Json<WithdrawalNew>,
) -> Result<Json<FeeOutcomeResponse>, ServerError> {
    let mut cmd = WithdrawCmd::new(
        association_id,
        member.id,
        payload.name,
        fees::category_to_engine(payload.category),
        MoneyCents::new(payload.amount_cents),
        target_for(payload.member_id),
    );
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }
    if let Some(due_date) = payload.due_date {
        cmd = cmd.due_date(due_date);
    }
    if let Some(method) = payload.method {
        cmd = cmd.method(method);
    }
    if let Some(bank_id) = payload.bank_id {
        cmd = cmd.bank_id(bank_id);
    }
    if let Some(proof_image) = payload.proof_image {
        cmd = cmd.proof_image(proof_image);
    }

    let outcome = state.engine.withdraw(cmd).await?;
    Ok(Json(fees::outcome_response(outcome)))
}

pub async fn list(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<WithdrawalList>,
) -> Result<Json<WithdrawalsResponse>, ServerError> {
    let records = state
        .engine
        .list_withdrawals(association_id, query.limit, member.id)
        .await?;

    Ok(Json(WithdrawalsResponse {
        withdrawals: records
            .into_iter()
            .map(|record| WithdrawalView {
                fee: fees::fee_view(record.fee),
                assignments: record
                    .assignments
                    .into_iter()
                    .map(fees::assignment_view)
                    .collect(),
            })
            .collect(),
    }))
}

/// Rewrites a withdrawal and re-settles it against the (possibly new)
/// beneficiary.
pub async fn update(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(fee_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<FeeOutcomeResponse>, ServerError> {
    let mut cmd = UpdateExpenseCmd::new(fee_id, member.id, target_for(payload.member_id));
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(fees::category_to_engine(category));
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
    if let Some(method) = payload.method {
        cmd = cmd.method(method);
    }
    if let Some(bank_id) = payload.bank_id {
        cmd = cmd.bank_id(bank_id);
    }
    if let Some(proof_image) = payload.proof_image {
        cmd = cmd.proof_image(proof_image);
    }

    let outcome = state.engine.update_expense(cmd).await?;
    Ok(Json(fees::outcome_response(outcome)))
}
