//! Payment endpoints: settle, revert, batch detail.

use api_types::payment::{
    AdminPaymentNew, BatchResponse, PaymentBatchFeeView, PaymentBatchResponse, PaymentNew,
    UnpayRequest,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{AdminPayFeesCmd, PayFeesCmd};

use crate::{ServerError, fees, server::ServerState};

/// Marks a batch of obligations paid under one shared reference.
pub async fn pay(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Json(payload): Json<PaymentNew>,
) -> Result<Json<BatchResponse>, ServerError> {
    let mut cmd = PayFeesCmd::new(member.id, payload.assignment_ids, payload.method);
    if let Some(bank_id) = payload.bank_id {
        cmd = cmd.bank_id(bank_id);
    }
    if let Some(proof_image) = payload.proof_image {
        cmd = cmd.proof_image(proof_image);
    }
    if let Some(trx_ref) = payload.trx_ref {
        cmd = cmd.trx_ref(trx_ref);
    }
    if let Some(paid_at) = payload.paid_at {
        cmd = cmd.paid_at(paid_at);
    }

    let outcome = state.engine.pay_fees(cmd).await?;
    Ok(Json(batch_response(outcome)))
}

/// Staff shortcut for out-of-band collections (cash at a meeting).
pub async fn admin_pay(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminPaymentNew>,
) -> Result<Json<BatchResponse>, ServerError> {
    let mut cmd = AdminPayFeesCmd::new(member.id, payload.assignment_ids, payload.method);
    if let Some(trx_ref) = payload.trx_ref {
        cmd = cmd.trx_ref(trx_ref);
    }
    if let Some(paid_at) = payload.paid_at {
        cmd = cmd.paid_at(paid_at);
    }

    let outcome = state.engine.admin_pay_fees(cmd).await?;
    Ok(Json(batch_response(outcome)))
}

/// Reverts an explicit list of paid assignments.
pub async fn unpay(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Json(payload): Json<UnpayRequest>,
) -> Result<Json<BatchResponse>, ServerError> {
    let outcome = state
        .engine
        .unpay_fees(&payload.assignment_ids, member.id)
        .await?;
    Ok(Json(batch_response(outcome)))
}

pub async fn batch_detail(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(trx_ref): Path<String>,
) -> Result<Json<PaymentBatchResponse>, ServerError> {
    let batch = state.engine.payment_batch(&trx_ref, member.id).await?;
    Ok(Json(PaymentBatchResponse {
        trx_ref: batch.trx_ref,
        method: batch.method,
        paid_at: batch.paid_at,
        bank_name: batch.bank_name,
        proof_image: batch.proof_image,
        total_cents: batch.total.cents(),
        fees: batch
            .fees
            .into_iter()
            .map(|fee| PaymentBatchFeeView {
                fee_id: fee.fee_id,
                name: fee.name,
                amount_cents: fee.amount.cents(),
                category: fees::category_view(fee.category),
            })
            .collect(),
    }))
}

/// Reverts every assignment settled under one reference. Unknown or
/// already-reverted references yield an empty outcome.
pub async fn remove(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(trx_ref): Path<String>,
) -> Result<Json<BatchResponse>, ServerError> {
    let outcome = state.engine.remove_payment(&trx_ref, member.id).await?;
    Ok(Json(batch_response(outcome)))
}

fn batch_response(outcome: engine::BatchOutcome) -> BatchResponse {
    BatchResponse {
        succeeded: outcome.succeeded,
        skipped: outcome.skipped,
        trx_ref: outcome.trx_ref,
    }
}
