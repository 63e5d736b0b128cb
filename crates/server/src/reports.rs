//! Reporting endpoints: unpaid totals, deposit detail and summary, payment
//! history.

use api_types::report::{
    DepositGroupView, DepositItemView, DepositList, DepositSummaryList, DepositSummaryResponse,
    DepositSummaryRowView, DepositsResponse, PaymentGroupView, PaymentHistoryList,
    PaymentHistoryResponse, UnpaidEntryView, UnpaidList, UnpaidResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{AssignmentTarget, DepositFilter};
use uuid::Uuid;

use crate::{ServerError, fees, server::ServerState};

/// What a member still owes. Members may ask about themselves; the
/// committee about anyone.
pub async fn unpaid(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<UnpaidList>,
) -> Result<Json<UnpaidResponse>, ServerError> {
    let summary = state
        .engine
        .unpaid_fees(association_id, query.member_id, member.id)
        .await?;

    Ok(Json(UnpaidResponse {
        entries: summary
            .entries
            .into_iter()
            .map(|entry| UnpaidEntryView {
                assignment: fees::assignment_view(entry.assignment),
                fee: fees::fee_view(entry.fee),
            })
            .collect(),
        total_cents: summary.total.cents(),
    }))
}

/// Paid deposits grouped per member, filterable by method and day.
pub async fn deposits(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<DepositList>,
) -> Result<Json<DepositsResponse>, ServerError> {
    let filter = DepositFilter {
        method: query.method,
        date: query.date,
    };
    let groups = state
        .engine
        .deposits(association_id, filter, member.id)
        .await?;

    Ok(Json(DepositsResponse {
        deposits: groups
            .into_iter()
            .map(|group| DepositGroupView {
                member_id: match group.target {
                    AssignmentTarget::Member { member_id } => Some(member_id),
                    AssignmentTarget::Association => None,
                },
                member_name: group.member_name,
                total_cents: group.total.cents(),
                items: group
                    .items
                    .into_iter()
                    .map(|item| DepositItemView {
                        assignment_id: item.assignment_id,
                        fee_id: item.fee_id,
                        fee_name: item.fee_name,
                        amount_cents: item.amount.cents(),
                        method: item.method,
                        trx_ref: item.trx_ref,
                        paid_at: item.paid_at,
                    })
                    .collect(),
            })
            .collect(),
    }))
}

/// Collection totals per day and method, newest day first.
pub async fn deposit_summary(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<DepositSummaryList>,
) -> Result<Json<DepositSummaryResponse>, ServerError> {
    let rows = state
        .engine
        .deposit_summary(association_id, query.limit, member.id)
        .await?;

    Ok(Json(DepositSummaryResponse {
        rows: rows
            .into_iter()
            .map(|row| DepositSummaryRowView {
                day: row.day,
                method: row.method,
                total_cents: row.total.cents(),
                count: row.count,
            })
            .collect(),
    }))
}

/// A member's settled batches, newest first.
pub async fn member_payments(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path((association_id, member_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PaymentHistoryList>,
) -> Result<Json<PaymentHistoryResponse>, ServerError> {
    let groups = state
        .engine
        .member_payments(association_id, member_id, query.limit, member.id)
        .await?;

    Ok(Json(PaymentHistoryResponse {
        payments: groups
            .into_iter()
            .map(|group| PaymentGroupView {
                trx_ref: group.trx_ref,
                total_cents: group.total.cents(),
                method: group.method,
                paid_at: group.paid_at,
                transaction_type: fees::transaction_type_view(group.transaction_type),
                fee_count: group.fee_count,
            })
            .collect(),
    }))
}
