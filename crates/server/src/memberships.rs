//! Membership endpoints: join requests, committee review, roster.

use api_types::membership::{
    MembershipReview, MembershipStatus, MembershipView, RosterEntryView, RosterList, RosterResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{ServerError, members, server::ServerState};
use engine::ReviewMembershipCmd;

/// Files a join request for the authenticated member (maker side).
pub async fn join(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
) -> Result<Json<MembershipView>, ServerError> {
    let membership = state
        .engine
        .join_association(association_id, member.id)
        .await?;
    Ok(Json(view(membership)))
}

/// Settles a membership (checker side). Committee only; the reviewer is
/// stamped as checker.
pub async fn review(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path((association_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MembershipReview>,
) -> Result<Json<MembershipView>, ServerError> {
    let mut cmd = ReviewMembershipCmd::new(
        association_id,
        member_id,
        member.id,
        status_to_engine(payload.status),
    );
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }

    let membership = state.engine.review_membership(cmd).await?;
    Ok(Json(view(membership)))
}

/// Lists members by membership status; defaults to the active roster.
pub async fn roster(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
    Query(query): Query<RosterList>,
) -> Result<Json<RosterResponse>, ServerError> {
    let entries = state
        .engine
        .roster(association_id, query.status.map(status_to_engine), member.id)
        .await?;

    Ok(Json(RosterResponse {
        members: entries
            .into_iter()
            .map(|entry| RosterEntryView {
                member: members::view(entry.member),
                membership: view(entry.membership),
            })
            .collect(),
    }))
}

fn status_to_engine(status: MembershipStatus) -> engine::MembershipStatus {
    match status {
        MembershipStatus::Pending => engine::MembershipStatus::Pending,
        MembershipStatus::Active => engine::MembershipStatus::Active,
        MembershipStatus::Rejected => engine::MembershipStatus::Rejected,
        MembershipStatus::Cancelled => engine::MembershipStatus::Cancelled,
        MembershipStatus::Blocked => engine::MembershipStatus::Blocked,
        MembershipStatus::NotActive => engine::MembershipStatus::NotActive,
        MembershipStatus::Leaved => engine::MembershipStatus::Leaved,
    }
}

fn status_view(status: engine::MembershipStatus) -> MembershipStatus {
    match status {
        engine::MembershipStatus::Pending => MembershipStatus::Pending,
        engine::MembershipStatus::Active => MembershipStatus::Active,
        engine::MembershipStatus::Rejected => MembershipStatus::Rejected,
        engine::MembershipStatus::Cancelled => MembershipStatus::Cancelled,
        engine::MembershipStatus::Blocked => MembershipStatus::Blocked,
        engine::MembershipStatus::NotActive => MembershipStatus::NotActive,
        engine::MembershipStatus::Leaved => MembershipStatus::Leaved,
    }
}

fn view(membership: engine::Membership) -> MembershipView {
    MembershipView {
        association_id: membership.association_id,
        member_id: membership.member_id,
        status: status_view(membership.status),
        is_committee: membership.is_committee,
        maker: membership.maker,
        checker: membership.checker,
        reason: membership.reason,
        joined_at: membership.joined_at,
    }
}
