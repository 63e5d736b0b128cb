//! Association endpoints.

use api_types::association::{
    AssociationDetailResponse, AssociationNew, AssociationView, AssociationsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{CreateAssociationCmd, MoneyCents};
use uuid::Uuid;

use crate::{ServerError, members, record_status_view, server::ServerState};

pub async fn create(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Json(payload): Json<AssociationNew>,
) -> Result<Json<AssociationView>, ServerError> {
    let mut cmd = CreateAssociationCmd::new(
        payload.name,
        member.id,
        MoneyCents::new(payload.monthly_fee_cents),
    );
    if let Some(city) = payload.city {
        cmd = cmd.city(city);
    }
    if let Some(meeting_place) = payload.meeting_place {
        cmd = cmd.meeting_place(meeting_place);
    }

    let association = state.engine.create_association(cmd).await?;
    Ok(Json(view(association)))
}

pub async fn list(
    Extension(_member): Extension<engine::Member>,
    State(state): State<ServerState>,
) -> Result<Json<AssociationsResponse>, ServerError> {
    let associations = state.engine.list_associations().await?;
    Ok(Json(AssociationsResponse {
        associations: associations.into_iter().map(view).collect(),
    }))
}

/// One association with its aggregates. The unpaid total is the caller's
/// own, so two members see different numbers here.
pub async fn detail(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(association_id): Path<Uuid>,
) -> Result<Json<AssociationDetailResponse>, ServerError> {
    let detail = state
        .engine
        .association_detail(association_id, member.id)
        .await?;

    Ok(Json(AssociationDetailResponse {
        association: view(detail.association),
        member_count: detail.member_count,
        unpaid_total_cents: detail.unpaid_total.cents(),
        committee: detail.committee.into_iter().map(members::view).collect(),
    }))
}

pub(crate) fn view(association: engine::Association) -> AssociationView {
    AssociationView {
        id: association.id,
        name: association.name,
        monthly_fee_cents: association.monthly_fee.cents(),
        city: association.city,
        meeting_place: association.meeting_place,
        status: record_status_view(association.status),
        created_by: association.created_by,
        created_at: association.created_at,
    }
}
