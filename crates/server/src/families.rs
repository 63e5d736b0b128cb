//! Family endpoints: the dependents a member has declared.

use api_types::family::{FamilyNew, FamilyRelationship, FamilyResponse, FamilyView, Gender};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, record_status_view, server::ServerState};
use engine::AddFamilyMemberCmd;

/// Declares a dependent on a member's record. Self or staff only.
pub async fn add(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(member_id): Path<Uuid>,
    Json(payload): Json<FamilyNew>,
) -> Result<Json<FamilyView>, ServerError> {
    let mut cmd = AddFamilyMemberCmd::new(
        member_id,
        member.id,
        payload.full_name,
        gender_to_engine(payload.gender),
        relationship_to_engine(payload.relationship),
    );
    if let Some(profession) = payload.profession {
        cmd = cmd.profession(profession);
    }

    let family = state.engine.add_family_member(cmd).await?;
    Ok(Json(view(family)))
}

/// Lists a member's active dependents.
pub async fn list(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<FamilyResponse>, ServerError> {
    let rows = state.engine.family_members(member_id, member.id).await?;
    Ok(Json(FamilyResponse {
        family: rows.into_iter().map(view).collect(),
    }))
}

/// Soft-deletes a dependent; the row drops out of listings.
pub async fn deactivate(
    Extension(member): Extension<engine::Member>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<FamilyView>, ServerError> {
    let family = state
        .engine
        .deactivate_family_member(family_id, member.id)
        .await?;
    Ok(Json(view(family)))
}

fn gender_to_engine(gender: Gender) -> engine::Gender {
    match gender {
        Gender::Male => engine::Gender::Male,
        Gender::Female => engine::Gender::Female,
    }
}

fn gender_view(gender: engine::Gender) -> Gender {
    match gender {
        engine::Gender::Male => Gender::Male,
        engine::Gender::Female => Gender::Female,
    }
}

fn relationship_to_engine(relationship: FamilyRelationship) -> engine::FamilyRelationship {
    match relationship {
        FamilyRelationship::Partner => engine::FamilyRelationship::Partner,
        FamilyRelationship::Child => engine::FamilyRelationship::Child,
        FamilyRelationship::Parent => engine::FamilyRelationship::Parent,
        FamilyRelationship::Sibling => engine::FamilyRelationship::Sibling,
        FamilyRelationship::PartnerParent => engine::FamilyRelationship::PartnerParent,
        FamilyRelationship::PartnerSibling => engine::FamilyRelationship::PartnerSibling,
    }
}

fn relationship_view(relationship: engine::FamilyRelationship) -> FamilyRelationship {
    match relationship {
        engine::FamilyRelationship::Partner => FamilyRelationship::Partner,
        engine::FamilyRelationship::Child => FamilyRelationship::Child,
        engine::FamilyRelationship::Parent => FamilyRelationship::Parent,
        engine::FamilyRelationship::Sibling => FamilyRelationship::Sibling,
        engine::FamilyRelationship::PartnerParent => FamilyRelationship::PartnerParent,
        engine::FamilyRelationship::PartnerSibling => FamilyRelationship::PartnerSibling,
    }
}

fn view(family: engine::Family) -> FamilyView {
    FamilyView {
        id: family.id,
        member_id: family.member_id,
        full_name: family.full_name,
        gender: gender_view(family.gender),
        relationship: relationship_view(family.relationship),
        profession: family.profession,
        status: record_status_view(family.status),
        created_at: family.created_at,
    }
}
