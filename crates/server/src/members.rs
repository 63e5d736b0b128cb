//! Member registration endpoint.

use api_types::member::{MemberNew, MemberView};
use axum::{Json, extract::State};
use engine::RegisterMemberCmd;

use crate::{ServerError, record_status_view, server::ServerState};

/// Self-registration. The one route served without credentials; everything
/// else requires the Basic pair this call establishes.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<Json<MemberView>, ServerError> {
    let member = state
        .engine
        .register_member(RegisterMemberCmd::new(
            payload.full_name,
            payload.phone,
            payload.password,
        ))
        .await?;

    Ok(Json(view(member)))
}

pub(crate) fn view(member: engine::Member) -> MemberView {
    MemberView {
        id: member.id,
        full_name: member.full_name,
        phone: member.phone,
        is_staff: member.is_staff,
        status: record_status_view(member.status),
        created_at: member.created_at,
    }
}
