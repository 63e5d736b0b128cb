use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{associations, families, fees, members, memberships, payments, reports, withdrawals};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Basic-auth gate. Credentials are the member's phone and password; the
/// resolved member rides along as a request extension.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let member = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/associations",
            post(associations::create).get(associations::list),
        )
        .route("/associations/{id}", get(associations::detail))
        .route(
            "/associations/{id}/members",
            post(memberships::join).get(memberships::roster),
        )
        .route(
            "/associations/{id}/members/{member_id}",
            patch(memberships::review),
        )
        .route(
            "/associations/{id}/members/{member_id}/payments",
            get(reports::member_payments),
        )
        .route(
            "/associations/{id}/fees",
            post(fees::create).get(fees::list),
        )
        .route(
            "/fees/{id}",
            get(fees::detail)
                .patch(fees::update)
                .delete(fees::deactivate),
        )
        .route(
            "/members/{member_id}/family",
            post(families::add).get(families::list),
        )
        .route("/family/{id}", delete(families::deactivate))
        .route("/payments", post(payments::pay))
        .route("/payments/admin", post(payments::admin_pay))
        .route("/payments/unpay", post(payments::unpay))
        .route(
            "/payments/{trx_ref}",
            get(payments::batch_detail).delete(payments::remove),
        )
        .route(
            "/associations/{id}/withdrawals",
            post(withdrawals::create).get(withdrawals::list),
        )
        .route("/withdrawals/{fee_id}", patch(withdrawals::update))
        .route("/associations/{id}/reports/unpaid", get(reports::unpaid))
        .route(
            "/associations/{id}/reports/deposits",
            get(reports::deposits),
        )
        .route(
            "/associations/{id}/reports/deposit-summary",
            get(reports::deposit_summary),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Registration stays outside the auth layer.
        .route("/members", post(members::register))
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
