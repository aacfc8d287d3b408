mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequest, RequestParts},
    http::{header, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};

use crate::server::handlers::{accounts, bids, requests, vehicles};
use crate::{
    api::{DynAPI, API},
    auth::{TokenVerifier, User},
    error::{unauthenticated_error, unexpected_error, Error},
};

// handlers that need an identity take this extractor; public handlers
// skip it and the request passes through anonymously
pub struct CurrentUser(pub User);

#[async_trait]
impl<B: Send> FromRequest<B> for CurrentUser {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let user = req
            .extensions()
            .get::<User>()
            .cloned()
            .ok_or_else(|| unauthenticated_error())?;

        Ok(Self(user))
    }
}

async fn authenticate<B: Send>(mut req: Request<B>, next: Next<B>) -> Result<Response, Error> {
    let maybe_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if let Some(value) = maybe_header {
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthenticated_error())?;

        let verifier = req
            .extensions()
            .get::<TokenVerifier>()
            .cloned()
            .ok_or_else(|| unexpected_error())?;

        let user = verifier.verify(token)?;

        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

pub async fn serve<T: API + Sync + Send + 'static>(
    api: T,
    verifier: TokenVerifier,
    addr: SocketAddr,
    sweep_every: Duration,
) {
    tracing_subscriber::fmt::init();

    let api = Arc::new(api) as DynAPI;

    // overdue OPEN requests expire in the background
    let sweeper = api.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);

        loop {
            interval.tick().await;

            if let Err(error) = sweeper.expire_overdue_requests().await {
                tracing::error!("expiry sweep failed: {:?}", error);
            }
        }
    });

    let app = Router::new()
        .route("/rider-requests", get(requests::list).post(requests::create))
        .route("/rider-requests/badge", get(requests::badge))
        .route("/rider-requests/mine", get(requests::list_mine))
        .route("/rider-requests/joined", get(requests::list_joined))
        .route("/rider-requests/:id", get(requests::find))
        .route("/rider-requests/:id/join", post(requests::join))
        .route("/rider-requests/:id/leave", post(requests::leave))
        .route("/rider-requests/:id/cancel", post(requests::cancel))
        .route("/rider-requests/:id/bids", post(bids::place))
        .route(
            "/rider-requests/:id/select-bid/:bid_id",
            patch(bids::select),
        )
        // the static `driver` segment outranks the `:id` routes above
        .route("/rider-requests/driver/bids", get(bids::list_for_driver))
        .route("/rider-requests/driver/assigned", get(bids::list_assigned))
        .route("/vehicles", get(vehicles::list).post(vehicles::register))
        .route("/vehicles/:id", get(vehicles::find).delete(vehicles::retire))
        .route("/vehicles/:id/review", patch(vehicles::review))
        .route("/accounts/:id", get(accounts::find))
        .route("/accounts/:id/status", put(accounts::set_status))
        .layer(Extension(api))
        .layer(middleware::from_fn(authenticate))
        .layer(Extension(verifier));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
