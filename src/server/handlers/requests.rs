use axum::extract::{Extension, Json, Path, Query};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{BadgeCount, RequestDetail, RequestDraft, RequestFilter, RideRequest};
use crate::error::Error;
use crate::server::CurrentUser;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    origin: Option<String>,
    destination: Option<String>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
    status: Option<String>,
}

#[axum_macros::debug_handler]
pub async fn create(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<RequestDraft>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.create_request(user, draft).await?;

    Ok(request.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<RideRequest>>, Error> {
    // ?status=OPEN,MATCHED widens the default open-only view
    let statuses = params
        .status
        .map(|value| {
            value
                .split(',')
                .map(|status| status.trim().to_uppercase())
                .filter(|status| !status.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let filter = RequestFilter {
        origin: params.origin,
        destination: params.destination,
        date_from: params.date_from,
        date_to: params.date_to,
        statuses,
    };

    let requests = api.list_open_requests(filter).await?;

    Ok(requests.into())
}

pub async fn badge(Extension(api): Extension<DynAPI>) -> Result<Json<BadgeCount>, Error> {
    let badge = api.badge().await?;

    Ok(badge.into())
}

pub async fn list_mine(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_created_requests(user).await?;

    Ok(requests.into())
}

pub async fn list_joined(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_joined_requests(user).await?;

    Ok(requests.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestDetail>, Error> {
    let detail = api.find_request(id).await?;

    Ok(detail.into())
}

pub async fn join(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.join_request(user, id).await?;

    Ok(request.into())
}

pub async fn leave(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.leave_request(user, id).await?;

    Ok(request.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.cancel_request(user, id).await?;

    Ok(request.into())
}
