use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Bid, DriverBid, RideRequest};
use crate::error::Error;
use crate::server::CurrentUser;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceParams {
    vehicle_id: Uuid,
    message: Option<String>,
}

pub async fn place(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(params): Json<PlaceParams>,
) -> Result<Json<Bid>, Error> {
    let bid = api
        .place_bid(user, id, params.vehicle_id, params.message)
        .await?;

    Ok(bid.into())
}

pub async fn select(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path((id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.select_bid(user, id, bid_id).await?;

    Ok(request.into())
}

pub async fn list_for_driver(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DriverBid>>, Error> {
    let bids = api.list_driver_bids(user).await?;

    Ok(bids.into())
}

pub async fn list_assigned(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_assigned_requests(user).await?;

    Ok(requests.into())
}
