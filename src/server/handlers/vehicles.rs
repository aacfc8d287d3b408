use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Vehicle, VehicleDraft};
use crate::error::Error;
use crate::server::CurrentUser;

#[derive(Serialize, Deserialize)]
pub struct ReviewParams {
    approve: bool,
}

pub async fn register(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<VehicleDraft>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api.register_vehicle(user, draft).await?;

    Ok(vehicle.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Vehicle>>, Error> {
    let vehicles = api.list_vehicles(user).await?;

    Ok(vehicles.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api.find_vehicle(user, id).await?;

    Ok(vehicle.into())
}

pub async fn review(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(params): Json<ReviewParams>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api.review_vehicle(user, id, params.approve).await?;

    Ok(vehicle.into())
}

pub async fn retire(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api.retire_vehicle(user, id).await?;

    Ok(vehicle.into())
}
