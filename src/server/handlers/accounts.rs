use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Account, AccountStatus};
use crate::error::Error;
use crate::server::CurrentUser;

#[derive(Serialize, Deserialize)]
pub struct SetStatusParams {
    status: AccountStatus,
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, Error> {
    let account = api.find_account(user, id).await?;

    Ok(account.into())
}

pub async fn set_status(
    Extension(api): Extension<DynAPI>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(params): Json<SetStatusParams>,
) -> Result<Json<Account>, Error> {
    let account = api.set_account_status(user, id, params.status).await?;

    Ok(account.into())
}
