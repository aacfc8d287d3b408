use super::Database;

use chrono::Utc;
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::{Account, Bid, Passenger, RideRequest, Vehicle},
    error::{bid_not_found_error, request_not_found_error, vehicle_not_found_error, Error},
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_request_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<RideRequest, Error> {
    let Json(request): Json<RideRequest> = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM ride_requests WHERE id = $1 FOR UPDATE").bind(id),
        )
        .await?
        .ok_or_else(|| request_not_found_error())?
        .try_get("data")?;

    Ok(request)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_bid_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Bid, Error> {
    let Json(bid): Json<Bid> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bids WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| bid_not_found_error())?
        .try_get("data")?;

    Ok(bid)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_vehicle_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Vehicle, Error> {
    let Json(vehicle): Json<Vehicle> = tx
        .fetch_optional(sqlx::query("SELECT data FROM vehicles WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| vehicle_not_found_error())?
        .try_get("data")?;

    Ok(vehicle)
}

// a user without a stored row is in good standing
#[tracing::instrument(skip(tx))]
pub async fn fetch_account(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Account, Error> {
    let maybe_result = tx
        .fetch_optional(sqlx::query("SELECT data FROM accounts WHERE id = $1").bind(id))
        .await?;

    match maybe_result {
        Some(result) => {
            let Json(account): Json<Account> = result.try_get("data")?;
            Ok(account)
        }
        None => Ok(Account::new(id.clone())),
    }
}

// standing is checked inside the same transaction as the mutation it gates
#[tracing::instrument(skip(tx))]
pub async fn check_standing(
    tx: &mut Transaction<'_, Database>,
    user_id: &Uuid,
    acting_role: &str,
) -> Result<(), Error> {
    let account = fetch_account(tx, user_id).await?;

    account.check_can_act(Utc::now(), acting_role)
}

#[tracing::instrument(skip(tx))]
pub async fn update_request(
    tx: &mut Transaction<'_, Database>,
    request: &RideRequest,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "UPDATE ride_requests SET status = $2, assigned_driver_id = $3, data = $4 WHERE id = $1",
        )
        .bind(&request.id)
        .bind(request.status.name())
        .bind(request.assigned_driver_id())
        .bind(Json(request)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn update_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = $2, data = $3 WHERE id = $1")
            .bind(&bid.id)
            .bind(bid.status.name())
            .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn update_vehicle(
    tx: &mut Transaction<'_, Database>,
    vehicle: &Vehicle,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE vehicles SET status = $2, data = $3 WHERE id = $1")
            .bind(&vehicle.id)
            .bind(vehicle.status.name())
            .bind(Json(vehicle)),
    )
    .await?;

    Ok(())
}

// the membership table mirrors the ledger embedded in the request document
#[tracing::instrument(skip(tx))]
pub async fn upsert_member(
    tx: &mut Transaction<'_, Database>,
    request_id: &Uuid,
    passenger: &Passenger,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("INSERT INTO request_members (request_id, user_id, status, is_owner) VALUES ($1, $2, $3, $4) ON CONFLICT (request_id, user_id) DO UPDATE SET status = EXCLUDED.status")
            .bind(request_id)
            .bind(&passenger.user_id)
            .bind(passenger.status.name())
            .bind(passenger.is_owner),
    )
    .await?;

    Ok(())
}

// the status column and the embedded document must move together
#[tracing::instrument(skip(tx))]
pub async fn reject_pending_bids(
    tx: &mut Transaction<'_, Database>,
    request_id: &Uuid,
    except: Option<&Uuid>,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = 'REJECTED', data = jsonb_set(data, '{status}', '{\"name\": \"REJECTED\"}'::jsonb) WHERE request_id = $1 AND status = 'PENDING' AND ($2::uuid IS NULL OR id <> $2)")
            .bind(request_id)
            .bind(except),
    )
    .await?;

    Ok(())
}
