use super::helpers::{
    check_standing, fetch_bid_for_update, fetch_request_for_update, fetch_vehicle_for_update,
    reject_pending_bids, update_bid, update_request,
};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::BidAPI,
    auth::User,
    entities::{Bid, DriverBid, RideRequest},
    error::{
        bid_not_found_error, duplicate_bid_error, invalid_input_error, request_closed_error,
        vehicle_not_eligible_error, Error,
    },
};

#[async_trait]
impl BidAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn place_bid(
        &self,
        user: User,
        request_id: Uuid,
        vehicle_id: Uuid,
        message: Option<String>,
    ) -> Result<Bid, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let request = fetch_request_for_update(&mut tx, &request_id).await?;

        self.authorize(user.clone(), "place_bid", request.clone())?;

        check_standing(&mut tx, &user.id, "driver").await?;

        if request.creator_id == user.id {
            return Err(invalid_input_error());
        }

        if !request.is_open() || request.has_departed(Utc::now()) {
            return Err(request_closed_error());
        }

        // lock the vehicle so it cannot be retired while the bid is created
        let vehicle = fetch_vehicle_for_update(&mut tx, &vehicle_id).await?;

        if !vehicle.is_eligible(&user.id) {
            return Err(vehicle_not_eligible_error());
        }

        let maybe_existing = tx
            .fetch_optional(
                sqlx::query(
                    "SELECT id FROM bids WHERE request_id = $1 AND driver_id = $2 AND status <> 'REJECTED'",
                )
                .bind(&request_id)
                .bind(&user.id),
            )
            .await?;

        if maybe_existing.is_some() {
            return Err(duplicate_bid_error());
        }

        let bid = Bid::new(request_id, user.id, vehicle_id, message, vehicle.snapshot());

        tx.execute(
            sqlx::query(
                "INSERT INTO bids (id, request_id, driver_id, status, data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&bid.id)
            .bind(&bid.request_id)
            .bind(&bid.driver_id)
            .bind(bid.status.name())
            .bind(Json(&bid)),
        )
        .await?;

        tx.commit().await?;

        Ok(bid)
    }

    #[tracing::instrument(skip(self))]
    async fn select_bid(
        &self,
        user: User,
        request_id: Uuid,
        bid_id: Uuid,
    ) -> Result<RideRequest, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut request = fetch_request_for_update(&mut tx, &request_id).await?;

        self.authorize(user.clone(), "select_bid", request.clone())?;

        check_standing(&mut tx, &user.id, "rider").await?;

        let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;

        if bid.request_id != request.id {
            return Err(bid_not_found_error());
        }

        // the request transition runs first so a second selection reports
        // the match, not the state of the losing bid
        request.select_bid(bid.id, bid.driver_id)?;
        bid.accept()?;

        reject_pending_bids(&mut tx, &request_id, Some(&bid.id)).await?;

        update_bid(&mut tx, &bid).await?;
        update_request(&mut tx, &request).await?;

        tx.commit().await?;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn list_driver_bids(&self, user: User) -> Result<Vec<DriverBid>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = "
            SELECT
                b.data AS bid,
                r.data AS request
            FROM
                bids b
                JOIN ride_requests r ON b.request_id = r.id
            WHERE
                b.driver_id = $1
            ORDER BY
                CASE b.status WHEN 'ACCEPTED' THEN 0 WHEN 'PENDING' THEN 1 ELSE 2 END ASC,
                r.departure_at ASC
        ";

        let results = conn.fetch_all(sqlx::query(query).bind(&user.id)).await?;

        let mut bids = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(bid): Json<Bid> = result.try_get("bid")?;
            let Json(request): Json<RideRequest> = result.try_get("request")?;

            bids.push(DriverBid { bid, request });
        }

        Ok(bids)
    }

    #[tracing::instrument(skip(self))]
    async fn list_assigned_requests(&self, user: User) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM ride_requests WHERE assigned_driver_id = $1 ORDER BY departure_at ASC",
                )
                .bind(&user.id),
            )
            .await?;

        let mut requests = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(request): Json<RideRequest> = result.try_get("data")?;
            requests.push(request);
        }

        Ok(requests)
    }
}
