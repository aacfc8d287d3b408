use super::helpers::{
    check_standing, fetch_request_for_update, reject_pending_bids, update_request, upsert_member,
};
use super::Engine;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::RequestAPI,
    auth::{Platform, User},
    entities::{
        BadgeCount, Bid, RequestDetail, RequestDraft, RequestFilter, RequestStatus, RideRequest,
    },
    error::{request_closed_error, request_not_found_error, unexpected_error, Error},
};

#[async_trait]
impl RequestAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_request(&self, user: User, draft: RequestDraft) -> Result<RideRequest, Error> {
        self.authorize(user.clone(), "create_request", Platform::default())?;

        let request = RideRequest::new(user.id, draft)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        check_standing(&mut tx, &user.id, "rider").await?;

        tx.execute(
            sqlx::query("INSERT INTO ride_requests (id, creator_id, status, origin, destination, departure_at, assigned_driver_id, data) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                .bind(&request.id)
                .bind(&request.creator_id)
                .bind(request.status.name())
                .bind(&request.origin)
                .bind(&request.destination)
                .bind(&request.departure_at)
                .bind(request.assigned_driver_id())
                .bind(Json(&request)),
        )
        .await?;

        for passenger in request.passengers.iter() {
            upsert_member(&mut tx, &request.id, passenger).await?;
        }

        tx.commit().await?;

        Ok(request)
    }

    // reads are public, no authorization check
    #[tracing::instrument(skip(self))]
    async fn find_request(&self, id: Uuid) -> Result<RequestDetail, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM ride_requests WHERE id = $1").bind(&id))
            .await?;

        let result = maybe_result.ok_or_else(|| request_not_found_error())?;
        let Json(request): Json<RideRequest> = result.try_get("data")?;

        let results = conn
            .fetch_all(sqlx::query("SELECT data FROM bids WHERE request_id = $1").bind(&id))
            .await?;

        let mut bids = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(bid): Json<Bid> = result.try_get("data")?;
            bids.push(bid);
        }

        bids.sort_by_key(|bid| (bid.priority(), bid.created_at));

        let chosen_bid = match &request.status {
            RequestStatus::Matched {
                bid_id,
                driver_id: _,
            } => bids.iter().find(|bid| bid.id == *bid_id).cloned(),
            _ => None,
        };

        Ok(RequestDetail {
            request,
            bids,
            chosen_bid,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_open_requests(&self, filter: RequestFilter) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let statuses = if filter.statuses.is_empty() {
            vec!["OPEN".to_string()]
        } else {
            filter.statuses.clone()
        };

        let query = "
            SELECT
                data
            FROM
                ride_requests
            WHERE
                status = ANY($1)
                AND ($2::timestamptz IS NULL OR departure_at >= $2)
                AND ($3::timestamptz IS NULL OR departure_at <= $3)
                AND ($4::varchar IS NULL OR origin ILIKE '%' || $4 || '%')
                AND ($5::varchar IS NULL OR destination ILIKE '%' || $5 || '%')
            ORDER BY
                departure_at ASC
        ";

        let mut rows = conn.fetch(
            sqlx::query(query)
                .bind(&statuses)
                .bind(&filter.date_from)
                .bind(&filter.date_to)
                .bind(&filter.origin)
                .bind(&filter.destination),
        );

        let mut requests = Vec::new();

        while let Some(row) = rows.try_next().await? {
            let Json(request): Json<RideRequest> = row.try_get("data")?;
            requests.push(request);
        }

        Ok(requests)
    }

    #[tracing::instrument(skip(self))]
    async fn list_created_requests(&self, user: User) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM ride_requests WHERE creator_id = $1 ORDER BY departure_at DESC",
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

    #[tracing::instrument(skip(self))]
    async fn list_joined_requests(&self, user: User) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        // the membership table carries requests the user joined but did not create
        let query = "
            SELECT
                r.data
            FROM
                ride_requests r
                JOIN request_members m ON m.request_id = r.id
            WHERE
                m.user_id = $1
                AND m.status = 'JOINED'
                AND m.is_owner = FALSE
            ORDER BY
                r.departure_at DESC
        ";

        let results = conn.fetch_all(sqlx::query(query).bind(&user.id)).await?;

        let mut requests = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(request): Json<RideRequest> = result.try_get("data")?;
            requests.push(request);
        }

        Ok(requests)
    }

    #[tracing::instrument(skip(self))]
    async fn join_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut request = fetch_request_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "join", request.clone())?;

        check_standing(&mut tx, &user.id, "rider").await?;

        // past departures are closed even before the sweeper catches up
        if request.has_departed(Utc::now()) {
            return Err(request_closed_error());
        }

        request.join(user.id)?;

        update_request(&mut tx, &request).await?;

        let passenger = request
            .passenger(&user.id)
            .ok_or_else(|| unexpected_error())?;

        upsert_member(&mut tx, &id, passenger).await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn leave_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut request = fetch_request_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "leave", request.clone())?;

        request.leave(user.id)?;

        update_request(&mut tx, &request).await?;

        if let Some(passenger) = request.passenger(&user.id) {
            upsert_member(&mut tx, &id, passenger).await?;
        }

        tx.commit().await?;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut request = fetch_request_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "cancel_request", request.clone())?;

        request.cancel()?;

        update_request(&mut tx, &request).await?;
        reject_pending_bids(&mut tx, &id, None).await?;

        tx.commit().await?;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn badge(&self) -> Result<BadgeCount, Error> {
        let mut conn = self.pool.acquire().await?;

        // stale-but-unswept requests age out of the count after a week
        let date_from = Utc::now() - Duration::days(7);

        let result = conn
            .fetch_one(
                sqlx::query(
                    "SELECT COUNT(*) AS count FROM ride_requests WHERE status = 'OPEN' AND departure_at >= $1",
                )
                .bind(&date_from),
            )
            .await?;

        let count: i64 = result.try_get("count")?;

        Ok(BadgeCount { count })
    }

    #[tracing::instrument(skip(self))]
    async fn expire_overdue_requests(&self) -> Result<u64, Error> {
        let mut conn = self.pool.acquire().await?;

        let now = Utc::now();

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT id FROM ride_requests WHERE status = 'OPEN' AND departure_at < $1",
                )
                .bind(&now),
            )
            .await?;

        let mut expired = 0;

        for result in results.iter() {
            let id: Uuid = result.try_get("id")?;

            let mut tx = conn.begin().await?;

            let mut request = fetch_request_for_update(&mut tx, &id).await?;

            // the request may have settled between the scan and the lock
            if request.expire().is_err() {
                continue;
            }

            update_request(&mut tx, &request).await?;
            reject_pending_bids(&mut tx, &id, None).await?;

            tx.commit().await?;

            expired += 1;
        }

        if expired > 0 {
            tracing::info!("expired {} overdue requests", expired);
        }

        Ok(expired)
    }
}
