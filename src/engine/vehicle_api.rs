use super::helpers::{check_standing, fetch_vehicle_for_update, update_vehicle};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::VehicleAPI,
    auth::{Platform, User},
    entities::{Vehicle, VehicleDraft},
    error::{vehicle_not_found_error, Error},
};

#[async_trait]
impl VehicleAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn register_vehicle(&self, user: User, draft: VehicleDraft) -> Result<Vehicle, Error> {
        self.authorize(user.clone(), "register_vehicle", Platform::default())?;

        let vehicle = Vehicle::new(user.id, draft)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        check_standing(&mut tx, &user.id, "driver").await?;

        tx.execute(
            sqlx::query(
                "INSERT INTO vehicles (id, owner_id, status, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(&vehicle.id)
            .bind(&vehicle.owner_id)
            .bind(vehicle.status.name())
            .bind(Json(&vehicle)),
        )
        .await?;

        tx.commit().await?;

        Ok(vehicle)
    }

    #[tracing::instrument(skip(self))]
    async fn find_vehicle(&self, user: User, id: Uuid) -> Result<Vehicle, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM vehicles WHERE id = $1").bind(&id))
            .await?;

        let result = maybe_result.ok_or_else(|| vehicle_not_found_error())?;
        let Json(vehicle): Json<Vehicle> = result.try_get("data")?;

        self.authorize(user.clone(), "read", vehicle.clone())?;

        Ok(vehicle)
    }

    #[tracing::instrument(skip(self))]
    async fn list_vehicles(&self, user: User) -> Result<Vec<Vehicle>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM vehicles WHERE owner_id = $1 ORDER BY data->>'plate' ASC",
                )
                .bind(&user.id),
            )
            .await?;

        let mut vehicles = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(vehicle): Json<Vehicle> = result.try_get("data")?;

            // retired vehicles drop out of the listing but stay readable by id
            if vehicle.is_retired() {
                continue;
            }

            vehicles.push(vehicle);
        }

        Ok(vehicles)
    }

    #[tracing::instrument(skip(self))]
    async fn review_vehicle(&self, user: User, id: Uuid, approve: bool) -> Result<Vehicle, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut vehicle = fetch_vehicle_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "review", vehicle.clone())?;

        if approve {
            vehicle.approve()?;
        } else {
            vehicle.reject()?;
        }

        update_vehicle(&mut tx, &vehicle).await?;

        tx.commit().await?;

        Ok(vehicle)
    }

    async fn retire_vehicle(&self, user: User, id: Uuid) -> Result<Vehicle, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut vehicle = fetch_vehicle_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "retire", vehicle.clone())?;

        vehicle.retire(Utc::now())?;

        update_vehicle(&mut tx, &vehicle).await?;

        tx.commit().await?;

        Ok(vehicle)
    }
}
