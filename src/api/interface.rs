use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Account, AccountStatus, BadgeCount, Bid, DriverBid, RequestDetail, RequestDraft, RequestFilter,
    RideRequest, Vehicle, VehicleDraft,
};
use crate::error::Error;

#[async_trait]
pub trait RequestAPI {
    async fn create_request(&self, user: User, draft: RequestDraft) -> Result<RideRequest, Error>;
    async fn find_request(&self, id: Uuid) -> Result<RequestDetail, Error>;
    async fn list_open_requests(&self, filter: RequestFilter) -> Result<Vec<RideRequest>, Error>;
    async fn list_created_requests(&self, user: User) -> Result<Vec<RideRequest>, Error>;
    async fn list_joined_requests(&self, user: User) -> Result<Vec<RideRequest>, Error>;
    async fn join_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error>;
    async fn leave_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error>;
    async fn cancel_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error>;
    async fn badge(&self) -> Result<BadgeCount, Error>;
    async fn expire_overdue_requests(&self) -> Result<u64, Error>;
}

#[async_trait]
pub trait BidAPI {
    async fn place_bid(
        &self,
        user: User,
        request_id: Uuid,
        vehicle_id: Uuid,
        message: Option<String>,
    ) -> Result<Bid, Error>;
    async fn select_bid(&self, user: User, request_id: Uuid, bid_id: Uuid)
        -> Result<RideRequest, Error>;
    async fn list_driver_bids(&self, user: User) -> Result<Vec<DriverBid>, Error>;
    async fn list_assigned_requests(&self, user: User) -> Result<Vec<RideRequest>, Error>;
}

#[async_trait]
pub trait VehicleAPI {
    async fn register_vehicle(&self, user: User, draft: VehicleDraft) -> Result<Vehicle, Error>;
    async fn find_vehicle(&self, user: User, id: Uuid) -> Result<Vehicle, Error>;
    async fn list_vehicles(&self, user: User) -> Result<Vec<Vehicle>, Error>;
    async fn review_vehicle(&self, user: User, id: Uuid, approve: bool) -> Result<Vehicle, Error>;
    async fn retire_vehicle(&self, user: User, id: Uuid) -> Result<Vehicle, Error>;
}

#[async_trait]
pub trait AccountAPI {
    async fn find_account(&self, user: User, id: Uuid) -> Result<Account, Error>;
    async fn set_account_status(
        &self,
        user: User,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<Account, Error>;
}

pub trait API: RequestAPI + BidAPI + VehicleAPI + AccountAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
