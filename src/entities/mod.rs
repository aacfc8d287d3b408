mod account;
mod bid;
mod request;
mod vehicle;

pub use account::{Account, Status as AccountStatus};
pub use bid::{Bid, DriverBid};
pub use request::{
    BadgeCount, Passenger, RequestDetail, RequestDraft, RequestFilter, RideRequest,
    Status as RequestStatus,
};
pub use vehicle::{Vehicle, VehicleDraft, VehicleSnapshot};
