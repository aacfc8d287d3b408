use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{RideRequest, VehicleSnapshot};
use crate::error::{invalid_state_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub request_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: Status,
    pub message: Option<String>,
    pub vehicle: VehicleSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "PENDING".into(),
            Self::Accepted => "ACCEPTED".into(),
            Self::Rejected => "REJECTED".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverBid {
    pub bid: Bid,
    pub request: RideRequest,
}

impl Bid {
    pub fn new(
        request_id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
        message: Option<String>,
        vehicle: VehicleSnapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            driver_id,
            vehicle_id,
            status: Status::Pending,
            message,
            vehicle,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        match self.status {
            Status::Pending => true,
            _ => false,
        }
    }

    // display rank: accepted first, rejected last
    pub fn priority(&self) -> i64 {
        match self.status {
            Status::Accepted => 0,
            Status::Pending => 1,
            Status::Rejected => 2,
        }
    }

    #[tracing::instrument]
    pub fn accept(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Accepted;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    #[tracing::instrument]
    pub fn reject(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Rejected;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }
}

#[test]
fn accept_and_reject_only_once() {
    let snapshot = VehicleSnapshot {
        make: "Seat".into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats: 4,
    };

    let mut bid = Bid::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None, snapshot);
    assert!(bid.is_pending());

    bid.accept().unwrap();
    assert_eq!(bid.accept().unwrap_err().code, 100);
    assert_eq!(bid.reject().unwrap_err().code, 100);

    let snapshot = VehicleSnapshot {
        make: "Seat".into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats: 4,
    };

    let mut bid = Bid::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None, snapshot);

    bid.reject().unwrap();
    assert_eq!(bid.accept().unwrap_err().code, 100);
}

#[test]
fn priority_ranks_accepted_first() {
    let snapshot = VehicleSnapshot {
        make: "Seat".into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats: 4,
    };

    let mut accepted = Bid::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        None,
        snapshot.clone(),
    );
    accepted.accept().unwrap();

    let pending = Bid::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        None,
        snapshot.clone(),
    );

    let mut rejected = Bid::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None, snapshot);
    rejected.reject().unwrap();

    assert!(accepted.priority() < pending.priority());
    assert!(pending.priority() < rejected.priority());
}

#[test]
fn status_wire_format() {
    // the bulk rejection query writes this literal into the bid documents
    let rejected = serde_json::to_value(Status::Rejected).unwrap();
    assert_eq!(rejected, serde_json::json!({ "name": "REJECTED" }));

    let pending = serde_json::to_value(Status::Pending).unwrap();
    assert_eq!(pending, serde_json::json!({ "name": "PENDING" }));
}
