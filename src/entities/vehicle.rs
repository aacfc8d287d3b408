use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, invalid_state_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub owner_id: Uuid,
    pub status: Status,
    pub make: String,
    pub model: String,
    pub plate: String,
    pub seats: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    PendingApproval,
    Approved,
    Rejected,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::PendingApproval => "PENDING_APPROVAL".into(),
            Self::Approved => "APPROVED".into(),
            Self::Rejected => "REJECTED".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub plate: String,
    pub seats: i64,
}

// the card shown on a bid keeps rendering even if the vehicle is retired later
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub make: String,
    pub model: String,
    pub plate: String,
    pub seats: i64,
}

impl Vehicle {
    pub fn new(owner_id: Uuid, draft: VehicleDraft) -> Result<Self, Error> {
        if draft.make.trim().is_empty()
            || draft.model.trim().is_empty()
            || draft.plate.trim().is_empty()
        {
            return Err(invalid_input_error());
        }

        if draft.seats < 1 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            status: Status::PendingApproval,
            make: draft.make,
            model: draft.model,
            plate: draft.plate,
            seats: draft.seats,
            deleted_at: None,
        })
    }

    pub fn is_retired(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_eligible(&self, driver_id: &Uuid) -> bool {
        if self.owner_id != *driver_id || self.is_retired() {
            return false;
        }

        match self.status {
            Status::Approved => true,
            _ => false,
        }
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            make: self.make.clone(),
            model: self.model.clone(),
            plate: self.plate.clone(),
            seats: self.seats,
        }
    }

    #[tracing::instrument]
    pub fn approve(&mut self) -> Result<(), Error> {
        match self.status {
            Status::PendingApproval => {
                self.status = Status::Approved;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    #[tracing::instrument]
    pub fn reject(&mut self) -> Result<(), Error> {
        match self.status {
            Status::PendingApproval => {
                self.status = Status::Rejected;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    #[tracing::instrument]
    pub fn retire(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }

        Ok(())
    }
}

#[test]
fn new_vehicle_validates_input() {
    let draft = |make: &str, seats: i64| VehicleDraft {
        make: make.into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats,
    };

    let vehicle = Vehicle::new(Uuid::new_v4(), draft("Seat", 4)).unwrap();
    assert_eq!(vehicle.status.name(), "PENDING_APPROVAL");
    assert!(!vehicle.is_retired());

    assert_eq!(Vehicle::new(Uuid::new_v4(), draft("", 4)).unwrap_err().code, 101);
    assert_eq!(Vehicle::new(Uuid::new_v4(), draft("Seat", 0)).unwrap_err().code, 101);
}

#[test]
fn review_only_from_pending_approval() {
    let draft = VehicleDraft {
        make: "Seat".into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats: 4,
    };

    let mut vehicle = Vehicle::new(Uuid::new_v4(), draft.clone()).unwrap();
    vehicle.approve().unwrap();
    assert_eq!(vehicle.approve().unwrap_err().code, 100);
    assert_eq!(vehicle.reject().unwrap_err().code, 100);

    let mut vehicle = Vehicle::new(Uuid::new_v4(), draft).unwrap();
    vehicle.reject().unwrap();
    assert_eq!(vehicle.approve().unwrap_err().code, 100);
}

#[test]
fn retire_is_idempotent() {
    let owner_id = Uuid::new_v4();
    let mut vehicle = Vehicle::new(
        owner_id,
        VehicleDraft {
            make: "Seat".into(),
            model: "Leon".into(),
            plate: "1234BCD".into(),
            seats: 4,
        },
    )
    .unwrap();

    let first = Utc::now();
    vehicle.retire(first).unwrap();
    vehicle.retire(Utc::now()).unwrap();

    assert_eq!(vehicle.deleted_at, Some(first));
}

#[test]
fn eligibility_requires_approved_owned_and_active() {
    let owner_id = Uuid::new_v4();
    let draft = VehicleDraft {
        make: "Seat".into(),
        model: "Leon".into(),
        plate: "1234BCD".into(),
        seats: 4,
    };

    let mut vehicle = Vehicle::new(owner_id, draft).unwrap();
    assert!(!vehicle.is_eligible(&owner_id));

    vehicle.approve().unwrap();
    assert!(vehicle.is_eligible(&owner_id));
    assert!(!vehicle.is_eligible(&Uuid::new_v4()));

    vehicle.retire(Utc::now()).unwrap();
    assert!(!vehicle.is_eligible(&owner_id));
}
