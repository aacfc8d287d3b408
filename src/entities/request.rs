use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Bid;
use crate::error::{
    already_joined_error, already_matched_error, capacity_exceeded_error, invalid_input_error,
    request_closed_error, Error,
};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    #[polar(attribute)]
    pub id: Uuid,
    pub status: Status,
    #[polar(attribute)]
    pub creator_id: Uuid,
    pub origin: String,
    pub origin_location: Option<String>,
    pub destination: String,
    pub destination_location: Option<String>,
    pub departure_at: DateTime<Utc>,
    pub seats_requested: i64,
    pub max_passengers: i64,
    pub final_price: Option<f64>,
    pub iva_rate: Option<f64>,
    pub passengers: Vec<Passenger>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    #[serde(rename_all = "camelCase")]
    Matched {
        bid_id: Uuid,
        driver_id: Uuid,
    },
    Cancelled,
    Expired,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Open => "OPEN".into(),
            Self::Matched {
                bid_id: _,
                driver_id: _,
            } => "MATCHED".into(),
            Self::Cancelled => "CANCELLED".into(),
            Self::Expired => "EXPIRED".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub user_id: Uuid,
    pub is_owner: bool,
    pub status: MemberStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Joined,
    Left,
}

impl MemberStatus {
    pub fn name(&self) -> String {
        match self {
            Self::Joined => "JOINED".into(),
            Self::Left => "LEFT".into(),
        }
    }
}

impl Passenger {
    pub fn is_joined(&self) -> bool {
        match self.status {
            MemberStatus::Joined => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    pub origin: String,
    pub origin_location: Option<String>,
    pub destination: String,
    pub destination_location: Option<String>,
    pub departure_at: DateTime<Utc>,
    pub seats_requested: i64,
    pub max_passengers: i64,
    pub final_price: Option<f64>,
    pub iva_rate: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct RequestFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub statuses: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    pub request: RideRequest,
    pub bids: Vec<Bid>,
    pub chosen_bid: Option<Bid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BadgeCount {
    pub count: i64,
}

impl RideRequest {
    pub fn new(creator_id: Uuid, draft: RequestDraft) -> Result<Self, Error> {
        if draft.origin.trim().is_empty() || draft.destination.trim().is_empty() {
            return Err(invalid_input_error());
        }

        if draft.seats_requested < 1 || draft.max_passengers < 1 {
            return Err(invalid_input_error());
        }

        if draft.seats_requested > draft.max_passengers {
            return Err(invalid_input_error());
        }

        let now = Utc::now();

        if draft.departure_at <= now {
            return Err(invalid_input_error());
        }

        // the creator holds a seat from the start
        let passengers = vec![Passenger {
            user_id: creator_id,
            is_owner: true,
            status: MemberStatus::Joined,
        }];

        Ok(Self {
            id: Uuid::new_v4(),
            status: Status::Open,
            creator_id,
            origin: draft.origin,
            origin_location: draft.origin_location,
            destination: draft.destination,
            destination_location: draft.destination_location,
            departure_at: draft.departure_at,
            seats_requested: draft.seats_requested,
            max_passengers: draft.max_passengers,
            final_price: draft.final_price,
            iva_rate: draft.iva_rate,
            passengers,
            created_at: now,
        })
    }

    pub fn is_open(&self) -> bool {
        match self.status {
            Status::Open => true,
            _ => false,
        }
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_at <= now
    }

    pub fn joined_count(&self) -> i64 {
        self.passengers.iter().filter(|p| p.is_joined()).count() as i64
    }

    pub fn passenger(&self, user_id: &Uuid) -> Option<&Passenger> {
        self.passengers.iter().find(|p| p.user_id == *user_id)
    }

    pub fn assigned_driver_id(&self) -> Option<Uuid> {
        match self.status {
            Status::Matched {
                bid_id: _,
                driver_id,
            } => Some(driver_id),
            _ => None,
        }
    }

    #[tracing::instrument]
    pub fn join(&mut self, user_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open => (),
            _ => return Err(request_closed_error()),
        }

        if self
            .passengers
            .iter()
            .any(|p| p.user_id == user_id && p.is_joined())
        {
            return Err(already_joined_error());
        }

        if self.joined_count() >= self.max_passengers {
            return Err(capacity_exceeded_error());
        }

        match self.passengers.iter_mut().find(|p| p.user_id == user_id) {
            Some(passenger) => passenger.status = MemberStatus::Joined,
            None => self.passengers.push(Passenger {
                user_id,
                is_owner: false,
                status: MemberStatus::Joined,
            }),
        }

        Ok(())
    }

    // leaving frees a seat, even for the owner; the request itself only
    // closes through cancel or expire
    #[tracing::instrument]
    pub fn leave(&mut self, user_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open => (),
            _ => return Err(request_closed_error()),
        }

        if let Some(passenger) = self.passengers.iter_mut().find(|p| p.user_id == user_id) {
            passenger.status = MemberStatus::Left;
        }

        Ok(())
    }

    #[tracing::instrument]
    pub fn select_bid(&mut self, bid_id: Uuid, driver_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::Matched { bid_id, driver_id };
                Ok(())
            }
            Status::Matched {
                bid_id: _,
                driver_id: _,
            } => Err(already_matched_error()),
            _ => Err(request_closed_error()),
        }
    }

    #[tracing::instrument]
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::Cancelled;
                Ok(())
            }
            _ => Err(request_closed_error()),
        }
    }

    #[tracing::instrument]
    pub fn expire(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::Expired;
                Ok(())
            }
            _ => Err(request_closed_error()),
        }
    }
}

#[test]
fn new_request_enrolls_creator() {
    use chrono::Duration;

    let creator_id = Uuid::new_v4();
    let request = RideRequest::new(
        creator_id,
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: Some("Atocha".into()),
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    assert!(request.is_open());
    assert_eq!(request.joined_count(), 1);

    let owner = request.passenger(&creator_id).unwrap();
    assert!(owner.is_owner);
    assert!(owner.is_joined());
}

#[test]
fn new_request_validates_input() {
    use chrono::Duration;

    let draft = |seats: i64, max: i64, offset: Duration, origin: &str| RequestDraft {
        origin: origin.into(),
        origin_location: None,
        destination: "Valencia".into(),
        destination_location: None,
        departure_at: Utc::now() + offset,
        seats_requested: seats,
        max_passengers: max,
        final_price: None,
        iva_rate: None,
    };

    let err = RideRequest::new(Uuid::new_v4(), draft(0, 3, Duration::hours(1), "Madrid"));
    assert_eq!(err.unwrap_err().code, 101);

    let err = RideRequest::new(Uuid::new_v4(), draft(4, 3, Duration::hours(1), "Madrid"));
    assert_eq!(err.unwrap_err().code, 101);

    let err = RideRequest::new(Uuid::new_v4(), draft(1, 3, Duration::hours(-1), "Madrid"));
    assert_eq!(err.unwrap_err().code, 101);

    let err = RideRequest::new(Uuid::new_v4(), draft(1, 3, Duration::hours(1), "  "));
    assert_eq!(err.unwrap_err().code, 101);
}

#[test]
fn join_up_to_capacity() {
    use chrono::Duration;

    let mut request = RideRequest::new(
        Uuid::new_v4(),
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 2,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    // the owner already occupies one of the two slots
    request.join(Uuid::new_v4()).unwrap();
    assert_eq!(request.joined_count(), 2);

    let err = request.join(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code, 400);
}

#[test]
fn join_twice_is_rejected() {
    use chrono::Duration;

    let mut request = RideRequest::new(
        Uuid::new_v4(),
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    let rider_id = Uuid::new_v4();

    request.join(rider_id).unwrap();

    let err = request.join(rider_id).unwrap_err();
    assert_eq!(err.code, 401);
}

#[test]
fn rejoin_after_leaving() {
    use chrono::Duration;

    let mut request = RideRequest::new(
        Uuid::new_v4(),
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    let rider_id = Uuid::new_v4();

    request.join(rider_id).unwrap();
    request.leave(rider_id).unwrap();
    assert_eq!(request.joined_count(), 1);

    request.join(rider_id).unwrap();
    assert_eq!(request.joined_count(), 2);

    // the ledger keeps a single entry per user
    assert_eq!(request.passengers.len(), 2);
}

#[test]
fn owner_leave_keeps_request_open() {
    use chrono::Duration;

    let creator_id = Uuid::new_v4();
    let mut request = RideRequest::new(
        creator_id,
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    request.leave(creator_id).unwrap();
    assert!(request.is_open());
    assert_eq!(request.joined_count(), 0);

    // the entry survives with its owner flag, marked left
    let owner = request.passenger(&creator_id).unwrap();
    assert!(owner.is_owner);
    assert!(!owner.is_joined());

    // the owner returns through the ordinary reactivation path
    request.join(creator_id).unwrap();
    assert_eq!(request.joined_count(), 1);
    assert!(request.passenger(&creator_id).unwrap().is_owner);
}

#[test]
fn leave_without_joining_is_a_noop() {
    use chrono::Duration;

    let mut request = RideRequest::new(
        Uuid::new_v4(),
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    request.leave(Uuid::new_v4()).unwrap();
    assert_eq!(request.joined_count(), 1);
    assert_eq!(request.passengers.len(), 1);
}

#[test]
fn select_bid_matches_once() {
    use chrono::Duration;

    let mut request = RideRequest::new(
        Uuid::new_v4(),
        RequestDraft {
            origin: "Madrid".into(),
            origin_location: None,
            destination: "Valencia".into(),
            destination_location: None,
            departure_at: Utc::now() + Duration::hours(4),
            seats_requested: 1,
            max_passengers: 3,
            final_price: None,
            iva_rate: None,
        },
    )
    .unwrap();

    let bid_id = Uuid::new_v4();
    let driver_id = Uuid::new_v4();

    request.select_bid(bid_id, driver_id).unwrap();
    assert_eq!(request.assigned_driver_id(), Some(driver_id));

    let err = request.select_bid(Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code, 403);

    // a matched request no longer accepts membership changes
    let err = request.join(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code, 404);
}

#[test]
fn cancel_and_expire_only_from_open() {
    use chrono::Duration;

    let draft = RequestDraft {
        origin: "Madrid".into(),
        origin_location: None,
        destination: "Valencia".into(),
        destination_location: None,
        departure_at: Utc::now() + Duration::hours(4),
        seats_requested: 1,
        max_passengers: 3,
        final_price: None,
        iva_rate: None,
    };

    let mut request = RideRequest::new(Uuid::new_v4(), draft.clone()).unwrap();
    request.cancel().unwrap();
    assert_eq!(request.status.name(), "CANCELLED");
    assert_eq!(request.cancel().unwrap_err().code, 404);
    assert_eq!(request.expire().unwrap_err().code, 404);

    let mut request = RideRequest::new(Uuid::new_v4(), draft).unwrap();
    request.select_bid(Uuid::new_v4(), Uuid::new_v4()).unwrap();
    assert_eq!(request.cancel().unwrap_err().code, 404);
    assert_eq!(request.expire().unwrap_err().code, 404);
}

#[test]
fn status_wire_format() {
    let open = serde_json::to_value(Status::Open).unwrap();
    assert_eq!(open, serde_json::json!({ "name": "OPEN" }));

    let bid_id = Uuid::new_v4();
    let driver_id = Uuid::new_v4();
    let matched = serde_json::to_value(Status::Matched { bid_id, driver_id }).unwrap();
    assert_eq!(matched["name"], "MATCHED");
    assert_eq!(matched["bidId"], serde_json::json!(bid_id));
    assert_eq!(matched["driverId"], serde_json::json!(driver_id));
}

#[test]
fn draft_wire_format() {
    use chrono::Duration;

    // clients post flat origin/destination fields with their locations
    // alongside, not nested objects
    let departure_at = Utc::now() + Duration::days(2);
    let body = serde_json::json!({
        "origin": "Madrid",
        "originLocation": "Atocha",
        "destination": "Valencia",
        "destinationLocation": null,
        "departureAt": departure_at,
        "seatsRequested": 1,
        "maxPassengers": 3
    });

    let draft: RequestDraft = serde_json::from_value(body).unwrap();
    assert_eq!(draft.origin, "Madrid");
    assert_eq!(draft.origin_location.as_deref(), Some("Atocha"));
    assert_eq!(draft.destination, "Valencia");
    assert!(draft.destination_location.is_none());
    assert_eq!(draft.departure_at, departure_at);
    assert!(draft.iva_rate.is_none());

    let request = RideRequest::new(Uuid::new_v4(), draft).unwrap();
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["origin"], "Madrid");
    assert_eq!(value["originLocation"], "Atocha");
    assert_eq!(value["destination"], "Valencia");
    assert_eq!(value["destinationLocation"], serde_json::Value::Null);
}
