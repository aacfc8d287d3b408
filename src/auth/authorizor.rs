use oso::{Oso, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::{Account, RideRequest, Vehicle};

pub fn new() -> Oso {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class()).unwrap();
    o.register_class(User::get_polar_class()).unwrap();
    o.register_class(RideRequest::get_polar_class()).unwrap();
    o.register_class(Vehicle::get_polar_class()).unwrap();
    o.register_class(Account::get_polar_class()).unwrap();

    o.load_str(include_str!("rules.polar")).unwrap();

    o
}

#[test]
fn platform_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };

    let result = authorizor.query_rule("has_role", (admin.clone(), "admin", Platform::default()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let rider = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let result = authorizor.query_rule("has_role", (rider.clone(), "admin", Platform::default()));
    assert!(result.unwrap().next().is_none());

    let result = authorizor.is_allowed(rider.clone(), "create_request", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(rider.clone(), "register_vehicle", Platform::default());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn request_creator_role_test() {
    use crate::entities::RequestDraft;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    let authorizor = new();

    let creator = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let stranger = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let request = RideRequest::new(
        creator.id,
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

    let result = authorizor.query_rule("has_role", (creator.clone(), "creator", request.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let result = authorizor.query_rule("has_role", (stranger.clone(), "creator", request.clone()));
    assert!(result.unwrap().next().is_none());

    let result = authorizor.is_allowed(creator.clone(), "select_bid", request.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(creator.clone(), "cancel_request", request.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "select_bid", request.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "cancel_request", request.clone());
    assert_eq!(result.unwrap(), false);

    // any rider may join or leave, only the creator settles
    let result = authorizor.is_allowed(stranger.clone(), "join", request.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "leave", request.clone());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn bid_requires_driver_role_test() {
    use crate::entities::RequestDraft;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    let authorizor = new();

    let driver = User {
        id: Uuid::new_v4(),
        roles: vec!["driver".into()],
    };

    let rider = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let request = RideRequest::new(
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

    let result = authorizor.is_allowed(driver.clone(), "place_bid", request.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(rider.clone(), "place_bid", request.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "register_vehicle", Platform::default());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn vehicle_owner_role_test() {
    use crate::entities::VehicleDraft;
    use uuid::Uuid;

    let authorizor = new();

    let owner = User {
        id: Uuid::new_v4(),
        roles: vec!["driver".into()],
    };

    let stranger = User {
        id: Uuid::new_v4(),
        roles: vec!["driver".into()],
    };

    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };

    let vehicle = Vehicle::new(
        owner.id,
        VehicleDraft {
            make: "Seat".into(),
            model: "Leon".into(),
            plate: "1234BCD".into(),
            seats: 4,
        },
    )
    .unwrap();

    let result = authorizor.query_rule("has_role", (owner.clone(), "owner", vehicle.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let result = authorizor.is_allowed(owner.clone(), "read", vehicle.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "retire", vehicle.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "read", vehicle.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "retire", vehicle.clone());
    assert_eq!(result.unwrap(), false);

    // review is admin-only via the catch-all
    let result = authorizor.is_allowed(admin.clone(), "review", vehicle.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "review", vehicle.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn account_holder_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let holder = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let stranger = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };

    let account = Account::new(holder.id);

    let result = authorizor.is_allowed(holder.clone(), "read", account.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "read", account.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(admin.clone(), "set_status", account.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(holder.clone(), "set_status", account.clone());
    assert_eq!(result.unwrap(), false);
}
