use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{forbidden_error, Error};

// account standing gates every mutation; a user without a row is active
#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Account {
    #[polar(attribute)]
    pub id: Uuid,
    pub status: Status,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Active,
    Banned {
        until: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Restricted {
        until: DateTime<Utc>,
        fallback_role: String,
    },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Active => "ACTIVE".into(),
            Self::Banned { until: _ } => "BANNED".into(),
            Self::Restricted {
                until: _,
                fallback_role: _,
            } => "RESTRICTED".into(),
        }
    }
}

impl Account {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: Status::Active,
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    // a ban with no deadline is permanent; a restriction narrows the user
    // to its fallback role until the deadline passes
    pub fn check_can_act(&self, now: DateTime<Utc>, acting_role: &str) -> Result<(), Error> {
        match &self.status {
            Status::Active => Ok(()),
            Status::Banned { until: None } => Err(forbidden_error()),
            Status::Banned { until: Some(until) } => {
                if now < *until {
                    return Err(forbidden_error());
                }

                Ok(())
            }
            Status::Restricted {
                until,
                fallback_role,
            } => {
                if now >= *until || fallback_role == acting_role {
                    return Ok(());
                }

                Err(forbidden_error())
            }
        }
    }
}

#[test]
fn active_account_can_act() {
    let account = Account::new(Uuid::new_v4());

    account.check_can_act(Utc::now(), "rider").unwrap();
    account.check_can_act(Utc::now(), "driver").unwrap();
}

#[test]
fn permanent_ban_blocks_everything() {
    let mut account = Account::new(Uuid::new_v4());
    account.set_status(Status::Banned { until: None });

    let err = account.check_can_act(Utc::now(), "rider").unwrap_err();
    assert_eq!(err.code, 202);
}

#[test]
fn temporary_ban_lifts_after_deadline() {
    use chrono::Duration;

    let now = Utc::now();

    let mut account = Account::new(Uuid::new_v4());
    account.set_status(Status::Banned {
        until: Some(now + Duration::days(2)),
    });

    assert_eq!(account.check_can_act(now, "rider").unwrap_err().code, 202);
    account.check_can_act(now + Duration::days(3), "rider").unwrap();
}

#[test]
fn restriction_narrows_to_fallback_role() {
    use chrono::Duration;

    let now = Utc::now();

    let mut account = Account::new(Uuid::new_v4());
    account.set_status(Status::Restricted {
        until: now + Duration::days(2),
        fallback_role: "rider".into(),
    });

    account.check_can_act(now, "rider").unwrap();
    assert_eq!(account.check_can_act(now, "driver").unwrap_err().code, 202);

    // the restriction expires on its own
    account.check_can_act(now + Duration::days(3), "driver").unwrap();
}

#[test]
fn status_wire_format() {
    use chrono::TimeZone;

    let active = serde_json::to_value(Status::Active).unwrap();
    assert_eq!(active, serde_json::json!({ "name": "ACTIVE" }));

    let until = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    let restricted = serde_json::to_value(Status::Restricted {
        until,
        fallback_role: "rider".into(),
    })
    .unwrap();
    assert_eq!(restricted["name"], "RESTRICTED");
    assert_eq!(restricted["fallbackRole"], "rider");
}
