use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::error::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

// issuance lives with the identity provider; the service only verifies
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<User, Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;

        Ok(User {
            id: data.claims.sub,
            roles: data.claims.roles,
        })
    }
}

pub fn issue_token(secret: &str, user: &User, ttl: Duration) -> Result<String, Error> {
    let now = Utc::now();

    let claims = Claims {
        sub: user.id,
        roles: user.roles.clone(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[test]
fn token_round_trip() {
    let user = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into(), "driver".into()],
    };

    let token = issue_token("s3cret", &user, Duration::hours(1)).unwrap();
    let verified = TokenVerifier::new("s3cret").verify(&token).unwrap();

    assert_eq!(verified.id, user.id);
    assert_eq!(verified.roles, user.roles);
}

#[test]
fn expired_token_is_rejected() {
    let user = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let token = issue_token("s3cret", &user, Duration::hours(-1)).unwrap();
    let err = TokenVerifier::new("s3cret").verify(&token).unwrap_err();

    assert_eq!(err.code, 201);
}

#[test]
fn wrong_secret_is_rejected() {
    let user = User {
        id: Uuid::new_v4(),
        roles: vec!["rider".into()],
    };

    let token = issue_token("s3cret", &user, Duration::hours(1)).unwrap();
    let err = TokenVerifier::new("other").verify(&token).unwrap_err();

    assert_eq!(err.code, 201);
}
