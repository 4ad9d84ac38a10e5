use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a bearer token. Wire names match what API clients
/// already decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a token for `user_id` that expires `ttl` from now. HS256 with a
/// process-wide secret; there is no key rotation.
pub fn issue(
    user_id: i32,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        email: email.to_owned(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a token; expiry and signature failures both surface
/// as errors.
pub fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let token = issue(42, "a@x.com", SECRET, Duration::hours(1)).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Well past the default validation leeway.
        let token = issue(42, "a@x.com", SECRET, Duration::hours(-2)).unwrap();
        assert!(verify(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(42, "a@x.com", SECRET, Duration::hours(1)).unwrap();
        assert!(verify(&token, "another-secret").is_err());
    }

    #[test]
    fn mangled_token_is_rejected() {
        let token = issue(42, "a@x.com", SECRET, Duration::hours(1)).unwrap();
        let mangled = format!("{}x", token);
        assert!(verify(&mangled, SECRET).is_err());
    }
}
