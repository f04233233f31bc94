use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::outcome::Outcome::{Error as Failure, Success};
use rocket::request::{self, FromRequest, Request};
use rocket::time::OffsetDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::util::date_time_as_unix_seconds;
use crate::data::user::User;
use crate::resp::problem::Problem;
use crate::role::RoleName;
use crate::SECURITY;

pub static AUTH_COOKIE_NAME: &str = "jwt_auth";

/// Identity resolved from the auth cookie. Handlers receive these claims,
/// never the raw token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleToken {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub user: Uuid,
    pub name: String,
    pub email: String,
    pub role: RoleName,
}

impl UserRoleToken {
    pub fn new(user: &User, role: RoleName) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        }
    }

    pub fn encode_jwt(
        &self,
        private_key: impl AsRef<[u8]>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::PS256);
        let key = EncodingKey::from_rsa_pem(private_key.as_ref())?;

        encode(&header, &self, &key)
    }

    pub fn cookie(&self) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        let jwt = self.encode_jwt(&SECURITY.jwt_keys.private)?;

        Ok(Cookie::build((AUTH_COOKIE_NAME, jwt))
            .secure(true)
            .expires(OffsetDateTime::from_unix_timestamp(self.exp.timestamp()).ok())
            .path("/")
            .http_only(true)
            .build())
    }
}

pub fn auth_problem(detail: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
        .detail(detail)
        .clone()
}

pub fn decode_claims(
    token: &str,
    public_key: impl AsRef<[u8]>,
) -> Result<UserRoleToken, Problem> {
    let key = DecodingKey::from_rsa_pem(public_key.as_ref())
        .map_err(|_| auth_problem("Server JWT public key is invalid."))?;

    decode::<UserRoleToken>(token, &key, &Validation::new(Algorithm::PS256))
        .map(|data| data.claims)
        .map_err(|_| auth_problem("JWT cookie was malformed."))
}

pub fn extract_claims(
    cookies: &CookieJar,
    public_key: impl AsRef<[u8]>,
) -> Result<UserRoleToken, Problem> {
    let auth_cookie = cookies.get(AUTH_COOKIE_NAME);
    let token = match auth_cookie {
        Some(jwt) => jwt.value().to_owned(),
        None => {
            return Err(auth_problem("No JWT auth cookie."));
        }
    };
    tracing::debug!("extracted jwt auth from cookie");

    let claims = decode_claims(&token, public_key)?;
    tracing::debug!("decoded user roles token for user: {}", claims.user);

    Ok(claims)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserRoleToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        tracing::trace!("extracting user roles token from request cookies");
        let claims: UserRoleToken = match extract_claims(req.cookies(), &SECURITY.jwt_keys.public) {
            Ok(it) => it,
            Err(e) => {
                tracing::debug!("unable to extract claims from cookies");
                return Failure((Status::Unauthorized, e));
            }
        };

        Success(claims)
    }
}

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> SecurityScheme {
            let mut http = Http::new(HttpAuthScheme::Bearer);
            http.bearer_format = Some("JWT".to_string());
            http.scheme = HttpAuthScheme::Bearer;
            SecurityScheme::Http(http)
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let c = openapi.components.as_mut().unwrap();
            c.add_security_scheme("jwt", *self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    #[test]
    fn claims_round_trip() {
        let mut now = Utc::now();
        now = now.round_subsecs(0);

        let user = Uuid::new_v4();

        let urt = UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user,
            name: "John Instructor".to_string(),
            email: "instructor@example.com".to_string(),
            role: RoleName::Instructor,
        };

        let keys = crate::security::generate_jwt_keys();

        let token = urt
            .encode_jwt(&keys.private)
            .expect("encoding should work for example");

        let decoded = decode_claims(&token, &keys.public).expect("unable to decode encoded token");

        assert_eq!(now, decoded.iat);
        assert_eq!(now + Duration::weeks(1), decoded.exp);
        assert_eq!(user, decoded.user);
        assert_eq!(decoded.role, RoleName::Instructor);
        assert_eq!(decoded.email, "instructor@example.com");
    }
}
