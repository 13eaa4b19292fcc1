//! Account registration and session handlers.
//!
//! ```text
//! POST /api/auth/sign-up {"name":"Ada","email":"ada@example.com","password":"secret1"}
//! POST /api/auth/sign-in {"email":"ada@example.com","password":"secret1"}
//! POST /api/auth/sign-out
//! GET  /api/auth/me
//! ```
//!
//! Successful sign-up and sign-in set the HTTP-only `token` cookie and also
//! return the token in the body for bearer clients.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EmailAddress, Error, Password, Role, Session, SignUp, User, UserName};
use crate::middleware::RateLimit;

use super::ApiResult;
use super::dto::UserResponse;
use super::envelope;
use super::schemas::{FailureEnvelopeSchema, MessageEnvelopeSchema};
use super::session::{AuthenticatedUser, expired_token_cookie, token_cookie};
use super::state::HttpState;
use super::validation::{FieldName, invalid_field_error, missing_field_error};

const SIGN_UP_REQUIRED_MESSAGE: &str = "Name, email and password are required.";
const SIGN_IN_REQUIRED_MESSAGE: &str = "Email and password are required.";
const UNKNOWN_USER_MESSAGE: &str = "User not found";

/// Registration body for `POST /api/auth/sign-up`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SignUpRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "secret1")]
    pub password: Option<String>,
}

impl SignUpRequest {
    fn into_command(self) -> Result<SignUp, Error> {
        let name = required(self.name, "name", SIGN_UP_REQUIRED_MESSAGE)?;
        let email = required(self.email, "email", SIGN_UP_REQUIRED_MESSAGE)?;
        let password = required(self.password, "password", SIGN_UP_REQUIRED_MESSAGE)?;
        Ok(SignUp {
            name: UserName::new(name)
                .map_err(|err| invalid_field_error(FieldName::new("name"), err.to_string()))?,
            email: EmailAddress::new(email)
                .map_err(|err| invalid_field_error(FieldName::new("email"), err.to_string()))?,
            password: Password::new(password)
                .map_err(|err| invalid_field_error(FieldName::new("password"), err.to_string()))?,
        })
    }
}

/// Credentials body for `POST /api/auth/sign-in`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "secret1")]
    pub password: Option<String>,
}

fn required(value: Option<String>, field: &'static str, message: &str) -> Result<String, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(FieldName::new(field), message))
}

/// Token plus account returned by sign-up and sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token; also set as the `token` cookie.
    pub token: String,
    pub user: UserResponse,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.value.clone(),
            user: UserResponse::from(&session.user),
        }
    }
}

/// Caller profile returned by `GET /api/auth/me`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

fn session_response(
    state: &HttpState,
    builder: &mut actix_web::HttpResponseBuilder,
    message: &'static str,
    session: &Session,
) -> HttpResponse {
    builder
        .cookie(token_cookie(
            &session.token.value,
            session.token.expires_in,
            state.settings.cookie_secure,
        ))
        .json(envelope::Envelope::new(message, SessionResponse::from(session)))
}

/// Register a `user` account and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created successfully", body = SessionResponse,
            headers(("Set-Cookie" = String, description = "Access token cookie"))),
        (status = 400, description = "Missing or invalid fields, or email taken", body = FailureEnvelopeSchema),
        (status = 429, description = "Too many authentication attempts from this IP", body = FailureEnvelopeSchema),
        (status = 500, description = "Internal server error", body = FailureEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/sign-up", wrap = "RateLimit::auth()")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<HttpResponse> {
    let command = payload.into_inner().into_command()?;
    let session = state.auth.sign_up(command).await?;
    Ok(session_response(
        &state,
        &mut HttpResponse::Created(),
        "User created successfully",
        &session,
    ))
}

/// Check credentials and open a session.
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "User signed in successfully", body = SessionResponse,
            headers(("Set-Cookie" = String, description = "Access token cookie"))),
        (status = 400, description = "Missing fields", body = FailureEnvelopeSchema),
        (status = 401, description = "Invalid password", body = FailureEnvelopeSchema),
        (status = 404, description = "User not found", body = FailureEnvelopeSchema),
        (status = 429, description = "Too many authentication attempts from this IP", body = FailureEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/auth/sign-in", wrap = "RateLimit::auth()")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    payload: web::Json<SignInRequest>,
) -> ApiResult<HttpResponse> {
    let SignInRequest { email, password } = payload.into_inner();
    let email = required(email, "email", SIGN_IN_REQUIRED_MESSAGE)?;
    let password = Password::candidate(required(password, "password", SIGN_IN_REQUIRED_MESSAGE)?);
    // A malformed address cannot belong to any account.
    let email = EmailAddress::new(email).map_err(|_| Error::not_found(UNKNOWN_USER_MESSAGE))?;
    let session = state.auth.sign_in(&email, &password).await?;
    Ok(session_response(
        &state,
        &mut HttpResponse::Ok(),
        "User signed in successfully",
        &session,
    ))
}

/// Expire the `token` cookie.
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 200, description = "User signed out successfully", body = MessageEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "signOut",
    security([])
)]
#[post("/auth/sign-out")]
pub async fn sign_out(state: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(expired_token_cookie(state.settings.cookie_secure))
        .json(envelope::Envelope::message("User signed out successfully"))
}

/// Profile of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "User profile fetched successfully", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = FailureEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "me"
)]
#[get("/auth/me")]
pub async fn me(caller: AuthenticatedUser) -> HttpResponse {
    envelope::private(
        "User profile fetched successfully",
        ProfileResponse::from(caller.user()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::session::TOKEN_COOKIE;
    use crate::inbound::http::state::HttpSettings;
    use crate::inbound::http::test_utils::{TestContext, read_json};
    use crate::middleware::{Quota, RatePolicies, RatePolicy};
    use actix_web::http::StatusCode;
    use actix_web::http::header::CACHE_CONTROL;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn sign_up_body(email: &str) -> Value {
        json!({"name": "Ada Lovelace", "email": email, "password": "secret1"})
    }

    #[rstest]
    #[actix_web::test]
    async fn sign_up_creates_user_and_sets_cookie() {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(sign_up_body("Ada@Example.com"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == TOKEN_COOKIE)
            .expect("token cookie");
        assert_eq!(cookie.http_only(), Some(true));
        let token = cookie.value().to_owned();

        let body = read_json(res).await;
        assert_eq!(body["message"], json!("User created successfully"));
        assert_eq!(body["data"]["token"], json!(token));
        assert_eq!(body["data"]["user"]["email"], json!("ada@example.com"));
        assert_eq!(body["data"]["user"]["role"], json!("user"));
        assert!(body["data"]["user"].get("passwordHash").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_email_is_a_client_error() {
        let ctx = TestContext::new();
        ctx.user("Existing", "ada@example.com", Role::User).await;
        let app = actix_test::init_service(ctx.app()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(sign_up_body("ada@example.com"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("User already exists"));
        assert_eq!(body["code"], json!("conflict"));
    }

    #[rstest]
    #[case(json!({"email": "a@example.com", "password": "secret1"}), "name", "missing_field")]
    #[case(json!({"name": "Ada", "password": "secret1"}), "email", "missing_field")]
    #[case(json!({"name": "Ada", "email": "nope", "password": "secret1"}), "email", "invalid_value")]
    #[case(json!({"name": "Ada", "email": "a@example.com", "password": "123"}), "password", "invalid_value")]
    #[actix_web::test]
    async fn sign_up_validates_fields(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(payload)
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["details"]["field"], json!(field));
        assert_eq!(body["details"]["code"], json!(code));
    }

    #[rstest]
    #[case("secret1", StatusCode::OK, "User signed in successfully")]
    #[case("wrong-password", StatusCode::UNAUTHORIZED, "Invalid password")]
    #[actix_web::test]
    async fn sign_in_checks_password(
        #[case] password: &str,
        #[case] status: StatusCode,
        #[case] message: &str,
    ) {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/auth/sign-up")
                .set_json(sign_up_body("ada@example.com"))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(json!({"email": "ada@example.com", "password": password}))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), status);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!(message));
    }

    #[rstest]
    #[case("ghost@example.com")]
    #[case("not-an-address")]
    #[actix_web::test]
    async fn sign_in_unknown_user_is_not_found(#[case] email: &str) {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(json!({"email": email, "password": "secret1"}))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!(UNKNOWN_USER_MESSAGE));
    }

    #[rstest]
    #[actix_web::test]
    async fn sign_out_expires_cookie() {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/api/auth/sign-out").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == TOKEN_COOKIE)
            .expect("removal cookie");
        assert_eq!(cookie.value(), "");
        let body = read_json(res).await;
        assert_eq!(body, json!({"success": true, "message": "User signed out successfully"}));
    }

    #[rstest]
    #[actix_web::test]
    async fn me_returns_private_profile() {
        let ctx = TestContext::new();
        let user = ctx.user("Ana", "ana@example.com", Role::User).await;
        let app = actix_test::init_service(ctx.app()).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(CACHE_CONTROL).is_some());
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("User profile fetched successfully"));
        assert_eq!(body["data"]["id"], json!(user.id.get()));
        assert_eq!(body["data"]["email"], json!("ana@example.com"));
        assert!(body["data"].get("createdAt").is_some());
    }

    #[rstest]
    #[actix_web::test]
    async fn credential_routes_share_a_per_ip_quota() {
        let ctx = TestContext::with_settings(HttpSettings {
            rate_limits: RatePolicies {
                auth: RatePolicy::new(2, Duration::from_secs(60 * 60)),
                ..RatePolicies::default()
            },
            ..HttpSettings::default()
        });
        let app = actix_test::init_service(ctx.app()).await;
        let sign_in_req = || {
            actix_test::TestRequest::post()
                .uri("/api/auth/sign-in")
                .set_json(json!({"email": "ghost@example.com", "password": "secret1"}))
                .to_request()
        };
        for _ in 0..2 {
            let res = actix_test::call_service(&app, sign_in_req()).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        }

        let res = actix_test::call_service(&app, sign_in_req()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = read_json(res).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("too_many_requests"));
        assert_eq!(body["message"], json!(Quota::Auth.exhausted_message()));

        let sign_up_req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(sign_up_body("ada@example.com"))
            .to_request();
        let res = actix_test::call_service(&app, sign_up_req).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

        let sign_out_req = actix_test::TestRequest::post()
            .uri("/api/auth/sign-out")
            .to_request();
        let res = actix_test::call_service(&app, sign_out_req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
