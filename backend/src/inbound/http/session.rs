//! Request authentication helpers.
//!
//! Provides extractors that resolve the caller from a bearer token, checked
//! in the `Authorization` header first and then in the `token` cookie, so
//! handlers only deal with domain users and actors.

use std::time::Duration;

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::error;

use crate::domain::{Actor, Error, TOKEN_MISSING_MESSAGE, User};

use super::state::HttpState;

/// Name of the cookie carrying the access token.
pub const TOKEN_COOKIE: &str = "token";

const BEARER_PREFIX: &str = "Bearer ";

/// Build the HTTP-only cookie that carries `token`.
pub fn token_cookie(token: &str, lifetime: Duration, secure: bool) -> Cookie<'static> {
    let max_age = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
    Cookie::build(TOKEN_COOKIE, token.to_owned())
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age))
        .finish()
}

/// Build a cookie that makes the browser drop the access token.
pub fn expired_token_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = token_cookie("", Duration::ZERO, secure);
    cookie.make_removal();
    cookie
}

/// Raw token from `Authorization: Bearer` or, failing that, the cookie.
fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }
    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

fn state_from_request(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>().cloned().ok_or_else(|| {
        error!("HttpState missing from application data");
        Error::internal("HTTP state not configured")
    })
}

/// Caller resolved from a verified token; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    /// Account behind the token.
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Identity and role used for access checks.
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_from_request(req);
        let token = token_from_request(req);
        Box::pin(async move {
            let state = state?;
            let token = token.ok_or_else(|| Error::unauthorized(TOKEN_MISSING_MESSAGE))?;
            let user = state.auth.authenticate(&token).await?;
            Ok(Self(user))
        })
    }
}

/// Authenticated caller holding the admin role; rejects with 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl AdminUser {
    /// Identity and role used for access checks.
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let authenticated = AuthenticatedUser::from_request(req, payload);
        Box::pin(async move {
            let AuthenticatedUser(user) = authenticated.await?;
            Actor::from(&user).require_admin()?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{TestContext, read_json};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;
    use serde_json::json;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user().email.to_string())
    }

    async fn admin_only(admin: AdminUser) -> HttpResponse {
        HttpResponse::Ok().body(admin.actor().id().to_string())
    }

    fn app(
        ctx: &TestContext,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(ctx.state())
            .route("/whoami", web::get().to(whoami))
            .route("/admin", web::get().to(admin_only))
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_token_is_unauthorised() {
        let ctx = TestContext::new();
        let service = actix_test::init_service(app(&ctx)).await;
        let res = actix_test::call_service(&service, actix_test::TestRequest::get().uri("/whoami").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!(TOKEN_MISSING_MESSAGE));
        assert_eq!(body["success"], json!(false));
    }

    #[rstest]
    #[actix_web::test]
    async fn garbage_token_is_rejected() {
        let ctx = TestContext::new();
        let service = actix_test::init_service(app(&ctx)).await;
        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, "Bearer not.a.jwt"))
            .to_request();
        let res = actix_test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("No autorizado. Token inválido."));
    }

    #[rstest]
    #[actix_web::test]
    async fn cookie_token_is_accepted() {
        let ctx = TestContext::new();
        let user = ctx.user("Ana", "ana@example.com", Role::User).await;
        let service = actix_test::init_service(app(&ctx)).await;
        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new(TOKEN_COOKIE, ctx.token_for(&user)))
            .to_request();
        let body = actix_test::call_and_read_body(&service, req).await;
        assert_eq!(body, "ana@example.com");
    }

    #[rstest]
    #[actix_web::test]
    async fn bearer_header_wins_over_cookie() {
        let ctx = TestContext::new();
        let ana = ctx.user("Ana", "ana@example.com", Role::User).await;
        let bea = ctx.user("Bea", "bea@example.com", Role::User).await;
        let service = actix_test::init_service(app(&ctx)).await;
        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header(ctx.bearer(&bea))
            .cookie(Cookie::new(TOKEN_COOKIE, ctx.token_for(&ana)))
            .to_request();
        let body = actix_test::call_and_read_body(&service, req).await;
        assert_eq!(body, "bea@example.com");
    }

    #[rstest]
    #[actix_web::test]
    async fn deleted_account_is_unauthorised() {
        let ctx = TestContext::new();
        let user = ctx.user("Ana", "ana@example.com", Role::User).await;
        let token = ctx.token_for(&user);
        ctx.remove_user(&user).await;
        let service = actix_test::init_service(app(&ctx)).await;
        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let res = actix_test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("No autorizado. Usuario no encontrado."));
    }

    #[rstest]
    #[case(Role::User, StatusCode::FORBIDDEN)]
    #[case(Role::Admin, StatusCode::OK)]
    #[actix_web::test]
    async fn admin_gate_checks_role(#[case] role: Role, #[case] expected: StatusCode) {
        let ctx = TestContext::new();
        let user = ctx.user("Ana", "ana@example.com", role).await;
        let service = actix_test::init_service(app(&ctx)).await;
        let req = actix_test::TestRequest::get()
            .uri("/admin")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let res = actix_test::call_service(&service, req).await;
        assert_eq!(res.status(), expected);
    }

    #[rstest]
    fn token_cookie_is_strict_and_http_only() {
        let cookie = token_cookie("abc", Duration::from_secs(86_400), true);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(1)));
    }

    #[rstest]
    fn expired_cookie_clears_value() {
        let cookie = expired_token_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
