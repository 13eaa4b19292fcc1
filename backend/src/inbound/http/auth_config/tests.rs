//! Unit tests for authentication configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;

fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn expect_error(result: Result<AuthSettings, AuthConfigError>, label: &str) -> AuthConfigError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

const STRONG_SECRET: &str = "0123456789abcdef0123456789abcdef";

#[rstest]
fn release_requires_secret() {
    let env = mock_env(&[]);
    let err = expect_error(
        auth_settings_from_env(&env, BuildMode::Release),
        "expected missing secret to fail",
    );
    assert!(matches!(
        err,
        AuthConfigError::MissingEnv {
            name: JWT_SECRET_ENV
        }
    ));
}

#[rstest]
fn release_rejects_short_secret() {
    let env = mock_env(&[(JWT_SECRET_ENV, "short")]);
    let err = expect_error(
        auth_settings_from_env(&env, BuildMode::Release),
        "expected short secret to fail",
    );
    assert!(matches!(
        err,
        AuthConfigError::SecretTooShort {
            length: 5,
            min_len: SECRET_MIN_LEN
        }
    ));
}

#[rstest]
fn release_uses_configured_values() {
    let env = mock_env(&[
        (JWT_SECRET_ENV, STRONG_SECRET),
        (JWT_EXPIRES_IN_ENV, "30m"),
        (COOKIE_SECURE_ENV, "false"),
    ]);
    let settings =
        auth_settings_from_env(&env, BuildMode::Release).expect("release settings should load");
    assert_eq!(settings.jwt_secret.as_slice(), STRONG_SECRET.as_bytes());
    assert_eq!(settings.token_lifetime, Duration::from_secs(30 * 60));
    assert!(!settings.cookie_secure);
}

#[rstest]
fn release_defaults_lifetime_and_secure_cookie() {
    let env = mock_env(&[(JWT_SECRET_ENV, STRONG_SECRET)]);
    let settings =
        auth_settings_from_env(&env, BuildMode::Release).expect("release settings should load");
    assert_eq!(settings.token_lifetime, DEFAULT_TOKEN_LIFETIME);
    assert!(settings.cookie_secure);
}

#[rstest]
#[case(JWT_EXPIRES_IN_ENV, "soon")]
#[case(COOKIE_SECURE_ENV, "maybe")]
fn release_rejects_invalid_values(#[case] name: &str, #[case] value: &str) {
    let env = mock_env(&[(JWT_SECRET_ENV, STRONG_SECRET), (name, value)]);
    let err = expect_error(
        auth_settings_from_env(&env, BuildMode::Release),
        "expected invalid value to fail",
    );
    match err {
        AuthConfigError::InvalidEnv {
            name: reported,
            value: raw,
            ..
        } => {
            assert_eq!(reported, name);
            assert_eq!(raw, value);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn debug_generates_ephemeral_secret() {
    let env = mock_env(&[]);
    let first = auth_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    let second = auth_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert_eq!(first.jwt_secret.len(), EPHEMERAL_SECRET_LEN);
    assert_ne!(first.jwt_secret.as_slice(), second.jwt_secret.as_slice());
    assert!(!first.cookie_secure);
}

#[rstest]
fn debug_tolerates_invalid_values() {
    let env = mock_env(&[(JWT_EXPIRES_IN_ENV, "0d"), (COOKIE_SECURE_ENV, "perhaps")]);
    let settings = auth_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.token_lifetime, DEFAULT_TOKEN_LIFETIME);
    assert!(!settings.cookie_secure);
}

#[rstest]
fn debug_accepts_short_secret() {
    let env = mock_env(&[(JWT_SECRET_ENV, "dev")]);
    let settings = auth_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.jwt_secret.as_slice(), b"dev");
}

#[rstest]
#[case("1d", Some(86_400))]
#[case("12h", Some(43_200))]
#[case(" 15m ", Some(900))]
#[case("45s", Some(45))]
#[case("3600", Some(3_600))]
#[case("0h", None)]
#[case("d", None)]
#[case("-1d", None)]
#[case("1w", None)]
#[case("", None)]
fn parses_lifetimes(#[case] raw: &str, #[case] seconds: Option<u64>) {
    assert_eq!(parse_lifetime(raw), seconds.map(Duration::from_secs));
}
