//! Tests for the user administration service.

use std::sync::Arc;

use mockable::DefaultClock;

use super::*;
use crate::domain::ports::MockUserRepository;
use crate::domain::test_fixtures::user;
use crate::domain::{EmailAddress, ErrorCode, Role};

fn service(repo: MockUserRepository) -> UserService {
    UserService::new(Arc::new(repo), Arc::new(DefaultClock))
}

fn admin(id: i32) -> Actor {
    Actor::new(UserId::new(id), Role::Admin)
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let mut repo = MockUserRepository::new();
    repo.expect_delete().never();

    let err = service(repo)
        .delete(&admin(1), UserId::new(1))
        .await
        .expect_err("self delete");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), SELF_DELETE_MESSAGE);
}

#[tokio::test]
async fn admin_deletes_other_account() {
    let mut repo = MockUserRepository::new();
    repo.expect_delete().times(1).return_once(|_| Ok(true));

    service(repo)
        .delete(&admin(1), UserId::new(2))
        .await
        .expect("deleted");
}

#[tokio::test]
async fn non_admin_cannot_read_other_accounts() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().never();

    let err = service(repo)
        .get(&Actor::new(UserId::new(2), Role::User), UserId::new(3))
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.message(), "No tienes permiso para ver este usuario");
}

#[tokio::test]
async fn user_reads_own_account() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .return_once(|id| Ok(Some(user(id.get(), "ada@example.com", Role::User))));

    let found = service(repo)
        .get(&Actor::new(UserId::new(2), Role::User), UserId::new(2))
        .await
        .expect("self access");

    assert_eq!(found.id, UserId::new(2));
}

#[tokio::test]
async fn update_rejects_email_owned_by_another_account() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .return_once(|id| Ok(Some(user(id.get(), "ada@example.com", Role::User))));
    repo.expect_find_by_email()
        .return_once(|_| Ok(Some(user(9, "grace@example.com", Role::User))));
    repo.expect_update().never();

    let changes = UserChanges {
        email: Some(EmailAddress::new("grace@example.com").expect("valid email")),
        ..UserChanges::default()
    };
    let err = service(repo)
        .update(UserId::new(2), changes)
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), DUPLICATE_EMAIL_MESSAGE);
}

#[tokio::test]
async fn update_applies_role_change() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .return_once(|id| Ok(Some(user(id.get(), "ada@example.com", Role::User))));
    repo.expect_update().return_once(|id, changes| {
        let role = changes.role.unwrap_or_default();
        Ok(Some(user(id.get(), "ada@example.com", role)))
    });

    let changes = UserChanges {
        role: Some(Role::Admin),
        ..UserChanges::default()
    };
    let updated = service(repo)
        .update(UserId::new(2), changes)
        .await
        .expect("updated");

    assert_eq!(updated.role, Role::Admin);
}

#[tokio::test]
async fn stats_combine_counts() {
    let mut repo = MockUserRepository::new();
    repo.expect_count().return_once(|| Ok(12));
    let mut calls = 0;
    repo.expect_count_created_in().times(2).returning(move |_| {
        calls += 1;
        Ok(if calls == 1 { 3 } else { 2 })
    });

    let stats = service(repo).stats().await.expect("stats");

    assert_eq!(stats.total_users, 12);
    assert_eq!(stats.new_users_this_month, 3);
    assert_eq!(stats.new_users_last_month, 2);
    assert_eq!(stats.user_growth, rust_decimal::Decimal::from(50));
}
