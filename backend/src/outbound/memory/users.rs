//! `UserRepository` over the in-memory store.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    EmailAddress, NewUser, TimeWindow, User, UserChanges, UserId, UserWithOrderCount,
};

use super::{InMemoryStore, advance, paginate, tally};

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().map_err(UserRepositoryError::query)?.users.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.users.values().find(|user| &user.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(UserRepositoryError::duplicate_email(user.email.as_str()));
        }
        let id = UserId::new(advance(&mut state.sequences.user));
        let stored = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if let Some(email) = &changes.email {
            let taken = state
                .users
                .values()
                .any(|other| other.id != id && &other.email == email);
            if taken {
                return Err(UserRepositoryError::duplicate_email(email.as_str()));
            }
        }
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.orders.retain(|_, order| order.user_id != id);
        Ok(true)
    }

    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<UserWithOrderCount>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let rows = state
            .users
            .values()
            .map(|user| UserWithOrderCount {
                user: user.clone(),
                order_count: tally(
                    state
                        .orders
                        .values()
                        .filter(|order| order.user_id == user.id)
                        .count(),
                ),
            })
            .collect();
        Ok(paginate(rows, page))
    }

    async fn count(&self) -> Result<u64, UserRepositoryError> {
        Ok(tally(self.lock().map_err(UserRepositoryError::query)?.users.len()))
    }

    async fn count_created_in(&self, window: TimeWindow) -> Result<u64, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tally(
            state
                .users
                .values()
                .filter(|user| window.contains(user.created_at))
                .count(),
        ))
    }
}
