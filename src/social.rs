use crate::database::UserRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::model::*;
use chrono::{Local, NaiveDate};
use log::{debug, info};
use std::sync::Arc;

/// Users and the friendship graph between them.
pub struct SocialGraphService {
    users: Arc<dyn UserRepository>,
}

impl SocialGraphService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        SocialGraphService { users }
    }

    pub fn create_user(&self, mut user: User) -> CatalogResult<User> {
        validate_user(&user, local_today())?;
        fill_display_name(&mut user);
        user.friends.clear();
        let user = self.users.create_user(user);
        info!("Created user {} ({})", user.id, user.display_name());
        Ok(user)
    }

    pub fn update_user(&self, mut user: User) -> CatalogResult<User> {
        self.users.get_user(user.id)?;
        validate_user(&user, local_today())?;
        fill_display_name(&mut user);
        let user = self.users.update_user(user)?;
        info!("Updated user {}", user.id);
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: Id) -> CatalogResult<User> {
        self.users.get_user(id)
    }

    pub fn get_all_users(&self) -> Vec<User> {
        self.users.get_all_users()
    }

    pub fn add_friend(&self, user_id: Id, friend_id: Id) -> CatalogResult<()> {
        if self.users.add_friendship(user_id, friend_id)? {
            info!("Users {} and {} are now friends", user_id, friend_id);
        } else {
            debug!("Users {} and {} were already friends", user_id, friend_id);
        }
        Ok(())
    }

    pub fn remove_friend(&self, user_id: Id, friend_id: Id) -> CatalogResult<()> {
        if self.users.remove_friendship(user_id, friend_id)? {
            info!("Users {} and {} are no longer friends", user_id, friend_id);
        } else {
            debug!("Users {} and {} were not friends", user_id, friend_id);
        }
        Ok(())
    }

    /// Friends in ascending id order.
    pub fn get_friends(&self, user_id: Id) -> CatalogResult<Vec<User>> {
        let user = self.users.get_user(user_id)?;
        user.friends
            .iter()
            .map(|id| self.users.get_user(*id))
            .collect()
    }

    pub fn get_common_friends(&self, user_id: Id, other_id: Id) -> CatalogResult<Vec<User>> {
        let user = self.users.get_user(user_id)?;
        let other = self.users.get_user(other_id)?;
        let common = user
            .friends
            .intersection(&other.friends)
            .map(|id| self.users.get_user(*id))
            .collect::<CatalogResult<Vec<_>>>()?;
        debug!(
            "Users {} and {} have {} common friends",
            user_id,
            other_id,
            common.len()
        );
        Ok(common)
    }
}

/// Birthdays are compared with the server's local calendar date.
fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn fill_display_name(user: &mut User) {
    let blank = user.name.as_ref().map_or(true, |name| name.trim().is_empty());
    if blank {
        user.name = Some(user.login.clone());
    }
}

fn validate_user(user: &User, today: NaiveDate) -> CatalogResult<()> {
    if user.email.trim().is_empty() {
        return Err(CatalogError::validation("Email must not be empty"));
    }
    if !user.email.contains('@') {
        return Err(CatalogError::validation("Email must contain '@'"));
    }
    if user.login.trim().is_empty() {
        return Err(CatalogError::validation("Login must not be empty"));
    }
    if user.login.chars().any(char::is_whitespace) {
        return Err(CatalogError::validation("Login must not contain whitespace"));
    }
    if let Some(birthday) = user.birthday {
        if birthday > today {
            return Err(CatalogError::validation(format!(
                "Birthday {} is in the future",
                birthday
            )));
        }
    }
    Ok(())
}
