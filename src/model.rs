use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type Id = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    /// Minutes.
    pub duration: Option<i32>,
    /// Ids of the users who liked this film.
    #[serde(default)]
    pub likes: BTreeSet<Id>,
}

impl Film {
    #[cfg(test)]
    pub fn new(name: &str) -> Self {
        Film {
            name: name.to_owned(),
            ..Film::default()
        }
    }

    pub fn popularity(&self) -> usize {
        self.likes.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: String,
    /// Display name. Filled with the login when missing or blank.
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Always mirrored: if `a.friends` holds `b`, then `b.friends` holds `a`.
    #[serde(default)]
    pub friends: BTreeSet<Id>,
}

impl User {
    #[cfg(test)]
    pub fn new(email: &str, login: &str) -> Self {
        User {
            email: email.to_owned(),
            login: login.to_owned(),
            ..User::default()
        }
    }

    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.login,
        }
    }
}
