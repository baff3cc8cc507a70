use crate::error::{CatalogError, CatalogResult};
use crate::model::*;
use std::collections::BTreeMap;
use std::mem;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait Entity: Clone {
    const KIND: &'static str;

    fn id(&self) -> Id;
    fn set_id(&mut self, id: Id);

    /// Takes over the relation sets of the stored version this entity replaces.
    fn inherit_relations(&mut self, stored: &mut Self);
}

impl Entity for Film {
    const KIND: &'static str = "Film";

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn inherit_relations(&mut self, stored: &mut Self) {
        self.likes = mem::take(&mut stored.likes);
    }
}

impl Entity for User {
    const KIND: &'static str = "User";

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn inherit_relations(&mut self, stored: &mut Self) {
        self.friends = mem::take(&mut stored.friends);
    }
}

struct Entries<T> {
    next_id: Id,
    by_id: BTreeMap<Id, T>,
}

/// Keyed in-memory store. Ids start at 1 and are never reused.
///
/// One lock guards both the id counter and the map, so every read-modify-write
/// below is atomic with respect to other callers.
pub struct EntityStore<T> {
    entries: RwLock<Entries<T>>,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        EntityStore {
            entries: RwLock::new(Entries {
                next_id: 1,
                by_id: BTreeMap::new(),
            }),
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries<T>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<T>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self, mut entity: T) -> T {
        let mut entries = self.write();
        let id = entries.next_id;
        entries.next_id += 1;
        entity.set_id(id);
        entries.by_id.insert(id, entity.clone());
        entity
    }

    pub fn update(&self, mut entity: T) -> CatalogResult<T> {
        let id = entity.id();
        let mut entries = self.write();
        let stored = entries
            .by_id
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found(T::KIND, id))?;
        entity.inherit_relations(stored);
        *stored = entity.clone();
        Ok(entity)
    }

    /// Snapshot in ascending id order.
    pub fn get_all(&self) -> Vec<T> {
        self.read().by_id.values().cloned().collect()
    }

    pub fn get_by_id(&self, id: Id) -> CatalogResult<T> {
        self.read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(T::KIND, id))
    }

    pub fn modify<R>(&self, id: Id, f: impl FnOnce(&mut T) -> R) -> CatalogResult<R> {
        let mut entries = self.write();
        let entity = entries
            .by_id
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found(T::KIND, id))?;
        Ok(f(entity))
    }

    /// Applies `f` to two entities under a single lock acquisition. `f` only
    /// runs when both exist. `a` and `b` must be distinct. Neither entry leaves
    /// the map while `f` runs.
    pub fn modify_pair<R>(
        &self,
        a: Id,
        b: Id,
        f: impl FnOnce(&mut T, &mut T) -> R,
    ) -> CatalogResult<R> {
        debug_assert_ne!(a, b);
        let mut entries = self.write();
        for id in &[a, b] {
            if !entries.by_id.contains_key(id) {
                return Err(CatalogError::not_found(T::KIND, *id));
            }
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let mut span = entries.by_id.range_mut(low..=high);
        match (span.next(), span.next_back()) {
            (Some((_, lower)), Some((_, upper))) => Ok(if a < b {
                f(lower, upper)
            } else {
                f(upper, lower)
            }),
            _ => Err(CatalogError::not_found(T::KIND, high)),
        }
    }
}

pub trait FilmRepository: Send + Sync {
    fn create_film(&self, film: Film) -> Film;
    fn update_film(&self, film: Film) -> CatalogResult<Film>;
    fn get_all_films(&self) -> Vec<Film>;
    fn get_film(&self, id: Id) -> CatalogResult<Film>;
    /// Returns whether the like-set changed.
    fn add_like(&self, film_id: Id, user_id: Id) -> CatalogResult<bool>;
    fn remove_like(&self, film_id: Id, user_id: Id) -> CatalogResult<bool>;
}

impl FilmRepository for EntityStore<Film> {
    fn create_film(&self, film: Film) -> Film {
        self.create(film)
    }

    fn update_film(&self, film: Film) -> CatalogResult<Film> {
        self.update(film)
    }

    fn get_all_films(&self) -> Vec<Film> {
        self.get_all()
    }

    fn get_film(&self, id: Id) -> CatalogResult<Film> {
        self.get_by_id(id)
    }

    fn add_like(&self, film_id: Id, user_id: Id) -> CatalogResult<bool> {
        self.modify(film_id, |film| film.likes.insert(user_id))
    }

    fn remove_like(&self, film_id: Id, user_id: Id) -> CatalogResult<bool> {
        self.modify(film_id, |film| film.likes.remove(&user_id))
    }
}

pub trait UserRepository: Send + Sync {
    fn create_user(&self, user: User) -> User;
    fn update_user(&self, user: User) -> CatalogResult<User>;
    fn get_all_users(&self) -> Vec<User>;
    fn get_user(&self, id: Id) -> CatalogResult<User>;
    /// Links both users at once. Returns whether either friend-set changed.
    fn add_friendship(&self, user_id: Id, friend_id: Id) -> CatalogResult<bool>;
    fn remove_friendship(&self, user_id: Id, friend_id: Id) -> CatalogResult<bool>;
}

impl UserRepository for EntityStore<User> {
    fn create_user(&self, user: User) -> User {
        self.create(user)
    }

    fn update_user(&self, user: User) -> CatalogResult<User> {
        self.update(user)
    }

    fn get_all_users(&self) -> Vec<User> {
        self.get_all()
    }

    fn get_user(&self, id: Id) -> CatalogResult<User> {
        self.get_by_id(id)
    }

    fn add_friendship(&self, user_id: Id, friend_id: Id) -> CatalogResult<bool> {
        if user_id == friend_id {
            return self.modify(user_id, |user| user.friends.insert(user_id));
        }
        self.modify_pair(user_id, friend_id, |user, friend| {
            let forward = user.friends.insert(friend_id);
            let backward = friend.friends.insert(user_id);
            forward || backward
        })
    }

    fn remove_friendship(&self, user_id: Id, friend_id: Id) -> CatalogResult<bool> {
        if user_id == friend_id {
            return self.modify(user_id, |user| user.friends.remove(&user_id));
        }
        self.modify_pair(user_id, friend_id, |user, friend| {
            let forward = user.friends.remove(&friend_id);
            let backward = friend.friends.remove(&user_id);
            forward || backward
        })
    }
}
