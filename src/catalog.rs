use crate::database::FilmRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::model::*;
use crate::social::SocialGraphService;
use chrono::NaiveDate;
use log::{debug, info};
use std::cmp::Reverse;
use std::convert::TryFrom;
use std::sync::Arc;

pub const DEFAULT_POPULAR_COUNT: i64 = 10;
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Date of the first public film screening. Earlier release dates are rejected.
fn first_screening() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

pub struct CatalogService {
    films: Arc<dyn FilmRepository>,
    social: Arc<SocialGraphService>,
}

impl CatalogService {
    pub fn new(films: Arc<dyn FilmRepository>, social: Arc<SocialGraphService>) -> Self {
        CatalogService { films, social }
    }

    pub fn create_film(&self, mut film: Film) -> CatalogResult<Film> {
        validate_film(&film)?;
        film.likes.clear();
        let film = self.films.create_film(film);
        info!("Created film {} ({})", film.id, film.name);
        Ok(film)
    }

    pub fn update_film(&self, film: Film) -> CatalogResult<Film> {
        self.films.get_film(film.id)?;
        validate_film(&film)?;
        let film = self.films.update_film(film)?;
        info!("Updated film {}", film.id);
        Ok(film)
    }

    pub fn get_film_by_id(&self, id: Id) -> CatalogResult<Film> {
        self.films.get_film(id)
    }

    pub fn get_all_films(&self) -> Vec<Film> {
        self.films.get_all_films()
    }

    pub fn add_like(&self, film_id: Id, user_id: Id) -> CatalogResult<()> {
        self.films.get_film(film_id)?;
        self.social.get_user_by_id(user_id)?;
        if self.films.add_like(film_id, user_id)? {
            info!("User {} liked film {}", user_id, film_id);
        } else {
            debug!("User {} already liked film {}", user_id, film_id);
        }
        Ok(())
    }

    pub fn remove_like(&self, film_id: Id, user_id: Id) -> CatalogResult<()> {
        self.films.get_film(film_id)?;
        self.social.get_user_by_id(user_id)?;
        if self.films.remove_like(film_id, user_id)? {
            info!("User {} unliked film {}", user_id, film_id);
        } else {
            debug!("User {} had not liked film {}", user_id, film_id);
        }
        Ok(())
    }

    /// Most liked films first, equal like counts in ascending id order.
    /// `None` means [`DEFAULT_POPULAR_COUNT`]; a non-positive count yields nothing.
    pub fn get_popular_films(&self, count: Option<i64>) -> Vec<Film> {
        let count = count.unwrap_or(DEFAULT_POPULAR_COUNT);
        if count <= 0 {
            return Vec::new();
        }
        let mut films = self.films.get_all_films();
        films.sort_by_key(|film| (Reverse(film.popularity()), film.id));
        films.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        debug!("Returning {} popular films", films.len());
        films
    }
}

fn validate_film(film: &Film) -> CatalogResult<()> {
    if film.name.trim().is_empty() {
        return Err(CatalogError::validation("Film name must not be empty"));
    }
    if let Some(description) = &film.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(CatalogError::validation(format!(
                "Description is longer than {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
    }
    if let Some(release_date) = film.release_date {
        if release_date < first_screening() {
            return Err(CatalogError::validation(format!(
                "Release date must not be before {}",
                first_screening()
            )));
        }
    }
    if let Some(duration) = film.duration {
        if duration <= 0 {
            return Err(CatalogError::validation("Duration must be positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::EntityStore;

    struct Fixture {
        catalog: CatalogService,
        social: Arc<SocialGraphService>,
    }

    fn fixture() -> Fixture {
        let social = Arc::new(SocialGraphService::new(Arc::new(EntityStore::<User>::new())));
        let catalog = CatalogService::new(
            Arc::new(EntityStore::<Film>::new()),
            Arc::clone(&social),
        );
        Fixture { catalog, social }
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn valid_film() -> Film {
        Film {
            description: Some("Test Description".to_owned()),
            release_date: date(2020, 1, 1),
            duration: Some(120),
            ..Film::new("Test Film")
        }
    }

    fn ids(films: &[Film]) -> Vec<Id> {
        films.iter().map(|film| film.id).collect()
    }

    #[test]
    fn boundary_values_are_accepted() {
        let catalog = fixture().catalog;
        let films = vec![
            valid_film(),
            Film {
                description: Some("a".repeat(200)),
                ..valid_film()
            },
            Film {
                description: Some("ё".repeat(200)),
                ..valid_film()
            },
            Film {
                release_date: date(1895, 12, 28),
                ..valid_film()
            },
            Film {
                duration: Some(1),
                ..valid_film()
            },
            Film::new("Only a name"),
        ];
        let mut last_id = 0;
        for film in films {
            let created = catalog.create_film(film).unwrap();
            assert!(created.id > last_id);
            last_id = created.id;
        }
        assert_eq!(catalog.get_all_films().len(), 6);
    }

    #[test]
    fn invalid_films_are_rejected() {
        let catalog = fixture().catalog;
        let films = vec![
            Film::new(""),
            Film::new("   "),
            Film {
                description: Some("a".repeat(201)),
                ..valid_film()
            },
            Film {
                release_date: date(1895, 12, 27),
                ..valid_film()
            },
            Film {
                duration: Some(0),
                ..valid_film()
            },
            Film {
                duration: Some(-5),
                ..valid_film()
            },
        ];
        for film in films {
            match catalog.create_film(film.clone()) {
                Err(CatalogError::Validation(_)) => {}
                other => panic!("{:?} accepted: {:?}", film, other),
            }
        }
        assert!(catalog.get_all_films().is_empty());
    }

    #[test]
    fn create_ignores_supplied_id_and_likes() {
        let catalog = fixture().catalog;
        let mut film = valid_film();
        film.id = 99;
        film.likes.insert(3);
        let created = catalog.create_film(film).unwrap();
        assert_eq!(created.id, 1);
        assert!(created.likes.is_empty());
    }

    #[test]
    fn update_film() {
        let Fixture { catalog, social } = fixture();
        let film = catalog.create_film(valid_film()).unwrap();
        let user = social.create_user(User::new("a@x.com", "a")).unwrap();
        catalog.add_like(film.id, user.id).unwrap();

        let updated = catalog
            .update_film(Film {
                id: film.id,
                ..Film::new("Renamed")
            })
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.duration, None);
        assert_eq!(updated.popularity(), 1);
        assert_eq!(catalog.get_film_by_id(film.id).unwrap(), updated);

        let invalid = catalog.update_film(Film {
            id: film.id,
            duration: Some(0),
            ..Film::new("Renamed again")
        });
        assert!(matches!(invalid, Err(CatalogError::Validation(_))));
        assert_eq!(catalog.get_film_by_id(film.id).unwrap().name, "Renamed");
    }

    #[test]
    fn update_unknown_film() {
        let catalog = fixture().catalog;
        catalog.create_film(valid_film()).unwrap();
        let before = catalog.get_all_films();
        let result = catalog.update_film(Film {
            id: 2,
            ..Film::new("")
        });
        assert_eq!(result, Err(CatalogError::not_found("Film", 2)));
        assert_eq!(catalog.get_all_films(), before);
    }

    #[test]
    fn likes_are_idempotent() {
        let Fixture { catalog, social } = fixture();
        let film = catalog.create_film(valid_film()).unwrap();
        let user = social.create_user(User::new("a@x.com", "a")).unwrap();

        catalog.add_like(film.id, user.id).unwrap();
        catalog.add_like(film.id, user.id).unwrap();
        assert_eq!(catalog.get_film_by_id(film.id).unwrap().popularity(), 1);

        catalog.remove_like(film.id, user.id).unwrap();
        catalog.remove_like(film.id, user.id).unwrap();
        assert_eq!(catalog.get_film_by_id(film.id).unwrap().popularity(), 0);
    }

    #[test]
    fn likes_need_existing_film_and_user() {
        let Fixture { catalog, social } = fixture();
        let film = catalog.create_film(valid_film()).unwrap();
        let user = social.create_user(User::new("a@x.com", "a")).unwrap();
        assert_eq!(
            catalog.add_like(film.id, 7),
            Err(CatalogError::not_found("User", 7))
        );
        assert_eq!(
            catalog.add_like(7, user.id),
            Err(CatalogError::not_found("Film", 7))
        );
        assert_eq!(
            catalog.remove_like(film.id, 7),
            Err(CatalogError::not_found("User", 7))
        );
        assert_eq!(catalog.get_film_by_id(film.id).unwrap().popularity(), 0);
    }

    #[test]
    fn most_liked_film() {
        let Fixture { catalog, social } = fixture();
        let matrix = catalog
            .create_film(Film {
                duration: Some(120),
                release_date: date(1999, 3, 31),
                ..Film::new("Matrix")
            })
            .unwrap();
        catalog.create_film(valid_film()).unwrap();
        let u1 = social.create_user(User::new("a@x.com", "a")).unwrap();
        let u2 = social.create_user(User::new("b@x.com", "b")).unwrap();
        catalog.add_like(matrix.id, u1.id).unwrap();
        catalog.add_like(matrix.id, u2.id).unwrap();

        let popular = catalog.get_popular_films(Some(1));
        assert_eq!(ids(&popular), vec![matrix.id]);
        assert_eq!(popular[0].popularity(), 2);
    }

    #[test]
    fn popular_films_ordering_and_count() {
        let Fixture { catalog, social } = fixture();
        let films = (0..12)
            .map(|i| catalog.create_film(Film::new(&format!("film {}", i))).unwrap())
            .collect::<Vec<_>>();
        let users = (0..3)
            .map(|i| {
                social
                    .create_user(User::new("u@x.com", &format!("u{}", i)))
                    .unwrap()
            })
            .collect::<Vec<_>>();
        for user in &users {
            catalog.add_like(films[4].id, user.id).unwrap();
        }
        catalog.add_like(films[9].id, users[0].id).unwrap();
        catalog.add_like(films[2].id, users[1].id).unwrap();

        let top = catalog.get_popular_films(Some(4));
        assert_eq!(
            ids(&top),
            vec![films[4].id, films[2].id, films[9].id, films[0].id]
        );
        for pair in catalog.get_popular_films(Some(100)).windows(2) {
            assert!(pair[0].popularity() >= pair[1].popularity());
        }

        assert_eq!(catalog.get_popular_films(None).len(), 10);
        assert_eq!(catalog.get_popular_films(Some(100)).len(), 12);
        assert!(catalog.get_popular_films(Some(0)).is_empty());
        assert!(catalog.get_popular_films(Some(-3)).is_empty());
    }
}
