use crate::model::Id;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: Id },
}

impl CatalogError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        CatalogError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: Id) -> Self {
        CatalogError::NotFound { entity, id }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
