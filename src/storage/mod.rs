//! Persistence layer
//!
//! One table, one entity. Every mutating call commits on its own; nothing
//! spans more than one statement.

use async_trait::async_trait;

use crate::models::{Drink, DrinkId, NewDrink};
use crate::Result;

pub mod sqlite;

pub use sqlite::SqliteDrinkStore;

/// Drink storage trait
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// Create the `drink` table if it does not exist
    async fn setup(&self) -> Result<()>;

    /// Drop the `drink` table and recreate it empty
    async fn drop_and_create_all(&self) -> Result<()>;

    /// All drinks, ordered by id
    async fn list_all(&self) -> Result<Vec<Drink>>;

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>>;

    /// Insert a drink and return it with its assigned id.
    ///
    /// Fails with [`crate::Error::ConstraintViolation`] when the title is
    /// taken or a required value is missing.
    async fn insert(&self, drink: NewDrink) -> Result<Drink>;

    /// Persist title and recipe of an existing drink
    async fn update(&self, drink: &Drink) -> Result<()>;

    async fn delete(&self, drink: &Drink) -> Result<()>;
}
