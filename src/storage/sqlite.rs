//! SQLite drink store

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::models::{Drink, DrinkId, Ingredient, NewDrink};
use crate::{Error, Result};

use super::DrinkStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS drink (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    recipe TEXT NOT NULL
)";

#[derive(FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = Error;

    fn try_from(row: DrinkRow) -> Result<Self> {
        let recipe: Vec<Ingredient> = serde_json::from_str(&row.recipe)?;
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe,
        })
    }
}

/// Drink store backed by a SQLite connection pool
#[derive(Clone)]
pub struct SqliteDrinkStore {
    pool: SqlitePool,
}

impl SqliteDrinkStore {
    /// Connect to a database URL such as `sqlite://drinks.db`, creating the
    /// file if it is missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(Error::from_sqlx)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(Error::from_sqlx)?;

        tracing::debug!(%url, max_connections, "Connected drink store");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(Error::from_sqlx)?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(Error::from_sqlx)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DrinkStore for SqliteDrinkStore {
    async fn setup(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(Error::from_sqlx)?;
        Ok(())
    }

    async fn drop_and_create_all(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS drink")
            .execute(&self.pool)
            .await
            .map_err(Error::from_sqlx)?;
        tracing::info!("Dropped drink table");
        self.setup().await
    }

    async fn list_all(&self) -> Result<Vec<Drink>> {
        let rows: Vec<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drink ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::from_sqlx)?;

        rows.into_iter().map(Drink::try_from).collect()
    }

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>> {
        let row: Option<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drink WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::from_sqlx)?;

        row.map(Drink::try_from).transpose()
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink> {
        let recipe = drink
            .recipe
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query("INSERT INTO drink (title, recipe) VALUES (?, ?)")
            .bind(drink.title.as_deref())
            .bind(recipe.as_deref())
            .execute(&self.pool)
            .await
            .map_err(Error::from_sqlx)?;

        let id = result.last_insert_rowid();
        tracing::debug!(drink_id = id, "Inserted drink");

        // Both columns are NOT NULL, so a successful insert had both values.
        match (drink.title, drink.recipe) {
            (Some(title), Some(recipe)) => Ok(Drink { id, title, recipe }),
            _ => Err(Error::internal("drink inserted without title or recipe")),
        }
    }

    async fn update(&self, drink: &Drink) -> Result<()> {
        let recipe = serde_json::to_string(&drink.recipe)?;

        let result = sqlx::query("UPDATE drink SET title = ?, recipe = ? WHERE id = ?")
            .bind(&drink.title)
            .bind(recipe)
            .bind(drink.id)
            .execute(&self.pool)
            .await
            .map_err(Error::from_sqlx)?;

        tracing::debug!(
            drink_id = drink.id,
            rows = result.rows_affected(),
            "Updated drink"
        );
        Ok(())
    }

    async fn delete(&self, drink: &Drink) -> Result<()> {
        sqlx::query("DELETE FROM drink WHERE id = ?")
            .bind(drink.id)
            .execute(&self.pool)
            .await
            .map_err(Error::from_sqlx)?;

        tracing::debug!(drink_id = drink.id, "Deleted drink");
        Ok(())
    }
}
