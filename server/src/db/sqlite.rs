//! `SQLite` drink store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use super::models::{Drink, DrinkPatch, DrinkRow, Ingredient, NewDrink};
use super::{Result, StoreError};

/// SQLite-backed drink store.
#[derive(Clone)]
pub struct DrinkStore {
    pool: SqlitePool,
}

impl DrinkStore {
    /// Connect to a `SQLite` database, creating the file if needed.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let url = if dsn.starts_with("sqlite:") {
            dsn.to_string()
        } else {
            format!("sqlite:{dsn}")
        };

        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the drinks table if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS drinks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT UNIQUE NOT NULL,
                recipe TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop and recreate the table, then seed it with a single drink.
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS drinks")
            .execute(&self.pool)
            .await?;
        self.migrate().await?;

        self.create_drink(&NewDrink {
            title: "water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        })
        .await?;

        Ok(())
    }

    /// All drinks in ascending id order.
    pub async fn list_drinks(&self) -> Result<Vec<Drink>> {
        let rows: Vec<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drinks ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| Drink::try_from(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn get_drink(&self, id: i64) -> Result<Option<Drink>> {
        let row: Option<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drinks WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Drink::try_from).transpose()?)
    }

    pub async fn create_drink(&self, new: &NewDrink) -> Result<Drink> {
        let recipe = serde_json::to_string(&new.recipe)?;

        let result = sqlx::query("INSERT INTO drinks (title, recipe) VALUES (?, ?)")
            .bind(&new.title)
            .bind(&recipe)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, &new.title))?;

        Ok(Drink {
            id: result.last_insert_rowid(),
            title: new.title.clone(),
            recipe: new.recipe.clone(),
        })
    }

    /// Apply `patch` to drink `id` in one transaction. `None` if absent.
    pub async fn update_drink(&self, id: i64, patch: &DrinkPatch) -> Result<Option<Drink>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drinks WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut drink = Drink::try_from(row)?;
        patch.apply(&mut drink);
        let recipe = serde_json::to_string(&drink.recipe)?;

        sqlx::query("UPDATE drinks SET title = ?, recipe = ? WHERE id = ?")
            .bind(&drink.title)
            .bind(&recipe)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, &drink.title))?;

        tx.commit().await?;
        Ok(Some(drink))
    }

    /// Remove drink `id`. Returns `false` if it did not exist.
    pub async fn delete_drink(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
