//! Record types for the customer, user and comments tables

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, ToSql};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Entity, EntityStore, Operation, Result, StoreError};

/// A row of the `customer` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub balance: i32,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub birth_date: Option<NaiveDate>,
    pub married: bool,
}

impl Entity for Customer {
    type Id = String;

    const TABLE: &'static str = "customer";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "balance",
        "rating",
        "created_at",
        "birth_date",
        "married",
    ];

    const INSERT_SQL: &'static str =
        "INSERT INTO customer (id, name, email, balance, rating, created_at, birth_date, married)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT id, name, email, balance, rating, created_at, birth_date, married
         FROM customer
         WHERE id = ?1";
    const SELECT_ALL_SQL: &'static str =
        "SELECT id, name, email, balance, rating, created_at, birth_date, married
         FROM customer";
    const UPDATE_SQL: &'static str = "UPDATE customer
         SET name = ?2, email = ?3, balance = ?4, rating = ?5,
             created_at = ?6, birth_date = ?7, married = ?8
         WHERE id = ?1";
    const DELETE_SQL: &'static str = "DELETE FROM customer WHERE id = ?1";
    const COUNT_SQL: &'static str = "SELECT COUNT(*) FROM customer";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            balance: row.get(3)?,
            rating: row.get(4)?,
            created_at: row.get(5)?,
            birth_date: row.get(6)?,
            married: row.get(7)?,
        })
    }

    fn insert_params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id as &dyn ToSql,
            &self.name,
            &self.email,
            &self.balance,
            &self.rating,
            &self.created_at,
            &self.birth_date,
            &self.married,
        ]
    }

    fn update_params(&self) -> Vec<&dyn ToSql> {
        self.insert_params()
    }

    fn id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn inserted_id(&self, _rowid: i64) -> String {
        self.id.clone()
    }
}

/// A row of the `user` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl Entity for User {
    type Id = String;

    const TABLE: &'static str = "user";
    const COLUMNS: &'static [&'static str] = &["username", "password"];

    const INSERT_SQL: &'static str = "INSERT INTO user (username, password) VALUES (?1, ?2)";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT username, password FROM user WHERE username = ?1";
    const SELECT_ALL_SQL: &'static str = "SELECT username, password FROM user";
    const UPDATE_SQL: &'static str = "UPDATE user SET password = ?2 WHERE username = ?1";
    const DELETE_SQL: &'static str = "DELETE FROM user WHERE username = ?1";
    const COUNT_SQL: &'static str = "SELECT COUNT(*) FROM user";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            username: row.get(0)?,
            password: row.get(1)?,
        })
    }

    fn insert_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.username as &dyn ToSql, &self.password]
    }

    fn update_params(&self) -> Vec<&dyn ToSql> {
        self.insert_params()
    }

    fn id(&self) -> Option<String> {
        Some(self.username.clone())
    }

    fn inserted_id(&self, _rowid: i64) -> String {
        self.username.clone()
    }
}

const AUTHENTICATE_SQL: &str =
    "SELECT username FROM user WHERE username = ?1 AND password = ?2 LIMIT 1";

impl EntityStore<'_, User> {
    /// Check a username/password pair
    ///
    /// Returns the stored username on a match and `None` otherwise. Both
    /// values are bound, so quotes or comment markers in either one are
    /// compared literally.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<String>> {
        let op = Operation::Authenticate;
        let mut stmt = self
            .conn
            .prepare_cached(AUTHENTICATE_SQL)
            .map_err(|e| StoreError::from_driver(op, User::TABLE, e))?;
        let mut rows = stmt
            .query([username, password])
            .map_err(|e| StoreError::from_driver(op, User::TABLE, e))?;

        let row = rows
            .next()
            .map_err(|e| StoreError::from_driver(op, User::TABLE, e))?;
        let matched = match row {
            Some(row) => Some(
                row.get::<_, String>(0)
                    .map_err(|e| StoreError::from_driver(op, User::TABLE, e))?,
            ),
            None => None,
        };

        debug!(username, matched = matched.is_some(), "authentication attempt");
        Ok(matched)
    }
}

/// A row of the `comments` table
///
/// `id` is assigned by the engine on insert and is `None` until then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub email: String,
    pub comment: Option<String>,
}

impl Comment {
    pub fn new(email: impl Into<String>, comment: Option<String>) -> Self {
        Comment {
            id: None,
            email: email.into(),
            comment,
        }
    }
}

impl Entity for Comment {
    type Id = i64;

    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] = &["id", "email", "comment"];

    const INSERT_SQL: &'static str = "INSERT INTO comments (email, comment) VALUES (?1, ?2)";
    const SELECT_BY_ID_SQL: &'static str = "SELECT id, email, comment FROM comments WHERE id = ?1";
    const SELECT_ALL_SQL: &'static str = "SELECT id, email, comment FROM comments";
    const UPDATE_SQL: &'static str = "UPDATE comments SET email = ?1, comment = ?2 WHERE id = ?3";
    const DELETE_SQL: &'static str = "DELETE FROM comments WHERE id = ?1";
    const COUNT_SQL: &'static str = "SELECT COUNT(*) FROM comments";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: Some(row.get(0)?),
            email: row.get(1)?,
            comment: row.get(2)?,
        })
    }

    fn insert_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.email as &dyn ToSql, &self.comment]
    }

    fn update_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.email as &dyn ToSql, &self.comment, &self.id]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn inserted_id(&self, rowid: i64) -> i64 {
        rowid
    }
}
