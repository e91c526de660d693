//! People repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{FullNameLookup, PersonStore};
use crate::{
    error::{AppError, AppResult},
    models::Person,
};

#[derive(Clone)]
pub struct PeopleRepository {
    pool: Pool<Postgres>,
}

impl PeopleRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FullNameLookup for PeopleRepository {
    async fn find_by_full_name(&self, full_name: &str) -> AppResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            "SELECT * FROM person WHERE full_name = $1 ORDER BY id LIMIT 1",
        )
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }
}

#[async_trait]
impl PersonStore for PeopleRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>("SELECT * FROM person WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    async fn find_all(&self) -> AppResult<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>("SELECT * FROM person ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(people)
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM person WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save(&self, person: &Person) -> AppResult<Person> {
        match person.id {
            None => {
                let created = sqlx::query_as::<_, Person>(
                    "INSERT INTO person (full_name, year_of_birth) VALUES ($1, $2) RETURNING *",
                )
                .bind(&person.full_name)
                .bind(person.year_of_birth)
                .fetch_one(&self.pool)
                .await?;
                Ok(created)
            }
            Some(id) => sqlx::query_as::<_, Person>(
                "UPDATE person SET full_name = $1, year_of_birth = $2 WHERE id = $3 RETURNING *",
            )
            .bind(&person.full_name)
            .bind(person.year_of_birth)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Person with id {} not found", id))),
        }
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM person WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Person with id {} not found", id)));
        }
        Ok(())
    }

    async fn delete_releasing_books(&self, id: i32) -> AppResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        // Locking the person blocks new loans to them until commit
        let person: Option<i32> = sqlx::query_scalar("SELECT id FROM person WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if person.is_none() {
            return Ok(None);
        }

        let released = sqlx::query(
            "UPDATE book SET person_id = NULL, date_taken = NULL WHERE person_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM person WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(released))
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM person")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
