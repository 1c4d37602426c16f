use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::AuthorityRepo,
    },
    models::Authority,
};

pub struct SqliteAuthorityRepo {
    pool: SqlitePool,
}

impl SqliteAuthorityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorityRepo for SqliteAuthorityRepo {
    async fn list_all(&self) -> DbResult<Vec<Authority>> {
        let rows = sqlx::query(
            r#"
            SELECT name, url
            FROM authorities
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Authority::new(row.get::<String, _>("name"), row.get::<String, _>("url")))
            .collect())
    }

    async fn create(&self, authority: Authority) -> DbResult<Authority> {
        sqlx::query(
            r#"
            INSERT INTO authorities (name, url)
            VALUES (?, ?)
            "#,
        )
        .bind(&authority.name)
        .bind(&authority.url)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(
                format!("Authority '{}' already exists", authority.name),
            ),
            _ => DbError::from(e),
        })?;

        Ok(authority)
    }

    async fn delete_by_name(&self, name: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM role_authorities
            WHERE authority_id IN (SELECT id FROM authorities WHERE name = ?)
            "#,
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM authorities WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
