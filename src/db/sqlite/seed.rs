use sqlx::SqlitePool;

use crate::db::{error::DbResult, seed::SeedFile};

/// Counts of records written by [`import_seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub authorities: usize,
    pub roles: usize,
    pub principals: usize,
}

/// Import a seed file into a migrated SQLite database in one transaction.
///
/// Existing records with the same name are updated in place, so store order
/// (ascending id) is kept for authorities that already exist. A role's grants
/// and a principal's assignments are replaced by the seed's lists.
pub async fn import_seed(pool: &SqlitePool, seed: &SeedFile) -> DbResult<SeedStats> {
    let mut tx = pool.begin().await?;

    for authority in &seed.authorities {
        sqlx::query(
            r#"
            INSERT INTO authorities (name, url)
            VALUES (?, ?)
            ON CONFLICT (name) DO UPDATE SET url = excluded.url
            "#,
        )
        .bind(&authority.name)
        .bind(&authority.url)
        .execute(&mut *tx)
        .await?;
    }

    for role in &seed.roles {
        sqlx::query("INSERT INTO roles (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(&role.name)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM role_authorities
            WHERE role_id = (SELECT id FROM roles WHERE name = ?)
            "#,
        )
        .bind(&role.name)
        .execute(&mut *tx)
        .await?;

        for authority in &role.authorities {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO role_authorities (role_id, authority_id)
                SELECT r.id, a.id FROM roles r, authorities a
                WHERE r.name = ? AND a.name = ?
                "#,
            )
            .bind(&role.name)
            .bind(authority)
            .execute(&mut *tx)
            .await?;
        }
    }

    for principal in &seed.principals {
        sqlx::query(
            r#"
            INSERT INTO principals (username, roles_assigned)
            VALUES (?, ?)
            ON CONFLICT (username) DO UPDATE SET roles_assigned = excluded.roles_assigned
            "#,
        )
        .bind(&principal.username)
        .bind(principal.roles.is_some())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM principal_roles
            WHERE principal_id = (SELECT id FROM principals WHERE username = ?)
            "#,
        )
        .bind(&principal.username)
        .execute(&mut *tx)
        .await?;

        for role in principal.roles.iter().flatten() {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO principal_roles (principal_id, role_id)
                SELECT p.id, r.id FROM principals p, roles r
                WHERE p.username = ? AND r.name = ?
                "#,
            )
            .bind(&principal.username)
            .bind(role)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let stats = SeedStats {
        authorities: seed.authorities.len(),
        roles: seed.roles.len(),
        principals: seed.principals.len(),
    };
    tracing::info!(
        authorities = stats.authorities,
        roles = stats.roles,
        principals = stats.principals,
        "Imported seed data"
    );
    Ok(stats)
}
