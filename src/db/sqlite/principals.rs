use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{
    db::{error::DbResult, repos::PrincipalRepo},
    models::{Authority, Principal, Role},
};

pub struct SqlitePrincipalRepo {
    pool: SqlitePool,
}

impl SqlitePrincipalRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalRepo for SqlitePrincipalRepo {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<Principal>> {
        let principal = sqlx::query(
            r#"
            SELECT id, username, roles_assigned
            FROM principals
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(principal) = principal else {
            return Ok(None);
        };

        let principal_id: i64 = principal.get("id");
        let username: String = principal.get("username");
        let roles_assigned: bool = principal.get("roles_assigned");

        if !roles_assigned {
            return Ok(Some(Principal::without_roles(username)));
        }

        // One row per (role, authority) grant; roles without grants come back
        // once with NULL authority columns.
        let rows = sqlx::query(
            r#"
            SELECT r.name AS role_name, a.name AS authority_name, a.url AS authority_url
            FROM principal_roles pr
            JOIN roles r ON r.id = pr.role_id
            LEFT JOIN role_authorities ra ON ra.role_id = r.id
            LEFT JOIN authorities a ON a.id = ra.authority_id
            WHERE pr.principal_id = ?
            ORDER BY r.id, a.id
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await?;

        let mut roles: Vec<Role> = Vec::new();
        for row in &rows {
            let role_name: String = row.get("role_name");
            if roles.last().is_none_or(|r| r.name != role_name) {
                roles.push(Role::new(role_name, Vec::new()));
            }
            let authority_name: Option<String> = row.get("authority_name");
            let authority_url: Option<String> = row.get("authority_url");
            if let (Some(name), Some(url), Some(role)) =
                (authority_name, authority_url, roles.last_mut())
            {
                role.authorities.push(Authority::new(name, url));
            }
        }

        Ok(Some(Principal::with_roles(username, roles)))
    }
}
