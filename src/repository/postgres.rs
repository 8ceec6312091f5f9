use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{NewPermission, NewRole, NewUser, Permission, Role, User};

use super::{AccessRepository, StoreError, StoreResult, UserRepository};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed entity store.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

fn duplicate_or(err: sqlx::Error, entity: &'static str, value: &str) -> StoreError {
    match sqlstate(&err).as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::Duplicate {
            entity,
            value: value.to_string(),
        },
        _ => StoreError::Unavailable(err),
    }
}

/// Maps a foreign-key failure on a join insert to the side that is missing.
/// `left`/`right` are `(entity, id)`; the constraint name tells them apart.
fn missing_or(
    err: sqlx::Error,
    table: &str,
    left: (&'static str, i64),
    right: (&'static str, i64),
) -> StoreError {
    let violated = match err.as_database_error() {
        Some(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            Some(db.constraint().map(str::to_owned))
        }
        _ => None,
    };

    match violated {
        Some(constraint) => {
            let (entity, id) = missing_side(table, constraint.as_deref(), left, right);
            StoreError::MissingReference { entity, id }
        }
        None => StoreError::Unavailable(err),
    }
}

// Constraint names follow `<table>_<entity>_id_fkey` (see migrations/).
fn missing_side(
    table: &str,
    constraint: Option<&str>,
    left: (&'static str, i64),
    right: (&'static str, i64),
) -> (&'static str, i64) {
    let right_fkey = format!("{}_{}_id_fkey", table, right.0);
    if constraint == Some(right_fkey.as_str()) {
        right
    } else {
        left
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, "user", &user.email))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(user))
    }
}

#[async_trait]
impl AccessRepository for PgRepository {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn find_role(&self, id: i64) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        sqlx::query_as::<_, Role>("INSERT INTO roles (name) VALUES ($1) RETURNING *")
            .bind(&role.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, "role", &role.name))
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    async fn create_permission(&self, permission: NewPermission) -> StoreResult<Permission> {
        sqlx::query_as::<_, Permission>("INSERT INTO permissions (name) VALUES ($1) RETURNING *")
            .bind(&permission.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, "permission", &permission.name))
    }

    async fn assign_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| missing_or(e, "user_roles", ("user", user_id), ("role", role_id)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn grant_permission(&self, role_id: i64, permission_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            missing_or(
                e,
                "role_permissions",
                ("role", role_id),
                ("permission", permission_id),
            )
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn roles_of_user(&self, user_id: i64) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.* FROM roles r
            JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn permissions_of_role(&self, role_id: i64) -> StoreResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.* FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn permissions_of_user(&self, user_id: i64) -> StoreResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT DISTINCT p.* FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            JOIN user_roles ur ON rp.role_id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_name_selects_the_missing_side() {
        let user = ("user", 1);
        let role = ("role", 9);

        assert_eq!(
            missing_side("user_roles", Some("user_roles_role_id_fkey"), user, role),
            role
        );
        assert_eq!(
            missing_side("user_roles", Some("user_roles_user_id_fkey"), user, role),
            user
        );
    }

    #[test]
    fn permission_side_is_reported_for_role_permissions() {
        let role = ("role", 2);
        let permission = ("permission", 5);

        assert_eq!(
            missing_side(
                "role_permissions",
                Some("role_permissions_permission_id_fkey"),
                role,
                permission,
            ),
            permission
        );
        assert_eq!(missing_side("role_permissions", None, role, permission), role);
    }

    #[test]
    fn non_database_errors_stay_unavailable() {
        let err = missing_or(sqlx::Error::PoolTimedOut, "user_roles", ("user", 1), ("role", 2));
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
