//! MySQL implementation of the IdentityStore trait.
//!
//! Verification records live in two nullable columns on the users table,
//! `mfa_code` (bcrypt hash) and `mfa_expires_at`. The compare-and-swap is a
//! single conditional UPDATE keyed on the current hash.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use mfa_core::domain::entities::VerificationRecord;
use mfa_core::errors::DomainError;
use mfa_core::repositories::IdentityStore;

use crate::InfrastructureError;

/// MySQL implementation of IdentityStore
#[derive(Clone)]
pub struct MySqlIdentityStore {
    /// Database connection pool
    pool: MySqlPool,
    select_sql: String,
    update_sql: String,
    swap_sql: String,
}

impl MySqlIdentityStore {
    /// Create a store over `table`
    ///
    /// The table name is interpolated into SQL, so only ASCII letters,
    /// digits and underscores are accepted.
    pub fn new(pool: MySqlPool, table: &str) -> Result<Self, InfrastructureError> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            select_sql: format!(
                "SELECT mfa_code, mfa_expires_at FROM `{}` WHERE id = ? LIMIT 1",
                table
            ),
            update_sql: format!(
                "UPDATE `{}` SET mfa_code = ?, mfa_expires_at = ? WHERE id = ?",
                table
            ),
            swap_sql: format!(
                "UPDATE `{}` SET mfa_code = ?, mfa_expires_at = ? WHERE id = ? AND mfa_code <=> ?",
                table
            ),
        })
    }

    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<VerificationRecord, DomainError> {
        let code_hash: Option<String> = row.try_get("mfa_code").map_err(|e| DomainError::Internal {
            message: format!("Failed to get mfa_code: {}", e),
        })?;
        let expires_at: Option<DateTime<Utc>> =
            row.try_get("mfa_expires_at")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get mfa_expires_at: {}", e),
                })?;

        Ok(VerificationRecord::from_parts(code_hash, expires_at))
    }
}

pub(crate) fn validate_table_name(table: &str) -> Result<(), InfrastructureError> {
    let valid = !table.is_empty()
        && table.len() <= 64
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(InfrastructureError::Config(format!(
            "Invalid users table name: {:?}",
            table
        )))
    }
}

#[async_trait]
impl IdentityStore for MySqlIdentityStore {
    async fn load_record(&self, user_id: Uuid) -> Result<VerificationRecord, DomainError> {
        let row = sqlx::query(&self.select_sql)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to load verification record: {}", e),
            })?;

        match row {
            Some(row) => Self::row_to_record(&row),
            None => Err(DomainError::NotFound {
                resource: format!("user {}", user_id),
            }),
        }
    }

    async fn store_record(
        &self,
        user_id: Uuid,
        record: &VerificationRecord,
    ) -> Result<(), DomainError> {
        sqlx::query(&self.update_sql)
            .bind(record.code_hash())
            .bind(record.expires_at())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to store verification record: {}", e),
            })?;

        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected_hash: Option<&str>,
        new_record: &VerificationRecord,
    ) -> Result<bool, DomainError> {
        // `<=>` is NULL-safe, so a cleared record matches `None`.
        let result = sqlx::query(&self.swap_sql)
            .bind(new_record.code_hash())
            .bind(new_record.expires_at())
            .bind(user_id.to_string())
            .bind(expected_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to swap verification record: {}", e),
            })?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("users").is_ok());
        assert!(validate_table_name("app_users_v2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("users; DROP TABLE users").is_err());
        assert!(validate_table_name("users`").is_err());
        assert!(validate_table_name(&"x".repeat(65)).is_err());
    }
}
