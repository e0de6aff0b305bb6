//! Database operations for the user directory.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stablefront_core::{UserId, WalletAddress};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    wallet_address: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let wallet_address = WalletAddress::parse(&row.wallet_address).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid wallet address in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            wallet_address,
            email: row.email,
            created_at: row.created_at,
        })
    }
}

/// Look up a user by wallet address.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored address is invalid.
pub async fn find_by_wallet(
    pool: &PgPool,
    wallet: &WalletAddress,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, wallet_address, email, created_at
         FROM users
         WHERE wallet_address = $1",
    )
    .bind(wallet.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get the user for a wallet address, creating it on first sight.
///
/// The unique constraint on `wallet_address` is the arbiter of "first creator
/// wins": the insert is `ON CONFLICT DO NOTHING`, and losing the race falls
/// back to re-reading the winner's row instead of surfacing a duplicate-key
/// error.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
/// Returns `RepositoryError::DataCorruption` if the stored address is invalid.
pub async fn find_or_create(
    pool: &PgPool,
    wallet: &WalletAddress,
) -> Result<User, RepositoryError> {
    let inserted = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (wallet_address)
         VALUES ($1)
         ON CONFLICT (wallet_address) DO NOTHING
         RETURNING id, wallet_address, email, created_at",
    )
    .bind(wallet.as_str())
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return row.try_into();
    }

    // Lost the insert race; the winner's row must exist (users are never
    // deleted).
    find_by_wallet(pool, wallet).await?.ok_or_else(|| {
        RepositoryError::DataCorruption(format!(
            "user for wallet {wallet} vanished after insert conflict"
        ))
    })
}
