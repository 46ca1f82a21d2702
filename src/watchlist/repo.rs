use sqlx::PgPool;

use crate::error::Result;
use crate::listings::repo::Listing;

/// Idempotent add. `false` means the pair was already present, which is
/// not a fault. A vanished listing or user trips the foreign key and maps
/// to `NotFoundOrForbidden` upstream.
pub async fn add(db: &PgPool, user_id: i64, listing_id: i64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO watchlist (user_id, listing_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, listing_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(listing_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove(db: &PgPool, user_id: i64, listing_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2")
        .bind(user_id)
        .bind(listing_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn contains(db: &PgPool, user_id: i64, listing_id: i64) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM watchlist WHERE user_id = $1 AND listing_id = $2)",
    )
    .bind(user_id)
    .bind(listing_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// The watched listings themselves, most recently watched first. Entries
/// for deleted listings are gone via the cascade, so the join never
/// produces dangling rows.
pub async fn list_for_user(db: &PgPool, user_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query_as::<_, Listing>(
        r#"
        SELECT l.id, l.owner_id, l.brand, l.model, l.year, l.price, l.mileage,
               l.color, l.description, l.image_path, l.created_at
        FROM listings l
        INNER JOIN watchlist w ON l.id = w.listing_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
