use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::error::Result;

const LISTING_COLUMNS: &str =
    "id, owner_id, brand, model, year, price, mileage, color, description, image_path, created_at";

/// Vehicle listing row. Reads are public; every mutation below carries the
/// owner id in its WHERE clause, so a caller can never touch another
/// user's row no matter what the layer above does.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: i64,
    pub owner_id: i64,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub color: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Validated field set for insert/update. Produced by the service layer;
/// never built straight from request input.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// Optional search filters, ANDed together. All absent means no constraint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchFilter {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.model.is_none()
            && self.min_year.is_none()
            && self.max_year.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

pub async fn create(db: &PgPool, owner_id: i64, listing: &NewListing) -> Result<Listing> {
    let row = sqlx::query_as::<_, Listing>(
        r#"
        INSERT INTO listings (owner_id, brand, model, year, price, mileage, color, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, owner_id, brand, model, year, price, mileage, color, description, image_path, created_at
        "#,
    )
    .bind(owner_id)
    .bind(&listing.brand)
    .bind(&listing.model)
    .bind(listing.year)
    .bind(listing.price)
    .bind(listing.mileage)
    .bind(&listing.color)
    .bind(&listing.description)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Ownership-scoped update: no row matches unless both id and owner_id do.
/// `false` covers "no such listing" and "not yours" alike.
pub async fn update(db: &PgPool, id: i64, owner_id: i64, listing: &NewListing) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE listings
        SET brand = $1, model = $2, year = $3, price = $4, mileage = $5,
            color = $6, description = $7
        WHERE id = $8 AND owner_id = $9
        "#,
    )
    .bind(&listing.brand)
    .bind(&listing.model)
    .bind(listing.year)
    .bind(listing.price)
    .bind(listing.mileage)
    .bind(&listing.color)
    .bind(&listing.description)
    .bind(id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: i64, owner_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist the opaque storage key for the listing photo. Same ownership
/// predicate as update/delete.
pub async fn set_image_path(db: &PgPool, id: i64, owner_id: i64, key: &str) -> Result<bool> {
    let result =
        sqlx::query("UPDATE listings SET image_path = $1 WHERE id = $2 AND owner_id = $3")
            .bind(key)
            .bind(id)
            .bind(owner_id)
            .execute(db)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Listing>> {
    let row = sqlx::query_as::<_, Listing>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_all(db: &PgPool) -> Result<Vec<Listing>> {
    let rows = sqlx::query_as::<_, Listing>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_owner(db: &PgPool, owner_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query_as::<_, Listing>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE owner_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn search(db: &PgPool, filter: &SearchFilter) -> Result<Vec<Listing>> {
    let mut qb = build_search_query(filter);
    let rows = qb.build_query_as::<Listing>().fetch_all(db).await?;
    Ok(rows)
}

/// One bound predicate per present filter; values only ever travel as bind
/// parameters. Brand and model match as case-insensitive substrings, the
/// numeric ranges are inclusive.
fn build_search_query(filter: &SearchFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE 1=1"
    ));

    if let Some(brand) = non_blank(&filter.brand) {
        qb.push(" AND brand ILIKE ");
        qb.push_bind(like_pattern(brand));
        qb.push(" ESCAPE '\\'");
    }
    if let Some(model) = non_blank(&filter.model) {
        qb.push(" AND model ILIKE ");
        qb.push_bind(like_pattern(model));
        qb.push(" ESCAPE '\\'");
    }
    if let Some(min_year) = filter.min_year {
        qb.push(" AND year >= ");
        qb.push_bind(min_year);
    }
    if let Some(max_year) = filter.max_year {
        qb.push(" AND year <= ");
        qb.push_bind(max_year);
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }

    qb.push(" ORDER BY created_at DESC");
    qb
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Substring pattern with LIKE metacharacters in the input neutralized, so
/// a search for "100%" matches the literal text and not everything
/// starting with "100".
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_the_list_all_query() {
        let mut qb = build_search_query(&SearchFilter::default());
        let sql = qb.sql();
        assert!(!sql.contains('$'), "no binds expected: {sql}");
        assert!(sql.ends_with("ORDER BY created_at DESC"));
    }

    #[test]
    fn each_present_filter_adds_one_bound_predicate() {
        let filter = SearchFilter {
            brand: Some("Toy".into()),
            model: None,
            min_year: Some(2015),
            max_year: Some(2020),
            min_price: None,
            max_price: None,
        };
        let mut qb = build_search_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("brand ILIKE $1"));
        assert!(sql.contains("year >= $2"));
        assert!(sql.contains("year <= $3"));
        assert!(!sql.contains("model ILIKE"), "absent filter must not appear");
        assert!(!sql.contains("price >="));
        assert!(sql.ends_with("ORDER BY created_at DESC"));
    }

    #[test]
    fn all_six_filters_bind_in_order() {
        let filter = SearchFilter {
            brand: Some("Toyota".into()),
            model: Some("Corolla".into()),
            min_year: Some(2010),
            max_year: Some(2022),
            min_price: Some(Decimal::new(500_000, 2)),
            max_price: Some(Decimal::new(2_000_000, 2)),
        };
        let mut qb = build_search_query(&filter);
        let sql = qb.sql();
        for placeholder in ["$1", "$2", "$3", "$4", "$5", "$6"] {
            assert!(sql.contains(placeholder), "{placeholder} missing: {sql}");
        }
        // values never appear in the text
        assert!(!sql.contains("Toyota"));
        assert!(!sql.contains("Corolla"));
    }

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(like_pattern("Toy"), "%Toy%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(r"back\slash"), r"%back\\slash%");

        let filter = SearchFilter {
            brand: Some("100%".into()),
            ..Default::default()
        };
        let mut qb = build_search_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("brand ILIKE $1 ESCAPE '\\'"), "{sql}");
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let filter = SearchFilter {
            brand: Some("   ".into()),
            model: Some(String::new()),
            ..Default::default()
        };
        assert!(!filter.is_empty());
        let mut qb = build_search_query(&filter);
        assert!(!qb.sql().contains('$'));
    }
}
