use rust_decimal::Decimal;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::listings::dto::ListingBody;
use crate::listings::repo::{self, Listing, NewListing};

// First production automobile; nothing plausible predates it.
const MIN_YEAR: i32 = 1886;

// Column widths from the schema; anything longer must fail here as a
// validation error rather than inside the database driver.
const MAX_BRAND_LEN: usize = 50;
const MAX_MODEL_LEN: usize = 50;
const MAX_COLOR_LEN: usize = 30;

/// Field validation ahead of storage. Brand/model must survive trimming
/// and fit their columns, the year must be plausible (up to next year's
/// models), price strictly positive, mileage non-negative with absent
/// meaning zero.
pub(crate) fn validate(body: ListingBody) -> Result<NewListing> {
    let brand = body.brand.trim().to_string();
    if brand.is_empty() {
        return Err(ApiError::Validation("brand is required".into()));
    }
    if brand.len() > MAX_BRAND_LEN {
        return Err(ApiError::Validation(format!(
            "brand must be at most {MAX_BRAND_LEN} characters"
        )));
    }
    let model = body.model.trim().to_string();
    if model.is_empty() {
        return Err(ApiError::Validation("model is required".into()));
    }
    if model.len() > MAX_MODEL_LEN {
        return Err(ApiError::Validation(format!(
            "model must be at most {MAX_MODEL_LEN} characters"
        )));
    }

    let max_year = OffsetDateTime::now_utc().year() + 1;
    if body.year < MIN_YEAR || body.year > max_year {
        return Err(ApiError::Validation(format!(
            "year must be between {MIN_YEAR} and {max_year}"
        )));
    }

    if body.price <= Decimal::ZERO {
        return Err(ApiError::Validation("price must be positive".into()));
    }

    let mileage = body.mileage.unwrap_or(0);
    if mileage < 0 {
        return Err(ApiError::Validation("mileage cannot be negative".into()));
    }

    let color = trim_to_none(body.color);
    if color.as_deref().is_some_and(|c| c.len() > MAX_COLOR_LEN) {
        return Err(ApiError::Validation(format!(
            "color must be at most {MAX_COLOR_LEN} characters"
        )));
    }

    Ok(NewListing {
        brand,
        model,
        year: body.year,
        price: body.price,
        mileage,
        color,
        description: trim_to_none(body.description),
    })
}

/// Gate for side effects that must not run on someone else's listing.
/// A missing row and a foreign row collapse into the same error.
pub(crate) fn require_owner(listing: Option<Listing>, owner_id: i64) -> Result<Listing> {
    match listing {
        Some(listing) if listing.owner_id == owner_id => Ok(listing),
        _ => Err(ApiError::NotFoundOrForbidden),
    }
}

fn trim_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub async fn create_listing(db: &PgPool, owner_id: i64, body: ListingBody) -> Result<Listing> {
    let new_listing = validate(body)?;
    let listing = repo::create(db, owner_id, &new_listing).await?;
    info!(listing_id = listing.id, owner_id, "listing created");
    Ok(listing)
}

/// The unmatched case is reported as `NotFoundOrForbidden` without saying
/// which; the row either does not exist or belongs to someone else.
pub async fn update_listing(db: &PgPool, id: i64, owner_id: i64, body: ListingBody) -> Result<()> {
    let new_listing = validate(body)?;
    if !repo::update(db, id, owner_id, &new_listing).await? {
        return Err(ApiError::NotFoundOrForbidden);
    }
    info!(listing_id = id, owner_id, "listing updated");
    Ok(())
}

pub async fn delete_listing(db: &PgPool, id: i64, owner_id: i64) -> Result<()> {
    if !repo::delete(db, id, owner_id).await? {
        return Err(ApiError::NotFoundOrForbidden);
    }
    info!(listing_id = id, owner_id, "listing deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> ListingBody {
        ListingBody {
            brand: "Toyota".into(),
            model: "Corolla".into(),
            year: 2018,
            price: Decimal::new(1_250_000, 2), // 12500.00
            mileage: Some(42_000),
            color: Some("blue".into()),
            description: None,
        }
    }

    #[test]
    fn accepts_a_sound_listing() {
        let listing = validate(body()).expect("valid");
        assert_eq!(listing.brand, "Toyota");
        assert_eq!(listing.mileage, 42_000);
    }

    #[test]
    fn rejects_blank_brand_and_model() {
        let mut b = body();
        b.brand = "   ".into();
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.model = String::new();
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_implausible_years() {
        let mut b = body();
        b.year = 1885;
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.year = OffsetDateTime::now_utc().year() + 2;
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.year = OffsetDateTime::now_utc().year() + 1; // next model year is fine
        assert!(validate(b).is_ok());
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut b = body();
        b.price = Decimal::ZERO;
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.price = Decimal::new(-100, 2);
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));
    }

    #[test]
    fn mileage_defaults_to_zero_and_rejects_negative() {
        let mut b = body();
        b.mileage = None;
        assert_eq!(validate(b).unwrap().mileage, 0);

        let mut b = body();
        b.mileage = Some(-1);
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_text_longer_than_its_column() {
        let mut b = body();
        b.brand = "x".repeat(MAX_BRAND_LEN + 1);
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.model = "x".repeat(MAX_MODEL_LEN + 1);
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        let mut b = body();
        b.color = Some("x".repeat(MAX_COLOR_LEN + 1));
        assert!(matches!(validate(b), Err(ApiError::Validation(_))));

        // exactly at the limit still fits
        let mut b = body();
        b.brand = "x".repeat(MAX_BRAND_LEN);
        b.color = Some("x".repeat(MAX_COLOR_LEN));
        assert!(validate(b).is_ok());
    }

    fn listing_owned_by(owner_id: i64) -> Listing {
        Listing {
            id: 1,
            owner_id,
            brand: "Toyota".into(),
            model: "Corolla".into(),
            year: 2018,
            price: Decimal::new(1_250_000, 2),
            mileage: 42_000,
            color: None,
            description: None,
            image_path: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn require_owner_admits_only_the_owner() {
        assert!(require_owner(Some(listing_owned_by(7)), 7).is_ok());
        assert!(matches!(
            require_owner(Some(listing_owned_by(7)), 8),
            Err(ApiError::NotFoundOrForbidden)
        ));
        assert!(matches!(
            require_owner(None, 7),
            Err(ApiError::NotFoundOrForbidden)
        ));
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        let mut b = body();
        b.color = Some("  ".into());
        b.description = Some(String::new());
        let listing = validate(b).unwrap();
        assert_eq!(listing.color, None);
        assert_eq!(listing.description, None);
    }
}
