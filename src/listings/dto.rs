use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for creating or fully replacing a listing.
#[derive(Debug, Deserialize)]
pub struct ListingBody {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    #[serde(default)]
    pub mileage: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for attaching a photo to a listing.
#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    pub image: serde_bytes::ByteBuf,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_body_optional_fields_default() {
        let body: ListingBody = serde_json::from_str(
            r#"{"brand":"Honda","model":"Civic","year":2020,"price":"9999.99"}"#,
        )
        .unwrap();
        assert_eq!(body.mileage, None);
        assert_eq!(body.color, None);
        assert_eq!(body.price, Decimal::new(999_999, 2));
    }

    #[test]
    fn price_also_accepts_a_json_number() {
        let body: ListingBody = serde_json::from_str(
            r#"{"brand":"Honda","model":"Civic","year":2020,"price":9999}"#,
        )
        .unwrap();
        assert_eq!(body.price, Decimal::new(9999, 0));
    }
}
