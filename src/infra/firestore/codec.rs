//! Mapping between stored documents and catalog entities.

use std::collections::BTreeMap;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::application::repos::{CreateProductParams, RepoError, UpdateProductParams};
use crate::domain::entities::{Product, TaxonomyRecord};
use crate::domain::products::ProductFields;

use super::value::{Document, Value};

/// Fields written by a product update, in the order sent as the update mask.
pub(crate) const PRODUCT_UPDATE_MASK: &[&str] = &[
    "name",
    "price",
    "category",
    "type",
    "description",
    "image",
    "shopeeLink",
    "isBestSeller",
    "updatedAt",
    "updatedBy",
];

pub(crate) fn taxonomy_from_document(doc: &Document) -> Result<TaxonomyRecord, RepoError> {
    let reader = FieldReader::new(doc);
    Ok(TaxonomyRecord {
        id: doc.id().to_string(),
        key: reader.required_string("key")?,
        value: reader.required_string("value")?,
    })
}

pub(crate) fn taxonomy_to_fields(key: &str, value: &str) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("key".to_string(), Value::string(key)),
        ("value".to_string(), Value::string(value)),
    ])
}

/// Decode a product, applying defaults for optional fields.
///
/// A missing `name` or `price`, a negative or fractional amount, or a field of
/// an unexpected type makes the document malformed.
pub(crate) fn product_from_document(doc: &Document) -> Result<Product, RepoError> {
    let reader = FieldReader::new(doc);
    Ok(Product {
        id: doc.id().to_string(),
        name: reader.required_string("name")?,
        price: reader.required_whole("price")?,
        category: reader.string_or_default("category")?,
        product_type: reader.string_or_default("type")?,
        description: reader.string_or_default("description")?,
        image: reader.string_or_default("image")?,
        is_best_seller: reader.bool_or_default("isBestSeller")?,
        rating: reader.number_or_default("rating")?,
        sold: reader.whole_or_default("sold")?,
        shopee_link: reader.string_or_default("shopeeLink")?,
        created_at: reader.timestamp("createdAt")?,
        updated_at: reader.timestamp("updatedAt")?,
        created_by: reader.optional_string("createdBy")?,
        updated_by: reader.optional_string("updatedBy")?,
    })
}

fn editable_fields(fields: ProductFields) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("name".to_string(), Value::string(fields.name)),
        ("price".to_string(), Value::integer(fields.price)),
        ("category".to_string(), Value::string(fields.category)),
        ("type".to_string(), Value::string(fields.product_type)),
        ("description".to_string(), Value::string(fields.description)),
        ("image".to_string(), Value::string(fields.image)),
        ("shopeeLink".to_string(), Value::string(fields.shopee_link)),
        (
            "isBestSeller".to_string(),
            Value::Boolean(fields.is_best_seller),
        ),
    ])
}

fn actor(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null(()))
}

/// New products start with no rating and nothing sold.
pub(crate) fn create_product_fields(params: CreateProductParams) -> BTreeMap<String, Value> {
    let mut fields = editable_fields(params.fields);
    let stamp = Value::timestamp(params.created_at);
    let by = actor(params.created_by);
    fields.insert("rating".to_string(), Value::integer(0));
    fields.insert("sold".to_string(), Value::integer(0));
    fields.insert("createdAt".to_string(), stamp.clone());
    fields.insert("updatedAt".to_string(), stamp);
    fields.insert("createdBy".to_string(), by.clone());
    fields.insert("updatedBy".to_string(), by);
    fields
}

pub(crate) fn update_product_fields(params: UpdateProductParams) -> BTreeMap<String, Value> {
    let mut fields = editable_fields(params.fields);
    fields.insert("updatedAt".to_string(), Value::timestamp(params.updated_at));
    fields.insert("updatedBy".to_string(), actor(params.updated_by));
    fields
}

struct FieldReader<'a> {
    doc: &'a Document,
}

impl<'a> FieldReader<'a> {
    fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Present and non-null value of a field.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.doc.fields.get(field).filter(|value| !value.is_null())
    }

    fn malformed(&self, field: &str, message: impl std::fmt::Display) -> RepoError {
        RepoError::malformed(self.doc.name.clone(), format!("field `{field}`: {message}"))
    }

    fn wrong_type(&self, field: &str, expected: &str, found: &Value) -> RepoError {
        self.malformed(
            field,
            format!("expected {expected}, found {}", found.type_name()),
        )
    }

    fn optional_string(&self, field: &str) -> Result<Option<String>, RepoError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.wrong_type(field, "stringValue", other)),
        }
    }

    fn string_or_default(&self, field: &str) -> Result<String, RepoError> {
        Ok(self.optional_string(field)?.unwrap_or_default())
    }

    fn required_string(&self, field: &str) -> Result<String, RepoError> {
        self.optional_string(field)?
            .ok_or_else(|| self.malformed(field, "missing"))
    }

    fn bool_or_default(&self, field: &str) -> Result<bool, RepoError> {
        match self.get(field) {
            None => Ok(false),
            Some(Value::Boolean(value)) => Ok(*value),
            Some(other) => Err(self.wrong_type(field, "booleanValue", other)),
        }
    }

    fn number_or_default(&self, field: &str) -> Result<f64, RepoError> {
        match self.get(field) {
            None => Ok(0.0),
            Some(Value::Double(value)) => Ok(*value),
            Some(Value::Integer(raw)) => raw
                .parse::<i64>()
                .map(|value| value as f64)
                .map_err(|err| self.malformed(field, err)),
            Some(other) => Err(self.wrong_type(field, "a number", other)),
        }
    }

    fn optional_whole(&self, field: &str) -> Result<Option<u64>, RepoError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Integer(raw)) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|_| self.malformed(field, format!("`{raw}` is not a non-negative integer"))),
            Some(Value::Double(value)) => {
                if value.is_finite() && *value >= 0.0 && value.fract() == 0.0 {
                    Ok(Some(*value as u64))
                } else {
                    Err(self.malformed(field, format!("`{value}` is not a whole amount")))
                }
            }
            Some(other) => Err(self.wrong_type(field, "a number", other)),
        }
    }

    fn required_whole(&self, field: &str) -> Result<u64, RepoError> {
        self.optional_whole(field)?
            .ok_or_else(|| self.malformed(field, "missing"))
    }

    fn whole_or_default(&self, field: &str) -> Result<u64, RepoError> {
        Ok(self.optional_whole(field)?.unwrap_or(0))
    }

    /// Accepts native timestamps and the ISO-8601 strings older documents carry.
    fn timestamp(&self, field: &str) -> Result<Option<OffsetDateTime>, RepoError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Timestamp(raw)) => OffsetDateTime::parse(raw, &Rfc3339)
                .map(Some)
                .map_err(|err| self.malformed(field, err)),
            Some(Value::String(raw)) => Ok(OffsetDateTime::parse(raw, &Rfc3339).ok()),
            Some(other) => Err(self.wrong_type(field, "timestampValue", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn document(fields: serde_json::Value) -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/products/p1",
            "fields": fields,
        }))
        .expect("document")
    }

    #[test]
    fn optional_product_fields_take_defaults() {
        let product = product_from_document(&document(json!({
            "name": {"stringValue": "Gamis"},
            "price": {"integerValue": "150000"},
            "image": {"nullValue": null}
        })))
        .expect("decoded");

        assert_eq!(product.id, "p1");
        assert_eq!(product.price, 150_000);
        assert_eq!(product.category, "");
        assert_eq!(product.image, "");
        assert!(!product.is_best_seller);
        assert_eq!(product.rating, 0.0);
        assert_eq!(product.sold, 0);
        assert_eq!(product.created_at, None);
    }

    #[test]
    fn full_product_document_decodes() {
        let product = product_from_document(&document(json!({
            "name": {"stringValue": "Koko Kurta"},
            "price": {"doubleValue": 99000.0},
            "category": {"stringValue": "koko"},
            "type": {"stringValue": "dewasa"},
            "isBestSeller": {"booleanValue": true},
            "rating": {"integerValue": "4"},
            "sold": {"integerValue": "12"},
            "createdAt": {"stringValue": "2024-05-01T00:00:00.000Z"},
            "updatedAt": {"timestampValue": "2024-05-02T00:00:00Z"},
            "createdBy": {"stringValue": "admin@toko.id"}
        })))
        .expect("decoded");

        assert_eq!(product.price, 99_000);
        assert_eq!(product.product_type, "dewasa");
        assert!(product.is_best_seller);
        assert_eq!(product.rating, 4.0);
        assert_eq!(product.sold, 12);
        assert_eq!(product.created_at, Some(datetime!(2024-05-01 00:00:00 UTC)));
        assert_eq!(product.updated_at, Some(datetime!(2024-05-02 00:00:00 UTC)));
        assert_eq!(product.created_by.as_deref(), Some("admin@toko.id"));
    }

    #[test]
    fn malformed_products_are_rejected() {
        let missing_name = document(json!({"price": {"integerValue": "1"}}));
        assert!(matches!(
            product_from_document(&missing_name),
            Err(RepoError::Malformed { .. })
        ));

        let negative = document(json!({
            "name": {"stringValue": "A"},
            "price": {"integerValue": "-5"}
        }));
        assert!(product_from_document(&negative).is_err());

        let fractional = document(json!({
            "name": {"stringValue": "A"},
            "price": {"doubleValue": 10.5}
        }));
        assert!(product_from_document(&fractional).is_err());

        let wrong_type = document(json!({
            "name": {"stringValue": "A"},
            "price": {"integerValue": "1"},
            "isBestSeller": {"stringValue": "yes"}
        }));
        let err = product_from_document(&wrong_type).expect_err("wrong type");
        assert!(err.to_string().contains("isBestSeller"));
    }

    #[test]
    fn taxonomy_requires_key_and_value() {
        let doc = document(json!({"key": {"stringValue": "gamis"}}));
        assert!(taxonomy_from_document(&doc).is_err());

        let doc = document(json!({
            "key": {"stringValue": "gamis"},
            "value": {"stringValue": "Gamis"}
        }));
        let record = taxonomy_from_document(&doc).expect("decoded");
        assert_eq!((record.id.as_str(), record.key.as_str()), ("p1", "gamis"));
    }

    #[test]
    fn created_products_start_at_zero() {
        let fields = create_product_fields(CreateProductParams {
            fields: ProductFields {
                name: "Gamis".into(),
                price: 150_000,
                category: "gamis".into(),
                product_type: "dewasa".into(),
                description: String::new(),
                image: String::new(),
                shopee_link: String::new(),
                is_best_seller: false,
            },
            created_at: datetime!(2024-05-01 00:00:00 UTC),
            created_by: Some("admin@toko.id".into()),
        });

        assert_eq!(fields["sold"], Value::Integer("0".into()));
        assert_eq!(fields["rating"], Value::Integer("0".into()));
        assert_eq!(fields["type"], Value::string("dewasa"));
        assert_eq!(
            fields["createdAt"],
            Value::Timestamp("2024-05-01T00:00:00Z".into())
        );
        assert_eq!(fields["createdBy"], Value::string("admin@toko.id"));
    }

    #[test]
    fn update_mask_covers_every_written_field() {
        let fields = update_product_fields(UpdateProductParams {
            id: "p1".into(),
            fields: ProductFields {
                name: "Gamis".into(),
                price: 1,
                category: "gamis".into(),
                product_type: "dewasa".into(),
                description: String::new(),
                image: String::new(),
                shopee_link: String::new(),
                is_best_seller: true,
            },
            updated_at: datetime!(2024-05-01 00:00:00 UTC),
            updated_by: None,
        });

        let mut written: Vec<_> = fields.keys().map(String::as_str).collect();
        let mut mask = PRODUCT_UPDATE_MASK.to_vec();
        written.sort_unstable();
        mask.sort_unstable();
        assert_eq!(written, mask);
    }
}
