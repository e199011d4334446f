use std::borrow::Cow;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Upper bound for `title` and `author`, in characters.
pub const NAME_MAX_CHARS: u64 = 100;
/// Upper bound for `genre`, in characters.
pub const GENRE_MAX_CHARS: u64 = 50;
pub const PRICE_MIN: Decimal = Decimal::ZERO;
pub const PRICE_MAX: Decimal = Decimal::ONE_THOUSAND;

/// A catalog entry as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Server-assigned identifier, immutable after creation
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Request body for create and update.
///
/// Every field defaults when absent, and `null` is read the same way, so that a
/// missing field is reported as a validation failure on that field instead of
/// a parse error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(default)]
pub struct BookInput {
    /// Ignored on create; must match the path id on update when present.
    pub id: Option<i64>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    pub year: i32,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub genre: Option<String>,
    #[validate(
        required(message = "is required"),
        custom(function = "price_in_range")
    )]
    #[serde(deserialize_with = "saturating_price")]
    pub price: Option<Decimal>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a JSON number as a price. Numbers beyond `Decimal`'s range saturate,
/// leaving the range check to reject them with a field error.
fn saturating_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let price = Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .unwrap_or(if value.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        });
    Ok(Some(price))
}

/// A validated book that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: Option<String>,
    pub price: Decimal,
}

impl NewBook {
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            genre: self.genre,
            price: self.price,
        }
    }
}

/// One failing field, as reported in the error envelope's `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
    pub message: String,
}

impl BookInput {
    /// Validate the payload and strip the client-supplied id.
    pub fn into_new_book(self) -> Result<NewBook, Vec<FieldError>> {
        self.validate().map_err(|errors| field_errors(&errors))?;

        Ok(NewBook {
            title: self.title,
            author: self.author,
            year: self.year,
            genre: self.genre,
            // `required` above rejects a missing price.
            price: self.price.unwrap_or_default(),
        })
    }
}

/// Flatten `validator` output into field errors sorted by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut flattened: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| FieldError {
                field: field.clone(),
                error: err.code.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect();

    flattened.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.error.cmp(&b.error)));
    flattened
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("is required")));
    }
    Ok(())
}

fn price_in_range(price: &Decimal) -> Result<(), ValidationError> {
    if *price < PRICE_MIN || *price > PRICE_MAX {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("must be between 0 and 1000")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_input() -> BookInput {
        BookInput {
            id: None,
            title: "Refactoring".to_string(),
            author: "Martin Fowler".to_string(),
            year: 1999,
            genre: Some("Software Engineering".to_string()),
            price: Some(Decimal::from_str("44.99").unwrap()),
        }
    }

    fn failing_fields(input: BookInput) -> Vec<(String, String)> {
        input
            .into_new_book()
            .unwrap_err()
            .into_iter()
            .map(|e| (e.field, e.error))
            .collect()
    }

    #[test]
    fn valid_input_becomes_new_book() {
        let new_book = valid_input().into_new_book().unwrap();
        assert_eq!(new_book.title, "Refactoring");
        assert_eq!(new_book.price, Decimal::from_str("44.99").unwrap());
    }

    #[test]
    fn client_id_is_dropped() {
        let mut input = valid_input();
        input.id = Some(42);
        let book = input.into_new_book().unwrap().with_id(7);
        assert_eq!(book.id, 7);
    }

    #[test]
    fn genre_is_optional() {
        let mut input = valid_input();
        input.genre = None;
        assert!(input.into_new_book().is_ok());
    }

    #[rstest]
    #[case("", "title", "required")]
    #[case("   ", "title", "required")]
    #[case(&"x".repeat(101), "title", "length")]
    fn title_rules(#[case] title: &str, #[case] field: &str, #[case] code: &str) {
        let mut input = valid_input();
        input.title = title.to_string();
        assert_eq!(
            failing_fields(input),
            vec![(field.to_string(), code.to_string())]
        );
    }

    #[test]
    fn title_limit_counts_characters_not_bytes() {
        let mut input = valid_input();
        input.title = "é".repeat(100);
        assert!(input.into_new_book().is_ok());
    }

    #[test]
    fn author_too_long_is_rejected() {
        let mut input = valid_input();
        input.author = "a".repeat(101);
        assert_eq!(
            failing_fields(input),
            vec![("author".to_string(), "length".to_string())]
        );
    }

    #[test]
    fn genre_too_long_is_rejected() {
        let mut input = valid_input();
        input.genre = Some("g".repeat(51));
        assert_eq!(
            failing_fields(input),
            vec![("genre".to_string(), "length".to_string())]
        );
    }

    #[rstest]
    #[case("0", true)]
    #[case("1000", true)]
    #[case("999.99", true)]
    #[case("-0.01", false)]
    #[case("1000.01", false)]
    fn price_bounds(#[case] price: &str, #[case] accepted: bool) {
        let mut input = valid_input();
        input.price = Some(Decimal::from_str(price).unwrap());
        assert_eq!(input.into_new_book().is_ok(), accepted);
    }

    #[test]
    fn every_failing_field_is_reported_in_order() {
        let input = BookInput {
            price: Some(Decimal::from(5000)),
            ..BookInput::default()
        };
        assert_eq!(
            failing_fields(input),
            vec![
                ("author".to_string(), "required".to_string()),
                ("price".to_string(), "range".to_string()),
                ("title".to_string(), "required".to_string()),
            ]
        );
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let input: BookInput = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(input.author, "");
        assert_eq!(input.genre, None);
        assert_eq!(input.price, None);
    }

    #[test]
    fn missing_price_is_required() {
        let mut input = valid_input();
        input.price = None;
        assert_eq!(
            failing_fields(input),
            vec![("price".to_string(), "required".to_string())]
        );
    }

    #[rstest]
    #[case(r#"{"title": null, "author": "Y", "price": 1}"#, "title", "required")]
    #[case(r#"{"title": "X", "author": null, "price": 1}"#, "author", "required")]
    #[case(r#"{"title": "X", "author": "Y", "price": null}"#, "price", "required")]
    #[case(r#"{"title": "X", "author": "Y", "price": 1e30}"#, "price", "range")]
    #[case(r#"{"title": "X", "author": "Y", "price": -1e30}"#, "price", "range")]
    fn null_and_huge_values_reach_validation(
        #[case] body: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let input: BookInput = serde_json::from_str(body).unwrap();
        assert_eq!(
            failing_fields(input),
            vec![(field.to_string(), code.to_string())]
        );
    }

    #[test]
    fn price_keeps_its_decimal_digits() {
        let input: BookInput =
            serde_json::from_str(r#"{"title": "X", "author": "Y", "price": 44.99}"#).unwrap();
        assert_eq!(input.price, Some(Decimal::from_str("44.99").unwrap()));
    }

    #[test]
    fn book_serializes_price_as_number() {
        let book = valid_input().into_new_book().unwrap().with_id(1);
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["price"], serde_json::json!(44.99));
        assert_eq!(value["genre"], "Software Engineering");
    }
}
