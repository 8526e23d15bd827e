use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use fixtureforge_core::{Choice, FieldDescription, FieldKind, Value};

use crate::errors::SynthesisError;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Base date for temporal generation; fixed so runs are reproducible.
pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Generate a structurally minimal value for a built-in field kind.
///
/// `attempt` is the uniqueness retry counter; every generator folds it into
/// the value so each retry yields a different candidate. Relational and
/// custom kinds never resolve here — the former go through the relationship
/// resolver, the latter through the plugin registry.
pub fn generate(
    field: &FieldDescription,
    attempt: u32,
    rng: &mut ChaCha8Rng,
) -> Result<Value, SynthesisError> {
    if !field.choices.is_empty() {
        return Ok(pick_choice(&field.choices, attempt));
    }

    match &field.kind {
        FieldKind::Integer | FieldKind::BigInteger | FieldKind::PositiveInteger => {
            Ok(Value::Int(1 + i64::from(attempt)))
        }
        FieldKind::SmallInteger | FieldKind::PositiveSmallInteger => {
            let value = (1 + i64::from(attempt)).min(i64::from(i16::MAX));
            Ok(Value::Int(value))
        }
        FieldKind::Float => Ok(Value::Float(1.0 + f64::from(attempt))),
        FieldKind::Decimal => Ok(decimal_value(field, attempt)),
        FieldKind::Text | FieldKind::Slug => Ok(Value::Text(text_value(field, attempt))),
        FieldKind::Boolean => Ok(Value::Bool(false)),
        FieldKind::Date => Ok(Value::Date(base_date() + Duration::days(i64::from(attempt)))),
        FieldKind::Time => {
            let seconds = attempt % 86_400;
            let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
                .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
            Ok(Value::Time(time))
        }
        FieldKind::DateTime => {
            let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
            let stamp = NaiveDateTime::new(base_date(), noon) + Duration::seconds(i64::from(attempt));
            Ok(Value::DateTime(stamp))
        }
        FieldKind::Uuid => {
            let bytes: [u8; 16] = rng.random();
            Ok(Value::Uuid(uuid::Uuid::from_bytes(bytes)))
        }
        FieldKind::Binary => Ok(Value::Bytes(vec![0; 1 + attempt as usize % 8])),
        FieldKind::FilePath | FieldKind::File => {
            Ok(Value::Text(format!("fixtures/{}_{attempt}.dat", field.name)))
        }
        FieldKind::Email => Ok(Value::Text(format!("u{attempt:03}@example.com"))),
        FieldKind::Url => Ok(Value::Text(format!("https://example.com/{attempt}"))),
        FieldKind::IpAddress => {
            let host = attempt + 1;
            Ok(Value::Text(format!(
                "127.0.{}.{}",
                (host >> 8) & 0xff,
                host & 0xff
            )))
        }
        FieldKind::Json => {
            if attempt == 0 {
                Ok(Value::Json(serde_json::json!({})))
            } else {
                Ok(Value::Json(serde_json::json!({ "n": attempt })))
            }
        }
        FieldKind::ForeignKey | FieldKind::OneToOne | FieldKind::ManyToMany => {
            Err(SynthesisError::UnsupportedFieldKind {
                field: field.name.clone(),
                kind: field.kind.clone(),
            })
        }
        FieldKind::Custom(_) => Err(SynthesisError::UnsupportedFieldKind {
            field: field.name.clone(),
            kind: field.kind.clone(),
        }),
    }
}

/// First leaf for attempt 0, stepping through the flattened set on retries.
fn pick_choice(choices: &[Choice], attempt: u32) -> Value {
    let leaves = Choice::flatten(choices);
    let index = attempt as usize % leaves.len().max(1);
    leaves
        .get(index)
        .map(|value| (*value).clone())
        .unwrap_or(Value::Null)
}

/// Single letter progressing with the attempt, widened with a numeric suffix
/// once the alphabet runs out. Truncation to `max_length` means a short
/// unique field eventually repeats and exhausts the retry budget, which is
/// the intended bounded failure.
fn text_value(field: &FieldDescription, attempt: u32) -> String {
    let letter = ALPHABET[attempt as usize % ALPHABET.len()] as char;
    let mut value = if (attempt as usize) < ALPHABET.len() {
        letter.to_string()
    } else {
        format!("{letter}{attempt}")
    };
    if let Some(max_length) = field.max_length {
        value.truncate(max_length as usize);
    }
    value
}

fn decimal_value(field: &FieldDescription, attempt: u32) -> Value {
    let digits = u32::from(field.max_digits.unwrap_or(10)).min(15);
    let places = u32::from(field.decimal_places.unwrap_or(0)).min(digits);
    let modulus = 10u64.pow(digits);
    let scaled = (1 + u64::from(attempt)) % modulus;
    Value::Float(scaled as f64 / 10f64.powi(places as i32))
}
