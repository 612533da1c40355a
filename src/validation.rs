//! Per-field validation for the specification record.
//!
//! Only `totalArea`, `balconies` and `ceilingHeight` are checked; every
//! other field is accepted as-is.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::models::{HomeSpecifications, SpecField};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("Required")] Required,
    #[error("Must be a number")] NotANumber,
    #[error("Cannot be negative")] Negative,
    #[error("Must be positive")] NotPositive,
}

/// Parses a form value as a decimal number.
///
/// Surrounding whitespace is ignored. Anything `f64::from_str` accepts is a
/// number ("+5", "1e3", ".5", "5.") except the non-finite spellings
/// ("inf", "NaN"); trailing garbage such as "12abc" is rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validates a single field. First failing rule wins.
pub fn validate_field(field: SpecField, raw: &str) -> Option<FieldError> {
    if !matches!(field, SpecField::TotalArea | SpecField::Balconies | SpecField::CeilingHeight) {
        return None;
    }
    if raw.trim().is_empty() {
        return Some(FieldError::Required);
    }
    let Some(num) = parse_number(raw) else {
        return Some(FieldError::NotANumber);
    };
    match field {
        SpecField::Balconies if num < 0.0 => Some(FieldError::Negative),
        SpecField::TotalArea | SpecField::CeilingHeight if num <= 0.0 => Some(FieldError::NotPositive),
        _ => None,
    }
}

/// One error slot per specification field, always all ten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    slots: [Option<FieldError>; SpecField::COUNT],
}

impl ValidationErrors {
    /// Validates every field of `specs`.
    pub fn for_specifications(specs: &HomeSpecifications) -> Self {
        let mut errors = Self::default();
        for field in SpecField::ALL {
            errors.revalidate(field, specs.get(field));
        }
        errors
    }

    /// Recomputes the slot of `field` only.
    pub fn revalidate(&mut self, field: SpecField, raw: &str) {
        self.slots[field.index()] = validate_field(field, raw);
    }

    pub fn get(&self, field: SpecField) -> Option<FieldError> {
        self.slots[field.index()]
    }

    pub fn has_errors(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SpecField::COUNT))?;
        for field in SpecField::ALL {
            map.serialize_entry(field.as_str(), &self.get(field).map(|e| e.to_string()))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Choice;
    use pretty_assertions::assert_eq;

    const CHECKED: [SpecField; 3] = [SpecField::TotalArea, SpecField::Balconies, SpecField::CeilingHeight];

    #[test]
    fn blank_values_are_required() {
        for field in CHECKED {
            for raw in ["", " ", "\t\n"] {
                assert_eq!(validate_field(field, raw), Some(FieldError::Required), "{field} {raw:?}");
            }
        }
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        for field in CHECKED {
            for raw in ["abc", "12abc", "0x10", "1,000", "inf", "NaN", "--1"] {
                assert_eq!(validate_field(field, raw), Some(FieldError::NotANumber), "{field} {raw:?}");
            }
        }
    }

    #[test]
    fn accepted_number_forms() {
        for raw in ["5", " 5 ", "+5", "1e3", ".5", "5.", "1200.75"] {
            assert!(parse_number(raw).is_some(), "{raw:?}");
            assert_eq!(validate_field(SpecField::TotalArea, raw), None, "{raw:?}");
        }
    }

    #[test]
    fn balconies_cannot_be_negative_but_may_be_zero() {
        assert_eq!(validate_field(SpecField::Balconies, "-1"), Some(FieldError::Negative));
        assert_eq!(validate_field(SpecField::Balconies, "-0.5"), Some(FieldError::Negative));
        assert_eq!(validate_field(SpecField::Balconies, "0"), None);
        assert_eq!(validate_field(SpecField::Balconies, "3"), None);
    }

    #[test]
    fn area_and_ceiling_must_be_positive() {
        for field in [SpecField::TotalArea, SpecField::CeilingHeight] {
            assert_eq!(validate_field(field, "0"), Some(FieldError::NotPositive));
            assert_eq!(validate_field(field, "-4"), Some(FieldError::NotPositive));
            assert_eq!(validate_field(field, "0.1"), None);
        }
    }

    #[test]
    fn unchecked_fields_never_error() {
        let unchecked = SpecField::ALL.into_iter().filter(|f| !CHECKED.contains(f));
        for field in unchecked {
            for raw in ["", "abc", "-1", "0", "5+"] {
                assert_eq!(validate_field(field, raw), None, "{field} {raw:?}");
            }
        }
    }

    #[test]
    fn messages_match_the_form_copy() {
        assert_eq!(FieldError::Required.to_string(), "Required");
        assert_eq!(FieldError::NotANumber.to_string(), "Must be a number");
        assert_eq!(FieldError::Negative.to_string(), "Cannot be negative");
        assert_eq!(FieldError::NotPositive.to_string(), "Must be positive");
    }

    #[test]
    fn has_errors_tracks_any_slot() {
        let table: [(&str, &str, &str, bool); 6] = [
            ("1200", "1", "10", false),
            ("", "1", "10", true),
            ("1200", "-1", "10", true),
            ("1200", "1", "0", true),
            ("x", "-1", "0", true),
            ("1", "0", "8.5", false),
        ];
        for (area, balconies, ceiling, expected) in table {
            let specs = HomeSpecifications {
                total_area: area.into(),
                balconies: balconies.into(),
                ceiling_height: ceiling.into(),
                bedrooms: "lots".into(),
                ..HomeSpecifications::default()
            };
            let errors = ValidationErrors::for_specifications(&specs);
            assert_eq!(errors.has_errors(), expected, "{area:?} {balconies:?} {ceiling:?}");
        }
    }

    #[test]
    fn revalidate_touches_one_slot() {
        let mut errors = ValidationErrors::for_specifications(&HomeSpecifications::default());
        assert!(!errors.has_errors());

        errors.revalidate(SpecField::TotalArea, "");
        assert_eq!(errors.get(SpecField::TotalArea), Some(FieldError::Required));
        assert_eq!(errors.get(SpecField::Balconies), None);

        errors.revalidate(SpecField::TotalArea, "900");
        assert!(!errors.has_errors());
    }

    #[test]
    fn serializes_all_ten_keys() {
        let specs = HomeSpecifications { balconies: "-2".into(), garden: Choice::Yes, ..Default::default() };
        let value = serde_json::to_value(ValidationErrors::for_specifications(&specs)).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 10);
        assert_eq!(map["balconies"], "Cannot be negative");
        assert!(map["totalArea"].is_null());
        assert!(map["garden"].is_null());
    }
}
