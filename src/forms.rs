//! Form validation.
//!
//! A [`Form`] wraps one submission's values and accumulates every failed
//! rule before the handler decides what to do, so a re-rendered form can
//! show all of its problems at once.
//!
//! ```
//! use courtside::forms::Form;
//!
//! let mut form = Form::new([
//!     ("title".to_string(), "".to_string()),
//!     ("expires".to_string(), "30".to_string()),
//! ]);
//! form.required(&["title", "expires"])
//!     .permitted_values("expires", &["365", "7", "1"]);
//!
//! assert!(!form.valid());
//! assert_eq!(form.errors().get("title"), Some("This field cannot be blank"));
//! assert_eq!(form.errors().get("expires"), Some("This field is invalid"));
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Loose email-shape check, in line with what browsers accept for `type="email"`.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// Validation messages keyed by field name.
///
/// Entries only come into existence through [`FormErrors::add`], so a field
/// present in the map always has at least one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// The first message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Every message recorded for `field`, in the order the rules ran.
    pub fn get_all(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One submission's values plus the errors found in them.
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: BTreeMap<String, Vec<String>>,
    errors: FormErrors,
}

impl Form {
    /// Builds a form from decoded `application/x-www-form-urlencoded` pairs.
    ///
    /// Repeated keys keep all of their values, in submission order.
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            values.entry(key).or_default().push(value);
        }
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    /// The first submitted value for `field`, or `""`.
    pub fn get(&self, field: &str) -> &str {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    pub fn get_all(&self, field: &str) -> &[String] {
        self.values.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Each field must be non-blank after trimming whitespace.
    pub fn required(&mut self, fields: &[&str]) -> &mut Self {
        for field in fields {
            if self.get(field).trim().is_empty() {
                self.errors.add(*field, "This field cannot be blank");
            }
        }
        self
    }

    /// At most `max` characters. Blank values are left to [`Form::required`].
    pub fn max_length(&mut self, field: &str, max: usize) -> &mut Self {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() > max {
            self.errors.add(
                field,
                format!("This field is too long (maximum is {max} characters)"),
            );
        }
        self
    }

    /// At least `min` characters. Blank values are left to [`Form::required`].
    pub fn min_length(&mut self, field: &str, min: usize) -> &mut Self {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() < min {
            self.errors.add(
                field,
                format!("This field is too short (minimum is {min} characters)"),
            );
        }
        self
    }

    pub fn permitted_values(&mut self, field: &str, allowed: &[&str]) -> &mut Self {
        let value = self.get(field);
        if !value.is_empty() && !allowed.contains(&value) {
            self.errors.add(field, "This field is invalid");
        }
        self
    }

    pub fn matches_pattern(&mut self, field: &str, pattern: &Regex) -> &mut Self {
        let value = self.get(field);
        if !value.is_empty() && !pattern.is_match(value) {
            self.errors.add(field, "This field is invalid");
        }
        self
    }

    /// Records a failure that no rule can detect, such as a taken email
    /// address or rejected credentials.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }
}

// Templates see the first value and the first message of each field.
impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values: BTreeMap<&str, &str> = self
            .values
            .keys()
            .map(|field| (field.as_str(), self.get(field)))
            .collect();
        let errors: BTreeMap<&str, &str> = self
            .errors
            .0
            .keys()
            .filter_map(|field| Some((field.as_str(), self.errors.get(field)?)))
            .collect();

        let mut state = serializer.serialize_struct("Form", 2)?;
        state.serialize_field("values", &values)?;
        state.serialize_field("errors", &errors)?;
        state.end()
    }
}
