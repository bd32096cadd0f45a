//! Input validation for creating and editing clients and goals.

use crate::{
    Error, Result,
    model::{Client, ClientInput, Goal, GoalInput},
};
use regex::Regex;
use rust_decimal::Decimal;
use std::{collections::BTreeMap, fmt, str::FromStr};

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
}

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const CLIENT_REQUIRED: &str = "Please select a client";
pub const GOAL_NAME_REQUIRED: &str = "Goal name is required";
pub const GOAL_AMOUNT_POSITIVE: &str = "Goal amount must be greater than 0";

/// Validation messages keyed by field name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert<S: Into<String>>(&mut self, field: &'static str, message: S) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok` if there are no errors, otherwise a validation error carrying them.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// Lenient numeric parsing: anything that does not parse counts as zero.
fn parse_or_zero<N: FromStr + Default>(value: &str) -> N {
    value.trim().parse().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Name,
    Email,
}

impl ClientField {
    fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    values: ClientInput,
    errors: FieldErrors,
    editing: bool,
}

impl ClientForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled with an existing client's values.
    pub fn editing(client: &Client) -> Self {
        Self {
            values: ClientInput::from(client),
            errors: FieldErrors::default(),
            editing: true,
        }
    }

    pub fn set_field<S: Into<String>>(&mut self, field: ClientField, value: S) -> &mut Self {
        let value = value.into();
        match field {
            ClientField::Name => self.values.name = value,
            ClientField::Email => self.values.email = value,
        }
        self.errors.remove(field.key());
        self
    }

    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::default();
        if self.values.name.trim().is_empty() {
            errors.insert("name", NAME_REQUIRED);
        }
        if self.values.email.trim().is_empty() {
            errors.insert("email", EMAIL_REQUIRED);
        } else if !EMAIL_PATTERN.is_match(&self.values.email) {
            errors.insert("email", EMAIL_INVALID);
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validates, and hands the values to `on_submit` only when they pass.
    pub fn submit<F: FnOnce(ClientInput)>(&mut self, on_submit: F) -> bool {
        if !self.validate() {
            return false;
        }
        on_submit(self.values.clone());
        true
    }

    #[inline]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[inline]
    pub fn values(&self) -> &ClientInput {
        &self.values
    }

    #[inline]
    pub fn is_editing(&self) -> bool {
        self.editing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    ClientId,
    GoalName,
    GoalAmount,
}

impl GoalField {
    fn key(self) -> &'static str {
        match self {
            Self::ClientId => "clientId",
            Self::GoalName => "goalName",
            Self::GoalAmount => "goalAmount",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalForm {
    values: GoalInput,
    errors: FieldErrors,
    editing: bool,
}

impl GoalForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing(goal: &Goal) -> Self {
        Self {
            values: GoalInput::from(goal),
            errors: FieldErrors::default(),
            editing: true,
        }
    }

    /// Sets a field from its text form. Numbers that do not parse become zero and are then
    /// caught by validation.
    pub fn set_field<S: AsRef<str>>(&mut self, field: GoalField, value: S) -> &mut Self {
        let value = value.as_ref();
        match field {
            GoalField::ClientId => self.values.client_id = parse_or_zero(value),
            GoalField::GoalName => self.values.goal_name = String::from(value),
            GoalField::GoalAmount => self.values.goal_amount = parse_or_zero::<Decimal>(value),
        }
        self.errors.remove(field.key());
        self
    }

    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::default();
        if self.values.client_id == 0 {
            errors.insert("clientId", CLIENT_REQUIRED);
        }
        if self.values.goal_name.trim().is_empty() {
            errors.insert("goalName", GOAL_NAME_REQUIRED);
        }
        if self.values.goal_amount <= Decimal::ZERO {
            errors.insert("goalAmount", GOAL_AMOUNT_POSITIVE);
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn submit<F: FnOnce(GoalInput)>(&mut self, on_submit: F) -> bool {
        if !self.validate() {
            return false;
        }
        on_submit(self.values.clone());
        true
    }

    #[inline]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[inline]
    pub fn values(&self) -> &GoalInput {
        &self.values
    }

    #[inline]
    pub fn is_editing(&self) -> bool {
        self.editing
    }
}

/// Validates a client read from somewhere other than a form, such as an import file.
pub fn validate_client(input: &ClientInput) -> Result<()> {
    let mut form = ClientForm {
        values: input.clone(),
        ..Default::default()
    };
    form.validate();
    form.errors.into_result()
}

pub fn validate_goal(input: &GoalInput) -> Result<()> {
    let mut form = GoalForm {
        values: input.clone(),
        ..Default::default()
    };
    form.validate();
    form.errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_client_form_reports_both_fields() {
        let mut form = ClientForm::new();
        let mut called = false;
        assert!(!form.submit(|_| called = true));
        assert!(!called);
        assert_eq!(form.errors().get("name"), Some(NAME_REQUIRED));
        assert_eq!(form.errors().get("email"), Some(EMAIL_REQUIRED));
    }

    #[test]
    fn whitespace_name_is_empty() {
        let mut form = ClientForm::new();
        form.set_field(ClientField::Name, "   ")
            .set_field(ClientField::Email, "a@b.co");
        assert!(!form.validate());
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.errors().get("name"), Some(NAME_REQUIRED));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["ada", "ada@example", "@.", "ada example.com"] {
            let mut form = ClientForm::new();
            form.set_field(ClientField::Name, "Ada")
                .set_field(ClientField::Email, email);
            assert!(!form.validate(), "{email}");
            assert_eq!(form.errors().get("email"), Some(EMAIL_INVALID));
        }
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut form = ClientForm::new();
        form.validate();
        form.set_field(ClientField::Name, "A");
        assert_eq!(form.errors().get("name"), None);
        assert_eq!(form.errors().get("email"), Some(EMAIL_REQUIRED));
    }

    #[test]
    fn valid_client_is_submitted_once_with_exact_values() {
        let client = Client {
            id: 4,
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let mut form = ClientForm::editing(&client);
        assert!(form.is_editing());
        let mut submitted = Vec::new();
        assert!(form.submit(|input| submitted.push(input)));
        assert_eq!(
            submitted,
            [ClientInput {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            }]
        );
        assert!(form.errors().is_empty());
    }

    #[test]
    fn goal_form_checks_all_three_fields() {
        let mut form = GoalForm::new();
        assert!(!form.submit(|_| panic!("must not submit")));
        assert_eq!(form.errors().get("clientId"), Some(CLIENT_REQUIRED));
        assert_eq!(form.errors().get("goalName"), Some(GOAL_NAME_REQUIRED));
        assert_eq!(form.errors().get("goalAmount"), Some(GOAL_AMOUNT_POSITIVE));
    }

    #[test]
    fn unparseable_amount_counts_as_zero() {
        let mut form = GoalForm::new();
        form.set_field(GoalField::ClientId, "2")
            .set_field(GoalField::GoalName, "House")
            .set_field(GoalField::GoalAmount, "lots");
        assert!(!form.validate());
        assert_eq!(form.values().goal_amount, Decimal::ZERO);
        assert_eq!(form.errors().len(), 1);

        form.set_field(GoalField::GoalAmount, "-5");
        assert!(!form.validate());
        assert_eq!(form.errors().get("goalAmount"), Some(GOAL_AMOUNT_POSITIVE));
    }

    #[test]
    fn valid_goal_is_submitted() {
        let mut form = GoalForm::new();
        form.set_field(GoalField::ClientId, "3")
            .set_field(GoalField::GoalName, "Car")
            .set_field(GoalField::GoalAmount, "15000.50");
        let mut submitted = None;
        assert!(form.submit(|input| submitted = Some(input)));
        assert_eq!(
            submitted,
            Some(GoalInput {
                client_id: 3,
                goal_name: "Car".into(),
                goal_amount: dec!(15000.50),
            })
        );
    }

    #[test]
    fn imported_records_use_the_same_rules() {
        let error = validate_client(&ClientInput {
            name: "".into(),
            email: "x@y.z".into(),
        })
        .unwrap_err();
        assert!(error.is_validation());
        assert_eq!(error.to_string(), "Invalid input: name: Name is required");
        assert!(validate_goal(&GoalInput {
            client_id: 1,
            goal_name: "Trip".into(),
            goal_amount: dec!(1),
        })
        .is_ok());
    }
}
