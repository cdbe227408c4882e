//! Shipping and contact details supplied at checkout.

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// How the order will be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cod,
    BankTransfer,
}

impl PaymentType {
    /// Parses `cod` or `bank_transfer`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "cod" => Some(PaymentType::Cod),
            "bank_transfer" => Some(PaymentType::BankTransfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cod => "cod",
            PaymentType::BankTransfer => "bank_transfer",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkout fields exactly as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub email: String,
    /// Payment type, named `types` on the wire.
    #[serde(default, rename = "types")]
    pub payment_type: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

/// Validated shipping and contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub email: String,
    pub payment_type: PaymentType,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub phone: String,
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CheckoutError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

impl ShippingForm {
    /// Checks fields in order and reports the first problem.
    ///
    /// Order: email, payment type, street, city, country, phone.
    pub fn validate(&self) -> Result<ShippingDetails> {
        let email = required("email", &self.email)?;
        if !looks_like_email(&email) {
            return Err(CheckoutError::Validation(format!(
                "email {email:?} is not a valid address"
            )));
        }

        let raw_type = required("types", &self.payment_type)?;
        let payment_type = PaymentType::parse(&raw_type).ok_or_else(|| {
            CheckoutError::Validation(format!(
                "types must be cod or bank_transfer, got {raw_type:?}"
            ))
        })?;

        let street = required("street", &self.street)?;
        let city = required("city", &self.city)?;
        let country = required("country", &self.country)?;
        let phone = required("phone", &self.phone)?;

        let state = self
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ShippingDetails {
            email,
            payment_type,
            street,
            city,
            state,
            country,
            phone,
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ShippingForm {
        ShippingForm {
            email: "teacher@school.edu".to_string(),
            payment_type: "cod".to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: None,
            country: "US".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn message(form: &ShippingForm) -> String {
        match form.validate() {
            Err(CheckoutError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_form_parses() {
        let mut form = valid_form();
        form.payment_type = "bank_transfer".to_string();
        form.state = Some("  IL ".to_string());

        let details = form.validate().unwrap();
        assert_eq!(details.payment_type, PaymentType::BankTransfer);
        assert_eq!(details.state.as_deref(), Some("IL"));
    }

    #[test]
    fn blank_state_is_dropped() {
        let mut form = valid_form();
        form.state = Some("   ".to_string());
        assert!(form.validate().unwrap().state.is_none());
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut form = ShippingForm::default();
        assert!(message(&form).starts_with("email"));

        form.email = "a@b.c".to_string();
        assert!(message(&form).starts_with("types"));

        form.payment_type = "cod".to_string();
        assert!(message(&form).starts_with("street"));

        form.street = "x".to_string();
        assert!(message(&form).starts_with("city"));

        form.city = "x".to_string();
        assert!(message(&form).starts_with("country"));

        form.country = "x".to_string();
        assert!(message(&form).starts_with("phone"));
    }

    #[test]
    fn unknown_payment_type_is_rejected() {
        let mut form = valid_form();
        form.payment_type = "crypto".to_string();
        assert!(message(&form).contains("cod or bank_transfer"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut form = valid_form();
        form.email = "no-at-sign".to_string();
        assert!(message(&form).contains("not a valid address"));
    }

    #[test]
    fn form_reads_wire_names() {
        let form: ShippingForm = serde_json::from_value(serde_json::json!({
            "email": "t@s.edu",
            "types": "cod",
            "street": "s",
            "city": "c",
            "country": "k",
            "phone": "p"
        }))
        .unwrap();
        assert_eq!(form.payment_type, "cod");
        assert!(form.validate().is_ok());
    }
}
