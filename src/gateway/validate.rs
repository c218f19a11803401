//! Client-side checks run before a request leaves the process.

use chrono::NaiveDate;

use crate::error::{ClientError, ClientResult};

/// Trimmed, non-empty value of a required field.
pub fn required<'a>(field: &str, value: &'a str) -> ClientResult<&'a str> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ClientError::validation(field, format!("{} is required", field)));
    }
    Ok(v)
}

pub fn amount(field: &str, value: f64) -> ClientResult<f64> {
    if !value.is_finite() {
        return Err(ClientError::validation(field, "Amount must be a number"));
    }
    if value <= 0.0 {
        return Err(ClientError::validation(field, "Amount must be greater than zero"));
    }
    Ok(value)
}

/// Parse user-typed money. Accepts a decimal comma.
pub fn parse_amount(field: &str, text: &str) -> ClientResult<f64> {
    let t = required(field, text)?.replace(',', ".");
    let v = t
        .parse::<f64>()
        .map_err(|_| ClientError::validation(field, format!("'{}' is not a valid amount", text.trim())))?;
    amount(field, v)
}

/// ISO 4217 style: three ASCII letters, returned upper-cased.
pub fn currency(code: &str) -> ClientResult<String> {
    let c = required("currency", code)?;
    if c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ClientError::validation("currency", format!("'{}' is not a currency code", c)));
    }
    Ok(c.to_ascii_uppercase())
}

pub fn distinct_accounts(from: &str, to: &str) -> ClientResult<()> {
    if from.trim() == to.trim() {
        return Err(ClientError::validation("receiverAccountId", "Cannot transfer to the same account"));
    }
    Ok(())
}

pub fn dispute_reason(reason: &str) -> ClientResult<&str> {
    required("reason", reason).map_err(|_| ClientError::validation("reason", "Please describe the problem"))
}

pub fn email(value: &str) -> ClientResult<&str> {
    let v = required("email", value)?;
    match v.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') => Ok(v),
        _ => Err(ClientError::validation("email", "Invalid email format")),
    }
}

/// `YYYY-MM-DD`, strictly before `today`.
pub fn date_of_birth(value: &str, today: NaiveDate) -> ClientResult<NaiveDate> {
    let v = required("dateOfBirth", value)?;
    let d = NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .map_err(|_| ClientError::validation("dateOfBirth", "Date of birth must be YYYY-MM-DD"))?;
    if d >= today {
        return Err(ClientError::validation("dateOfBirth", "Date of Birth must be in the past"));
    }
    Ok(d)
}
