use thiserror::Error;

use crate::contact::Contact;

pub const EMAIL_SUFFIX: &str = "@gmail.com";
pub const PHONE_LENGTH: usize = 10;

const DAY_RANGE: std::ops::RangeInclusive<i64> = 1..=31;
const MONTH_RANGE: std::ops::RangeInclusive<i64> = 1..=12;
const YEAR_RANGE: std::ops::RangeInclusive<i64> = 1900..=9999;

/// Reason a record was rejected. The display text is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name and Father Name should contain only alphabetic characters.")]
    NotAlphabetic,
    #[error("Email address must end with @gmail.com.")]
    EmailDomain,
    #[error("Phone number should be a 10-digit number.")]
    PhoneFormat,
    #[error("Invalid date of birth. Please use the format dd/mm/yyyy.")]
    DateFormat,
}

type Rule = fn(&Contact) -> Result<(), ValidationError>;

/// Checked in order; the first failure wins.
const RULES: &[Rule] = &[check_names, check_email, check_phone, check_dob];

/// Run every rule against `contact`, returning the first violation.
pub fn validate(contact: &Contact) -> Result<(), ValidationError> {
    RULES.iter().try_for_each(|rule| rule(contact))
}

fn is_alphabetic(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphabetic)
}

pub fn check_names(contact: &Contact) -> Result<(), ValidationError> {
    if is_alphabetic(&contact.name) && is_alphabetic(&contact.father_name) {
        Ok(())
    } else {
        Err(ValidationError::NotAlphabetic)
    }
}

pub fn check_email(contact: &Contact) -> Result<(), ValidationError> {
    if contact.email.ends_with(EMAIL_SUFFIX) {
        Ok(())
    } else {
        Err(ValidationError::EmailDomain)
    }
}

pub fn check_phone(contact: &Contact) -> Result<(), ValidationError> {
    let phone = &contact.phone;
    if phone.chars().count() == PHONE_LENGTH && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::PhoneFormat)
    }
}

pub fn check_dob(contact: &Contact) -> Result<(), ValidationError> {
    match parse_dob(&contact.dob) {
        Some((day, month, year))
            if DAY_RANGE.contains(&day)
                && MONTH_RANGE.contains(&month)
                && YEAR_RANGE.contains(&year) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::DateFormat),
    }
}

/// Split `dd/mm/yyyy` into integer parts without range checks.
///
/// No month-length or leap-year validation is done anywhere: `31/02/2001`
/// parses and passes.
pub fn parse_dob(value: &str) -> Option<(i64, i64, i64)> {
    let mut parts = value.split('/').map(|part| part.trim().parse::<i64>());
    let day = parts.next()?.ok()?;
    let month = parts.next()?.ok()?;
    let year = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((day, month, year))
}
