use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidateEmail;

/// Mainland mobile number: 11 digits, leading `1`, second digit 3-9.
static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("mobile pattern is a valid regex"));

pub fn is_valid_mobile(phone: &str) -> bool {
    MOBILE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}
