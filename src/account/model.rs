//! Mock account data model.

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::AccountError;

/// Length of generated user ids.
const USER_ID_LEN: usize = 9;

/// Minimum number of characters in a phone number.
pub const MIN_PHONE_LEN: usize = 10;

/// Name given to users created through login rather than signup.
pub const DEFAULT_USER_NAME: &str = "User";

/// A signed-in visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: generate_user_id(),
            name: name.into(),
            phone: phone.into(),
            email: None,
        }
    }
}

/// Random lowercase base-36 id.
pub fn generate_user_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..USER_ID_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Trim a phone number and check it is long enough.
pub fn validate_phone(phone: &str) -> Result<String, AccountError> {
    let phone = phone.trim();
    if phone.chars().count() < MIN_PHONE_LEN {
        return Err(AccountError::InvalidPhone(format!(
            "'{phone}' is shorter than {MIN_PHONE_LEN} characters"
        )));
    }
    Ok(phone.to_string())
}

/// Any six-digit code is accepted.
pub fn validate_otp(otp: &str) -> Result<(), AccountError> {
    static OTP: OnceLock<Regex> = OnceLock::new();
    let re = OTP.get_or_init(|| Regex::new(r"^\d{6}$").expect("static regex"));
    if re.is_match(otp.trim()) {
        Ok(())
    } else {
        Err(AccountError::InvalidOtp)
    }
}
