//! Validation of cluster requests
//!
//! Checks run before anything is submitted to the control plane. Every
//! failure is a client error.

use crate::controller::error::{Error, Result};
use crate::controller::types::ClusterRequest;

/// Maximum length of a DNS-1035 label
pub const MAX_NAME_LENGTH: usize = 63;

/// Validate a create request
///
/// `require_password` is set when this service manages user credentials.
pub fn validate_request(req: &ClusterRequest, require_password: bool) -> Result<()> {
    let password_missing = require_password && req.password.as_deref().is_none_or(str::is_empty);

    if req.name.is_empty()
        || req.user.is_empty()
        || password_missing
        || req.databases.is_empty()
        || req.storage.is_empty()
    {
        let required = if require_password {
            "name, user, password, databases, and storage are required"
        } else {
            "name, user, databases, and storage are required"
        };
        return Err(Error::ValidationError(required.to_string()));
    }

    validate_name(&req.name)?;
    validate_user(&req.user)?;
    validate_databases(&req.databases)?;
    validate_storage(&req.storage)?;
    Ok(())
}

/// Validate a cluster name
///
/// The name prefixes the Services the operator creates, so it must be a
/// DNS-1035 label.
pub fn validate_name(name: &str) -> Result<()> {
    validate_dns_label("name", name)
}

/// Validate a user name
///
/// The user is embedded in the `<cluster>-pguser-<user>` secret name.
pub fn validate_user(user: &str) -> Result<()> {
    validate_dns_label("user", user)
}

fn validate_dns_label(field: &str, value: &str) -> Result<()> {
    if value.len() > MAX_NAME_LENGTH {
        return Err(Error::ValidationError(format!(
            "{} must be at most {} characters: {}",
            field, MAX_NAME_LENGTH, value
        )));
    }

    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let starts_with_letter = value.starts_with(|c: char| c.is_ascii_lowercase());
    let ends_alphanumeric =
        value.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit());

    if !valid_chars || !starts_with_letter || !ends_alphanumeric {
        return Err(Error::ValidationError(format!(
            "{} must consist of lowercase letters, digits and '-', start with a letter and end with a letter or digit: {}",
            field, value
        )));
    }

    Ok(())
}

fn validate_databases(databases: &[String]) -> Result<()> {
    if databases.iter().any(String::is_empty) {
        return Err(Error::ValidationError(
            "database names must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate a storage quantity (e.g., "1Gi", "500Mi")
///
/// Exactly one unit suffix after a run of ASCII digits.
pub fn validate_storage(size: &str) -> Result<()> {
    let Some(digits) = size
        .strip_suffix("Gi")
        .or_else(|| size.strip_suffix("Mi"))
        .or_else(|| size.strip_suffix("Ti"))
    else {
        return Err(Error::ValidationError(format!(
            "storage size must end with Gi, Mi, or Ti: {}",
            size
        )));
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ValidationError(format!(
            "invalid storage size number: {}",
            size
        )));
    }

    let num: u64 = digits
        .parse()
        .map_err(|_| Error::ValidationError(format!("invalid storage size number: {}", size)))?;

    if num == 0 {
        return Err(Error::ValidationError(format!(
            "storage size must be positive: {}",
            size
        )));
    }

    Ok(())
}
