use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;

/// Key holding the plaintext password in a pguser secret
pub const PASSWORD_KEY: &str = "password";

/// Key holding the SCRAM verifier derived from the password
pub const VERIFIER_KEY: &str = "verifier";

/// Return the secret with its password replaced
///
/// The verifier is blanked so the Crunchy operator recomputes it from the
/// new password on its next reconcile.
pub fn with_password(mut secret: Secret, password: &str) -> Secret {
    let string_data = secret.string_data.get_or_insert_with(BTreeMap::new);
    string_data.insert(PASSWORD_KEY.to_string(), password.to_string());
    string_data.insert(VERIFIER_KEY.to_string(), String::new());
    secret
}

/// Read the password the operator generated for a user
pub fn read_password(secret: &Secret) -> Option<String> {
    let from_data = secret
        .data
        .as_ref()
        .and_then(|data| data.get(PASSWORD_KEY))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok());

    from_data.or_else(|| {
        secret
            .string_data
            .as_ref()
            .and_then(|data| data.get(PASSWORD_KEY))
            .cloned()
    })
}
