//! Utility functions

use base64::Engine;

/// Build an HTTP Basic `Authorization` header value
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            basic_auth_header("user", "password"),
            "Basic dXNlcjpwYXNzd29yZA=="
        );
        assert_eq!(basic_auth_header("", ""), "Basic Og==");
    }
}
