pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{generate_salt, hash_password, verify_password};
pub use token::{Claims, TokenIssuer};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Payload of `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Must be between 4 and 20 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 4, max = 20),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// Must be between 8 and 64 characters long.
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    #[serde(default)]
    pub is_partner: bool,
    #[serde(default)]
    pub certified: bool,
}

/// Payload of `POST /auth/signin`. Not format-validated: anything that does not
/// match a stored account is simply rejected as bad credentials.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Response of a successful sign-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for session authentication.
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn sign_up(username: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            username: username.to_string(),
            password: password.to_string(),
            is_partner: false,
            certified: false,
        }
    }

    #[test]
    fn test_sign_up_request_validation() {
        assert!(sign_up("test_user-123", "password123").validate().is_ok());

        // Contains space and exclamation
        assert!(sign_up("test user!", "password123").validate().is_err());
        assert!(sign_up("tu", "password123").validate().is_err());
        assert!(sign_up(&"a".repeat(21), "password123").validate().is_err());
        assert!(sign_up("test_user", "short").validate().is_err());
    }

    #[test]
    fn test_sign_up_flags_default_to_false() {
        let request: SignUpRequest =
            serde_json::from_str(r#"{"username":"alice","password":"password123"}"#).unwrap();
        assert!(!request.is_partner);
        assert!(!request.certified);
    }

    #[test]
    fn test_auth_response_uses_access_token_key() {
        let json = serde_json::to_value(AuthResponse {
            access_token: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json["accessToken"], "abc");
    }
}
