use std::sync::Arc;

use validator::Validate;

use crate::auth::{
    generate_salt, hash_password, verify_password, AuthResponse, Claims, SignInRequest,
    SignUpRequest, TokenIssuer,
};
use crate::error::AppError;
use crate::models::{NewUser, User, UserFilter, UserFilterQuery, UserProfile};
use crate::store::UserStore;

/// Sign-up, sign-in and token resolution.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
    /// Salt hashed against when the username is unknown, so a miss costs one
    /// bcrypt round like a wrong password does.
    decoy_salt: String,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
            decoy_salt: generate_salt(),
        }
    }

    /// Creates an account with a fresh salt. A taken username is `AppError::Conflict`.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User, AppError> {
        request.validate()?;

        let salt = generate_salt();
        let password_hash = hash_password(&request.password, &salt, self.bcrypt_cost)?;

        let user = self
            .users
            .insert(NewUser {
                username: request.username,
                password_hash,
                salt,
                is_partner: request.is_partner,
                certified: request.certified,
            })
            .await?;

        log::info!("User \"{}\" signed up", user.username);
        Ok(user)
    }

    /// Checks credentials and issues an access token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<AuthResponse, AppError> {
        let user = self.users.find_by_username(&request.username).await?;

        let valid = match &user {
            Some(user) => verify_password(&request.password, &user.salt, &user.password_hash)?,
            None => {
                hash_password(&request.password, &self.decoy_salt, self.bcrypt_cost)?;
                false
            }
        };
        if !valid {
            log::warn!("Rejected sign-in for \"{}\"", request.username);
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        let access_token = self.tokens.issue(&request.username)?;
        log::debug!("Issued access token for \"{}\"", request.username);
        Ok(AuthResponse { access_token })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify(token)
    }

    /// Maps verified claims to the stored user they name.
    pub async fn resolve(&self, claims: &Claims) -> Result<User, AppError> {
        self.users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))
    }

    pub async fn filter_users(&self, query: &UserFilterQuery) -> Result<Vec<UserProfile>, AppError> {
        let filter = UserFilter::parse(query)?;
        log::debug!("Filtering users with {:?}", filter);
        Ok(self.users.filter(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use pretty_assertions::assert_eq;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            TokenIssuer::new("service-test-secret", 3600),
            4,
        )
    }

    fn sign_in_request(username: &str, password: &str) -> SignInRequest {
        SignInRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let service = service();
        service
            .sign_up(SignUpRequest {
                username: "alice".to_string(),
                password: "password123".to_string(),
                is_partner: false,
                certified: false,
            })
            .await
            .unwrap();

        let mut messages = Vec::new();
        for request in [
            sign_in_request("alice", "wrong-password"),
            sign_in_request("mallory", "password123"),
        ] {
            match service.sign_in(request).await {
                Err(AppError::Unauthorized(msg)) => messages.push(msg),
                other => panic!("expected Unauthorized, got {:?}", other.map(|_| ())),
            }
        }
        assert_eq!(messages, vec!["Invalid credentials", "Invalid credentials"]);

        let response = service
            .sign_in(sign_in_request("alice", "password123"))
            .await
            .unwrap();
        let claims = service.verify_token(&response.access_token).unwrap();
        assert_eq!(service.resolve(&claims).await.unwrap().username, "alice");
    }

    #[test]
    fn test_decoy_salt_is_fresh_per_service() {
        let first = service();
        let second = service();
        assert_eq!(first.decoy_salt.len(), 32);
        assert_ne!(first.decoy_salt, second.decoy_salt);
    }
}
