use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// A stored account. The hash and salt never leave the server.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub is_partner: bool,
    pub certified: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything a store needs to create a `User`; the id and timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub is_partner: bool,
    pub certified: bool,
}

/// Public projection returned by `GET /auth/filtering`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub username: String,
    pub is_partner: bool,
    pub certified: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            is_partner: user.is_partner,
            certified: user.certified,
        }
    }
}

/// Query parameters of `GET /auth/filtering`.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilterQuery {
    /// Comma-separated badge names, e.g. `certified,isPartner`.
    pub filter: Option<String>,
    /// Comma-separated subset of `delivery,pickup`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Flag constraints for listing users. `None` means "either value".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserFilter {
    pub is_partner: Option<bool>,
    pub certified: Option<bool>,
}

impl UserFilter {
    /// Translates badge and type lists into flag constraints.
    ///
    /// Every badge present requires its flag to be true. A single type pins
    /// `is_partner` (`delivery` is a partner, `pickup` is not) and overrides an
    /// `isPartner` badge; both types together leave it open.
    pub fn parse(query: &UserFilterQuery) -> Result<Self, AppError> {
        let mut filter = UserFilter::default();

        for badge in split_list(query.filter.as_deref().unwrap_or("")) {
            match badge {
                "certified" => filter.certified = Some(true),
                "isPartner" | "is_partner" => filter.is_partner = Some(true),
                other => {
                    return Err(AppError::BadRequest(format!("Unknown badge \"{}\"", other)));
                }
            }
        }

        let kinds = split_list(query.kind.as_deref().unwrap_or("delivery,pickup"));
        for kind in &kinds {
            if *kind != "delivery" && *kind != "pickup" {
                return Err(AppError::BadRequest(format!("Unknown type \"{}\"", kind)));
            }
        }
        if let [only] = kinds.as_slice() {
            filter.is_partner = Some(*only == "delivery");
        }

        Ok(filter)
    }

    pub fn matches(&self, user: &User) -> bool {
        self.is_partner.map_or(true, |v| user.is_partner == v)
            && self.certified.map_or(true, |v| user.certified == v)
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query(filter: Option<&str>, kind: Option<&str>) -> UserFilterQuery {
        UserFilterQuery {
            filter: filter.map(str::to_string),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_leave_everything_open() {
        assert_eq!(UserFilter::parse(&query(None, None)).unwrap(), UserFilter::default());
        assert_eq!(
            UserFilter::parse(&query(Some(""), Some("delivery,pickup"))).unwrap(),
            UserFilter::default()
        );
    }

    #[test]
    fn test_badges_and_types() {
        assert_eq!(
            UserFilter::parse(&query(Some("certified,"), None)).unwrap(),
            UserFilter {
                is_partner: None,
                certified: Some(true),
            }
        );
        assert_eq!(
            UserFilter::parse(&query(None, Some("delivery"))).unwrap().is_partner,
            Some(true)
        );
        assert_eq!(
            UserFilter::parse(&query(Some("isPartner"), Some("pickup"))).unwrap().is_partner,
            Some(false)
        );
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        assert!(matches!(
            UserFilter::parse(&query(Some("verified"), None)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            UserFilter::parse(&query(None, Some("drone"))),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_profile_hides_credentials() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            salt: "00".repeat(16),
            is_partner: true,
            certified: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("salt").is_none());
        assert_eq!(
            UserProfile::from(&user),
            UserProfile {
                username: "alice".to_string(),
                is_partner: true,
                certified: false,
            }
        );
    }
}
