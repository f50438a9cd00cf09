use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Login tier. Only selects how long the token lives; role claims always
/// mirror the stored flags through [`Subject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Standard,
    Verified,
    TestUser,
}

impl TokenScope {
    pub fn for_user(user: &User) -> Self {
        if user.test_user {
            TokenScope::TestUser
        } else if user.verified {
            TokenScope::Verified
        } else {
            TokenScope::Standard
        }
    }
}

/// Facts about the subject as supplied to the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub verified: bool,
    pub admin: bool,
    pub test_user: bool,
}

impl From<&User> for Subject {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            verified: u.verified,
            admin: u.admin,
            test_user: u.test_user,
        }
    }
}

/// JWT payload. Role flags are only present when set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_user: Option<bool>,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.admin.unwrap_or(false)
    }

    /// Author-or-admin check used by resource handlers.
    pub fn may_modify(&self, owner: Uuid) -> bool {
        self.id == owner || self.is_admin()
    }
}

fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Subject {
    pub(crate) fn into_claims(self, iat: usize, exp: usize, iss: &str, aud: &str) -> Claims {
        Claims {
            id: self.id,
            verified: flag(self.verified),
            admin: flag(self.admin),
            test_user: flag(self.test_user),
            iat,
            exp,
            iss: iss.to_string(),
            aud: aud.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(verified: bool, test_user: bool) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            username: "testing".into(),
            first_name: "p".into(),
            last_name: "user".into(),
            password_hash: String::new(),
            verified,
            admin: false,
            test_user,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn scope_follows_stored_flags() {
        assert_eq!(TokenScope::for_user(&user(false, false)), TokenScope::Standard);
        assert_eq!(TokenScope::for_user(&user(true, false)), TokenScope::Verified);
        assert_eq!(TokenScope::for_user(&user(false, true)), TokenScope::TestUser);
        // test accounts win even when also verified
        assert_eq!(TokenScope::for_user(&user(true, true)), TokenScope::TestUser);
    }

    #[test]
    fn subject_copies_every_flag() {
        let u = user(true, true);
        let subject = Subject::from(&u);
        assert_eq!(subject.id, u.id);
        assert!(subject.verified && subject.test_user && !subject.admin);
    }

    #[test]
    fn unset_flags_are_omitted_from_payload() {
        let claims = Subject {
            id: Uuid::new_v4(),
            admin: true,
            ..Default::default()
        }
        .into_claims(1, 2, "iss", "aud");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["admin"], true);
        assert!(json.get("verified").is_none());
        assert!(json.get("test_user").is_none());
        assert!(claims.is_admin());
        assert_eq!(claims.verified, None);
    }

    #[test]
    fn may_modify_allows_owner_and_admin() {
        let owner = Uuid::new_v4();
        let mut claims = Subject {
            id: Uuid::new_v4(),
            ..Default::default()
        }
        .into_claims(1, 2, "iss", "aud");
        assert!(!claims.may_modify(owner));
        claims.admin = Some(true);
        assert!(claims.may_modify(owner));
        claims.admin = None;
        claims.id = owner;
        assert!(claims.may_modify(owner));
    }
}
