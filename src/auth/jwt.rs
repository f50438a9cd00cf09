use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::claims::{Claims, Subject, TokenScope},
    config::JwtConfig,
    state::AppState,
};

/// Signing and verification keys plus the per-scope lifetimes. Built once at
/// startup and shared read-only.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    pub issuer: String,
    pub audience: String,
    pub standard_ttl: Duration,
    pub verified_ttl: Duration,
    pub test_user_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = cfg.leeway_seconds;
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud"]);

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            standard_ttl: minutes(cfg.ttl_minutes),
            verified_ttl: minutes(cfg.verified_ttl_minutes),
            test_user_ttl: minutes(cfg.test_user_ttl_minutes),
        }
    }

    pub fn ttl_for(&self, scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Standard => self.standard_ttl,
            TokenScope::Verified => self.verified_ttl,
            TokenScope::TestUser => self.test_user_ttl,
        }
    }

    pub fn issue(&self, subject: Subject, ttl: Duration) -> anyhow::Result<String> {
        self.issue_at(subject, ttl, OffsetDateTime::now_utc())
    }

    /// Signs with an explicit issue time.
    pub fn issue_at(
        &self,
        subject: Subject,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let user_id = subject.id;
        let claims = subject.into_claims(
            now.unix_timestamp() as usize,
            exp.unix_timestamp() as usize,
            &self.issuer,
            &self.audience,
        );
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, ttl_secs = ttl.as_secs(), "jwt signed");
        Ok(token)
    }

    /// Issues a token whose claims and lifetime follow the subject's scope.
    pub fn issue_for_scope(&self, subject: Subject, scope: TokenScope) -> anyhow::Result<String> {
        let ttl = self.ttl_for(scope);
        self.issue(subject, ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs((m.max(0) as u64).saturating_mul(60))
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 15,
        verified_ttl_minutes: 25,
        test_user_ttl_minutes: 5,
        leeway_seconds: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&test_config())
    }

    fn subject() -> Subject {
        Subject {
            id: Uuid::new_v4(),
            ..Default::default()
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let subject = Subject {
            verified: true,
            ..subject()
        };
        let token = keys
            .issue(subject.clone(), Duration::from_secs(60))
            .expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, subject.id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.verified, Some(true));
        assert_eq!(claims.admin, None);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn token_has_three_segments() {
        let token = make_keys().issue(subject(), Duration::from_secs(60)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn accepted_just_before_expiry() {
        let keys = make_keys();
        let ttl = Duration::from_secs(600);
        // issued so that 10s of lifetime remain
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(590);
        let token = keys.issue_at(subject(), ttl, issued).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn rejected_just_after_expiry() {
        let keys = make_keys();
        let ttl = Duration::from_secs(600);
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(605);
        let token = keys.issue_at(subject(), ttl, issued).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn rejects_foreign_secret() {
        let keys = make_keys();
        let other = JwtKeys::new(&JwtConfig {
            secret: "someone-else".into(),
            ..test_config()
        });
        let token = other.issue(subject(), Duration::from_secs(60)).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = make_keys();
        let bad = JwtKeys::new(&JwtConfig {
            issuer: "bad-iss".into(),
            audience: "bad-aud".into(),
            ..test_config()
        });
        let token = good.issue(subject(), Duration::from_secs(60)).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn rejects_tampered_signature() {
        let keys = make_keys();
        let token = keys.issue(subject(), Duration::from_secs(60)).unwrap();
        let (head, sig) = token.rsplit_once('.').unwrap();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{head}.{flipped}{}", &sig[1..]);
        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn scope_selects_ttl() {
        let keys = make_keys();
        assert_eq!(keys.ttl_for(TokenScope::Standard), Duration::from_secs(15 * 60));
        assert_eq!(keys.ttl_for(TokenScope::Verified), Duration::from_secs(25 * 60));
        assert_eq!(keys.ttl_for(TokenScope::TestUser), Duration::from_secs(5 * 60));

        let token = keys
            .issue_for_scope(subject(), TokenScope::TestUser)
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }
}
