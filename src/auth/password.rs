use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hashing with parameters fixed at construction.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
}

impl Hasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Parameters are read from the stored hash, so hashes made under an
    /// older cost setting still verify.
    pub fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(anyhow::anyhow!(e.to_string()))
            }
        }
    }

    /// Runs the hash on the blocking pool.
    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&plain)).await?
    }

    pub async fn verify_blocking(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&plain, &hash)).await?
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> Hasher {
    Hasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = fast_hasher();
        let password = "Secur3P@ssw0rd!";
        let hash = hasher.hash_password(password).expect("hashing should succeed");
        assert!(hasher
            .verify_password(password, &hash)
            .expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher
            .hash_password("correct-horse-battery-staple")
            .expect("hashing should succeed");
        assert!(!hasher
            .verify_password("correct-horse-battery-stapl3", &hash)
            .expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = fast_hasher()
            .verify_password("anything", "not-a-valid-hash")
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn salts_differ_between_calls() {
        let hasher = fast_hasher();
        let a = hasher.hash_password("12345678").unwrap();
        let b = hasher.hash_password("12345678").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn hashes_from_other_parameters_still_verify() {
        let strong = Hasher::new(&PasswordConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash_password("12345678").unwrap();
        assert!(fast_hasher().verify_password("12345678", &hash).unwrap());
    }

    #[test]
    fn rejects_impossible_parameters() {
        let cfg = PasswordConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(Hasher::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hasher = fast_hasher();
        let hash = hasher.hash_blocking("12345678".into()).await.unwrap();
        assert!(hasher
            .verify_blocking("12345678".into(), hash.clone())
            .await
            .unwrap());
        assert!(!hasher.verify_blocking("1234567".into(), hash).await.unwrap());
    }
}
