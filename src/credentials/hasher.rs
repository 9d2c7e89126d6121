use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use tokio::task;

use crate::config::SecurityConfig;
use crate::services::auth_service::AuthError;

/// Argon2id hashing for API keys.
///
/// Digests are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so
/// verification reads its params from the digest and keeps working for
/// credentials hashed under older settings.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Failed to hash credential: {e}")))?;

        Ok(hash.to_string())
    }

    /// Constant-time check of `secret` against a stored digest.
    /// A malformed digest is a mismatch, never an error.
    #[must_use]
    pub fn verify(&self, digest: &str, secret: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    /// Whether `digest` was produced with different settings than the current ones.
    #[must_use]
    pub fn needs_rehash(&self, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return true;
        };

        if parsed.algorithm != Algorithm::Argon2id.ident()
            || parsed.version != Some(Version::V0x13 as u32)
        {
            return true;
        }

        let Ok(stored) = Params::try_from(&parsed) else {
            return true;
        };

        let current = self.argon2.params();
        stored.m_cost() != current.m_cost()
            || stored.t_cost() != current.t_cost()
            || stored.p_cost() != current.p_cost()
    }

    /// [`Self::hash`] on the blocking pool; Argon2 would otherwise stall the runtime.
    pub async fn hash_blocking(&self, secret: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let secret = secret.to_string();
        task::spawn_blocking(move || hasher.hash(&secret)).await?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(&self, digest: &str, secret: &str) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let digest = digest.to_string();
        let secret = secret.to_string();
        Ok(task::spawn_blocking(move || hasher.verify(&digest, &secret)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 64,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            auto_migrate_hashes: true,
        }
    }

    fn hasher() -> CredentialHasher {
        CredentialHasher::from_config(&cheap_config()).unwrap()
    }

    #[test]
    fn hash_embeds_params_and_hides_secret() {
        let digest = hasher().hash("odsp-secret").unwrap();
        assert!(digest.starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
        assert!(!digest.contains("odsp-secret"));
    }

    #[test]
    fn same_secret_gets_different_salts() {
        let h = hasher();
        let a = h.hash("repeat").unwrap();
        let b = h.hash("repeat").unwrap();
        assert_ne!(a, b);
        assert!(h.verify(&a, "repeat"));
        assert!(h.verify(&b, "repeat"));
    }

    #[test]
    fn wrong_secret_fails() {
        let h = hasher();
        let digest = h.hash("right").unwrap();
        assert!(!h.verify(&digest, "wrong"));
        assert!(!h.verify(&digest, ""));
    }

    #[test]
    fn malformed_digest_is_a_mismatch() {
        let h = hasher();
        assert!(!h.verify("", "anything"));
        assert!(!h.verify("odsp-plaintext-key", "odsp-plaintext-key"));
        assert!(!h.verify("$argon2id$garbage", "anything"));
    }

    #[test]
    fn old_params_still_verify() {
        let old = hasher();
        let digest = old.hash("carry-over").unwrap();

        let mut newer = cheap_config();
        newer.argon2_memory_cost_kib = 128;
        newer.argon2_time_cost = 2;
        let new = CredentialHasher::from_config(&newer).unwrap();

        assert!(new.verify(&digest, "carry-over"));
        assert!(new.needs_rehash(&digest));
        assert!(!old.needs_rehash(&digest));
    }

    #[test]
    fn non_argon2id_digest_needs_rehash() {
        let h = hasher();
        assert!(h.needs_rehash("not a phc string"));

        let argon2i = Argon2::new(
            Algorithm::Argon2i,
            Version::V0x13,
            Params::new(64, 1, 1, None).unwrap(),
        );
        let salt = SaltString::generate(&mut OsRng);
        let digest = argon2i.hash_password(b"legacy", &salt).unwrap().to_string();
        assert!(h.needs_rehash(&digest));
        assert!(h.verify(&digest, "legacy"));
    }

    #[test]
    fn invalid_params_rejected() {
        let mut config = cheap_config();
        config.argon2_parallelism = 0;
        assert!(matches!(
            CredentialHasher::from_config(&config),
            Err(AuthError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let h = hasher();
        let digest = h.hash_blocking("async-secret").await.unwrap();
        assert!(h.verify_blocking(&digest, "async-secret").await.unwrap());
        assert!(!h.verify_blocking(&digest, "other").await.unwrap());
    }
}
