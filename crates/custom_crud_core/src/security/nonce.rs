//! Anti-forgery tokens for destructive admin links.
//!
//! # Responsibility
//! - Issue short tokens bound to one user and one action string.
//! - Verify tokens inside a two-tick validity window.
//!
//! # Invariants
//! - A token is `base64url(HMAC-SHA-256(secret, tick|user|action)[..12])`.
//! - `tick = ceil(now / (lifetime / 2))`; the current and previous tick verify.
//! - Comparison is constant-time; empty tokens never verify.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

/// Default token lifetime (one day).
pub const DEFAULT_NONCE_LIFETIME: Duration = Duration::from_secs(86_400);
/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_BYTES: usize = 16;

const GENERATED_SECRET_BYTES: usize = 32;
const TOKEN_DIGEST_BYTES: usize = 12;

type HmacSha256 = Hmac<Sha256>;

/// How old a verified token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Issued in the current tick.
    Fresh,
    /// Issued in the previous tick; still accepted.
    Aging,
}

/// Construction errors for [`NonceIssuer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    SecretTooShort { min: usize, actual: usize },
    /// The MAC backend refused the key.
    InvalidSecret,
    LifetimeTooShort(Duration),
}

impl Display for NonceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SecretTooShort { min, actual } => {
                write!(f, "nonce secret must be at least {min} bytes, got {actual}")
            }
            Self::InvalidSecret => write!(f, "nonce secret was rejected by HMAC-SHA-256"),
            Self::LifetimeTooShort(lifetime) => {
                write!(f, "nonce lifetime must be at least 2s, got {}s", lifetime.as_secs())
            }
        }
    }
}

impl Error for NonceError {}

/// Issues and verifies anti-forgery tokens.
#[derive(Clone)]
pub struct NonceIssuer {
    mac: HmacSha256,
    half_lifetime_secs: u64,
}

impl std::fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceIssuer")
            .field("half_lifetime_secs", &self.half_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl NonceIssuer {
    /// Creates an issuer with a caller-provided secret.
    pub fn new(secret: impl Into<Vec<u8>>, lifetime: Duration) -> Result<Self, NonceError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(NonceError::SecretTooShort {
                min: MIN_SECRET_BYTES,
                actual: secret.len(),
            });
        }
        let half_lifetime_secs = lifetime.as_secs() / 2;
        if half_lifetime_secs == 0 {
            return Err(NonceError::LifetimeTooShort(lifetime));
        }
        let mac = HmacSha256::new_from_slice(&secret).map_err(|_| NonceError::InvalidSecret)?;
        Ok(Self {
            mac,
            half_lifetime_secs,
        })
    }

    /// Creates an issuer with a random per-process secret.
    ///
    /// Tokens issued by it do not survive a restart.
    pub fn with_random_secret(lifetime: Duration) -> Result<Self, NonceError> {
        let mut secret = vec![0u8; GENERATED_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret, lifetime)
    }

    /// Issues a token for `user` + `action` at the current time.
    pub fn issue(&self, user: &str, action: &str) -> String {
        self.issue_at(user, action, unix_now_secs())
    }

    /// Verifies a token for `user` + `action` at the current time.
    pub fn verify(&self, user: &str, action: &str, token: &str) -> Option<NonceAge> {
        self.verify_at(user, action, token, unix_now_secs())
    }

    /// Issues a token as of `now_secs` (seconds since the Unix epoch).
    pub fn issue_at(&self, user: &str, action: &str, now_secs: u64) -> String {
        self.token_for_tick(self.tick(now_secs), user, action)
    }

    /// Verifies a token as of `now_secs` (seconds since the Unix epoch).
    pub fn verify_at(
        &self,
        user: &str,
        action: &str,
        token: &str,
        now_secs: u64,
    ) -> Option<NonceAge> {
        if token.is_empty() {
            return None;
        }
        let tick = self.tick(now_secs);
        if tokens_match(&self.token_for_tick(tick, user, action), token) {
            return Some(NonceAge::Fresh);
        }
        if tick > 0 && tokens_match(&self.token_for_tick(tick - 1, user, action), token) {
            return Some(NonceAge::Aging);
        }
        None
    }

    fn tick(&self, now_secs: u64) -> u64 {
        now_secs.div_ceil(self.half_lifetime_secs)
    }

    fn token_for_tick(&self, tick: u64, user: &str, action: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{user}|{action}").as_bytes());
        let digest = mac.finalize().into_bytes();
        URL_SAFE_NO_PAD.encode(&digest[..TOKEN_DIGEST_BYTES])
    }
}

/// Token action for deleting record `id`.
pub fn delete_action(id: &str) -> String {
    format!("delete_custom_data_{id}")
}

fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[cfg(test)]
mod tests {
    use super::{delete_action, HmacSha256, NonceAge, NonceError, NonceIssuer};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use hmac::Mac;
    use std::time::Duration;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const LIFETIME: Duration = Duration::from_secs(100);

    fn issuer() -> NonceIssuer {
        NonceIssuer::new(SECRET, LIFETIME).expect("issuer should build")
    }

    #[test]
    fn token_is_truncated_hmac_of_tick_user_and_action() {
        // 1_000s with a 50s half lifetime is tick 20.
        let token = issuer().issue_at("alice", "delete_custom_data_1", 1_000);

        let mut mac = HmacSha256::new_from_slice(SECRET).expect("hmac key");
        mac.update(b"20|alice|delete_custom_data_1");
        let digest = mac.finalize().into_bytes();
        assert_eq!(token, URL_SAFE_NO_PAD.encode(&digest[..12]));
    }

    #[test]
    fn tokens_are_short_url_safe_strings() {
        let token = issuer().issue_at("alice", &delete_action("1"), 1_000);
        assert_eq!(token.len(), 16);
        assert!(token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn token_verifies_for_two_ticks_then_expires() {
        let issuer = issuer();
        let action = delete_action("7");
        // Half lifetime is 50s, so 1_000 sits at the end of tick 20.
        let token = issuer.issue_at("alice", &action, 1_000);

        assert_eq!(
            issuer.verify_at("alice", &action, &token, 1_000),
            Some(NonceAge::Fresh)
        );
        assert_eq!(
            issuer.verify_at("alice", &action, &token, 1_050),
            Some(NonceAge::Aging)
        );
        assert_eq!(issuer.verify_at("alice", &action, &token, 1_051), None);
    }

    #[test]
    fn token_is_bound_to_user_action_and_secret() {
        let issuer = issuer();
        let token = issuer.issue_at("alice", &delete_action("1"), 500);

        assert_eq!(issuer.verify_at("bob", &delete_action("1"), &token, 500), None);
        assert_eq!(issuer.verify_at("alice", &delete_action("2"), &token, 500), None);

        let other = NonceIssuer::new(b"fedcba9876543210fedcba9876543210".to_vec(), LIFETIME)
            .expect("issuer should build");
        assert_eq!(other.verify_at("alice", &delete_action("1"), &token, 500), None);
    }

    #[test]
    fn empty_and_garbage_tokens_never_verify() {
        let issuer = issuer();
        assert_eq!(issuer.verify_at("alice", "x", "", 500), None);
        assert_eq!(issuer.verify_at("alice", "x", "not-a-token", 500), None);
    }

    #[test]
    fn rejects_weak_configuration() {
        assert_eq!(
            NonceIssuer::new(b"short".to_vec(), LIFETIME).expect_err("short secret"),
            NonceError::SecretTooShort { min: 16, actual: 5 }
        );
        assert!(matches!(
            NonceIssuer::new(SECRET, Duration::from_secs(1)),
            Err(NonceError::LifetimeTooShort(_))
        ));
    }

    #[test]
    fn random_secret_issuers_do_not_share_tokens() {
        let first = NonceIssuer::with_random_secret(LIFETIME).expect("issuer");
        let second = NonceIssuer::with_random_secret(LIFETIME).expect("issuer");
        let token = first.issue_at("alice", "x", 500);
        assert_eq!(second.verify_at("alice", "x", &token, 500), None);
    }
}
