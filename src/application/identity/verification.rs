//! Phone verification codes
//!
//! One live code per phone number. Re-issuing is refused until the
//! cooldown has elapsed; codes are single-use and expire after their TTL.
//! A code is burned after [`MAX_FAILED_ATTEMPTS`] wrong guesses. Only a
//! SHA-256 digest of each code is retained, and entries are dropped once
//! used or once both expiry and cooldown have passed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::domain::{DomainError, DomainResult};

pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Returned to the caller when a code is issued.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationHandle {
    pub phone: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub cooldown_secs: u64,
    pub expires_in_secs: u64,
}

impl fmt::Debug for VerificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationHandle")
            .field("phone", &self.phone)
            .field("code", &"******")
            .field("issued_at", &self.issued_at)
            .field("cooldown_secs", &self.cooldown_secs)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

struct IssuedCode {
    digest: String,
    issued_at: Instant,
    expires_at: Instant,
    failed_attempts: u32,
}

pub struct VerificationCodes {
    issued: DashMap<String, IssuedCode>,
    cooldown: Duration,
    ttl: Duration,
    code_length: usize,
}

impl VerificationCodes {
    pub fn new(cooldown: Duration, ttl: Duration, code_length: usize) -> Self {
        Self {
            issued: DashMap::new(),
            cooldown,
            ttl,
            code_length: code_length.max(1),
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.code_cooldown(), cfg.code_ttl(), cfg.code_length)
    }

    /// Issue a code for an already validated phone number.
    pub fn issue(&self, phone: &str) -> DomainResult<VerificationHandle> {
        let now = Instant::now();
        self.prune(now);

        match self.issued.entry(phone.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(entry.get().issued_at);
                if elapsed < self.cooldown {
                    return Err(DomainError::CodeCooldown {
                        phone: phone.to_string(),
                        retry_after_secs: ceil_secs(self.cooldown - elapsed),
                    });
                }
                let (code, issued) = self.generate(now);
                entry.insert(issued);
                Ok(self.handle(phone, code))
            }
            Entry::Vacant(entry) => {
                let (code, issued) = self.generate(now);
                entry.insert(issued);
                Ok(self.handle(phone, code))
            }
        }
    }

    /// Check and consume a code.
    pub fn verify(&self, phone: &str, code: &str) -> DomainResult<()> {
        let now = Instant::now();
        let invalid = || DomainError::InvalidVerificationCode(phone.to_string());

        let mut issued = self.issued.get_mut(phone).ok_or_else(invalid)?;
        if issued.failed_attempts >= MAX_FAILED_ATTEMPTS || issued.expires_at <= now {
            return Err(invalid());
        }
        if issued.digest != digest(code) {
            issued.failed_attempts += 1;
            if issued.failed_attempts == MAX_FAILED_ATTEMPTS {
                warn!(phone, "Verification code burned after repeated failures");
            }
            return Err(invalid());
        }

        let issued_at = issued.issued_at;
        drop(issued);
        self.issued.remove_if(phone, |_, c| c.issued_at == issued_at);
        debug!(phone, "Verification code accepted");
        Ok(())
    }

    /// Drop codes that can no longer be used and no longer block a re-issue.
    fn prune(&self, now: Instant) {
        self.issued.retain(|_, c| {
            c.expires_at > now || now.saturating_duration_since(c.issued_at) < self.cooldown
        });
    }

    /// Remaining cooldown for `phone`, if any.
    pub fn cooldown_remaining(&self, phone: &str) -> Option<Duration> {
        let issued = self.issued.get(phone)?;
        let elapsed = Instant::now().saturating_duration_since(issued.issued_at);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    fn generate(&self, now: Instant) -> (String, IssuedCode) {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        let issued = IssuedCode {
            digest: digest(&code),
            issued_at: now,
            expires_at: now + self.ttl,
            failed_attempts: 0,
        };
        (code, issued)
    }

    fn handle(&self, phone: &str, code: String) -> VerificationHandle {
        VerificationHandle {
            phone: phone.to_string(),
            code,
            issued_at: Utc::now(),
            cooldown_secs: self.cooldown.as_secs(),
            expires_in_secs: self.ttl.as_secs(),
        }
    }
}

fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
