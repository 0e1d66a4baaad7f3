use crate::errors::Result;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Token as returned by a client-credentials grant
#[derive(Debug, Clone)]
pub struct GrantedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone)]
struct HeldToken {
    value: String,
    expires_at: Instant,
}

/// Caches one bearer token and replaces it once it expires or is rejected
#[derive(Debug)]
pub struct TokenHolder {
    slot: Mutex<Option<HeldToken>>,
    refresh_margin: Duration,
}

impl TokenHolder {
    /// `refresh_margin` is subtracted from the granted lifetime
    pub fn new(refresh_margin: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            refresh_margin,
        }
    }

    /// Current token, acquiring a new one with `acquire` when none is valid.
    /// Concurrent callers wait for a single acquisition.
    pub async fn bearer<F, Fut>(&self, acquire: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GrantedToken>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(held) = slot.as_ref() {
            if Instant::now() < held.expires_at {
                return Ok(held.value.clone());
            }
            debug!("Access token expired, requesting a new one");
        }

        let granted = acquire().await?;
        let lifetime = granted.expires_in.saturating_sub(self.refresh_margin);
        let value = granted.access_token;
        *slot = Some(HeldToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// Forget `rejected` so the next call acquires a fresh token.
    /// A token already replaced by another caller is kept.
    pub async fn invalidate(&self, rejected: &str) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|held| held.value == rejected) {
            *slot = None;
        }
    }
}

impl Default for TokenHolder {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MediaRankError;
    use crate::providers::Provider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn grant(counter: &AtomicUsize, lifetime: Duration) -> impl Future<Output = Result<GrantedToken>> {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            Ok(GrantedToken {
                access_token: format!("token-{}", n),
                expires_in: lifetime,
            })
        }
    }

    #[tokio::test]
    async fn test_token_is_reused_while_valid() {
        let holder = TokenHolder::new(Duration::from_secs(60));
        let grants = AtomicUsize::new(0);

        let first = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();
        let second = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(first, "token-0");
        assert_eq!(second, "token-0");
        assert_eq!(grants.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        // lifetime shorter than the margin expires immediately
        let holder = TokenHolder::new(Duration::from_secs(60));
        let grants = AtomicUsize::new(0);

        holder
            .bearer(|| grant(&grants, Duration::from_secs(30)))
            .await
            .unwrap();
        let second = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(second, "token-1");
        assert_eq!(grants.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_grant() {
        let holder = TokenHolder::default();
        let grants = AtomicUsize::new(0);

        let rejected = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();
        holder.invalidate(&rejected).await;
        let token = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(token, "token-1");
    }

    #[tokio::test]
    async fn test_stale_rejection_keeps_newer_token() {
        let holder = TokenHolder::default();
        let grants = AtomicUsize::new(0);

        let stale = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();
        holder.invalidate(&stale).await;
        let fresh = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();

        // a second task reporting the same rejected token must not drop the fresh one
        holder.invalidate(&stale).await;
        let again = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(fresh, "token-1");
        assert_eq!(again, "token-1");
        assert_eq!(grants.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_grant_leaves_slot_empty() {
        let holder = TokenHolder::default();
        let result = holder
            .bearer(|| async {
                Err(MediaRankError::Auth {
                    provider: Provider::Spotify,
                    message: "invalid_client".to_string(),
                })
            })
            .await;
        assert!(matches!(result, Err(MediaRankError::Auth { .. })));

        let grants = AtomicUsize::new(0);
        let token = holder
            .bearer(|| grant(&grants, Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(token, "token-0");
    }
}
