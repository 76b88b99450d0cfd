//! Cached resolution of user profiles.
//!
//! Profiles are read on every authenticated request, so the cache keeps one
//! entry per identity and guarantees at most one database fetch in flight
//! per identity: requests arriving while a fetch is outstanding coalesce
//! into a single follow-up fetch after the in-flight one completes instead
//! of piling up duplicate queries.
//!
//! Profile rows are created by a database trigger when an account is
//! inserted, so a freshly created identity can briefly race its first
//! profile lookup. A "not found" fetch is therefore retried exactly once
//! after a short delay; a second miss is cached as definitive and surfaced
//! as an error without re-fetching.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::Pool;
use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth_events::{AuthEvent, AuthEvents};
use crate::error::{AppError, Result};
use crate::models::profile::Profile;
use crate::repositories::profile as profile_repo;

/// Delay before the single retry of a "not found" profile fetch.
const NOT_FOUND_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on profile resolution during request authentication. A
/// stalled database call must never hang the request pipeline.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// The capability the cache fetches profiles through, so the backing store
/// is swappable and mockable.
pub trait ProfileSource: Send + Sync + 'static {
    /// Fetches the profile row for the identity, `None` when absent.
    fn fetch_profile(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Profile>>> + Send;
}

/// The production source, backed by the profiles table.
pub struct PgProfiles {
    db: Pool,
}

impl PgProfiles {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

impl ProfileSource for PgProfiles {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        profile_repo::find_by_id(&self.db, &user_id).await
    }
}

enum Slot {
    /// The profile is cached.
    Ready(Profile),
    /// The profile is definitively absent (confirmed by the retry).
    Missing,
    /// A fetch is in flight. `follow_up` records that another request
    /// arrived meanwhile and one follow-up fetch must run afterwards. The
    /// epoch identifies which fetch owns the slot, so a response from a
    /// superseded fetch can never overwrite newer state.
    Fetching { follow_up: bool, epoch: u64 },
}

/// Per-identity profile cache with in-flight de-duplication.
pub struct ProfileCache<S> {
    source: S,
    slots: Mutex<HashMap<Uuid, Slot>>,
    notify: Notify,
    epoch: std::sync::atomic::AtomicU64,
}

impl<S: ProfileSource> ProfileCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            epoch: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Resolves the profile for an identity, fetching it at most once no
    /// matter how many callers arrive concurrently.
    ///
    /// # Returns
    ///
    /// The profile, or `AppError::NotFound` when the identity has no
    /// profile row even after the retry.
    pub async fn get(&self, user_id: Uuid) -> Result<Profile> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            {
                let mut slots = self.slots.lock().await;
                match slots.get_mut(&user_id) {
                    Some(Slot::Ready(profile)) => return Ok(profile.clone()),
                    Some(Slot::Missing) => return Err(AppError::NotFound),
                    Some(Slot::Fetching { follow_up, .. }) => {
                        *follow_up = true;
                        // register for wakeup before releasing the lock so a
                        // completion between unlock and await is not lost
                        notified.as_mut().enable();
                    }
                    None => {
                        let epoch = self
                            .epoch
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        slots.insert(
                            user_id,
                            Slot::Fetching {
                                follow_up: false,
                                epoch,
                            },
                        );
                        drop(slots);
                        return self.run_fetch(user_id, epoch).await;
                    }
                }
            }
            notified.await;
        }
    }

    /// Drops the cached entry for an identity. Waiters are woken and the
    /// next request fetches fresh.
    pub async fn invalidate(&self, user_id: Uuid) {
        self.slots.lock().await.remove(&user_id);
        self.notify.notify_waiters();
    }

    /// Invalidates and immediately re-resolves the profile.
    pub async fn refresh(&self, user_id: Uuid) -> Result<Profile> {
        self.invalidate(user_id).await;
        self.get(user_id).await
    }

    /// Runs the fetch this task owns, plus at most one coalesced follow-up
    /// per completion if requests arrived in the meantime.
    async fn run_fetch(&self, user_id: Uuid, my_epoch: u64) -> Result<Profile> {
        loop {
            let outcome = self.fetch_with_retry(user_id).await;

            let mut slots = self.slots.lock().await;
            match slots.get(&user_id) {
                Some(Slot::Fetching { follow_up: true, epoch }) if *epoch == my_epoch => {
                    slots.insert(
                        user_id,
                        Slot::Fetching {
                            follow_up: false,
                            epoch: my_epoch,
                        },
                    );
                    drop(slots);
                    continue;
                }
                Some(Slot::Fetching { follow_up: false, epoch }) if *epoch == my_epoch => {
                    let result = match outcome {
                        Ok(Some(profile)) => {
                            slots.insert(user_id, Slot::Ready(profile.clone()));
                            Ok(profile)
                        }
                        Ok(None) => {
                            slots.insert(user_id, Slot::Missing);
                            Err(AppError::NotFound)
                        }
                        Err(e) => {
                            // transient failure: don't cache, let the next
                            // request try again
                            slots.remove(&user_id);
                            Err(e)
                        }
                    };
                    drop(slots);
                    self.notify.notify_waiters();
                    return result;
                }
                // the entry was invalidated (and possibly re-claimed by a
                // newer fetch) while this one was in flight; the response is
                // stale and must not overwrite newer state
                _ => {
                    drop(slots);
                    return match outcome {
                        Ok(Some(profile)) => Ok(profile),
                        Ok(None) => Err(AppError::NotFound),
                        Err(e) => Err(e),
                    };
                }
            }
        }
    }

    async fn fetch_with_retry(&self, user_id: Uuid) -> Result<Option<Profile>> {
        match self.source.fetch_profile(user_id).await? {
            Some(profile) => Ok(Some(profile)),
            None => {
                tracing::debug!(
                    "Profile {} not found, retrying once after {:?}",
                    user_id,
                    NOT_FOUND_RETRY_DELAY,
                );
                tokio::time::sleep(NOT_FOUND_RETRY_DELAY).await;
                self.source.fetch_profile(user_id).await
            }
        }
    }
}

/// The cache's subscription to auth events: sign-in refreshes the profile,
/// sign-out drops it, token refresh is a no-op. The task is cancellable via
/// [`ProfileListener::shutdown`].
pub struct ProfileListener {
    handle: JoinHandle<()>,
}

impl ProfileListener {
    pub fn spawn<S: ProfileSource>(cache: Arc<ProfileCache<S>>, events: &AuthEvents) -> Self {
        let mut rx = events.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AuthEvent::SignedIn { user_id }) => {
                        if let Err(e) = cache.refresh(user_id).await {
                            tracing::warn!(
                                "⚠️ Profile refresh after sign-in failed for {}: {}",
                                user_id,
                                e,
                            );
                        }
                    }
                    Ok(AuthEvent::SignedOut { user_id }) => {
                        cache.invalidate(user_id).await;
                    }
                    Ok(AuthEvent::TokenRefreshed { .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("⚠️ Auth event listener lagged, skipped {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { handle }
    }

    /// Cancels the listener task.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_profile(id: Uuid) -> Profile {
        Profile {
            id,
            email: "user@example.org".to_string(),
            full_name: Some("Test User".to_string()),
            role: crate::models::profile::Role::Admin,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// A scripted source: pops queued responses, then serves the default.
    struct MockSource {
        calls: Arc<AtomicUsize>,
        queue: std::sync::Mutex<VecDeque<Option<Profile>>>,
        default: Option<Profile>,
        delay: Duration,
    }

    impl MockSource {
        fn new(
            queue: Vec<Option<Profile>>,
            default: Option<Profile>,
            delay: Duration,
        ) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    queue: std::sync::Mutex::new(queue.into()),
                    default,
                    delay,
                },
                calls,
            )
        }
    }

    impl ProfileSource for MockSource {
        async fn fetch_profile(&self, _user_id: Uuid) -> Result<Option<Profile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let queued = self.queue.lock().unwrap().pop_front();
            Ok(queued.unwrap_or_else(|| self.default.clone()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_coalesce_into_one_follow_up() {
        let id = Uuid::new_v4();
        let (source, calls) =
            MockSource::new(vec![], Some(test_profile(id)), Duration::from_millis(50));
        let cache = Arc::new(ProfileCache::new(source));

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(id).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // two more requests while the first fetch is outstanding
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(id).await }
        });
        let third = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(id).await }
        });

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert!(third.await.unwrap().is_ok());

        // one initial fetch plus exactly one coalesced follow-up
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // and the result is cached afterwards
        assert!(cache.get(id).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_retried_exactly_once() {
        let id = Uuid::new_v4();
        let (source, calls) = MockSource::new(
            vec![None, Some(test_profile(id))],
            None,
            Duration::ZERO,
        );
        let cache = ProfileCache::new(source);

        let profile = cache.get(id).await.expect("retry should find the profile");
        assert_eq!(profile.id, id);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_miss_is_cached_without_further_fetches() {
        let id = Uuid::new_v4();
        let (source, calls) = MockSource::new(vec![None, None], None, Duration::ZERO);
        let cache = ProfileCache::new(source);

        assert!(matches!(cache.get(id).await, Err(AppError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // the miss is definitive; no retry loop
        assert!(matches!(cache.get(id).await, Err(AppError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_discards_stale_in_flight_result() {
        let id = Uuid::new_v4();
        let (source, calls) =
            MockSource::new(vec![], Some(test_profile(id)), Duration::from_millis(50));
        let cache = Arc::new(ProfileCache::new(source));

        let fetcher = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(id).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate(id).await;

        // the in-flight result still reaches its caller but is not cached
        assert!(fetcher.await.unwrap().is_ok());
        assert!(cache.get(id).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_event_clears_the_cached_profile() {
        let id = Uuid::new_v4();
        let (source, calls) =
            MockSource::new(vec![], Some(test_profile(id)), Duration::ZERO);
        let cache = Arc::new(ProfileCache::new(source));

        assert!(cache.get(id).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let events = AuthEvents::new(16);
        let listener = ProfileListener::spawn(cache.clone(), &events);
        events.publish(AuthEvent::SignedOut { user_id: id });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cache.get(id).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        listener.shutdown();
    }
}
