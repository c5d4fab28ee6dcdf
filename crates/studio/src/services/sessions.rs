//! Live studio sessions, one per signed-in user.
//!
//! Sessions live in a `moka` cache and are dropped after sitting idle. A
//! dropped session loses its unsaved outfit history, which matches what a
//! closed browser tab would lose.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use fitting_room_core::UserId;

use super::error::StudioError;
use super::studio::{Services, StudioSession};

const MAX_SESSIONS: u64 = 10_000;

/// Registry of live sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<SessionRegistryInner>,
}

struct SessionRegistryInner {
    services: Services,
    sessions: Cache<UserId, Arc<StudioSession>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(services: Services, idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .build();

        Self {
            inner: Arc::new(SessionRegistryInner { services, sessions }),
        }
    }

    /// The user's session, created with a fresh credit balance and saved
    /// library on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Library`] if the initial credit or library read
    /// fails; no session is cached in that case.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Arc<StudioSession>, StudioError> {
        self.inner
            .sessions
            .try_get_with(user_id, async {
                debug!("Creating studio session");
                let session = StudioSession::new(user_id, &self.inner.services);
                tokio::try_join!(session.refresh_credits(), session.refresh_library())?;
                Ok::<_, StudioError>(Arc::new(session))
            })
            .await
            .map_err(|e: Arc<StudioError>| (*e).clone())
    }

    /// The user's session if one is live.
    pub async fn get(&self, user_id: UserId) -> Option<Arc<StudioSession>> {
        self.inner.sessions.get(&user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::services::LibraryStore;
    use crate::services::testing::{
        MemoryCredits, MemoryLibrary, ScriptedGenerator, StaticSuggester, test_image,
    };
    use fitting_room_core::{CreditBalance, GarmentId};

    fn registry(credits: MemoryCredits) -> SessionRegistry {
        let services = Services {
            generator: Arc::new(ScriptedGenerator::new()),
            suggester: Arc::new(StaticSuggester::new(&[])),
            credits: Arc::new(credits),
            library: Arc::new(MemoryLibrary::new()),
        };
        SessionRegistry::new(services, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_same_user_gets_same_session() {
        let registry = registry(MemoryCredits::new(10));
        let user = UserId::generate();

        let first = registry.get_or_create(user).await.expect("session");
        let second = registry.get_or_create(user).await.expect("session");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.credits().await, CreditBalance::new(10));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let registry = registry(MemoryCredits::new(10));
        let a = registry.get_or_create(UserId::generate()).await.expect("a");
        let b = registry.get_or_create(UserId::generate()).await.expect("b");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_new_session_starts_with_saved_library() {
        let library = Arc::new(MemoryLibrary::new());
        let services = Services {
            generator: Arc::new(ScriptedGenerator::new()),
            suggester: Arc::new(StaticSuggester::new(&[])),
            credits: Arc::new(MemoryCredits::new(10)),
            library: Arc::clone(&library) as Arc<dyn LibraryStore>,
        };
        let user = UserId::generate();

        // a session from an earlier visit saves a look, then goes away
        let earlier = StudioSession::new(user, &services);
        earlier.refresh_credits().await.expect("credits");
        earlier
            .finalize_model(test_image("photo"))
            .await
            .expect("finalize");
        earlier
            .apply_wardrobe_item(&GarmentId::new("gemini-tee"))
            .await
            .expect("apply");
        let saved = earlier.save_look("Weekend").await.expect("save");
        let outfit_id = saved.view.library.outfits[0].id;
        drop(earlier);

        let registry = SessionRegistry::new(services, Duration::from_secs(60));
        let session = registry.get_or_create(user).await.expect("session");
        assert_eq!(session.view().await.library.outfits.len(), 1);

        let loaded = session.load_look(outfit_id).await.expect("load");
        assert_eq!(
            loaded.view.active_garment_ids,
            vec![GarmentId::new("gemini-tee")]
        );
    }

    #[tokio::test]
    async fn test_failed_library_read_caches_no_session() {
        let library = Arc::new(MemoryLibrary::new());
        library.fail_reads(true);
        let services = Services {
            generator: Arc::new(ScriptedGenerator::new()),
            suggester: Arc::new(StaticSuggester::new(&[])),
            credits: Arc::new(MemoryCredits::new(10)),
            library: Arc::clone(&library) as Arc<dyn LibraryStore>,
        };
        let registry = SessionRegistry::new(services, Duration::from_secs(60));
        let user = UserId::generate();

        let result = registry.get_or_create(user).await;
        assert!(matches!(result, Err(StudioError::Library(_))));
        assert!(registry.get(user).await.is_none());

        library.fail_reads(false);
        registry.get_or_create(user).await.expect("retry");
    }
}
