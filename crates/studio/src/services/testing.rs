//! In-memory implementations of the service traits for tests.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for the integration-test crate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};

use fitting_room_core::{
    CreditBalance, GarmentId, ImageRef, OutfitLayer, SavedModel, SavedModelId, SavedOutfit,
    SavedOutfitId, UserId,
};

use super::auth::{AuthError, Authenticator};
use super::generation::{GenerationError, ImageGenerator, OutfitSuggester, SuggestionItem};
use super::store::{CreditsStore, LibraryStore, StoreError};
use super::studio::{Services, StudioSession};
use crate::models::AuthenticatedUser;
use crate::payments::{CreditGrant, PaymentLedger, WebhookOutcome};

/// A generated image that is easy to recognise in assertions.
///
/// # Panics
///
/// Never; the input is always a well-formed data URL.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn test_image(tag: &str) -> ImageRef {
    use base64::Engine as _;
    let data = base64::engine::general_purpose::STANDARD.encode(tag);
    ImageRef::from_base64("image/png", &data).unwrap_or_else(|_| unreachable!())
}

/// One recorded generator call.
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub images: Vec<ImageRef>,
    pub prompt: String,
}

/// Generator that replays queued results, then falls back to numbered images.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<ImageRef, GenerationError>>>,
    calls: Mutex<Vec<GenerateCall>>,
    counter: AtomicUsize,
    gate: Option<Gate>,
}

struct Gate {
    entered: Notify,
    release: Notify,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call blocks until [`release`](Self::release) is called.
    #[must_use]
    pub fn gated() -> Self {
        Self {
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::default()
        }
    }

    /// Queue the result of the next call.
    pub async fn push(&self, response: Result<ImageRef, GenerationError>) {
        self.responses.lock().await.push_back(response);
    }

    /// Wait until a gated call is in flight.
    pub async fn wait_entered(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    /// Let a gated call finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.release.notify_one();
        }
    }

    pub async fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        images: &[ImageRef],
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        self.calls.lock().await.push(GenerateCall {
            images: images.to_vec(),
            prompt: prompt.to_owned(),
        });

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if let Some(response) = self.responses.lock().await.pop_front() {
            return response;
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(test_image(&format!("generated-{n}")))
    }
}

/// Suggester that always returns the same answer.
pub struct StaticSuggester {
    answer: Result<Vec<GarmentId>, GenerationError>,
    calls: AtomicUsize,
}

impl StaticSuggester {
    #[must_use]
    pub fn new(ids: &[&str]) -> Self {
        Self {
            answer: Ok(ids.iter().map(|id| GarmentId::new(*id)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn failing(error: GenerationError) -> Self {
        Self {
            answer: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutfitSuggester for StaticSuggester {
    async fn suggest(
        &self,
        _items: &[SuggestionItem],
        _theme: &str,
    ) -> Result<Vec<GarmentId>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Credit store backed by a map. New users start with the default balance.
pub struct MemoryCredits {
    default: CreditBalance,
    balances: Mutex<HashMap<UserId, CreditBalance>>,
    atomic: bool,
    fail_writes: AtomicBool,
    set_calls: AtomicUsize,
}

impl MemoryCredits {
    #[must_use]
    pub fn new(default: u32) -> Self {
        Self {
            default: CreditBalance::new(default),
            balances: Mutex::new(HashMap::new()),
            atomic: true,
            fail_writes: AtomicBool::new(false),
            set_calls: AtomicUsize::new(0),
        }
    }

    /// Report [`StoreError::Unsupported`] for atomic decrements.
    #[must_use]
    pub const fn without_atomic_decrement(mut self) -> Self {
        self.atomic = false;
        self
    }

    /// Make every write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn balance(&self, user: UserId) -> CreditBalance {
        self.balances
            .lock()
            .await
            .get(&user)
            .copied()
            .unwrap_or(self.default)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditsStore for MemoryCredits {
    async fn get_credits(&self, user: UserId) -> Result<CreditBalance, StoreError> {
        Ok(*self.balances.lock().await.entry(user).or_insert(self.default))
    }

    async fn set_credits(
        &self,
        user: UserId,
        credits: CreditBalance,
    ) -> Result<CreditBalance, StoreError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.balances.lock().await.insert(user, credits);
        Ok(credits)
    }

    async fn decrement_credits(&self, user: UserId) -> Result<CreditBalance, StoreError> {
        if !self.atomic {
            return Err(StoreError::Unsupported);
        }
        self.check_writable()?;
        let mut balances = self.balances.lock().await;
        let balance = balances.entry(user).or_insert(self.default);
        if balance.is_empty() {
            return Err(StoreError::Exhausted);
        }
        *balance = balance.spend_one();
        Ok(*balance)
    }

    async fn add_credits(&self, user: UserId, credits: u32) -> Result<CreditBalance, StoreError> {
        self.check_writable()?;
        let mut balances = self.balances.lock().await;
        let balance = balances.entry(user).or_insert(self.default);
        *balance = balance.add(credits);
        Ok(*balance)
    }
}

/// Library store backed by vectors, newest first.
#[derive(Default)]
pub struct MemoryLibrary {
    models: Mutex<Vec<SavedModel>>,
    outfits: Mutex<Vec<SavedOutfit>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every list fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn model_count(&self) -> usize {
        self.models.lock().await.len()
    }

    pub async fn outfit_count(&self) -> usize {
        self.outfits.lock().await.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write refused".to_string()));
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for MemoryLibrary {
    async fn list_models(&self, user: UserId) -> Result<Vec<SavedModel>, StoreError> {
        self.check_readable()?;
        let models = self.models.lock().await;
        Ok(models.iter().filter(|m| m.user_id == user).cloned().collect())
    }

    async fn insert_model(
        &self,
        user: UserId,
        name: &str,
        image: &ImageRef,
    ) -> Result<SavedModel, StoreError> {
        self.check_writable()?;
        let model = SavedModel {
            id: SavedModelId::generate(),
            user_id: user,
            name: name.to_owned(),
            image_url: image.clone(),
            created_at: Utc::now(),
        };
        self.models.lock().await.insert(0, model.clone());
        Ok(model)
    }

    async fn delete_model(&self, user: UserId, id: SavedModelId) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut models = self.models.lock().await;
        let before = models.len();
        models.retain(|m| !(m.id == id && m.user_id == user));
        if models.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_outfits(&self, user: UserId) -> Result<Vec<SavedOutfit>, StoreError> {
        self.check_readable()?;
        let outfits = self.outfits.lock().await;
        Ok(outfits.iter().filter(|o| o.user_id == user).cloned().collect())
    }

    async fn insert_outfit(
        &self,
        user: UserId,
        name: &str,
        thumbnail: &ImageRef,
        layers: &[OutfitLayer],
    ) -> Result<SavedOutfit, StoreError> {
        self.check_writable()?;
        let outfit = SavedOutfit {
            id: SavedOutfitId::generate(),
            user_id: user,
            name: name.to_owned(),
            thumbnail_url: thumbnail.clone(),
            layers: layers.to_vec(),
            created_at: Utc::now(),
        };
        self.outfits.lock().await.insert(0, outfit.clone());
        Ok(outfit)
    }

    async fn delete_outfit(&self, user: UserId, id: SavedOutfitId) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut outfits = self.outfits.lock().await;
        let before = outfits.len();
        outfits.retain(|o| !(o.id == id && o.user_id == user));
        if outfits.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Authenticator with a fixed token table.
#[derive(Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `user`.
    #[must_use]
    pub fn with_user(mut self, token: &str, user: AuthenticatedUser) -> Self {
        self.users.insert(token.to_owned(), user);
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn user_for_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.users.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

/// Payment ledger that tops up a [`MemoryCredits`] store.
pub struct MemoryPayments {
    credits: Arc<MemoryCredits>,
    seen: Mutex<HashSet<String>>,
}

impl MemoryPayments {
    #[must_use]
    pub fn new(credits: Arc<MemoryCredits>) -> Self {
        Self {
            credits,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub async fn recorded(&self) -> usize {
        self.seen.lock().await.len()
    }
}

#[async_trait]
impl PaymentLedger for MemoryPayments {
    async fn apply_webhook(
        &self,
        webhook_id: &str,
        _event_type: &str,
        grant: Option<CreditGrant>,
    ) -> Result<WebhookOutcome, StoreError> {
        let mut seen = self.seen.lock().await;
        if seen.contains(webhook_id) {
            return Ok(WebhookOutcome::Duplicate);
        }
        let outcome = match grant {
            Some(grant) => WebhookOutcome::Credited(
                self.credits.add_credits(grant.user_id, grant.credits).await?,
            ),
            None => WebhookOutcome::Recorded,
        };
        seen.insert(webhook_id.to_owned());
        Ok(outcome)
    }
}

/// A session wired to fresh fakes, with handles to each of them.
pub struct Harness {
    pub user_id: UserId,
    pub generator: Arc<ScriptedGenerator>,
    pub suggester: Arc<StaticSuggester>,
    pub credits: Arc<MemoryCredits>,
    pub library: Arc<MemoryLibrary>,
    pub session: Arc<StudioSession>,
}

impl Harness {
    /// Build a session whose user starts with `credits`.
    ///
    /// # Panics
    ///
    /// Never; the in-memory credit read cannot fail.
    pub async fn new(credits: u32) -> Self {
        Self::with(ScriptedGenerator::new(), StaticSuggester::new(&[]), MemoryCredits::new(credits))
            .await
    }

    /// Build a session from specific fakes.
    ///
    /// # Panics
    ///
    /// Never; the in-memory credit read cannot fail.
    #[allow(clippy::missing_panics_doc)]
    pub async fn with(
        generator: ScriptedGenerator,
        suggester: StaticSuggester,
        credits: MemoryCredits,
    ) -> Self {
        let user_id = UserId::generate();
        let generator = Arc::new(generator);
        let suggester = Arc::new(suggester);
        let credits = Arc::new(credits);
        let library = Arc::new(MemoryLibrary::new());

        let services = Services {
            generator: Arc::clone(&generator) as Arc<dyn ImageGenerator>,
            suggester: Arc::clone(&suggester) as Arc<dyn OutfitSuggester>,
            credits: Arc::clone(&credits) as Arc<dyn CreditsStore>,
            library: Arc::clone(&library) as Arc<dyn LibraryStore>,
        };
        let session = Arc::new(StudioSession::new(user_id, &services));
        if session.refresh_credits().await.is_err() {
            unreachable!("in-memory credit reads do not fail");
        }

        Self {
            user_id,
            generator,
            suggester,
            credits,
            library,
            session,
        }
    }
}
