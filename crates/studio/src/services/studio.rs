//! The studio session: one user's model, outfit history, wardrobe and
//! library, plus the generation pipeline that changes them.
//!
//! Every action that calls the generator follows the same shape:
//!
//! 1. claim the session's busy flag (a second trigger gets [`StudioError::Busy`])
//! 2. lock the state, check preconditions, snapshot the inputs, unlock
//! 3. await the remote call with no lock held
//! 4. lock again and commit the transition
//! 5. charge one credit through the [`CreditLedger`]
//!
//! A failure in step 3 returns before anything is committed or charged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use fitting_room_core::catalog::{self, MODEL_PROMPT};
use fitting_room_core::{
    CreditBalance, EditInstruction, GarmentId, HistoryError, ImageRef, Library, OutfitHistory,
    OutfitLayer, PoseIndex, SavedModelId, SavedOutfitId, Tentative, UserId, Wardrobe, WardrobeItem,
};

use super::credits::CreditLedger;
use super::error::StudioError;
use super::generation::{ImageGenerator, OutfitSuggester, SuggestionItem};
use super::store::{CreditsStore, LibraryStore, StoreError};
use crate::models::{ActionOutcome, LayerView, Notice, StudioView};

/// Shown when a generation succeeded but the server kept the old balance.
pub const CREDIT_SAVE_FAILED: &str = "Couldn't save your credit usage.";

const OUT_OF_CREDITS: &str = "You are out of credits for this action.";
const OUT_OF_CREDITS_GARMENT: &str = "You are out of credits to add a new garment.";
const OUT_OF_CREDITS_POSE: &str = "You are out of credits to generate a new pose.";
const OUT_OF_CREDITS_LOOK: &str = "You are out of credits to save a look.";

/// External collaborators shared by every session.
#[derive(Clone)]
pub struct Services {
    pub generator: Arc<dyn ImageGenerator>,
    pub suggester: Arc<dyn OutfitSuggester>,
    pub credits: Arc<dyn CreditsStore>,
    pub library: Arc<dyn LibraryStore>,
}

struct StudioState {
    /// The finalized base model image.
    model_image: Option<ImageRef>,
    history: Option<OutfitHistory>,
    pose: PoseIndex,
    wardrobe: Wardrobe,
    library: Library,
    activity: Option<String>,
}

impl StudioState {
    fn new() -> Self {
        Self {
            model_image: None,
            history: None,
            pose: PoseIndex::FRONT,
            wardrobe: Wardrobe::starter(),
            library: Library::default(),
            activity: None,
        }
    }

    fn display_image(&self) -> Option<&ImageRef> {
        self.history
            .as_ref()
            .and_then(|history| history.display_image(self.pose.instruction()))
            .or(self.model_image.as_ref())
    }

    fn history(&self) -> Result<&OutfitHistory, StudioError> {
        self.history.as_ref().ok_or(StudioError::NoModel)
    }

    fn history_mut(&mut self) -> Result<&mut OutfitHistory, StudioError> {
        self.history.as_mut().ok_or(StudioError::NoModel)
    }

    /// Start a fresh history on `image`.
    fn set_base(&mut self, image: ImageRef) {
        self.history = Some(OutfitHistory::new(
            PoseIndex::FRONT.instruction(),
            image.clone(),
        ));
        self.model_image = Some(image);
        self.pose = PoseIndex::FRONT;
    }
}

/// Clears the busy flag when the action ends, however it ends.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One user's studio.
pub struct StudioSession {
    user_id: UserId,
    state: Mutex<StudioState>,
    busy: AtomicBool,
    generator: Arc<dyn ImageGenerator>,
    suggester: Arc<dyn OutfitSuggester>,
    ledger: CreditLedger,
    library: Arc<dyn LibraryStore>,
}

impl StudioSession {
    /// Create an empty session. The credit balance reads zero until
    /// [`refresh_credits`](Self::refresh_credits) is called.
    #[must_use]
    pub fn new(user_id: UserId, services: &Services) -> Self {
        Self {
            user_id,
            state: Mutex::new(StudioState::new()),
            busy: AtomicBool::new(false),
            generator: Arc::clone(&services.generator),
            suggester: Arc::clone(&services.suggester),
            ledger: CreditLedger::new(user_id, Arc::clone(&services.credits)),
            library: Arc::clone(&services.library),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Whether an action is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The local credit balance.
    pub async fn credits(&self) -> CreditBalance {
        self.ledger.balance().await
    }

    /// Current view of the session.
    pub async fn view(&self) -> StudioView {
        let state = self.state.lock().await;
        self.render(&state).await
    }

    async fn render(&self, state: &StudioState) -> StudioView {
        let history = state.history.as_ref();
        let busy = self.is_busy();

        StudioView {
            model_image: state.model_image.clone(),
            display_image: state.display_image().cloned(),
            pose_index: state.pose,
            pose_instruction: state.pose.instruction(),
            available_poses: history
                .map(|h| h.available_pose_keys().into_iter().map(str::to_owned).collect())
                .unwrap_or_default(),
            layers: history
                .map(|h| h.layers().iter().map(LayerView::from).collect())
                .unwrap_or_default(),
            current_index: history.map_or(0, OutfitHistory::current_index),
            active_garment_ids: history
                .map(|h| h.active_garment_ids().into_iter().cloned().collect())
                .unwrap_or_default(),
            wardrobe: state.wardrobe.items().to_vec(),
            library: state.library.clone(),
            credits: self.ledger.balance().await,
            busy,
            activity: if busy { state.activity.clone() } else { None },
        }
    }

    async fn outcome(&self, notice: Option<Notice>) -> ActionOutcome {
        ActionOutcome {
            view: self.view().await,
            notice,
        }
    }

    /// Run `action` holding the busy flag, then render the result.
    async fn exclusive<F, Fut>(&self, action: F) -> Result<ActionOutcome, StudioError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Option<Notice>, StudioError>>,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!(user_id = %self.user_id, "Rejected action while busy");
            return Err(StudioError::Busy);
        }
        let guard = BusyGuard { flag: &self.busy };
        let result = action().await;
        drop(guard);

        let notice = result?;
        Ok(self.outcome(notice).await)
    }

    async fn require_credits(&self, message: &'static str) -> Result<(), StudioError> {
        if self.ledger.has_credits().await {
            Ok(())
        } else {
            Err(StudioError::InsufficientCredits(message))
        }
    }

    /// Charge for a committed generation. A failed server update becomes a
    /// notice; the generated image is kept.
    async fn charge(&self) -> Option<Notice> {
        match self.ledger.use_credit().await {
            Ok(_) => None,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Credit usage not saved");
                Some(Notice::error(CREDIT_SAVE_FAILED))
            }
        }
    }

    async fn set_activity(&self, message: String) {
        self.state.lock().await.activity = Some(message);
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Turn an uploaded photo into the base model and start a new history.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], [`StudioError::InsufficientCredits`], or the
    /// generation error. Nothing changes on error.
    #[instrument(skip(self, photo), fields(user_id = %self.user_id))]
    pub async fn finalize_model(&self, photo: ImageRef) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.finalize_model_step(photo)).await
    }

    async fn finalize_model_step(&self, photo: ImageRef) -> Result<Option<Notice>, StudioError> {
        self.require_credits(OUT_OF_CREDITS).await?;
        self.set_activity("Creating your model...".to_string()).await;

        let model = self.generator.generate(&[photo], MODEL_PROMPT).await?;

        self.state.lock().await.set_base(model);
        info!("Model finalized");
        Ok(self.charge().await)
    }

    /// Dress the model in `item`.
    ///
    /// If the next layer in the history already wears `item`, the pointer
    /// moves forward for free and the pose returns to the front view. Otherwise the displayed image and the garment
    /// image go to the generator and the result becomes a new layer.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], [`StudioError::NoModel`],
    /// [`StudioError::InsufficientCredits`], or the generation error.
    #[instrument(skip(self, item), fields(user_id = %self.user_id, garment_id = %item.id))]
    pub async fn apply_garment(&self, item: WardrobeItem) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.apply_garment_step(item)).await
    }

    /// [`apply_garment`](Self::apply_garment) for an item already in the
    /// wardrobe.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for an unknown ID, otherwise as
    /// [`apply_garment`](Self::apply_garment).
    pub async fn apply_wardrobe_item(&self, id: &GarmentId) -> Result<ActionOutcome, StudioError> {
        let item = self
            .state
            .lock()
            .await
            .wardrobe
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::InvalidInput(format!("Unknown garment: {id}")))?;
        self.apply_garment(item).await
    }

    async fn apply_garment_step(&self, item: WardrobeItem) -> Result<Option<Notice>, StudioError> {
        let (base, pose) = {
            let mut state = self.state.lock().await;
            let history = state.history_mut()?;
            if history.redo_hit(&item.id) {
                history.advance();
                state.pose = PoseIndex::FRONT;
                debug!(garment_id = %item.id, "Redo hit, no generation");
                return Ok(None);
            }

            self.require_credits(OUT_OF_CREDITS_GARMENT).await?;
            let base = state.display_image().cloned().ok_or(StudioError::NoModel)?;
            state.activity = Some(catalog::styling_message(&item));
            (base, state.pose.instruction())
        };

        let image = self
            .generator
            .generate(&[base, item.url.clone()], catalog::try_on_prompt(item.category))
            .await?;

        {
            let mut state = self.state.lock().await;
            state.history_mut()?.apply_garment(item.clone(), image, pose);
            state.wardrobe.insert(item);
        }
        Ok(self.charge().await)
    }

    /// Switch to pose `index`, rendering it if the current layer has no
    /// image for it yet.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for an index outside the catalogue,
    /// [`StudioError::Busy`], [`StudioError::NoModel`],
    /// [`StudioError::InsufficientCredits`], or the generation error. The
    /// pose index is restored on error.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn select_pose(&self, index: usize) -> Result<ActionOutcome, StudioError> {
        let pose = PoseIndex::new(index)
            .ok_or_else(|| StudioError::InvalidInput(format!("Unknown pose: {index}")))?;
        self.exclusive(|| self.select_pose_step(pose)).await
    }

    async fn select_pose_step(&self, pose: PoseIndex) -> Result<Option<Notice>, StudioError> {
        let instruction = pose.instruction();
        let (base, previous) = {
            let mut state = self.state.lock().await;
            let history = state.history()?;
            let cached = history.current().pose_image(instruction).is_some();
            let base = history.base_image_for_pose_change().cloned();
            if cached {
                state.pose = pose;
                return Ok(None);
            }

            self.require_credits(OUT_OF_CREDITS_POSE).await?;
            let base = base.ok_or(StudioError::NoModel)?;
            let previous = state.pose;
            state.pose = pose;
            state.activity = Some("Changing your pose...".to_string());
            (base, previous)
        };

        match self
            .generator
            .generate(&[base], &catalog::pose_prompt(instruction))
            .await
        {
            Ok(image) => {
                self.state
                    .lock()
                    .await
                    .history_mut()?
                    .add_pose_image(instruction, image);
                Ok(self.charge().await)
            }
            Err(e) => {
                self.state.lock().await.pose = previous;
                Err(e.into())
            }
        }
    }

    /// Apply an in-place edit (backdrop, scene, aspect ratio, professional
    /// shot or free-form remix) to the displayed image. The result replaces
    /// the current layer's image for the current pose.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for a blank remix, [`StudioError::Busy`],
    /// [`StudioError::NoModel`], [`StudioError::InsufficientCredits`], or the
    /// generation error.
    #[instrument(skip(self, edit), fields(user_id = %self.user_id))]
    pub async fn edit_image(&self, edit: EditInstruction) -> Result<ActionOutcome, StudioError> {
        if edit.is_blank() {
            return Err(StudioError::InvalidInput(
                "Describe the change you want.".to_string(),
            ));
        }
        self.exclusive(|| self.edit_image_step(&edit)).await
    }

    async fn edit_image_step(&self, edit: &EditInstruction) -> Result<Option<Notice>, StudioError> {
        let (base, pose) = {
            let mut state = self.state.lock().await;
            state.history()?;
            self.require_credits(OUT_OF_CREDITS).await?;
            let base = state.display_image().cloned().ok_or(StudioError::NoModel)?;
            state.activity = Some(edit.activity_message());
            (base, state.pose.instruction())
        };

        let image = self.generator.generate(&[base], &edit.prompt()).await?;

        self.state
            .lock()
            .await
            .history_mut()?
            .replace_current_pose_image(pose, image);
        Ok(self.charge().await)
    }

    /// Ask the stylist for a themed outfit and apply it from the base layer.
    ///
    /// Suggested IDs missing from the wardrobe are skipped. If a garment in
    /// the chain fails, the chain stops, the layers already applied stay and
    /// the failure comes back as a notice.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for a blank theme,
    /// [`StudioError::EmptySuggestion`] when nothing usable was suggested,
    /// [`StudioError::Busy`], [`StudioError::NoModel`],
    /// [`StudioError::InsufficientCredits`], or the stylist's error. Nothing
    /// changes on error.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn mixtape(&self, theme: &str) -> Result<ActionOutcome, StudioError> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(StudioError::InvalidInput(
                "Describe a theme for your mixtape.".to_string(),
            ));
        }
        self.exclusive(|| self.mixtape_step(theme)).await
    }

    async fn mixtape_step(&self, theme: &str) -> Result<Option<Notice>, StudioError> {
        let items: Vec<SuggestionItem> = {
            let mut state = self.state.lock().await;
            state.history()?;
            self.require_credits(OUT_OF_CREDITS).await?;
            state.activity = Some(catalog::mixtape_message(theme));
            state.wardrobe.items().iter().map(SuggestionItem::from).collect()
        };

        let ids = self.suggester.suggest(&items, theme).await?;

        let garments: Vec<WardrobeItem> = {
            let mut state = self.state.lock().await;
            let garments: Vec<WardrobeItem> = ids
                .iter()
                .filter_map(|id| state.wardrobe.get(id).cloned())
                .collect();
            if garments.is_empty() {
                info!(suggested = ids.len(), "Mixtape produced no usable items");
                return Err(StudioError::EmptySuggestion);
            }
            state.history_mut()?.revert_to(0)?;
            state.pose = PoseIndex::FRONT;
            garments
        };

        let mut notice = None;
        for item in garments {
            let garment_id = item.id.clone();
            match self.apply_garment_step(item).await {
                Ok(credit_notice) => notice = credit_notice.or(notice),
                Err(e) => {
                    warn!(garment_id = %garment_id, error = %e, "Mixtape chain stopped");
                    return Ok(Some(e.notice()));
                }
            }
        }
        Ok(notice)
    }

    // =========================================================================
    // History navigation
    // =========================================================================

    /// Take off the most recent garment. The layer stays available for redo.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], [`StudioError::NoModel`], or
    /// [`StudioError::InvalidInput`] at the base layer.
    pub async fn remove_last(&self) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.navigate(OutfitHistory::remove_last))
            .await
    }

    /// Jump to layer `index`.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], [`StudioError::NoModel`], or
    /// [`StudioError::InvalidInput`] for an out-of-range index.
    pub async fn revert_to(&self, index: usize) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.navigate(|history| history.revert_to(index)))
            .await
    }

    async fn navigate<F>(&self, step: F) -> Result<Option<Notice>, StudioError>
    where
        F: FnOnce(&mut OutfitHistory) -> Result<(), HistoryError>,
    {
        let mut state = self.state.lock().await;
        step(state.history_mut()?)?;
        state.pose = PoseIndex::FRONT;
        Ok(None)
    }

    /// Discard the model and its history. The wardrobe is kept.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`].
    pub async fn start_over(&self) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.start_over_step()).await
    }

    async fn start_over_step(&self) -> Result<Option<Notice>, StudioError> {
        let mut state = self.state.lock().await;
        state.history = None;
        state.model_image = None;
        state.pose = PoseIndex::FRONT;
        Ok(None)
    }

    /// Drop a garment from the wardrobe. Layers already wearing it are
    /// unaffected.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], or [`StudioError::InvalidInput`] if the garment
    /// is not in the wardrobe.
    pub async fn remove_wardrobe_item(&self, id: &GarmentId) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| async move {
            self.state
                .lock()
                .await
                .wardrobe
                .remove(id)
                .ok_or_else(|| StudioError::InvalidInput(format!("Unknown garment: {id}")))?;
            Ok(Some(Notice::success("Item removed from your wardrobe.")))
        })
        .await
    }

    // =========================================================================
    // Library
    // =========================================================================

    /// Fetch saved models and looks into the session.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], or [`StudioError::Library`] if either list
    /// cannot be read.
    pub async fn load_library(&self) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| async move {
            self.refresh_library().await?;
            Ok(None)
        })
        .await
    }

    /// Replace the cached library with the store's.
    ///
    /// # Errors
    ///
    /// [`StudioError::Library`] if either list cannot be read; the cached
    /// library is left untouched.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn refresh_library(&self) -> Result<(), StudioError> {
        let (models, outfits) = tokio::try_join!(
            self.library.list_models(self.user_id),
            self.library.list_outfits(self.user_id),
        )?;
        self.state.lock().await.library = Library { models, outfits };
        Ok(())
    }

    /// Save `image` as a named model and make it the current base.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for a blank name, [`StudioError::Busy`],
    /// or [`StudioError::Library`].
    #[instrument(skip(self, image), fields(user_id = %self.user_id))]
    pub async fn save_model(
        &self,
        name: &str,
        image: ImageRef,
    ) -> Result<ActionOutcome, StudioError> {
        let name = required_name(name, "Give your model a name.")?;
        self.exclusive(|| self.save_model_step(name, image)).await
    }

    async fn save_model_step(
        &self,
        name: &str,
        image: ImageRef,
    ) -> Result<Option<Notice>, StudioError> {
        let model = self
            .library
            .insert_model(self.user_id, name, &image)
            .await?;

        let mut state = self.state.lock().await;
        state.library.models.insert(0, model);
        state.set_base(image);
        Ok(Some(Notice::success("Model saved successfully!")))
    }

    /// Make a saved model the current base.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`] or [`StudioError::Library`] for an unknown ID.
    pub async fn select_model(&self, id: SavedModelId) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.select_model_step(id)).await
    }

    async fn select_model_step(&self, id: SavedModelId) -> Result<Option<Notice>, StudioError> {
        let mut state = self.state.lock().await;
        let image = state
            .library
            .model(id)
            .map(|model| model.image_url.clone())
            .ok_or(StoreError::NotFound)?;
        state.set_base(image);
        Ok(None)
    }

    /// Delete a saved model. The library drops it immediately and gets it
    /// back if the store refuses.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`] or [`StudioError::Library`].
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn delete_model(&self, id: SavedModelId) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.delete_model_step(id)).await
    }

    async fn delete_model_step(&self, id: SavedModelId) -> Result<Option<Notice>, StudioError> {
        let change = {
            let mut state = self.state.lock().await;
            if state.library.model(id).is_none() {
                return Err(StoreError::NotFound.into());
            }
            let remaining = state.library.models_without(id);
            Tentative::apply(&mut state.library.models, remaining)
        };

        match self.library.delete_model(self.user_id, id).await {
            Ok(()) => {
                change.commit();
                Ok(Some(Notice::success("Model deleted.")))
            }
            Err(e) => {
                change.rollback(&mut self.state.lock().await.library.models);
                Err(e.into())
            }
        }
    }

    /// Save the current outfit history as a named look. Costs one credit.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidInput`] for a blank name or an outfit with no
    /// garments, [`StudioError::Busy`], [`StudioError::InsufficientCredits`],
    /// or [`StudioError::Library`].
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn save_look(&self, name: &str) -> Result<ActionOutcome, StudioError> {
        let name = required_name(name, "Give your look a name.")?;
        self.exclusive(|| self.save_look_step(name)).await
    }

    async fn save_look_step(&self, name: &str) -> Result<Option<Notice>, StudioError> {
        let (thumbnail, layers) = {
            let mut state = self.state.lock().await;
            let history = state.history()?;
            if !history.has_garments() {
                return Err(StudioError::InvalidInput(
                    "Add at least one garment to save a look.".to_string(),
                ));
            }
            let layers = history.layers().to_vec();
            self.require_credits(OUT_OF_CREDITS_LOOK).await?;
            let thumbnail = state.display_image().cloned().ok_or(StudioError::NoModel)?;
            state.activity = Some("Saving your look...".to_string());
            (thumbnail, layers)
        };

        let outfit = self
            .library
            .insert_outfit(self.user_id, name, &thumbnail, &layers)
            .await?;
        self.state.lock().await.library.outfits.insert(0, outfit);

        let notice = self
            .charge()
            .await
            .unwrap_or_else(|| Notice::success("Look saved successfully!"));
        Ok(Some(notice))
    }

    /// Replace the history with a saved look, pointing at its last layer.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`], [`StudioError::Library`] for an unknown ID, or
    /// [`StudioError::InvalidInput`] if the stored layers are corrupt.
    pub async fn load_look(&self, id: SavedOutfitId) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.load_look_step(id)).await
    }

    async fn load_look_step(&self, id: SavedOutfitId) -> Result<Option<Notice>, StudioError> {
        let mut state = self.state.lock().await;
        let outfit = state.library.outfit(id).ok_or(StoreError::NotFound)?;
        let name = outfit.name.clone();
        let history = outfit.to_history()?;

        state.model_image = history
            .layers()
            .first()
            .and_then(OutfitLayer::first_image)
            .cloned();
        state.history = Some(history);
        state.pose = PoseIndex::FRONT;
        Ok(Some(Notice::info(format!("Loaded look: {name}"))))
    }

    /// Delete a saved look, optimistically.
    ///
    /// # Errors
    ///
    /// [`StudioError::Busy`] or [`StudioError::Library`].
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn delete_outfit(&self, id: SavedOutfitId) -> Result<ActionOutcome, StudioError> {
        self.exclusive(|| self.delete_outfit_step(id)).await
    }

    async fn delete_outfit_step(&self, id: SavedOutfitId) -> Result<Option<Notice>, StudioError> {
        let change = {
            let mut state = self.state.lock().await;
            if state.library.outfit(id).is_none() {
                return Err(StoreError::NotFound.into());
            }
            let remaining = state.library.outfits_without(id);
            Tentative::apply(&mut state.library.outfits, remaining)
        };

        match self.library.delete_outfit(self.user_id, id).await {
            Ok(()) => {
                change.commit();
                Ok(Some(Notice::success("Look deleted.")))
            }
            Err(e) => {
                change.rollback(&mut self.state.lock().await.library.outfits);
                Err(e.into())
            }
        }
    }

    /// Re-read the server balance, e.g. after a payment.
    ///
    /// # Errors
    ///
    /// [`StudioError::Library`] if the store cannot be read.
    pub async fn refresh_credits(&self) -> Result<CreditBalance, StudioError> {
        Ok(self.ledger.refresh().await?)
    }
}

fn required_name<'a>(name: &'a str, message: &str) -> Result<&'a str, StudioError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudioError::InvalidInput(message.to_string()));
    }
    Ok(name)
}
