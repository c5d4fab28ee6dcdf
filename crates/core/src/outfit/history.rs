use serde::Serialize;
use thiserror::Error;

use super::layer::OutfitLayer;
use super::resolve;
use crate::image::ImageRef;
use crate::wardrobe::{GarmentId, WardrobeItem};

/// Rejected history transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// `remove_last` at the base layer.
    #[error("no garment to remove")]
    NothingToRemove,
    /// Revert target outside `[0, len)`.
    #[error("layer {index} is out of range (history has {len} layers)")]
    IndexOutOfRange { index: usize, len: usize },
    /// Stored layers do not describe a valid history.
    #[error("invalid outfit history: {0}")]
    Invalid(&'static str),
}

/// How [`OutfitHistory::apply_garment`] satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The next layer already wore this garment; the pointer moved forward.
    Redo,
    /// Later layers were discarded and a new layer appended.
    Appended,
}

/// Linear undo/redo log of outfit layers.
///
/// Invariants, upheld by every transition:
/// - `layers` is never empty and `layers[0]` has no garment
/// - every other layer has a garment
/// - every layer has at least one pose image
/// - `current_index < layers.len()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutfitHistory {
    layers: Vec<OutfitLayer>,
    current_index: usize,
}

impl OutfitHistory {
    /// Start a history from a finalized model image rendered in `pose`.
    #[must_use]
    pub fn new(pose: &str, model_image: ImageRef) -> Self {
        Self {
            layers: vec![OutfitLayer::base(pose, model_image)],
            current_index: 0,
        }
    }

    /// Rebuild a history from stored layers, pointing at the last one.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Invalid`] if the layers break an invariant.
    pub fn from_layers(layers: Vec<OutfitLayer>) -> Result<Self, HistoryError> {
        let (base, rest) = layers
            .split_first()
            .ok_or(HistoryError::Invalid("no layers"))?;
        if base.garment().is_some() {
            return Err(HistoryError::Invalid("base layer has a garment"));
        }
        if rest.iter().any(|layer| layer.garment().is_none()) {
            return Err(HistoryError::Invalid("layer without a garment"));
        }
        if layers.iter().any(|layer| layer.pose_count() == 0) {
            return Err(HistoryError::Invalid("layer without images"));
        }

        let current_index = layers.len() - 1;
        Ok(Self {
            layers,
            current_index,
        })
    }

    /// All layers, including ones ahead of the pointer.
    #[must_use]
    pub fn layers(&self) -> &[OutfitLayer] {
        &self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Pointer into `layers`.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// The layer on screen.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // current_index < len
    pub fn current(&self) -> &OutfitLayer {
        &self.layers[self.current_index]
    }

    #[allow(clippy::indexing_slicing)] // current_index < len
    fn current_mut(&mut self) -> &mut OutfitLayer {
        &mut self.layers[self.current_index]
    }

    /// Whether at least one garment is applied at the pointer.
    #[must_use]
    pub const fn has_garments(&self) -> bool {
        self.current_index > 0
    }

    /// IDs of the garments worn at the pointer, oldest first.
    #[must_use]
    pub fn active_garment_ids(&self) -> Vec<&GarmentId> {
        self.layers
            .iter()
            .take(self.current_index + 1)
            .filter_map(OutfitLayer::garment_id)
            .collect()
    }

    /// Image shown for `pose` at the pointer.
    #[must_use]
    pub fn display_image(&self, pose: &str) -> Option<&ImageRef> {
        resolve::resolve_display_image(&self.layers, self.current_index, pose)
    }

    /// Poses already rendered for the current layer.
    #[must_use]
    pub fn available_pose_keys(&self) -> Vec<&str> {
        resolve::available_pose_keys(&self.layers, self.current_index)
    }

    /// Seed image for rendering a new pose of the current layer: the first
    /// image generated for it, whichever pose that was.
    #[must_use]
    pub fn base_image_for_pose_change(&self) -> Option<&ImageRef> {
        self.current().first_image()
    }

    /// Whether the layer right after the pointer already wears `garment_id`.
    ///
    /// Only the immediate next layer is checked; deeper redo entries are not
    /// searched.
    #[must_use]
    pub fn redo_hit(&self, garment_id: &GarmentId) -> bool {
        self.layers
            .get(self.current_index + 1)
            .and_then(OutfitLayer::garment_id)
            .is_some_and(|id| id == garment_id)
    }

    /// Move the pointer one layer forward. Returns false at the end.
    pub fn advance(&mut self) -> bool {
        if self.current_index + 1 >= self.layers.len() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Record a garment application.
    ///
    /// On a redo hit the pointer advances and `image` is discarded; otherwise
    /// layers after the pointer are dropped and a new layer is appended.
    pub fn apply_garment(
        &mut self,
        garment: WardrobeItem,
        image: ImageRef,
        pose: &str,
    ) -> Applied {
        if self.redo_hit(&garment.id) && self.advance() {
            return Applied::Redo;
        }

        self.layers.truncate(self.current_index + 1);
        self.layers.push(OutfitLayer::wearing(garment, pose, image));
        self.current_index = self.layers.len() - 1;
        Applied::Appended
    }

    /// Step back one garment, keeping the layer for redo.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NothingToRemove`] at the base layer.
    pub const fn remove_last(&mut self) -> Result<(), HistoryError> {
        if self.current_index == 0 {
            return Err(HistoryError::NothingToRemove);
        }
        self.current_index -= 1;
        Ok(())
    }

    /// Jump the pointer to any layer.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] if `index >= len`.
    pub fn revert_to(&mut self, index: usize) -> Result<(), HistoryError> {
        if index >= self.layers.len() {
            return Err(HistoryError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// Cache a new pose render for the current layer.
    pub fn add_pose_image(&mut self, pose: &str, image: ImageRef) {
        self.current_mut().set_pose_image(pose, image);
    }

    /// Overwrite the current layer's render for `pose` after an in-place
    /// edit (background, aspect ratio, professional shot, remix).
    pub fn replace_current_pose_image(&mut self, pose: &str, image: ImageRef) {
        self.current_mut().set_pose_image(pose, image);
    }

    /// Give up the layers, e.g. to store them as a saved outfit.
    #[must_use]
    pub fn into_layers(self) -> Vec<OutfitLayer> {
        self.layers
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::wardrobe::GarmentCategory;

    const P0: &str = "Full frontal view, hands on hips";
    const P1: &str = "Side profile view";

    fn img(name: &str) -> ImageRef {
        ImageRef::parse(&format!("https://img.example.com/{name}.png")).expect("valid url")
    }

    fn garment(id: &str) -> WardrobeItem {
        WardrobeItem {
            id: GarmentId::new(id),
            name: id.to_uppercase(),
            url: img(id),
            category: GarmentCategory::Clothing,
        }
    }

    fn assert_invariants(history: &OutfitHistory) {
        assert!(!history.layers().is_empty());
        assert!(history.current_index() < history.len());
        assert!(history.layers()[0].garment().is_none());
        for layer in &history.layers()[1..] {
            assert!(layer.garment().is_some());
        }
        for layer in history.layers() {
            assert!(layer.pose_count() >= 1);
        }
    }

    #[test]
    fn test_new_history_is_base_only() {
        let history = OutfitHistory::new(P0, img("a"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_index(), 0);
        assert!(!history.has_garments());
        assert_eq!(history.display_image(P0), Some(&img("a")));
        assert_invariants(&history);
    }

    #[test]
    fn test_apply_remove_and_redo_scenario() {
        let mut history = OutfitHistory::new(P0, img("a"));

        assert_eq!(
            history.apply_garment(garment("g1"), img("b"), P0),
            Applied::Appended
        );
        assert_eq!(history.current_index(), 1);

        assert_eq!(
            history.apply_garment(garment("g2"), img("c"), P0),
            Applied::Appended
        );
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.len(), 3);

        history.remove_last().expect("remove");
        assert_eq!(history.current_index(), 1);
        assert_eq!(history.len(), 3);

        // g2 is the next layer: redo instead of a new layer
        assert!(history.redo_hit(&GarmentId::new("g2")));
        assert_eq!(
            history.apply_garment(garment("g2"), img("ignored"), P0),
            Applied::Redo
        );
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.display_image(P0), Some(&img("c")));
        assert_invariants(&history);
    }

    #[test]
    fn test_new_garment_truncates_future_layers() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);
        history.apply_garment(garment("g2"), img("c"), P0);
        history.apply_garment(garment("g3"), img("d"), P0);
        history.revert_to(1).expect("revert");

        assert_eq!(
            history.apply_garment(garment("g4"), img("e"), P0),
            Applied::Appended
        );
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), 2);
        let ids: Vec<_> = history.active_garment_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, ["g1", "g4"]);
        assert_invariants(&history);
    }

    #[test]
    fn test_redo_check_is_one_step_deep() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);
        history.apply_garment(garment("g2"), img("c"), P0);
        history.revert_to(0).expect("revert");

        assert!(!history.redo_hit(&GarmentId::new("g2")));
        assert_eq!(
            history.apply_garment(garment("g2"), img("c2"), P0),
            Applied::Appended
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);
        history.revert_to(0).expect("revert");
        assert!(history.advance());
        assert_eq!(history.current_index(), 1);
        assert!(!history.advance());
        assert_eq!(history.current_index(), 1);
    }

    #[test]
    fn test_remove_last_at_base_fails() {
        let mut history = OutfitHistory::new(P0, img("a"));
        assert_eq!(history.remove_last(), Err(HistoryError::NothingToRemove));
        assert_eq!(history.current_index(), 0);
    }

    #[test]
    fn test_revert_out_of_range() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);
        assert_eq!(
            history.revert_to(2),
            Err(HistoryError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(history.current_index(), 1);
    }

    #[test]
    fn test_pose_images_and_replacement() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);

        assert_eq!(history.available_pose_keys(), [P0]);
        // uncached pose falls back to the first render
        assert_eq!(history.display_image(P1), Some(&img("b")));

        history.add_pose_image(P1, img("b-side"));
        assert_eq!(history.available_pose_keys(), [P0, P1]);
        assert_eq!(history.display_image(P1), Some(&img("b-side")));

        history.replace_current_pose_image(P0, img("b-beach"));
        assert_eq!(history.display_image(P0), Some(&img("b-beach")));
        assert_eq!(history.available_pose_keys(), [P0, P1]);
        assert_eq!(history.base_image_for_pose_change(), Some(&img("b-beach")));

        // other layers untouched
        history.revert_to(0).expect("revert");
        assert_eq!(history.display_image(P0), Some(&img("a")));
        assert_eq!(history.available_pose_keys(), [P0]);
    }

    #[test]
    fn test_from_layers_points_at_last() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.apply_garment(garment("g1"), img("b"), P0);
        history.apply_garment(garment("g2"), img("c"), P0);
        history.revert_to(0).expect("revert");

        let restored = OutfitHistory::from_layers(history.into_layers()).expect("valid layers");
        assert_eq!(restored.current_index(), 2);
        assert_invariants(&restored);
    }

    #[test]
    fn test_from_layers_rejects_broken_histories() {
        assert_eq!(
            OutfitHistory::from_layers(Vec::new()),
            Err(HistoryError::Invalid("no layers"))
        );
        assert!(OutfitHistory::from_layers(vec![OutfitLayer::wearing(garment("g1"), P0, img("a"))])
            .is_err());
        assert!(
            OutfitHistory::from_layers(vec![
                OutfitLayer::base(P0, img("a")),
                OutfitLayer::base(P0, img("b")),
            ])
            .is_err()
        );

        let empty: OutfitLayer =
            serde_json::from_str(r#"{"garment":null,"pose_images":{}}"#).expect("parse");
        assert_eq!(
            OutfitHistory::from_layers(vec![empty]),
            Err(HistoryError::Invalid("layer without images"))
        );
    }

    #[test]
    fn test_layers_serialize_in_pose_order() {
        let mut history = OutfitHistory::new(P0, img("a"));
        history.add_pose_image(P1, img("a-side"));
        let json = serde_json::to_string(history.layers()).expect("serialize");
        let restored: Vec<OutfitLayer> = serde_json::from_str(&json).expect("parse");
        assert_eq!(restored[0].pose_keys().collect::<Vec<_>>(), [P0, P1]);
    }
}
