use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::image::ImageRef;
use crate::wardrobe::{GarmentId, WardrobeItem};

/// One accumulated state of the model: the garment applied at this step (none
/// for the base layer) and every pose rendered for it so far.
///
/// Pose images keep insertion order so the fallback image is always the one
/// generated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitLayer {
    garment: Option<WardrobeItem>,
    pose_images: IndexMap<String, ImageRef>,
}

impl OutfitLayer {
    /// The base layer: the finalized model with no garment applied.
    #[must_use]
    pub fn base(pose: &str, image: ImageRef) -> Self {
        Self::with_image(None, pose, image)
    }

    /// A layer wearing `garment`, rendered in `pose`.
    #[must_use]
    pub fn wearing(garment: WardrobeItem, pose: &str, image: ImageRef) -> Self {
        Self::with_image(Some(garment), pose, image)
    }

    fn with_image(garment: Option<WardrobeItem>, pose: &str, image: ImageRef) -> Self {
        let mut pose_images = IndexMap::with_capacity(1);
        pose_images.insert(pose.to_owned(), image);
        Self {
            garment,
            pose_images,
        }
    }

    /// Garment applied at this layer.
    #[must_use]
    pub const fn garment(&self) -> Option<&WardrobeItem> {
        self.garment.as_ref()
    }

    /// ID of the garment applied at this layer.
    #[must_use]
    pub fn garment_id(&self) -> Option<&GarmentId> {
        self.garment.as_ref().map(|g| &g.id)
    }

    /// Rendered image for `pose`, if generated.
    #[must_use]
    pub fn pose_image(&self, pose: &str) -> Option<&ImageRef> {
        self.pose_images.get(pose)
    }

    /// The first image generated for this layer.
    #[must_use]
    pub fn first_image(&self) -> Option<&ImageRef> {
        self.pose_images.first().map(|(_, image)| image)
    }

    /// Pose keys in generation order.
    pub fn pose_keys(&self) -> impl Iterator<Item = &str> {
        self.pose_images.keys().map(String::as_str)
    }

    /// Number of cached pose renders.
    #[must_use]
    pub fn pose_count(&self) -> usize {
        self.pose_images.len()
    }

    /// Insert or overwrite the render for `pose`. Overwriting keeps the
    /// key's original position.
    pub(crate) fn set_pose_image(&mut self, pose: &str, image: ImageRef) {
        self.pose_images.insert(pose.to_owned(), image);
    }
}
