use serde::Serialize;

use fitting_room_core::{
    CreditBalance, GarmentId, ImageRef, Library, OutfitLayer, PoseIndex, WardrobeItem,
};

use super::Notice;

/// One entry of the outfit stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerView {
    pub garment: Option<WardrobeItem>,
    /// Poses rendered for this layer, in generation order.
    pub poses: Vec<String>,
}

impl From<&OutfitLayer> for LayerView {
    fn from(layer: &OutfitLayer) -> Self {
        Self {
            garment: layer.garment().cloned(),
            poses: layer.pose_keys().map(str::to_owned).collect(),
        }
    }
}

/// Everything the client needs to render the studio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudioView {
    /// The finalized base model, if any.
    pub model_image: Option<ImageRef>,
    /// The image on screen.
    pub display_image: Option<ImageRef>,
    pub pose_index: PoseIndex,
    pub pose_instruction: &'static str,
    /// Poses that can be selected for free.
    pub available_poses: Vec<String>,
    pub layers: Vec<LayerView>,
    pub current_index: usize,
    pub active_garment_ids: Vec<GarmentId>,
    pub wardrobe: Vec<WardrobeItem>,
    pub library: Library,
    pub credits: CreditBalance,
    pub busy: bool,
    /// What the in-flight generation is doing, while busy.
    pub activity: Option<String>,
}

/// Result of a studio action: the new view plus an optional toast.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub view: StudioView,
    pub notice: Option<Notice>,
}
