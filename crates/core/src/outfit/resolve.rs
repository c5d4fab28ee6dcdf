//! Display resolution: which image is on screen.
//!
//! Both functions are pure and cheap; callers recompute them whenever the
//! layers, the pointer or the selected pose change.

use super::layer::OutfitLayer;
use crate::image::ImageRef;

/// The image to show for `pose` at `current_index`.
///
/// Returns `None` for an empty history or an out-of-range index; the caller
/// falls back to the raw model image. If `pose` has not been rendered for the
/// layer, the first render of the layer is shown instead.
#[must_use]
pub fn resolve_display_image<'a>(
    layers: &'a [OutfitLayer],
    current_index: usize,
    pose: &str,
) -> Option<&'a ImageRef> {
    let layer = layers.get(current_index)?;
    layer.pose_image(pose).or_else(|| layer.first_image())
}

/// Poses already rendered for the layer at `current_index`, in generation
/// order. Selecting one of these is a free cache hit.
#[must_use]
pub fn available_pose_keys(layers: &[OutfitLayer], current_index: usize) -> Vec<&str> {
    layers
        .get(current_index)
        .map(|layer| layer.pose_keys().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(name: &str) -> ImageRef {
        ImageRef::parse(&format!("https://img.example.com/{name}.png")).expect("valid url")
    }

    #[test]
    fn test_empty_history_resolves_to_nothing() {
        assert_eq!(resolve_display_image(&[], 0, "any"), None);
        assert!(available_pose_keys(&[], 0).is_empty());
    }

    #[test]
    fn test_out_of_range_index() {
        let layers = [OutfitLayer::base("front", img("a"))];
        assert_eq!(resolve_display_image(&layers, 3, "front"), None);
    }

    #[test]
    fn test_fallback_is_first_inserted_pose() {
        let mut layer = OutfitLayer::base("side", img("side"));
        layer.set_pose_image("front", img("front"));
        layer.set_pose_image("back", img("back"));
        let layers = [layer];

        assert_eq!(resolve_display_image(&layers, 0, "front"), Some(&img("front")));
        assert_eq!(resolve_display_image(&layers, 0, "jumping"), Some(&img("side")));
        assert_eq!(available_pose_keys(&layers, 0), ["side", "front", "back"]);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let mut layer = OutfitLayer::base("a", img("1"));
        layer.set_pose_image("b", img("2"));
        let layers = [layer];

        let first = resolve_display_image(&layers, 0, "c");
        let second = resolve_display_image(&layers, 0, "c");
        assert_eq!(first, second);
    }
}
