//! Outfit layers, the undo/redo history and the display resolver.
//!
//! The history is an arena: a `Vec` of layers plus a pointer. Moving the
//! pointer back keeps later layers around for redo; applying a different
//! garment behind the end truncates them.
//!
//! ```text
//! layers:  [ base ] [ +tee ] [ +aviators ] [ +beanie ]
//!                       ^ current_index = 1
//!
//! apply(aviators)  -> redo: pointer moves to 2, nothing generated
//! apply(necklace)  -> truncate to [base, +tee], append [+necklace]
//! ```

mod history;
mod layer;
mod resolve;

pub use history::{Applied, HistoryError, OutfitHistory};
pub use layer::OutfitLayer;
pub use resolve::{available_pose_keys, resolve_display_image};
