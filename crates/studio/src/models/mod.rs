//! Response models for the studio API.
//!
//! - [`Notice`] - Transient user-facing notification (the toast)
//! - [`StudioView`] - Snapshot of a studio session as the client renders it
//! - [`AuthenticatedUser`] - The caller identified by the bearer token

mod notice;
mod user;
mod view;

pub use notice::{Notice, NoticeLevel};
pub use user::AuthenticatedUser;
pub use view::{ActionOutcome, LayerView, StudioView};
