pub mod errors;
pub mod id;
pub mod types;

pub use errors::{ConfigError, LayoutError, PortalError, SyncError};
pub use id::{new_id, once_id_for};
pub use types::{
    DisplayInfo, FrameId, Point, Rect, RectPatch, Size, WindowInfoPatch, WindowState,
};

pub type Result<T> = std::result::Result<T, PortalError>;
