//! Interactive editing for photo collages: the session state machine,
//! gesture interpretation, hit regions and background image decoding.

mod decode;
mod editor;
mod error;
mod gesture;
mod image_handle;
mod layout;
mod session;

pub use decode::{DecodeResult, DecodeService, DecodeTarget};
pub use editor::{Editor, EditorSettings};
pub use error::EditorError;
pub use gesture::{
    DOUBLE_TAP_WINDOW_MS, DoubleTapDetector, DragState, GestureInterpreter, GestureResponse,
    GestureSettings, PinchState, PointerEvent, PointerId, PointerKind, PointerPhase,
    PointerRelease, RotateState,
};
pub use image_handle::{EmbedFormat, ImageHandle, encode_png};
pub use layout::{Layout, LayoutMode, Viewport, rotate_handle_rect};
pub use session::{CellAssignment, CellSelection, EditSession, SessionState};
