//! Property editors bound to the selected canvas.

pub mod background;
pub mod text;

pub use background::BackgroundEditor;
pub use text::{TextEditor, TextForm};
