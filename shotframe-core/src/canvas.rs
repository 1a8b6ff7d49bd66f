//! Canvas identifiers and the per-canvas record kept by the store.

use serde::{Deserialize, Serialize};

use crate::surface::SurfaceHandle;

/// Prefix of default canvas names (`canvas-<n>`).
pub const DEFAULT_PREFIX: &str = "canvas-";

/// Identifier of one canvas in the collection.
///
/// Default names follow `canvas-<n>`; duplicates append ` (<k>)` to the
/// source's base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasId(String);

impl CanvasId {
    /// Wrap an arbitrary identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Default identifier for the `n`th canvas.
    #[must_use]
    pub fn numbered(n: u32) -> Self {
        Self(format!("{DEFAULT_PREFIX}{n}"))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric suffix if this ID matches the default `canvas-<n>` pattern
    /// exactly.
    #[must_use]
    pub fn default_number(&self) -> Option<u32> {
        let digits = self.0.strip_prefix(DEFAULT_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// The name with any trailing ` (<k>)` duplication suffix removed.
    #[must_use]
    pub fn base_name(&self) -> &str {
        let s = self.0.as_str();
        let Some(inner) = s.strip_suffix(')') else {
            return s;
        };
        let Some(open) = inner.rfind(" (") else {
            return s;
        };
        let digits = &inner[open + 2..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            &s[..open]
        } else {
            s
        }
    }

    /// Candidate duplicate name `<base> (<k>)`.
    #[must_use]
    pub fn with_copy_suffix(&self, k: u32) -> Self {
        Self(format!("{} ({k})", self.base_name()))
    }
}

impl std::fmt::Display for CanvasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanvasId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CanvasId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Mount lifecycle of one canvas.
#[derive(Clone, Default)]
pub enum Lifecycle {
    /// No surface has been requested yet.
    #[default]
    Unmounted,
    /// A wrapper holds the mount ticket with this generation and is
    /// creating the surface.
    Mounting {
        /// Generation of the outstanding ticket.
        generation: u64,
    },
    /// The live surface is installed.
    Ready(SurfaceHandle),
    /// The surface was released. Terminal.
    Disposed,
}

impl Lifecycle {
    /// Short state name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Mounting { .. } => "mounting",
            Self::Ready(_) => "ready",
            Self::Disposed => "disposed",
        }
    }

    /// Live surface handle if ready.
    #[must_use]
    pub const fn surface(&self) -> Option<&SurfaceHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mounting { generation } => {
                f.debug_struct("Mounting").field("generation", generation).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

/// The store's record for one canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasRecord {
    /// Mount state and live handle.
    pub lifecycle: Lifecycle,
    /// Width override.
    pub width: Option<u32>,
    /// Height override.
    pub height: Option<u32>,
}

/// Read-only view of one collection entry.
#[derive(Debug, Clone)]
pub struct CanvasItem {
    /// Canvas identifier.
    pub id: CanvasId,
    /// Live surface, absent until ready.
    pub surface: Option<SurfaceHandle>,
    /// Width override.
    pub width: Option<u32>,
    /// Height override.
    pub height: Option<u32>,
}

impl CanvasItem {
    /// Effective `(width, height)`, falling back to the given defaults.
    #[must_use]
    pub fn dimensions_or(&self, default_width: u32, default_height: u32) -> (u32, u32) {
        (
            self.width.unwrap_or(default_width),
            self.height.unwrap_or(default_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_number() {
        assert_eq!(CanvasId::numbered(7).default_number(), Some(7));
        assert_eq!(CanvasId::new("canvas-12").default_number(), Some(12));
        assert_eq!(CanvasId::new("canvas-1 (1)").default_number(), None);
        assert_eq!(CanvasId::new("canvas-").default_number(), None);
        assert_eq!(CanvasId::new("en-canvas-1").default_number(), None);
    }

    #[test]
    fn test_copy_suffix_uses_base_name() {
        let id = CanvasId::new("canvas-1");
        assert_eq!(id.with_copy_suffix(1).as_str(), "canvas-1 (1)");
        let dup = CanvasId::new("canvas-1 (1)");
        assert_eq!(dup.base_name(), "canvas-1");
        assert_eq!(dup.with_copy_suffix(2).as_str(), "canvas-1 (2)");
    }

    #[test]
    fn test_base_name_ignores_non_numeric_parens() {
        let id = CanvasId::new("hero (dark)");
        assert_eq!(id.base_name(), "hero (dark)");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&CanvasId::numbered(3)).expect("serialize");
        assert_eq!(json, "\"canvas-3\"");
    }
}
