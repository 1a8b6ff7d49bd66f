//! Frame-fitting math shared by frame placement and screenshot compositing.

/// Scale applied to `fit_min` for phone frames.
pub const PHONE_FRAME_RATIO: f32 = 0.75;

/// Scale applied to `fit_min` for tablet frames.
pub const TABLET_FRAME_RATIO: f32 = 0.95;

/// Contain scale: the largest uniform scale at which `(wi, hi)` fits inside
/// `(wc, hc)`.
#[must_use]
pub fn fit_min(wc: f32, hc: f32, wi: f32, hi: f32) -> f32 {
    (wc / wi).min(hc / hi)
}

/// Cover scale: the smallest uniform scale at which `(wi, hi)` fills
/// `(wc, hc)`.
#[must_use]
pub fn fit_max(wc: f32, hc: f32, wi: f32, hi: f32) -> f32 {
    (wc / wi).max(hc / hi)
}

/// Scale for a frame image of natural size `(wi, hi)` placed on a surface of
/// size `(wc, hc)`.
#[must_use]
pub fn frame_scale(wc: f32, hc: f32, wi: f32, hi: f32, is_tablet: bool, fill: bool) -> f32 {
    if fill {
        return fit_max(wc, hc, wi, hi);
    }
    let ratio = if is_tablet {
        TABLET_FRAME_RATIO
    } else {
        PHONE_FRAME_RATIO
    };
    fit_min(wc, hc, wi, hi) * ratio
}
