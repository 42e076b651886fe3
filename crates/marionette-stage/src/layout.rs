//! Layout - fitting the puppet into its container

use marionette_puppet::{Point, Size, Transform, Viewport};

use crate::LayoutConfig;

/// Renderer resolution for a device pixel ratio, capped by the config.
/// Nonsense ratios fall back to 1.
pub fn clamp_device_pixel_ratio(device_pixel_ratio: f32, config: &LayoutConfig) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(config.max_device_pixel_ratio)
    } else {
        1.0
    }
}

/// Viewport for a container at a given device pixel ratio
pub fn viewport_for(container: Size, device_pixel_ratio: f32, config: &LayoutConfig) -> Viewport {
    Viewport::new(
        container.width.max(0.0),
        container.height.max(0.0),
        clamp_device_pixel_ratio(device_pixel_ratio, config),
    )
}

/// Scale the puppet to fit the safe area, preserving aspect ratio, and
/// stand it bottom-center in the container.
///
/// `logical` is the unscaled puppet size; measuring the scaled bounds would
/// drift with every relayout. Degenerate sizes are treated as 1.
pub fn fit_transform(logical: Size, container: Size, config: &LayoutConfig) -> Transform {
    let lw = if logical.width > 0.0 { logical.width } else { 1.0 };
    let lh = if logical.height > 0.0 { logical.height } else { 1.0 };
    let scale_x = container.width * config.safe_width / lw;
    let scale_y = container.height * config.safe_height / lh;

    Transform {
        scale: scale_x.min(scale_y).max(0.0),
        position: Point::new(container.width / 2.0, container.height),
        anchor: Point::new(0.5, 1.0),
    }
}
