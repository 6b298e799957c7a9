// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalized box → pixel rectangle mapping

use crate::pipeline::types::NormalizedBox;

/// Pixel-space rectangle, end-exclusive: columns `x1..x2`, rows `y1..y2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Map a normalized box onto an image of `image_width` x `image_height`
///
/// Coordinates are scaled and truncated toward zero, then clamped to the
/// image. Returns `None` when the clamped rectangle has no area, which
/// covers degenerate, inverted and fully out-of-frame boxes. Callers skip
/// recognition for those detections.
pub fn to_pixel_rect(
    bbox: &NormalizedBox,
    image_width: u32,
    image_height: u32,
) -> Option<PixelRect> {
    let coords = [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max];
    if coords.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let width = image_width as f64;
    let height = image_height as f64;

    let x1 = ((bbox.x_min * width).trunc() as i64).max(0);
    let y1 = ((bbox.y_min * height).trunc() as i64).max(0);
    let x2 = ((bbox.x_max * width).trunc() as i64).min(image_width as i64);
    let y2 = ((bbox.y_max * height).trunc() as i64).min(image_height as i64);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    // 0 <= x1 < x2 <= W and 0 <= y1 < y2 <= H hold here
    Some(PixelRect {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}
