//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::VariantSize;

/// One variant to produce, with its final pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVariant {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Scale `(width, height)` so the longer edge equals `edge`, keeping the
/// aspect ratio. Neither side drops below 1px.
///
/// ```text
/// (4000, 3000) @ 800 → (800, 600)
/// (3000, 4000) @ 800 → (600, 800)
/// ```
pub fn scale_to_edge(source: (u32, u32), edge: u32) -> (u32, u32) {
    let (w, h) = source;
    if w >= h {
        let scaled = (h as f64 * edge as f64 / w as f64).round() as u32;
        (edge, scaled.max(1))
    } else {
        let scaled = (w as f64 * edge as f64 / h as f64).round() as u32;
        (scaled.max(1), edge)
    }
}

/// Decide which sizes to generate for an upright source of `source` pixels.
///
/// A size whose edge meets or exceeds the source's longest edge is skipped,
/// except the smallest configured size, which is always produced at its
/// target edge. A source smaller than that target is upscaled to it.
///
/// Output order follows `sizes`. Returns nothing for a zero-sized source.
pub fn plan_variants(source: (u32, u32), sizes: &[VariantSize]) -> Vec<PlannedVariant> {
    let (w, h) = source;
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let longest = w.max(h);
    let smallest = sizes.iter().map(|s| s.edge).min();

    sizes
        .iter()
        .filter_map(|size| {
            let is_smallest = Some(size.edge) == smallest;
            if size.edge >= longest && !is_smallest {
                return None;
            }
            let (width, height) = scale_to_edge(source, size.edge);
            Some(PlannedVariant {
                name: size.name.clone(),
                width,
                height,
            })
        })
        .collect()
}
