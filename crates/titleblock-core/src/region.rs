//! Corner-region token selection.
//!
//! Given a tokenized page and a [`RegionSpec`], pick the words that lie in
//! the configured corner of the page (typically a drawing's title block in
//! the bottom-right corner).

use crate::error::TitleBlockError;
use crate::model::{Containment, Corner, Page, Rect, RegionSpec, Token};

/// Derive the absolute region rectangle for `page`.
///
/// Insets are clamped into `[0, page dimension]`, so a page smaller than the
/// configured inset yields the whole page instead of an error.
pub fn region_rect(page: &Page, spec: &RegionSpec) -> Result<Rect, TitleBlockError> {
    // `!(x > 0)` also rejects NaN.
    if !(page.width > 0.0) || !(page.height > 0.0) {
        return Err(TitleBlockError::InvalidArgument(format!(
            "page {} has non-positive size {}x{}",
            page.page_number, page.width, page.height
        )));
    }

    let w = page.width;
    let h = page.height;
    let wi = clamp_inset(spec.width_inset, w);
    let hi = clamp_inset(spec.height_inset, h);

    let rect = match spec.corner {
        Corner::BottomRight => Rect::new(w - wi, 0.0, w, hi),
        Corner::BottomLeft => Rect::new(0.0, 0.0, wi, hi),
        Corner::TopRight => Rect::new(w - wi, h - hi, w, h),
        Corner::TopLeft => Rect::new(0.0, h - hi, wi, h),
    };
    Ok(rect)
}

/// Tokens of `page` that fall inside the region described by `spec`, in the
/// page's original order.
pub fn extract(page: &Page, spec: &RegionSpec) -> Result<Vec<Token>, TitleBlockError> {
    extract_region(page, spec).map(|(_, tokens)| tokens)
}

/// Like [`extract`], but also returns the rectangle the tokens were tested
/// against.
pub fn extract_region(
    page: &Page,
    spec: &RegionSpec,
) -> Result<(Rect, Vec<Token>), TitleBlockError> {
    let region = region_rect(page, spec)?;
    let tokens = page
        .tokens
        .iter()
        .filter(|t| is_inside(&region, &t.bbox, spec.containment))
        .cloned()
        .collect();
    Ok((region, tokens))
}

fn is_inside(region: &Rect, bbox: &Rect, containment: Containment) -> bool {
    match containment {
        Containment::FullBox => region.contains_rect(bbox),
        Containment::CornerPoint => region.contains_point(bbox.left, bbox.bottom),
    }
}

fn clamp_inset(inset: f64, extent: f64) -> f64 {
    if inset.is_nan() {
        return 0.0;
    }
    inset.clamp(0.0, extent)
}
