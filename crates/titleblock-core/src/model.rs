use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in PDF page space (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Rect {
    /// Build a rectangle, swapping bounds given in the wrong order so that
    /// `left <= right` and `bottom <= top` always hold.
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Rect {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// True if `other` lies entirely inside this rectangle (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.bottom >= self.bottom
            && other.right <= self.right
            && other.top <= self.top
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.left, self.bottom, self.right, self.top
        )
    }
}

/// A word on a page together with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub bbox: Rect,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Token {
            text: text.into(),
            bbox,
        }
    }
}

/// One page of a PDF as seen by the tokenizer: its size in points and its
/// words in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Corner {
    pub fn from_str_loose(s: &str) -> Option<Corner> {
        let norm: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match norm.as_str() {
            "bottomright" | "br" => Some(Corner::BottomRight),
            "bottomleft" | "bl" => Some(Corner::BottomLeft),
            "topright" | "tr" => Some(Corner::TopRight),
            "topleft" | "tl" => Some(Corner::TopLeft),
            _ => None,
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corner::BottomRight => write!(f, "bottom-right"),
            Corner::BottomLeft => write!(f, "bottom-left"),
            Corner::TopRight => write!(f, "top-right"),
            Corner::TopLeft => write!(f, "top-left"),
        }
    }
}

/// How a token's bounding box is tested against the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    /// The whole bounding box must lie inside the region.
    #[default]
    FullBox,
    /// Only the bottom-left corner of the bounding box must lie inside.
    CornerPoint,
}

impl Containment {
    pub fn from_str_loose(s: &str) -> Option<Containment> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full_box" | "full" | "box" => Some(Containment::FullBox),
            "corner_point" | "corner" | "point" => Some(Containment::CornerPoint),
            _ => None,
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::FullBox => write!(f, "full-box"),
            Containment::CornerPoint => write!(f, "corner-point"),
        }
    }
}

/// Which corner of a page to scan and how far in from the page edges.
///
/// The absolute rectangle is derived per page, since pages in one batch
/// differ in size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    #[serde(default)]
    pub corner: Corner,
    pub width_inset: f64,
    pub height_inset: f64,
    #[serde(default)]
    pub containment: Containment,
}

impl RegionSpec {
    pub fn new(corner: Corner, width_inset: f64, height_inset: f64) -> Self {
        RegionSpec {
            corner,
            width_inset,
            height_inset,
            containment: Containment::default(),
        }
    }

    pub fn with_containment(mut self, containment: Containment) -> Self {
        self.containment = containment;
        self
    }
}

impl Default for RegionSpec {
    fn default() -> Self {
        RegionSpec::new(Corner::BottomRight, 300.0, 300.0)
    }
}

/// Region tokens found on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRegion {
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub region: Rect,
    pub tokens: Vec<Token>,
}

/// Region tokens for every page of one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRegions {
    pub path: String,
    pub spec: RegionSpec,
    pub pages: Vec<PageRegion>,
}
