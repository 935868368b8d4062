use image::Rgba;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in image pixel coordinates (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Shift by the origin of the region this box was found in
    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// True when the box is non-empty and fits inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Kind of facial region reported by the cascade pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Face,
    Eye,
    Nose,
    Mouth,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Face,
        FeatureKind::Eye,
        FeatureKind::Nose,
        FeatureKind::Mouth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Face => "Face",
            FeatureKind::Eye => "Eye",
            FeatureKind::Nose => "Nose",
            FeatureKind::Mouth => "Mouth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Outline color used when annotating this kind of region
    pub fn color(&self) -> Rgba<u8> {
        match self {
            FeatureKind::Face => Rgba([255, 0, 0, 255]),
            FeatureKind::Eye => Rgba([255, 0, 255, 255]),
            FeatureKind::Nose => Rgba([0, 255, 0, 255]),
            FeatureKind::Mouth => Rgba([255, 255, 0, 255]),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detected region, always in full-image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub kind: FeatureKind,
    pub bbox: BoundingBox,
}

impl DetectionRecord {
    pub fn new(kind: FeatureKind, bbox: BoundingBox) -> Self {
        Self { kind, bbox }
    }
}

/// Garment categories in the order of the classifier's output layer.
/// Reordering this table invalidates every trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    TShirtTop,
    Trouser,
    Pullover,
    Dress,
    Coat,
    Sandal,
    Shirt,
    Sneaker,
    Bag,
    AnkleBoot,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::TShirtTop,
        Category::Trouser,
        Category::Pullover,
        Category::Dress,
        Category::Coat,
        Category::Sandal,
        Category::Shirt,
        Category::Sneaker,
        Category::Bag,
        Category::AnkleBoot,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::TShirtTop => "T-shirt/top",
            Category::Trouser => "Trouser",
            Category::Pullover => "Pullover",
            Category::Dress => "Dress",
            Category::Coat => "Coat",
            Category::Sandal => "Sandal",
            Category::Shirt => "Shirt",
            Category::Sneaker => "Sneaker",
            Category::Bag => "Bag",
            Category::AnkleBoot => "Ankle boot",
        }
    }

    /// Label shown to the app's users
    pub fn display_label(&self) -> &'static str {
        match self {
            Category::TShirtTop => "Camiseta/Top",
            Category::Trouser => "Pantalón",
            Category::Pullover => "Jersey",
            Category::Dress => "Vestido",
            Category::Coat => "Abrigo",
            Category::Sandal => "Sandalia",
            Category::Shirt => "Camisa",
            Category::Sneaker => "Deportiva",
            Category::Bag => "Bolso",
            Category::AnkleBoot => "Bota",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// External border of a foreground region
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let area = imageproc::geometry::contour_area(&points);
        Self { points, area }
    }

    /// Smallest upright rectangle containing every border point
    pub fn bounding_rect(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}
