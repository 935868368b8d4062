use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::models::{BoundingBox, Contour};
use super::preprocessing;

/// Outer borders of top-level foreground regions (non-zero pixels) in a binary image
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// Contour with the largest enclosed area; the first one found wins ties
pub fn largest_contour(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<&Contour> = None;
    for contour in contours {
        match best {
            Some(b) if contour.area <= b.area => {}
            _ => best = Some(contour),
        }
    }
    best
}

/// Bounding rectangle of the dominant dark-on-light object in a grayscale image
pub fn locate_dominant_object(gray: &GrayImage) -> Option<BoundingBox> {
    let binary = preprocessing::binarize_inverted(gray);
    let contours = find_external_contours(&binary);
    largest_contour(&contours).and_then(Contour::bounding_rect)
}
