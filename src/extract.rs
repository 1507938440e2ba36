//! Candidate region extraction.
//!
//! Turns one raw frame into zero or more coin-sized bounding boxes:
//! grayscale → Gaussian blur → Canny edges → external contours → area band.
//! The area band is the sole discriminator between "coin-sized object" and
//! noise or background clutter; it trades false negatives (touching or
//! oddly-oriented coins) for not running the classifier on spurious edges.

use image::imageops;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;

use crate::config::ExtractorSettings;
use crate::frame::{BoundingBox, Frame};

const BLUR_SIGMA: f32 = 1.4;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 100.0;

/// Geometric size filter over edge contours.
pub struct RegionExtractor {
    area_min: f64,
    area_max: f64,
}

impl RegionExtractor {
    pub fn new(settings: &ExtractorSettings) -> Self {
        Self {
            area_min: settings.area_min,
            area_max: settings.area_max,
        }
    }

    /// Extract candidate boxes from a frame.
    ///
    /// The emission order follows contour discovery and is unspecified;
    /// downstream logic must not depend on it.
    pub fn extract(&self, frame: &Frame) -> Vec<BoundingBox> {
        let gray = imageops::grayscale(frame.image());
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);

        find_contours::<i32>(&edges)
            .iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .filter(|contour| self.area_in_band(contour))
            .filter_map(bounding_box)
            .collect()
    }

    /// Closed-open band: `area_min <= area < area_max`.
    fn area_in_band(&self, contour: &Contour<i32>) -> bool {
        let area = contour_area(&contour.points);
        area >= self.area_min && area < self.area_max
    }
}

/// Enclosed polygon area of a traced contour (shoelace formula).
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

fn bounding_box(contour: &Contour<i32>) -> Option<BoundingBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    // Contour coordinates are pixel indices inside the frame, never negative.
    Some(BoundingBox::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
