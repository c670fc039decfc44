//! Outline vectorisation
//!
//! Turns glyph outlines into drawable geometry:
//! - Bezier flattening into closed polylines
//! - Contour outset (grow/shrink along point normals)
//! - Fill tessellation via lyon
//! - Extrusion side walls

use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule as LyonFillRule, FillTessellator, FillVertex,
    VertexBuffers,
};
use log::warn;

use crate::constants::{BEZIER_STEPS, TESSELLATION_TOLERANCE};
use crate::face::{Contour, FillRule, Outline, Segment};
use crate::geometry::Vector;
use crate::gpu::Mesh;

/// Flatten one contour into a closed polyline (closing point not repeated)
pub fn flatten_contour(contour: &Contour) -> Vec<Vector> {
    let mut points = vec![contour.start];
    let mut last = contour.start;

    for segment in &contour.segments {
        match *segment {
            Segment::Line(p) => points.push(p),
            Segment::Conic(c, p) => {
                for step in 1..=BEZIER_STEPS {
                    let t = step as f32 / BEZIER_STEPS as f32;
                    let u = 1.0 - t;
                    points.push(last * (u * u) + c * (2.0 * u * t) + p * (t * t));
                }
            }
            Segment::Cubic(c1, c2, p) => {
                for step in 1..=BEZIER_STEPS {
                    let t = step as f32 / BEZIER_STEPS as f32;
                    let u = 1.0 - t;
                    points.push(
                        last * (u * u * u)
                            + c1 * (3.0 * u * u * t)
                            + c2 * (3.0 * u * t * t)
                            + p * (t * t * t),
                    );
                }
            }
        }
        last = segment.end();
    }

    // FreeType contours end on their start point; drop duplicates
    points.dedup_by(|a, b| (*a - *b).length_xy() <= f32::EPSILON);
    while points.len() > 1 && (points[points.len() - 1] - points[0]).length_xy() <= f32::EPSILON {
        points.pop();
    }
    points
}

/// Flatten every contour of an outline, skipping degenerate ones
pub fn flatten(outline: &Outline) -> Vec<Vec<Vector>> {
    outline
        .contours
        .iter()
        .map(flatten_contour)
        .filter(|points| points.len() >= 3)
        .collect()
}

/// Shoelace area; positive for counter-clockwise in Y-up space
pub fn signed_area(points: &[Vector]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

/// Whether ink lies to the right of the travel direction.
///
/// TrueType outer contours run clockwise (ink on the right), PostScript ones
/// counter-clockwise; the dominant orientation of the whole glyph decides.
pub fn ink_on_right(contours: &[Vec<Vector>]) -> bool {
    contours.iter().map(|c| signed_area(c)).sum::<f32>() <= 0.0
}

/// Move every point `amount` pixels away from the ink (negative shrinks)
pub fn outset(points: &[Vector], amount: f32, ink_right: bool) -> Vec<Vector> {
    let n = points.len();
    if amount == 0.0 || n < 3 {
        return points.to_vec();
    }

    // Left-hand normal of the travel direction points away from ink on the right
    let away = |d: Vector| {
        if ink_right {
            Vector::xy(-d.y, d.x)
        } else {
            Vector::xy(d.y, -d.x)
        }
    };

    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let n1 = away((cur - prev).normalized_xy());
            let n2 = away((next - cur).normalized_xy());
            let bisector = (n1 + n2).normalized_xy();
            if bisector == Vector::ZERO {
                return cur + n1 * amount;
            }
            // Keep edges parallel: scale by 1/cos(half angle), clamped at spikes
            let cos_half = (bisector.x * n1.x + bisector.y * n1.y).max(0.25);
            cur + bisector * (amount / cos_half)
        })
        .collect()
}

/// Tessellate closed polylines into a triangle list at depth `z`.
///
/// `flip` reverses triangle winding (for back-facing caps).
pub fn tessellate(
    contours: &[Vec<Vector>],
    fill_rule: FillRule,
    z: f32,
    normal: Vector,
    flip: bool,
) -> Mesh {
    let mut mesh = Mesh::new();
    if contours.is_empty() {
        return mesh;
    }

    let mut builder = Path::builder();
    for contour in contours {
        builder.begin(point(contour[0].x, contour[0].y));
        for p in &contour[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let rule = match fill_rule {
        FillRule::NonZero => LyonFillRule::NonZero,
        FillRule::EvenOdd => LyonFillRule::EvenOdd,
    };
    let options = FillOptions::tolerance(TESSELLATION_TOLERANCE).with_fill_rule(rule);

    let mut buffers: VertexBuffers<lyon::math::Point, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    if let Err(e) = tessellator.tessellate_path(
        &path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position()),
    ) {
        warn!("Outline tessellation failed: {:?}", e);
        return mesh;
    }

    for tri in buffers.indices.chunks_exact(3) {
        let order = if flip { [0, 2, 1] } else { [0, 1, 2] };
        for k in order {
            let p = buffers.vertices[tri[k] as usize];
            mesh.push(Vector::new(p.x, p.y, z), normal);
        }
    }
    mesh
}

/// Side walls joining a front ring (z = 0) to a back ring (z = -depth).
///
/// Rings must have the same point count; normals face away from the ink.
pub fn extrude_sides(front: &[Vec<Vector>], back: &[Vec<Vector>], depth: f32, ink_right: bool) -> Mesh {
    let mut mesh = Mesh::new();

    for (f_ring, b_ring) in front.iter().zip(back) {
        let n = f_ring.len().min(b_ring.len());
        for i in 0..n {
            let j = (i + 1) % n;
            let f0 = f_ring[i];
            let f1 = f_ring[j];
            let b0 = Vector::new(b_ring[i].x, b_ring[i].y, -depth);
            let b1 = Vector::new(b_ring[j].x, b_ring[j].y, -depth);

            let d = (f1 - f0).normalized_xy();
            let normal = if ink_right {
                Vector::xy(-d.y, d.x)
            } else {
                Vector::xy(d.y, -d.x)
            };

            // Wind counter-clockwise as seen from outside
            let (quad_a, quad_b) = if ink_right {
                ([f0, b1, b0], [f0, f1, b1])
            } else {
                ([f0, b0, b1], [f0, b1, f1])
            };
            for p in quad_a.into_iter().chain(quad_b) {
                mesh.push(p, normal);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clockwise square (TrueType outer contour orientation)
    fn square_cw(size: f32) -> Contour {
        Contour {
            start: Vector::xy(0.0, 0.0),
            segments: vec![
                Segment::Line(Vector::xy(0.0, size)),
                Segment::Line(Vector::xy(size, size)),
                Segment::Line(Vector::xy(size, 0.0)),
                Segment::Line(Vector::xy(0.0, 0.0)),
            ],
        }
    }

    #[test]
    fn test_flatten_lines_drops_closing_point() {
        let points = flatten_contour(&square_cw(10.0));
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vector::xy(0.0, 0.0));
        assert_eq!(points[2], Vector::xy(10.0, 10.0));
    }

    #[test]
    fn test_flatten_conic_steps() {
        let contour = Contour {
            start: Vector::xy(0.0, 0.0),
            segments: vec![
                Segment::Conic(Vector::xy(5.0, 10.0), Vector::xy(10.0, 0.0)),
                Segment::Line(Vector::xy(0.0, 0.0)),
            ],
        };
        let points = flatten_contour(&contour);
        assert_eq!(points.len(), 1 + BEZIER_STEPS);
        assert_eq!(points[BEZIER_STEPS], Vector::xy(10.0, 0.0));
        assert!(points[1..BEZIER_STEPS].iter().all(|p| p.y > 0.0));
    }

    #[test]
    fn test_signed_area_orientation() {
        let cw = flatten_contour(&square_cw(10.0));
        assert!((signed_area(&cw) + 100.0).abs() < 1e-4);
        assert!(ink_on_right(&[cw]));
    }

    #[test]
    fn test_outset_grows_square() {
        let cw = flatten_contour(&square_cw(10.0));
        let grown = outset(&cw, 1.0, true);
        let area = signed_area(&grown).abs();
        assert!((area - 144.0).abs() < 1e-3, "area {}", area);
        assert!((grown[0].x + 1.0).abs() < 1e-5);
        assert!((grown[0].y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tessellate_square() {
        let cw = flatten_contour(&square_cw(10.0));
        let mesh = tessellate(&[cw], FillRule::NonZero, 0.0, Vector::new(0.0, 0.0, 1.0), false);
        assert!(mesh.triangle_count() >= 2);
        assert!(mesh.normals.iter().all(|n| n.z == 1.0));
        let area: f32 = mesh
            .positions
            .chunks_exact(3)
            .map(|t| signed_area(t).abs())
            .sum();
        assert!((area - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_extrude_sides() {
        let cw = flatten_contour(&square_cw(10.0));
        let mesh = extrude_sides(&[cw.clone()], &[cw], 5.0, true);
        // Two triangles per edge
        assert_eq!(mesh.triangle_count(), 8);
        assert!(mesh.positions.iter().all(|p| p.z == 0.0 || p.z == -5.0));
        // Left edge (0,0)->(0,10) faces -X, wound counter-clockwise from outside
        assert_eq!(mesh.normals[0], Vector::xy(-1.0, 0.0));
        let t = &mesh.positions[0..3];
        let facing = (t[1] - t[0]).cross(t[2] - t[0]);
        assert!(facing.x < 0.0);
    }
}
