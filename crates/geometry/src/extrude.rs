//! Outline -> extruded mesh.
//!
//! 1. Flatten the glyph's commands into closed polylines (`curve_segments`
//!    pieces per curve), scaled from font units by `size / resolution`.
//! 2. Orient outer contours counter-clockwise and holes clockwise.
//! 3. Triangulate the caps with lyon's fill tessellator.
//! 4. Emit front cap (z = height), back cap (z = 0) and side walls.

use glam::{Vec2, Vec3};
use glyphrain_assets::{Glyph, PathCommand};
use glyphrain_common::GlyphParams;
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use crate::shape::{Aabb, GlyphKey, GlyphShape};

/// Tolerance is irrelevant for straight-line input but lyon requires one.
const FILL_TOLERANCE: f32 = 0.01;
const WELD_EPSILON: f32 = 1e-6;

/// Build the extruded shape for `glyph`. `resolution` is the font's units per em.
pub(crate) fn extrude_glyph(
    key: GlyphKey,
    glyph: &Glyph,
    resolution: f32,
    params: &GlyphParams,
) -> Result<GlyphShape, String> {
    if glyph.is_blank() {
        return Ok(GlyphShape {
            key,
            params: *params,
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            groups: [0..0, 0..0],
            bounds: Aabb::EMPTY,
        });
    }

    let scale = params.size / resolution;
    let mut contours = flatten(&glyph.commands, scale, params.curve_segments.max(1));
    orient(&mut contours);

    let (cap_vertices, cap_triangles) = tessellate_caps(&contours)?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let depth = params.height;
    let extruded = depth > 0.0;

    // Front cap, facing +Z.
    let front_base = positions.len() as u32;
    for v in &cap_vertices {
        positions.push(Vec3::new(v.x, v.y, depth));
        normals.push(Vec3::Z);
    }
    for [a, b, c] in &cap_triangles {
        indices.extend([front_base + a, front_base + b, front_base + c]);
    }

    // Back cap, facing -Z (reversed winding).
    if extruded {
        let back_base = positions.len() as u32;
        for v in &cap_vertices {
            positions.push(Vec3::new(v.x, v.y, 0.0));
            normals.push(Vec3::NEG_Z);
        }
        for [a, b, c] in &cap_triangles {
            indices.extend([back_base + a, back_base + c, back_base + b]);
        }
    }
    let caps_end = indices.len() as u32;

    if extruded {
        for contour in &contours {
            let n = contour.len();
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                let d = b - a;
                let normal = Vec3::new(d.y, -d.x, 0.0).normalize_or_zero();
                let base = positions.len() as u32;
                positions.extend([
                    Vec3::new(a.x, a.y, 0.0),
                    Vec3::new(b.x, b.y, 0.0),
                    Vec3::new(b.x, b.y, depth),
                    Vec3::new(a.x, a.y, depth),
                ]);
                normals.extend([normal; 4]);
                indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }
    }
    let sides_end = indices.len() as u32;

    let bounds = Aabb::from_points(&positions);
    Ok(GlyphShape {
        key,
        params: *params,
        positions,
        normals,
        indices,
        groups: [0..caps_end, caps_end..sides_end],
        bounds,
    })
}

/// Flatten outline commands into closed polylines.
pub(crate) fn flatten(commands: &[PathCommand], scale: f32, segments: u32) -> Vec<Vec<Vec2>> {
    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut pen = Vec2::ZERO;
    let to_vec = |p: [f32; 2]| Vec2::new(p[0], p[1]) * scale;

    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                finish_contour(&mut contours, &mut current);
                pen = to_vec(p);
                current.push(pen);
            }
            PathCommand::LineTo(p) => {
                pen = to_vec(p);
                push_point(&mut current, pen);
            }
            PathCommand::QuadTo { ctrl, to } => {
                let (p0, c, p1) = (pen, to_vec(ctrl), to_vec(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    push_point(&mut current, p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t));
                }
                pen = p1;
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                let (p0, c1, c2, p1) = (pen, to_vec(ctrl1), to_vec(ctrl2), to_vec(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    let p = p0 * (u * u * u)
                        + c1 * (3.0 * u * u * t)
                        + c2 * (3.0 * u * t * t)
                        + p1 * (t * t * t);
                    push_point(&mut current, p);
                }
                pen = p1;
            }
            PathCommand::Close => finish_contour(&mut contours, &mut current),
        }
    }
    finish_contour(&mut contours, &mut current);
    contours
}

fn push_point(contour: &mut Vec<Vec2>, p: Vec2) {
    if contour
        .last()
        .is_none_or(|last| last.distance_squared(p) > WELD_EPSILON * WELD_EPSILON)
    {
        contour.push(p);
    }
}

fn finish_contour(contours: &mut Vec<Vec<Vec2>>, current: &mut Vec<Vec2>) {
    let mut contour = std::mem::take(current);
    if contour.len() > 1 {
        let first = contour[0];
        if contour
            .last()
            .is_some_and(|last| last.distance_squared(first) <= WELD_EPSILON * WELD_EPSILON)
        {
            contour.pop();
        }
    }
    if contour.len() >= 3 && signed_area(&contour).abs() > f32::EPSILON {
        contours.push(contour);
    }
}

/// Shoelace area; positive for counter-clockwise contours.
pub(crate) fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    let twice: f32 = (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

/// Even-odd point-in-polygon by ray casting along +X.
fn contains(contour: &[Vec2], p: Vec2) -> bool {
    let n = contour.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (contour[i], contour[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Outer contours counter-clockwise, holes clockwise.
pub(crate) fn orient(contours: &mut [Vec<Vec2>]) {
    let holes: Vec<bool> = (0..contours.len())
        .map(|i| {
            let probe = contours[i][0];
            let depth = contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && contains(other, probe))
                .count();
            depth % 2 == 1
        })
        .collect();

    for (contour, is_hole) in contours.iter_mut().zip(holes) {
        let ccw = signed_area(contour) > 0.0;
        if ccw == is_hole {
            contour.reverse();
        }
    }
}

type CapMesh = (Vec<Vec2>, Vec<[u32; 3]>);

/// Triangulate the filled region; triangles come back counter-clockwise.
fn tessellate_caps(contours: &[Vec<Vec2>]) -> Result<CapMesh, String> {
    if contours.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut builder = Path::builder();
    for contour in contours {
        builder.begin(point(contour[0].x, contour[0].y));
        for p in &contour[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.close();
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let options = FillOptions::tolerance(FILL_TOLERANCE).with_fill_rule(FillRule::NonZero);
    FillTessellator::new()
        .tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
                let p = v.position();
                Vec2::new(p.x, p.y)
            }),
        )
        .map_err(|e| format!("lyon tessellation failed: {e:?}"))?;

    let triangles = buffers
        .indices
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (t[0], t[1], t[2]);
            let (pa, pb, pc) = (
                buffers.vertices[a as usize],
                buffers.vertices[b as usize],
                buffers.vertices[c as usize],
            );
            if (pb - pa).perp_dot(pc - pa) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect();
    Ok((buffers.vertices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphrain_assets::{FontId, parse_outline};

    fn glyph(outline: &str) -> Glyph {
        Glyph {
            advance: 1000.0,
            x_min: 0.0,
            x_max: 1000.0,
            commands: parse_outline('x', outline).unwrap(),
        }
    }

    fn key() -> GlyphKey {
        GlyphKey {
            character: 'x',
            font: FontId(1),
        }
    }

    fn params(curve_segments: u32) -> GlyphParams {
        GlyphParams {
            size: 1.0,
            height: 0.2,
            curve_segments,
        }
    }

    const SQUARE: &str = "m 0 0 l 1000 0 l 1000 1000 l 0 1000 z";
    // Clockwise outer square with a counter-clockwise hole: both need flipping.
    const FRAME: &str = "m 0 0 l 0 1000 l 1000 1000 l 1000 0 z m 250 250 l 750 250 l 750 750 l 250 750 z";

    #[test]
    fn square_extrusion_counts() {
        let shape = extrude_glyph(key(), &glyph(SQUARE), 1000.0, &params(12)).unwrap();
        // Two caps of two triangles each, four walls of two triangles each.
        assert_eq!(shape.cap_indices().len(), 12);
        assert_eq!(shape.side_indices().len(), 24);
        assert_eq!(shape.triangle_count(), 12);
        assert_eq!(shape.bounds.min, Vec3::ZERO);
        assert!((shape.bounds.max - Vec3::new(1.0, 1.0, 0.2)).length() < 1e-5);
    }

    #[test]
    fn size_scales_geometry() {
        let small = GlyphParams {
            size: 0.5,
            ..params(6)
        };
        let shape = extrude_glyph(key(), &glyph(SQUARE), 1000.0, &small).unwrap();
        assert!((shape.bounds.max.x - 0.5).abs() < 1e-6);
        assert!((shape.bounds.max.z - 0.2).abs() < 1e-6);
    }

    #[test]
    fn holes_are_not_filled() {
        let shape = extrude_glyph(key(), &glyph(FRAME), 1000.0, &params(12)).unwrap();
        // The frame's cap area is 1 - 0.25 = 0.75 per cap.
        let front: f32 = shape.cap_indices()[..shape.cap_indices().len() / 2]
            .chunks_exact(3)
            .map(|t| {
                let a = shape.positions[t[0] as usize].truncate();
                let b = shape.positions[t[1] as usize].truncate();
                let c = shape.positions[t[2] as usize].truncate();
                (b - a).perp_dot(c - a) * 0.5
            })
            .sum();
        assert!((front - 0.75).abs() < 1e-4, "front cap area {front}");
    }

    #[test]
    fn side_normals_point_outward() {
        let shape = extrude_glyph(key(), &glyph(FRAME), 1000.0, &params(12)).unwrap();
        let center = Vec3::new(0.5, 0.5, 0.1);
        for tri in shape.side_indices().chunks_exact(3) {
            let p = shape.positions[tri[0] as usize];
            let n = shape.normals[tri[0] as usize];
            let outer = p.x <= 0.0 || p.x >= 1.0 || p.y <= 0.0 || p.y >= 1.0;
            let radial = (p - center).with_z(0.0);
            let dot = n.dot(radial);
            if outer {
                assert!(dot > 0.0, "outer wall normal {n:?} at {p:?}");
            } else {
                assert!(dot < 0.0, "hole wall normal {n:?} at {p:?}");
            }
        }
    }

    #[test]
    fn curve_segments_control_detail() {
        let circleish = "m 0 500 q 500 0 0 0 q 1000 500 1000 0 q 500 1000 1000 1000 q 0 500 0 1000";
        let coarse = flatten(&glyph(circleish).commands, 1.0, 2);
        let fine = flatten(&glyph(circleish).commands, 1.0, 12);
        assert_eq!(coarse.len(), 1);
        assert!(fine[0].len() > coarse[0].len());
    }

    #[test]
    fn blank_glyph_yields_empty_shape() {
        let shape = extrude_glyph(key(), &glyph(""), 1000.0, &params(12)).unwrap();
        assert_eq!(shape.triangle_count(), 0);
        assert_eq!(shape.bounds, Aabb::EMPTY);
    }

    #[test]
    fn moves_without_strokes_yield_empty_shape() {
        let pen_only = glyph("m 0 0 m 500 500 z");
        assert!(pen_only.is_blank());
        let shape = extrude_glyph(key(), &pen_only, 1000.0, &params(12)).unwrap();
        assert_eq!(shape.triangle_count(), 0);
        assert!(shape.groups.iter().all(|g| g.is_empty()));
    }

    #[test]
    fn orientation_normalized() {
        let mut contours = flatten(&glyph(FRAME).commands, 0.001, 1);
        orient(&mut contours);
        assert!(signed_area(&contours[0]) > 0.0);
        assert!(signed_area(&contours[1]) < 0.0);
    }

    #[test]
    fn zero_height_skips_walls() {
        let flat = GlyphParams {
            height: 0.0,
            ..params(12)
        };
        let shape = extrude_glyph(key(), &glyph(SQUARE), 1000.0, &flat).unwrap();
        assert!(shape.side_indices().is_empty());
        assert_eq!(shape.cap_indices().len(), 6);
    }
}
