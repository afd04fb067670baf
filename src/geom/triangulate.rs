//! Polygon triangulation and vertex emission.
//!
//! The polygon stream is one flat list of control point indices where a
//! complemented (negative) index closes a polygon. Triangles are emitted as
//! they are, quads are kept or split, and larger polygons go through
//! [`tessellate`]. Every corner becomes one output vertex carrying all the
//! layer attributes of that corner.

use bytemuck::{Pod, Zeroable};

use crate::core::CoordinateSystem;
use crate::scene::GeometryLayers;
use crate::util::{Mat4, Vec2, Vec3};

/// Most corners a single polygon may have.
pub const MAX_POLYGON_VERTICES: usize = 8192;

/// Output vertex, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Tangent direction with the bitangent sign in `w`.
    pub tangent: [f32; 4],
    pub color: [f32; 4],
    pub uv: [[f32; 2]; 4],
    /// Control point the corner came from.
    pub control_point: u32,
}

/// Triangles and quads sharing one material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubMesh {
    /// Material index from the geometry's material layer.
    pub layer_material: i32,
    /// Document material index after remapping through the model, `-1` when unresolved.
    pub material: i32,
    pub triangles: Vec<u32>,
    pub quads: Vec<u32>,
}

/// Triangulated mesh of one geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<Vertex>,
    pub submeshes: Vec<SubMesh>,
    /// Polygons dropped for having fewer than three or more than
    /// [`MAX_POLYGON_VERTICES`] corners.
    pub skipped_polygons: usize,
}

impl MeshBuffers {
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.triangles.len() / 3).sum()
    }

    pub fn quad_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.quads.len() / 4).sum()
    }

    fn submesh(&mut self, layer_material: i32) -> &mut SubMesh {
        let index = match self.submeshes.iter().position(|s| s.layer_material == layer_material) {
            Some(index) => index,
            None => {
                self.submeshes.push(SubMesh { layer_material, material: -1, ..Default::default() });
                self.submeshes.len() - 1
            }
        };
        &mut self.submeshes[index]
    }
}

/// Front faces flip when exactly one of handedness and a mirroring geometric
/// transform applies.
#[inline]
pub fn winding_flipped(is_right_handed: bool, geometric: &Mat4) -> bool {
    is_right_handed ^ (geometric.determinant() < 0.0)
}

/// Sign of the bitangent for a converted normal/tangent pair.
#[inline]
pub fn tangent_sign(normal: Vec3, tangent: Vec3) -> f32 {
    let bitangent = tangent.cross(normal);
    if normal.cross(tangent).dot(bitangent) > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// One corner of the polygon being assembled.
#[derive(Clone, Copy)]
struct Corner {
    control_point: i32,
    polygon_vertex: i32,
}

/// Triangulates one geometry.
///
/// The corner buffer is reused across polygons; a triangulator is meant for
/// one geometry on one thread.
pub struct Triangulator<'a> {
    layers: &'a GeometryLayers,
    coords: &'a CoordinateSystem,
    geometric: Mat4,
    keep_quads: bool,
    flipped: bool,
    corners: Vec<Corner>,
    mesh: MeshBuffers,
}

impl<'a> Triangulator<'a> {
    pub fn new(layers: &'a GeometryLayers, coords: &'a CoordinateSystem, geometric: Mat4, keep_quads: bool) -> Self {
        Self {
            layers,
            coords,
            geometric,
            keep_quads,
            flipped: winding_flipped(coords.is_right_handed, &geometric),
            corners: Vec::with_capacity(64),
            mesh: MeshBuffers::default(),
        }
    }

    #[inline]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Walk the polygon stream and return the finished buffers.
    pub fn run(mut self, polygon_vertex_index: &[i32]) -> MeshBuffers {
        let mut polygon = 0i32;
        let mut overflow = false;
        for (polygon_vertex, &raw) in polygon_vertex_index.iter().enumerate() {
            let control_point = if raw < 0 { !raw } else { raw };
            if self.corners.len() < MAX_POLYGON_VERTICES {
                self.corners.push(Corner { control_point, polygon_vertex: polygon_vertex as i32 });
            } else {
                overflow = true;
            }
            if raw < 0 {
                if overflow {
                    self.mesh.skipped_polygons += 1;
                } else {
                    self.emit_polygon(polygon);
                }
                self.corners.clear();
                overflow = false;
                polygon += 1;
            }
        }
        self.mesh
    }

    fn emit_polygon(&mut self, polygon: i32) {
        let corners = std::mem::take(&mut self.corners);
        let Some(first) = corners.first().copied() else {
            self.corners = corners;
            return;
        };
        let layer_material = self
            .layers
            .materials
            .as_ref()
            .map_or(0, |m| m.index(first.control_point, polygon, first.polygon_vertex));

        match corners.len() {
            3 => {
                let order: &[usize] = if self.flipped { &[2, 1, 0] } else { &[0, 1, 2] };
                self.emit(&corners, order, polygon, layer_material, false);
            }
            4 if self.keep_quads => {
                let order: &[usize] = if self.flipped { &[3, 2, 1, 0] } else { &[0, 1, 2, 3] };
                self.emit(&corners, order, polygon, layer_material, true);
            }
            4 => {
                let order: &[usize] = if self.flipped { &[0, 3, 2, 2, 1, 0] } else { &[0, 1, 2, 2, 3, 0] };
                self.emit(&corners, order, polygon, layer_material, false);
            }
            n if n >= 5 => {
                let points: Vec<Vec3> = corners.iter().map(|c| self.raw_position(*c, polygon)).collect();
                let mut order = Vec::with_capacity((n - 2) * 3);
                for [a, b, c] in tessellate(&points) {
                    if self.flipped {
                        order.extend([c, b, a]);
                    } else {
                        order.extend([a, b, c]);
                    }
                }
                self.emit(&corners, &order, polygon, layer_material, false);
            }
            _ => self.mesh.skipped_polygons += 1,
        }
        self.corners = corners;
    }

    fn emit(&mut self, corners: &[Corner], order: &[usize], polygon: i32, layer_material: i32, quads: bool) {
        for &i in order {
            let vertex = self.vertex(corners[i], polygon);
            let index = self.mesh.vertices.len() as u32;
            self.mesh.vertices.push(vertex);
            let submesh = self.mesh.submesh(layer_material);
            if quads {
                submesh.quads.push(index);
            } else {
                submesh.triangles.push(index);
            }
        }
    }

    fn raw_position(&self, corner: Corner, polygon: i32) -> Vec3 {
        self.layers
            .positions
            .as_ref()
            .map_or(Vec3::ZERO, |p| p.vec3(corner.control_point, polygon, corner.polygon_vertex))
    }

    /// Converted attributes of one corner.
    fn vertex(&self, corner: Corner, polygon: i32) -> Vertex {
        let (v, pv) = (corner.control_point, corner.polygon_vertex);
        let layers = self.layers;
        let coords = self.coords;

        let position = self.geometric.transform_point3(self.raw_position(corner, polygon));
        let position = coords.convert_vector(coords.bake_direction(position), true);

        let direction = |d: Vec3| coords.convert_vector(coords.bake_direction(self.geometric.transform_vector3(d)), false);
        let normal = layers.normals.as_ref().map_or(Vec3::ZERO, |n| direction(n.vec3(v, polygon, pv)));
        let tangent = layers.tangents.as_ref().map_or(Vec3::ZERO, |t| direction(t.vec3(v, polygon, pv)));
        let color = layers.colors.as_ref().map(|c| c.vec4(v, polygon, pv)).unwrap_or_default();

        let mut uv = [[0.0; 2]; 4];
        for (slot, layer) in uv.iter_mut().zip(&layers.uvs) {
            if let Some(layer) = layer {
                *slot = layer.vec2(v, polygon, pv).to_array();
            }
        }

        Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
            tangent: tangent.extend(tangent_sign(normal, tangent)).to_array(),
            color: color.to_array(),
            uv,
            control_point: v.max(0) as u32,
        }
    }
}

/// Triangulate one polygon stream.
pub fn triangulate(
    layers: &GeometryLayers,
    polygon_vertex_index: &[i32],
    coords: &CoordinateSystem,
    geometric: Mat4,
    keep_quads: bool,
) -> MeshBuffers {
    Triangulator::new(layers, coords, geometric, keep_quads).run(polygon_vertex_index)
}

// ============================================================================
// Tessellation
// ============================================================================

/// Ear-clip a simple planar polygon.
///
/// Triangles keep the winding of the input contour. The polygon is projected
/// onto the plane of its Newell normal; degenerate input falls back to a fan.
pub fn tessellate(points: &[Vec3]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let normal = newell_normal(points);
    if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
        return fan(&(0..n).collect::<Vec<_>>());
    }
    let normal = normal.normalize();
    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    let projected: Vec<Vec2> = points.iter().map(|p| Vec2::new(p.dot(u), p.dot(v))).collect();

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);
    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let a = remaining[(i + m - 1) % m];
            let b = remaining[i];
            let c = remaining[(i + 1) % m];
            is_ear(&projected, &remaining, a, b, c)
        });
        match ear {
            Some(i) => {
                triangles.push([remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]]);
                remaining.remove(i);
            }
            None => {
                triangles.extend(fan(&remaining));
                return triangles;
            }
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

fn fan(indices: &[usize]) -> Vec<[usize; 3]> {
    (1..indices.len().saturating_sub(1)).map(|i| [indices[0], indices[i], indices[i + 1]]).collect()
}

#[inline]
fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn is_ear(points: &[Vec2], remaining: &[usize], a: usize, b: usize, c: usize) -> bool {
    let (pa, pb, pc) = (points[a], points[b], points[c]);
    if cross2(pb - pa, pc - pb) <= 0.0 {
        return false;
    }
    remaining.iter().filter(|&&i| i != a && i != b && i != c).all(|&i| {
        let p = points[i];
        p == pa || p == pb || p == pc || !in_triangle(p, pa, pb, pc)
    })
}

/// Point inside or on the border of a counter-clockwise triangle.
fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    cross2(b - a, p - a) >= 0.0 && cross2(c - b, p - b) >= 0.0 && cross2(a - c, p - c) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GlobalSettings, ImportOptions};
    use crate::geom::{LayerAccessor, MappingType};

    fn coords(right_handed: bool) -> CoordinateSystem {
        let settings = GlobalSettings {
            front_axis_sign: if right_handed { 1 } else { -1 },
            ..Default::default()
        };
        CoordinateSystem::new(&settings, &ImportOptions::default().with_file_scale(false))
    }

    fn layers(positions: &[[f32; 3]]) -> GeometryLayers {
        let flat: Vec<f32> = positions.iter().flatten().copied().collect();
        GeometryLayers {
            positions: LayerAccessor::new(flat, None, None, 3, MappingType::ByVertex),
            ..Default::default()
        }
    }

    fn control_points(mesh: &MeshBuffers) -> Vec<u32> {
        mesh.submeshes[0].triangles.iter().map(|&i| mesh.vertices[i as usize].control_point).collect()
    }

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    const QUAD: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

    #[test]
    fn test_triangle_winding_by_handedness() {
        let l = layers(&TRIANGLE);
        let left = triangulate(&l, &[0, 1, !2], &coords(false), Mat4::IDENTITY, false);
        let right = triangulate(&l, &[0, 1, !2], &coords(true), Mat4::IDENTITY, false);
        assert_eq!(control_points(&left), vec![0, 1, 2]);
        assert_eq!(control_points(&right), vec![2, 1, 0]);
    }

    #[test]
    fn test_negative_geometric_scale_flips_back() {
        let l = layers(&TRIANGLE);
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let right = triangulate(&l, &[0, 1, !2], &coords(true), mirror, false);
        let left = triangulate(&l, &[0, 1, !2], &coords(false), mirror, false);
        assert_eq!(control_points(&right), vec![0, 1, 2]);
        assert_eq!(control_points(&left), vec![2, 1, 0]);
    }

    #[test]
    fn test_quad_split_orders() {
        let l = layers(&QUAD);
        let left = triangulate(&l, &[0, 1, 2, !3], &coords(false), Mat4::IDENTITY, false);
        let right = triangulate(&l, &[0, 1, 2, !3], &coords(true), Mat4::IDENTITY, false);
        assert_eq!(control_points(&left), vec![0, 1, 2, 2, 3, 0]);
        assert_eq!(control_points(&right), vec![0, 3, 2, 2, 1, 0]);
        assert_eq!(left.triangle_count(), 2);
    }

    #[test]
    fn test_keep_quads() {
        let l = layers(&QUAD);
        let mesh = triangulate(&l, &[0, 1, 2, !3], &coords(true), Mat4::IDENTITY, true);
        let order: Vec<u32> = mesh.submeshes[0].quads.iter().map(|&i| mesh.vertices[i as usize].control_point).collect();
        assert_eq!(order, vec![3, 2, 1, 0]);
        assert_eq!(mesh.quad_count(), 1);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_vertex_conversion() {
        let l = layers(&TRIANGLE);
        let geometric = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let mesh = triangulate(&l, &[0, 1, !2], &coords(true), geometric, false);
        let v1 = mesh.vertices.iter().find(|v| v.control_point == 1).unwrap();
        // Right-handed input mirrors X.
        assert_eq!(v1.position, [-1.0, 0.0, 5.0]);
    }

    #[test]
    fn test_material_groups() {
        let mut l = layers(&QUAD);
        l.materials = LayerAccessor::new(vec![0.0, 1.0], None, None, 1, MappingType::ByPolygon);
        let mesh = triangulate(&l, &[0, 1, !2, 0, 2, !3], &coords(false), Mat4::IDENTITY, false);
        assert_eq!(mesh.submeshes.len(), 2);
        assert_eq!(mesh.submeshes[1].layer_material, 1);
        assert_eq!(mesh.submeshes[1].material, -1);
    }

    #[test]
    fn test_degenerate_polygons_are_skipped() {
        let l = layers(&QUAD);
        let mesh = triangulate(&l, &[0, !1, 0, 1, !2], &coords(false), Mat4::IDENTITY, false);
        assert_eq!(mesh.skipped_polygons, 1);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_ngon_is_tessellated() {
        let pentagon: Vec<[f32; 3]> = (0..5)
            .map(|i| {
                let a = i as f32 / 5.0 * std::f32::consts::TAU;
                [a.cos(), a.sin(), 0.0]
            })
            .collect();
        let l = layers(&pentagon);
        let mesh = triangulate(&l, &[0, 1, 2, 3, !4], &coords(false), Mat4::IDENTITY, false);
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn test_tessellate_concave() {
        // L shape, counter-clockwise.
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let triangles = tessellate(&points);
        assert_eq!(triangles.len(), 4);
        let area: f32 = triangles
            .iter()
            .map(|&[a, b, c]| (points[b] - points[a]).cross(points[c] - points[a]).z * 0.5)
            .sum();
        assert!((area - 3.0).abs() < 1e-5, "area {area}");
        for &[a, b, c] in &triangles {
            assert!((points[b] - points[a]).cross(points[c] - points[a]).z > 0.0);
        }
    }

    #[test]
    fn test_tangent_sign() {
        assert_eq!(tangent_sign(Vec3::Z, Vec3::X), -1.0);
        assert_eq!(tangent_sign(Vec3::ZERO, Vec3::ZERO), -1.0);
    }

    #[test]
    fn test_vertex_is_pod() {
        let v = Vertex { control_point: 7, ..Default::default() };
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), std::mem::size_of::<Vertex>());
        assert_eq!(std::mem::size_of::<Vertex>(), 92);
    }
}
