//! Per-vertex layer data (normals, tangents, colors, UVs, material indices).
//!
//! A layer element stores a flat `f32` buffer of fixed-width entries plus an
//! optional index buffer. Which of the three per-corner indices selects the
//! entry depends on the layer's [`MappingType`]. Every lookup is clamped so a
//! malformed index buffer yields boundary values instead of a panic.

use smallvec::SmallVec;

use crate::node::{Node, NodeTag};
use crate::util::{Vec2, Vec3, Vec4};

/// Values of one entry; at most four floats wide.
pub type LayerValues = SmallVec<[f32; 4]>;

/// Which polygon-corner index selects the layer entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MappingType {
    #[default]
    ByPolygonVertex,
    ByVertex,
    ByPolygon,
    AllSame,
}

impl MappingType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ByPolygonVertex" => Some(Self::ByPolygonVertex),
            "ByVertice" | "ByVertex" | "ByControlPoint" => Some(Self::ByVertex),
            "ByPolygon" => Some(Self::ByPolygon),
            "AllSame" => Some(Self::AllSame),
            _ => None,
        }
    }
}

/// Whether entries are addressed directly or through an index buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    #[default]
    Direct,
    IndexToDirect,
}

impl ReferenceType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Direct" => Some(Self::Direct),
            "IndexToDirect" | "Index" => Some(Self::IndexToDirect),
            _ => None,
        }
    }
}

/// Node tags that make up one layer element kind.
#[derive(Clone, Copy, Debug)]
pub struct LayerElementKind {
    pub element: NodeTag,
    pub values: NodeTag,
    pub indices: Option<NodeTag>,
    pub weights: Option<NodeTag>,
    pub width: usize,
}

impl LayerElementKind {
    pub const NORMALS: Self = Self {
        element: NodeTag::LayerElementNormal,
        values: NodeTag::Normals,
        indices: Some(NodeTag::NormalsIndex),
        weights: Some(NodeTag::NormalsW),
        width: 3,
    };
    pub const TANGENTS: Self = Self {
        element: NodeTag::LayerElementTangent,
        values: NodeTag::Tangents,
        indices: Some(NodeTag::TangentsIndex),
        weights: Some(NodeTag::TangentsW),
        width: 3,
    };
    pub const COLORS: Self = Self {
        element: NodeTag::LayerElementColor,
        values: NodeTag::Colors,
        indices: Some(NodeTag::ColorIndex),
        weights: None,
        width: 4,
    };
    pub const UVS: Self = Self {
        element: NodeTag::LayerElementUv,
        values: NodeTag::Uv,
        indices: Some(NodeTag::UvIndex),
        weights: None,
        width: 2,
    };
    pub const MATERIALS: Self = Self {
        element: NodeTag::LayerElementMaterial,
        values: NodeTag::Materials,
        indices: None,
        weights: None,
        width: 1,
    };
}

/// Clamped accessor over one layer element.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerAccessor {
    values: Vec<f32>,
    indices: Option<Vec<i32>>,
    weights: Option<Vec<f32>>,
    width: usize,
    mapping: MappingType,
}

impl LayerAccessor {
    /// `None` when there is nothing to read.
    pub fn new(
        values: Vec<f32>,
        indices: Option<Vec<i32>>,
        weights: Option<Vec<f32>>,
        width: usize,
        mapping: MappingType,
    ) -> Option<Self> {
        if width == 0 || values.len() < width {
            return None;
        }
        let indices = indices.filter(|i| !i.is_empty());
        let weights = weights.filter(|w| !w.is_empty());
        Some(Self { values, indices, weights, width, mapping })
    }

    /// Build from a `LayerElement*` node.
    ///
    /// Missing or unknown mapping and reference tokens yield `None` and the
    /// layer is skipped. The index buffer is used only for `IndexToDirect` layers
    /// that actually carry one.
    pub fn from_node(node: &Node, kind: LayerElementKind) -> Option<Self> {
        let mapping = node.child(NodeTag::MappingInformationType)?.str_at(0)?;
        let mapping = MappingType::from_token(mapping)?;
        let reference = node.child(NodeTag::ReferenceInformationType)?.str_at(0)?;
        let reference = ReferenceType::from_token(reference)?;

        let values = node.child(kind.values)?.f32_array();
        let indices = match (reference, kind.indices) {
            (ReferenceType::IndexToDirect, Some(tag)) => node.child(tag).map(Node::i32_array),
            _ => None,
        };
        let weights = kind.weights.and_then(|tag| node.child(tag)).map(Node::f32_array);
        Self::new(values, indices, weights, kind.width, mapping)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn mapping(&self) -> MappingType {
        self.mapping
    }

    /// Number of whole entries in the value buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Raw index selected by the mapping type.
    fn raw_index(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> i32 {
        match self.mapping {
            MappingType::ByVertex => vertex,
            MappingType::ByPolygon => polygon,
            MappingType::ByPolygonVertex => polygon_vertex,
            MappingType::AllSame => 0,
        }
    }

    /// Entry index after the optional index buffer, clamped at both steps.
    fn entry(&self, raw: i32) -> i32 {
        match &self.indices {
            Some(indices) => indices[clamp_index(raw, indices.len())],
            None => raw,
        }
    }

    /// Entry for one polygon corner.
    pub fn values(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> LayerValues {
        let entry = self.entry(self.raw_index(vertex, polygon, polygon_vertex));
        let zero_negative = matches!(self.mapping, MappingType::ByPolygon | MappingType::ByPolygonVertex);
        if entry < 0 && zero_negative {
            return SmallVec::from_elem(0.0, self.width);
        }

        let base = entry.max(0) as usize * self.width;
        let last = self.values.len() - 1;
        (0..self.width).map(|i| self.values[(base + i).min(last)]).collect()
    }

    /// Weight for one polygon corner. Per-polygon and per-corner weights go
    /// through the index buffer and a negative entry weighs `0.0`; per-vertex
    /// weights use the vertex index directly. Layers without weights report `1.0`.
    pub fn weight(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> f32 {
        let Some(weights) = &self.weights else {
            return 1.0;
        };
        let index = match self.mapping {
            MappingType::ByPolygon | MappingType::ByPolygonVertex => {
                let entry = self.entry(self.raw_index(vertex, polygon, polygon_vertex));
                if entry < 0 {
                    return 0.0;
                }
                entry
            }
            MappingType::ByVertex | MappingType::AllSame => self.raw_index(vertex, polygon, polygon_vertex),
        };
        weights[clamp_index(index, weights.len())]
    }

    pub fn vec2(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> Vec2 {
        let v = self.values(vertex, polygon, polygon_vertex);
        Vec2::new(component(&v, 0), component(&v, 1))
    }

    pub fn vec3(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> Vec3 {
        let v = self.values(vertex, polygon, polygon_vertex);
        Vec3::new(component(&v, 0), component(&v, 1), component(&v, 2))
    }

    pub fn vec4(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> Vec4 {
        let v = self.values(vertex, polygon, polygon_vertex);
        Vec4::new(component(&v, 0), component(&v, 1), component(&v, 2), component(&v, 3))
    }

    /// Material index of a polygon corner.
    pub fn index(&self, vertex: i32, polygon: i32, polygon_vertex: i32) -> i32 {
        component(&self.values(vertex, polygon, polygon_vertex), 0) as i32
    }
}

#[inline]
fn clamp_index(index: i32, len: usize) -> usize {
    (index.max(0) as usize).min(len.saturating_sub(1))
}

#[inline]
fn component(values: &[f32], i: usize) -> f32 {
    values.get(i).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uv_layer(mapping: &str, reference: &str, values: Vec<f32>, indices: Option<Vec<i32>>) -> Node {
        let mut node = Node::new("LayerElementUV")
            .with_property(0i32)
            .with_child(Node::new("MappingInformationType").with_property(mapping))
            .with_child(Node::new("ReferenceInformationType").with_property(reference))
            .with_child(Node::new("UV").with_property(values));
        if let Some(indices) = indices {
            node.push_child(Node::new("UVIndex").with_property(indices));
        }
        node
    }

    #[test]
    fn test_direct_by_polygon_vertex() {
        let node = uv_layer("ByPolygonVertex", "Direct", vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1], None);
        let layer = LayerAccessor::from_node(&node, LayerElementKind::UVS).unwrap();
        assert!(!layer.is_indexed());
        assert_eq!(layer.vec2(99, 99, 1), Vec2::new(1.0, 1.1));
    }

    #[test]
    fn test_index_to_direct_by_vertex() {
        let node = uv_layer("ByVertice", "IndexToDirect", vec![0.0, 0.0, 5.0, 6.0], Some(vec![1, 0, 1]));
        let layer = LayerAccessor::from_node(&node, LayerElementKind::UVS).unwrap();
        assert_eq!(layer.mapping(), MappingType::ByVertex);
        assert_eq!(layer.vec2(0, 7, 7), Vec2::new(5.0, 6.0));
        assert_eq!(layer.vec2(1, 7, 7), Vec2::ZERO);
    }

    #[test]
    fn test_out_of_range_index_clamps() {
        let node = uv_layer("ByPolygonVertex", "IndexToDirect", vec![0.0, 0.5, 0.25, 0.75], Some(vec![0, 42]));
        let layer = LayerAccessor::from_node(&node, LayerElementKind::UVS).unwrap();
        // entry 42 clamps to the last float of the buffer for each component
        assert_eq!(layer.vec2(0, 0, 1), Vec2::new(0.75, 0.75));
        // position past the index buffer clamps to its last slot
        assert_eq!(layer.vec2(0, 0, 100), Vec2::new(0.75, 0.75));
    }

    #[test]
    fn test_negative_index_by_polygon_vertex_is_zero() {
        let node = uv_layer("ByPolygonVertex", "IndexToDirect", vec![3.0, 4.0], Some(vec![-1]));
        let layer = LayerAccessor::from_node(&node, LayerElementKind::UVS).unwrap();
        assert_eq!(layer.vec2(0, 0, 0), Vec2::ZERO);
    }

    #[test]
    fn test_all_same() {
        let layer = LayerAccessor::new(vec![0.0, 0.0, 1.0], None, None, 3, MappingType::AllSame).unwrap();
        assert_eq!(layer.vec3(10, 20, 30), Vec3::Z);
    }

    #[test]
    fn test_weights() {
        let layer =
            LayerAccessor::new(vec![0.0, 1.0, 0.0], None, Some(vec![0.5, -1.0]), 3, MappingType::ByPolygon).unwrap();
        assert_eq!(layer.weight(0, 0, 0), 0.5);
        assert_eq!(layer.weight(0, 9, 0), -1.0);

        let unweighted = LayerAccessor::new(vec![1.0], None, None, 1, MappingType::ByPolygon).unwrap();
        assert_eq!(unweighted.weight(0, 0, 0), 1.0);
    }

    #[test]
    fn test_indexed_weights_follow_the_index_buffer() {
        let layer = LayerAccessor::new(
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            Some(vec![1, -1]),
            Some(vec![0.25, 0.75]),
            3,
            MappingType::ByPolygonVertex,
        )
        .unwrap();
        assert_eq!(layer.vec3(0, 0, 0), Vec3::Y);
        assert_eq!(layer.weight(0, 0, 0), 0.75);
        assert_eq!(layer.weight(0, 0, 1), 0.0);

        let by_vertex =
            LayerAccessor::new(vec![0.0, 1.0], Some(vec![1, 0]), Some(vec![0.25, 0.75]), 1, MappingType::ByVertex)
                .unwrap();
        assert_eq!(by_vertex.weight(0, 5, 5), 0.25);
        assert_eq!(by_vertex.weight(7, 5, 5), 0.75);
    }

    #[test]
    fn test_unknown_mapping_is_skipped() {
        let node = uv_layer("ByEdge", "Direct", vec![0.0, 0.0], None);
        assert!(LayerAccessor::from_node(&node, LayerElementKind::UVS).is_none());
        assert!(LayerAccessor::new(vec![], None, None, 2, MappingType::ByVertex).is_none());
    }

    #[test]
    fn test_material_index() {
        let layer = LayerAccessor::new(vec![0.0, 2.0, 1.0], None, None, 1, MappingType::ByPolygon).unwrap();
        assert_eq!(layer.index(0, 1, 0), 2);
    }
}
