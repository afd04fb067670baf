//! Mesh `Geometry` objects and blend-shape targets.

use tracing::trace;

use crate::geom::{LayerAccessor, LayerElementKind, MappingType};
use crate::node::{Node, NodeTag};
use crate::scene::{BlendShapeGeometry, Document, Geometry, ObjectInfo, UV_CHANNELS};
use crate::util::Vec3;

use super::{definition_slot, set, ObjectBuilder};

impl ObjectBuilder for Geometry {
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self {
        let mut geometry = Geometry::new(info);
        let options = &doc.options;

        for entry in node.properties70() {
            match entry.name() {
                "Color" => set(&mut geometry.color, entry.vec4().or_else(|| entry.vec3().map(|c| c.extend(1.0)))),
                "BBoxMin" => set(&mut geometry.bbox_min, entry.vec3()),
                "BBoxMax" => set(&mut geometry.bbox_max, entry.vec3()),
                "Primary Visibility" => set(&mut geometry.primary_visibility, entry.bool()),
                "Cast Shadows" => set(&mut geometry.cast_shadows, entry.bool()),
                "Receive Shadows" => set(&mut geometry.receive_shadows, entry.bool()),
                _ => {}
            }
        }
        if geometry.info.is_template() {
            return geometry;
        }

        let layers = &mut geometry.layers;
        if let Some(vertices) = node.child(NodeTag::Vertices) {
            layers.positions = LayerAccessor::new(vertices.f32_array(), None, None, 3, MappingType::ByVertex);
        }
        if let Some(indices) = node.child(NodeTag::PolygonVertexIndex) {
            geometry.polygon_vertex_index = indices.i32_array();
        }

        let layers = &mut geometry.layers;
        if options.import_materials {
            layers.materials = first_layer(node, LayerElementKind::MATERIALS);
        }
        if options.import_normals {
            layers.normals = first_layer(node, LayerElementKind::NORMALS);
        }
        if options.import_tangents {
            layers.tangents = first_layer(node, LayerElementKind::TANGENTS);
        }
        if options.import_colors {
            layers.colors = first_layer(node, LayerElementKind::COLORS);
        }
        for element in node.children_with(NodeTag::LayerElementUv) {
            let channel = element.i32_at(0).unwrap_or(0);
            let Some(slot) = usize::try_from(channel).ok().filter(|&c| c < UV_CHANNELS) else {
                trace!("skipping UV channel {} of '{}'", channel, geometry.info.name);
                continue;
            };
            if layers.uvs[slot].is_none() {
                layers.uvs[slot] = LayerAccessor::from_node(element, LayerElementKind::UVS);
            }
        }
        geometry
    }

    definition_slot!(geometries);
}

/// First readable element of a kind. Layer 0 comes first in practice.
fn first_layer(node: &Node, kind: LayerElementKind) -> Option<LayerAccessor> {
    node.children_with(kind.element).find_map(|element| LayerAccessor::from_node(element, kind))
}

impl ObjectBuilder for BlendShapeGeometry {
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self {
        let mut shape = BlendShapeGeometry::new(info);
        shape.indexes = node.child(NodeTag::Indexes).map(Node::i32_array).unwrap_or_default();
        shape.vertices = node.child(NodeTag::Vertices).map(|v| vectors(&v.f32_array())).unwrap_or_default();
        if doc.options.import_normals {
            shape.normals = node.child(NodeTag::Normals).map(|n| vectors(&n.f32_array()));
        }
        shape
    }
}

fn vectors(flat: &[f32]) -> Vec<Vec3> {
    flat.chunks_exact(3).map(Vec3::from_slice).collect()
}
