//! Connection resolution.
//!
//! The `Connections` section is a flat list of `C` entries:
//! `C: "OO", source, destination` links two objects and
//! `C: "OP", source, destination, "property"` links an object to a property
//! of another. The list is walked twice:
//!
//! 1. counting: sizes every child collection before anything is linked;
//! 2. linking: sets parents, meshes, materials, deformer chains and
//!    animation bindings.
//!
//! Entries with an unknown source are ignored, so the result does not depend
//! on which objects the import options filtered out.

use tracing::{debug, trace};

use crate::node::{Node, NodeTag};
use crate::scene::{
    AnimationCurveNode, AttributeData, BlendShapeChannel, CurveBinding, Document, Geometry, Material, MatrixSlot,
    Model, ModelKind, NodeAttribute, ObjectRef, Parent, Texture, DIFFUSE_TEXTURE,
};
use crate::util::Handle;

/// Destination ID of the document root.
pub const ROOT_ID: i64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    /// `OO`
    ObjectObject,
    /// `OP`
    ObjectProperty,
}

/// One `C` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection<'a> {
    pub kind: ConnectionKind,
    pub source: i64,
    pub destination: i64,
    /// Driven property of `OP` connections.
    pub property: Option<&'a str>,
}

impl<'a> Connection<'a> {
    /// Parse a `C` node. Entries with a missing kind or ID yield `None`.
    pub fn from_node(node: &'a Node) -> Option<Self> {
        let kind = match node.str_at(0)? {
            "OO" => ConnectionKind::ObjectObject,
            "OP" => ConnectionKind::ObjectProperty,
            _ => return None,
        };
        Some(Self {
            kind,
            source: node.i64_at(1)?,
            destination: node.i64_at(2)?,
            property: node.str_at(3),
        })
    }

    #[inline]
    fn property_name(&self) -> &'a str {
        self.property.unwrap_or_default()
    }
}

/// Parse every `C` entry of the `Connections` section, in file order.
pub fn read_connections(root: &Node) -> Vec<Connection<'_>> {
    root.child(NodeTag::Connections)
        .into_iter()
        .flat_map(|c| c.children_with(NodeTag::Connection))
        .filter_map(Connection::from_node)
        .collect()
}

/// Run both passes over the connection list, then bind curve nodes to their
/// animated models.
pub fn resolve_connections(doc: &mut Document, root: &Node) {
    let connections = read_connections(root);
    for connection in &connections {
        count(doc, connection);
    }
    for connection in &connections {
        link(doc, connection);
    }
    debug!("connections: {} resolved, {} root children", connections.len(), doc.root_children.len());

    if doc.options.imports_animation() {
        post_process_curve_nodes(doc);
    }
    if doc.options.imports_animation() || doc.options.import_blend_shapes {
        count_deformer_bindings(doc);
    }
}

// ============================================================================
// Pass 1
// ============================================================================

/// Counting pass: grow the declared sizes of the destinations' collections.
pub fn count(doc: &mut Document, c: &Connection<'_>) {
    let Some(source) = doc.object(c.source) else {
        return;
    };
    if c.destination == ROOT_ID {
        if let ObjectRef::Model(_) = source {
            doc.children_count += 1;
        }
        return;
    }
    let Some(destination) = doc.object(c.destination) else {
        return;
    };

    match (c.kind, source, destination) {
        (ConnectionKind::ObjectObject, ObjectRef::NodeAttribute(a), ObjectRef::Model(m)) => {
            apply_attribute(doc, a, m);
        }
        (ConnectionKind::ObjectObject, ObjectRef::Model(_), ObjectRef::Model(m)) => {
            doc.models[m].children_count += 1;
        }
        (ConnectionKind::ObjectObject, ObjectRef::AnimationCurveNode(_), ObjectRef::AnimationLayer(l)) => {
            doc.layers[l].curve_nodes_count += 1;
        }
        (ConnectionKind::ObjectObject, ObjectRef::AnimationLayer(_), ObjectRef::AnimationStack(s)) => {
            doc.stacks[s].layers_count += 1;
        }
        (ConnectionKind::ObjectObject, ObjectRef::Material(_), ObjectRef::Model(m)) => {
            doc.models[m].materials_count += 1;
        }
        (ConnectionKind::ObjectObject, ObjectRef::Geometry(_), ObjectRef::Model(m)) => {
            doc.models[m].connected_geometries_count += 1;
            doc.connected_geometries_count += 1;
        }
        (ConnectionKind::ObjectProperty, ObjectRef::AnimationCurve(_), ObjectRef::AnimationCurveNode(n)) => {
            doc.curve_nodes[n].curves_count += 1;
        }
        _ => {}
    }
}

/// Copy camera or light parameters onto the model, keeping a look-at target
/// that is already linked.
fn apply_attribute(doc: &mut Document, attribute: Handle<NodeAttribute>, model: Handle<Model>) {
    let data = doc.node_attributes[attribute].data.clone();
    let options = &doc.options;
    let (import_cameras, import_lights) = (options.import_cameras, options.import_lights);
    let model = &mut doc.models[model];
    match (&mut model.kind, data) {
        (ModelKind::Camera(camera), AttributeData::Camera(mut data)) if import_cameras => {
            data.look_at = camera.look_at;
            *camera = data;
        }
        (ModelKind::Light(light), AttributeData::Light(data)) if import_lights => {
            *light = data;
        }
        _ => {}
    }
}

// ============================================================================
// Pass 2
// ============================================================================

/// Linking pass.
pub fn link(doc: &mut Document, c: &Connection<'_>) {
    let Some(source) = doc.object(c.source) else {
        return;
    };
    if c.destination == ROOT_ID {
        if let ObjectRef::Model(m) = source {
            doc.models[m].parent = Some(Parent::Document);
            if doc.root_children.capacity() < doc.children_count {
                let additional = doc.children_count - doc.root_children.len();
                doc.root_children.reserve_exact(additional);
            }
            doc.root_children.push(m);
        }
        return;
    }
    let Some(destination) = doc.object(c.destination) else {
        return;
    };
    trace!("{:?} {:?} -> {:?} {:?}", c.kind, source.kind(), destination.kind(), c.property);

    match c.kind {
        ConnectionKind::ObjectObject => link_objects(doc, source, destination),
        ConnectionKind::ObjectProperty => link_property(doc, source, destination, c.property_name()),
    }
}

fn link_objects(doc: &mut Document, source: ObjectRef, destination: ObjectRef) {
    match (source, destination) {
        (ObjectRef::Model(child), ObjectRef::Model(parent)) => {
            doc.models[child].parent = Some(Parent::Model(parent));
            doc.models[parent].push_child(child);
        }
        (ObjectRef::BlendShapeGeometry(shape), ObjectRef::BlendShapeChannel(channel)) => {
            doc.blend_shape_channels[channel].shape = Some(shape);
        }
        (ObjectRef::Geometry(geometry), ObjectRef::Model(model)) => link_geometry(doc, geometry, model),
        (ObjectRef::AnimationCurveNode(node), ObjectRef::AnimationLayer(layer)) => {
            doc.curve_nodes[node].layer = Some(layer);
            doc.layers[layer].add_curve_node(node);
        }
        (ObjectRef::AnimationLayer(layer), ObjectRef::AnimationStack(stack)) => {
            doc.layers[layer].add_stack(stack);
            doc.stacks[stack].add_layer(layer);
        }
        (ObjectRef::Deformer(deformer), ObjectRef::Geometry(geometry)) => {
            let (skin, blend_shape) = {
                let d = &mut doc.deformers[deformer];
                d.geometry = Some(geometry);
                (d.is_skin(), d.is_blend_shape())
            };
            let g = &mut doc.geometries[geometry];
            g.deformers.push(deformer);
            g.has_skin |= skin;
            g.has_blend_shapes |= blend_shape;
        }
        (ObjectRef::Cluster(cluster), ObjectRef::Deformer(deformer)) => {
            doc.clusters[cluster].deformer = Some(deformer);
        }
        (ObjectRef::BlendShapeChannel(channel), ObjectRef::Deformer(deformer)) => {
            doc.blend_shape_channels[channel].deformer = Some(deformer);
        }
        (ObjectRef::Model(model), ObjectRef::Cluster(cluster)) => {
            doc.clusters[cluster].model = Some(model);
        }
        (ObjectRef::Model(model), ObjectRef::BlendShapeChannel(channel)) => {
            doc.blend_shape_channels[channel].model = Some(model);
        }
        (ObjectRef::Video(video), ObjectRef::Texture(texture)) => {
            doc.textures[texture].video = Some(video);
        }
        (ObjectRef::Texture(layer), ObjectRef::Texture(texture)) => {
            doc.textures[texture].add_layer(layer);
        }
        (ObjectRef::Material(material), ObjectRef::Model(model)) => link_material(doc, material, model),
        (ObjectRef::Texture(texture), ObjectRef::Model(model)) => link_model_texture(doc, texture, model),
        (ObjectRef::Material(material), ObjectRef::Implementation(implementation)) => {
            doc.materials[material].implementation = Some(implementation);
        }
        (ObjectRef::BindingTable(table), ObjectRef::Implementation(implementation)) => {
            doc.implementations[implementation].binding_table = Some(table);
        }
        _ => {}
    }
}

/// Attach a mesh. A geometry already owned by another model is shared when
/// the geometric transforms agree and cloned otherwise.
fn link_geometry(doc: &mut Document, geometry: Handle<Geometry>, model: Handle<Model>) {
    match doc.geometries[geometry].model {
        Some(owner) if owner == model => {}
        Some(owner) => {
            let compatible = doc.models[owner].matrices.is_geometry_compatible(&doc.models[model].matrices);
            let mesh = if compatible {
                geometry
            } else {
                let mut clone = doc.geometries[geometry].clone_for(geometry, model);
                clone.info.name.clone_from(&doc.models[model].info.name);
                doc.add_unregistered(clone)
            };
            debug!(
                "geometry '{}' {} for '{}'",
                doc.geometries[geometry].info.name,
                if compatible { "shared" } else { "cloned" },
                doc.models[model].info.name
            );
            doc.models[model].mesh = Some(mesh);
        }
        None => {
            let name = doc.models[model].info.name.clone();
            let g = &mut doc.geometries[geometry];
            g.info.name = name;
            g.model = Some(model);
            doc.models[model].mesh = Some(geometry);
        }
    }
}

fn link_material(doc: &mut Document, material: Handle<Material>, model: Handle<Model>) {
    let m = &mut doc.models[model];
    if m.materials.capacity() < m.materials_count {
        let additional = m.materials_count - m.materials.len();
        m.materials.reserve_exact(additional);
    }
    m.materials.push(material);
    if let Some(texture) = m.diffuse_texture {
        doc.materials[material].bind_texture(DIFFUSE_TEXTURE, texture);
    }
}

/// A texture wired straight to a model acts as the diffuse map of each of
/// its materials, or is kept on the model until a material arrives.
fn link_model_texture(doc: &mut Document, texture: Handle<Texture>, model: Handle<Model>) {
    let materials = doc.models[model].materials.clone();
    if materials.is_empty() {
        if doc.models[model].diffuse_texture.is_some() {
            let message = format!("Model [{}] already has a diffuse texture.", doc.models[model].info.name);
            doc.warn(message);
        } else {
            doc.models[model].diffuse_texture = Some(texture);
        }
        return;
    }
    for material in materials {
        if !doc.materials[material].bind_texture(DIFFUSE_TEXTURE, texture) {
            let message = format!("Material [{}] already has a diffuse texture.", doc.materials[material].info.name);
            doc.warn(message);
        }
    }
}

fn link_property(doc: &mut Document, source: ObjectRef, destination: ObjectRef, property: &str) {
    match (source, destination) {
        (ObjectRef::Model(target), ObjectRef::Model(camera)) if property == "LookAtProperty" => {
            if !doc.options.import_cameras {
                return;
            }
            if let ModelKind::Camera(c) = &mut doc.models[camera].kind {
                c.look_at = Some(target);
            }
        }
        (ObjectRef::AnimationCurve(curve), ObjectRef::AnimationCurveNode(node)) => {
            doc.curve_nodes[node].add_curve(curve, CurveBinding::field_from_property(property));
        }
        (ObjectRef::AnimationCurveNode(node), ObjectRef::Model(model)) => {
            doc.curve_nodes[node].model_binding = Some((model, MatrixSlot::from_property_name(property)));
        }
        (ObjectRef::AnimationCurveNode(node), ObjectRef::Geometry(geometry)) => {
            doc.curve_nodes[node].geometry_binding = Some(geometry);
        }
        (ObjectRef::AnimationCurveNode(node), ObjectRef::BlendShapeChannel(channel)) => {
            doc.curve_nodes[node].blend_shape_binding = Some(channel);
        }
        (ObjectRef::AnimationCurveNode(node), ObjectRef::Material(material)) => {
            doc.curve_nodes[node].material_binding = Some((material, property.to_string()));
        }
        (ObjectRef::Texture(texture), ObjectRef::Material(material)) => {
            let short = property.rsplit('|').next().unwrap_or(property);
            if !doc.materials[material].bind_texture(format!("{short}Tex"), texture) {
                let message = format!("Material [{}] already has a {} texture.", doc.materials[material].info.name, short);
                doc.warn(message);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Curve nodes
// ============================================================================

/// Register every curve node with the stacks of its layer: the driven model
/// becomes animated, its curves are initialized and their key times join the
/// stack's sample set.
///
/// Model bindings win over blend-shape bindings. A blend-shape node animates
/// the model owning the channel's deformed geometry.
pub fn post_process_curve_nodes(doc: &mut Document) {
    let nodes: Vec<Handle<AnimationCurveNode>> = doc.curve_nodes.handles().collect();
    for handle in nodes {
        let node = &doc.curve_nodes[handle];
        let Some(layer) = node.layer else { continue };
        let (model, is_model_binding) = match (node.model_binding, node.blend_shape_binding) {
            (Some((model, _)), _) => (Some(model), true),
            (None, Some(channel)) => (blend_shape_owner(doc, channel), false),
            (None, None) => (None, false),
        };
        let Some(model) = model else { continue };

        let curves: Vec<_> = node.curves.iter().map(|b| b.curve).collect();
        let time_base = doc.time_base;
        let mut times = Vec::new();
        for &curve in &curves {
            let curve = &mut doc.curves[curve];
            curve.initialize(time_base);
            times.extend_from_slice(&curve.key_times);
        }

        let stacks = doc.layers[layer].stacks.clone();
        for stack in stacks {
            let stack = &mut doc.stacks[stack];
            stack.add_animated_model(model);
            stack.animated_times.extend(times.iter().copied());
        }

        let layer = &mut doc.layers[layer];
        let map = if is_model_binding { &mut layer.model_curve_nodes } else { &mut layer.geometry_curve_nodes };
        let entry = map.entry(model).or_default();
        if !entry.contains(&handle) {
            entry.push(handle);
        }
    }
}

fn blend_shape_owner(doc: &Document, channel: Handle<BlendShapeChannel>) -> Option<Handle<Model>> {
    let deformer = doc.blend_shape_channels.get(channel)?.deformer?;
    let geometry = doc.deformers.get(deformer)?.geometry?;
    doc.geometries.get(geometry)?.model
}

/// Count blend-shape channels per geometry and skin clusters per model.
fn count_deformer_bindings(doc: &mut Document) {
    let channels: Vec<_> = doc.blend_shape_channels.iter().filter_map(|c| c.deformer).collect();
    for deformer in channels {
        if let Some(geometry) = doc.deformers[deformer].geometry {
            doc.geometries[geometry].blend_shape_bindings_count += 1;
        }
    }
    let clusters: Vec<_> = doc.clusters.iter().filter_map(|c| c.deformer).collect();
    for deformer in clusters {
        let owner = doc.deformers[deformer].geometry.and_then(|g| doc.geometries[g].model);
        if let Some(model) = owner {
            doc.models[model].bones_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::AnimationCurve;
    use crate::core::ImportOptions;
    use crate::scene::{AnimationLayer, AnimationStack, Camera, Deformer, ObjectInfo};

    fn c(kind: &str, source: i64, destination: i64) -> Node {
        Node::new("C").with_property(kind).with_property(source).with_property(destination)
    }

    fn oo(source: i64, destination: i64) -> Node {
        c("OO", source, destination)
    }

    fn op(source: i64, destination: i64, property: &str) -> Node {
        c("OP", source, destination).with_property(property)
    }

    fn connections(entries: Vec<Node>) -> Node {
        let mut c = Node::new("Connections");
        for e in entries {
            c = c.with_child(e);
        }
        Node::new("").with_child(c)
    }

    fn doc() -> Document {
        Document::new(ImportOptions::default(), false)
    }

    #[test]
    fn test_parse_connection() {
        let node = op(1, 2, "Lcl Translation");
        let c = Connection::from_node(&node).unwrap();
        assert_eq!(c.kind, ConnectionKind::ObjectProperty);
        assert_eq!((c.source, c.destination), (1, 2));
        assert_eq!(c.property, Some("Lcl Translation"));
        assert!(Connection::from_node(&Node::new("C").with_property("XX").with_property(1i64)).is_none());
    }

    #[test]
    fn test_hierarchy_and_root() {
        let mut doc = doc();
        let root = doc.add(Model::new(ObjectInfo::new(100, "root", "Null")));
        let child = doc.add(Model::new(ObjectInfo::new(101, "child", "Mesh")));
        let tree = connections(vec![oo(100, 0), oo(101, 100), oo(999, 100)]);

        resolve_connections(&mut doc, &tree);
        assert_eq!(doc.root_children, vec![root]);
        assert_eq!(doc.models[root].children, vec![child]);
        assert_eq!(doc.models[root].children_count, 1);
        assert_eq!(doc.models[child].parent, Some(Parent::Model(root)));
        assert!(doc.models[root].is_root_child());
    }

    #[test]
    fn test_shared_geometry_is_cloned_when_incompatible() {
        let mut doc = doc();
        let a = doc.add(Model::new(ObjectInfo::new(1, "a", "Mesh")));
        let mut b = Model::new(ObjectInfo::new(2, "b", "Mesh"));
        b.matrices.set(MatrixSlot::GeometricScaling, crate::util::Vec3::splat(2.0));
        let b = doc.add(b);
        let c = doc.add(Model::new(ObjectInfo::new(3, "c", "Mesh")));
        let g = doc.add(Geometry::new(ObjectInfo::new(10, "mesh", "Mesh")));

        resolve_connections(&mut doc, &connections(vec![oo(10, 1), oo(10, 2), oo(10, 3)]));
        assert_eq!(doc.models[a].mesh, Some(g));
        assert_eq!(doc.geometries[g].info.name, "a");
        assert_eq!(doc.models[c].mesh, Some(g));
        let cloned = doc.models[b].mesh.unwrap();
        assert_ne!(cloned, g);
        assert_eq!(doc.geometries[cloned].base, Some(g));
        assert_eq!(doc.geometries[cloned].model, Some(b));
        assert_eq!(doc.connected_geometries_count, 3);
    }

    #[test]
    fn test_camera_attribute_keeps_look_at() {
        let mut doc = doc();
        let target = doc.add(Model::new(ObjectInfo::new(1, "target", "Null")));
        let mut cam = Model::new(ObjectInfo::new(2, "cam", "Camera"));
        cam.kind = ModelKind::Camera(Camera::default());
        let cam = doc.add(cam);
        let data = Camera { field_of_view: 70.0, ..Default::default() };
        doc.add(NodeAttribute { info: ObjectInfo::new(3, "camattr", "Camera"), data: AttributeData::Camera(data) });

        resolve_connections(&mut doc, &connections(vec![op(1, 2, "LookAtProperty"), oo(3, 2)]));
        match &doc.models[cam].kind {
            ModelKind::Camera(c) => {
                assert_eq!(c.field_of_view, 70.0);
                assert_eq!(c.look_at, Some(target));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_textures_and_materials() {
        let mut doc = doc();
        let model = doc.add(Model::new(ObjectInfo::new(1, "m", "Mesh")));
        let stray = doc.add(Texture::new(ObjectInfo::new(20, "stray", "")));
        let red = doc.add(Material::new(ObjectInfo::new(10, "red", ""), 0));
        let bump = doc.add(Texture::new(ObjectInfo::new(21, "bump", "")));
        doc.add(Texture::new(ObjectInfo::new(22, "other", "")));

        let tree = connections(vec![
            oo(20, 1),
            oo(10, 1),
            op(21, 10, "Maya|NormalMap"),
            op(22, 10, "NormalMap"),
        ]);
        resolve_connections(&mut doc, &tree);

        assert_eq!(doc.models[model].materials, vec![red]);
        assert_eq!(doc.materials[red].texture(DIFFUSE_TEXTURE), Some(stray));
        assert_eq!(doc.materials[red].texture("NormalMapTex"), Some(bump));
        assert_eq!(doc.warnings, vec!["Material [red] already has a NormalMap texture.".to_string()]);
    }

    #[test]
    fn test_curve_nodes_register_animated_models() {
        let mut doc = doc();
        let model = doc.add(Model::new(ObjectInfo::new(1, "m", "Null")));
        let stack = doc.add(AnimationStack::new(ObjectInfo::new(2, "Take", "")));
        let layer = doc.add(AnimationLayer::new(ObjectInfo::new(3, "Base", "")));
        let node = doc.add(AnimationCurveNode::new(ObjectInfo::new(4, "T", "")));
        let mut curve = AnimationCurve::new(ObjectInfo::new(5, "", ""));
        curve.key_times = vec![0, 100];
        curve.key_values = vec![0.0, 1.0];
        let curve = doc.add(curve);

        let tree = connections(vec![
            oo(3, 2),
            oo(4, 3),
            op(5, 4, "d|Y"),
            op(4, 1, "Lcl Translation"),
        ]);
        resolve_connections(&mut doc, &tree);

        assert_eq!(doc.curve_nodes[node].slot(), Some(MatrixSlot::LclTranslation));
        assert_eq!(doc.curve_nodes[node].curves, vec![CurveBinding { curve, field: 1 }]);
        assert_eq!(doc.curve_nodes[node].curves_count, 1);
        assert_eq!(doc.stacks[stack].animated_models, vec![model]);
        assert_eq!(doc.stacks[stack].animated_times.iter().copied().collect::<Vec<_>>(), vec![0, 100]);
        assert_eq!(doc.layers[layer].model_curve_nodes[&model], vec![node]);
        assert!(doc.curves[curve].is_initialized());
    }

    #[test]
    fn test_blend_shape_chain() {
        let mut doc = doc();
        let model = doc.add(Model::new(ObjectInfo::new(1, "face", "Mesh")));
        let geometry = doc.add(Geometry::new(ObjectInfo::new(2, "face", "Mesh")));
        let deformer = doc.add(Deformer::new(ObjectInfo::new(3, "morph", "BlendShape")));
        let channel = doc.add(BlendShapeChannel::new(ObjectInfo::new(4, "smile", "BlendShapeChannel")));
        let stack = doc.add(AnimationStack::new(ObjectInfo::new(5, "Take", "")));
        let layer = doc.add(AnimationLayer::new(ObjectInfo::new(6, "Base", "")));
        let node = doc.add(AnimationCurveNode::new(ObjectInfo::new(7, "DeformPercent", "")));

        let tree = connections(vec![
            oo(2, 1),
            oo(3, 2),
            oo(4, 3),
            oo(6, 5),
            oo(7, 6),
            op(7, 4, "DeformPercent"),
        ]);
        resolve_connections(&mut doc, &tree);

        assert!(doc.geometries[geometry].has_blend_shapes);
        assert_eq!(doc.geometries[geometry].deformers, vec![deformer]);
        assert_eq!(doc.geometries[geometry].blend_shape_bindings_count, 1);
        assert_eq!(doc.blend_shape_channels[channel].deformer, Some(deformer));
        assert_eq!(doc.stacks[stack].animated_models, vec![model]);
        assert_eq!(doc.layers[layer].geometry_curve_nodes[&model], vec![node]);
        assert!(doc.layers[layer].model_curve_nodes.is_empty());
    }
}
