//! The processing pipeline: node tree in, populated [`Document`] out.
//!
//! Phases run strictly in order, each consuming the previous one's output:
//!
//! 1. header extension and global settings
//! 2. definitions and preallocation
//! 3. objects
//! 4. connections
//! 5. models
//! 6. pivots
//! 7. geometries
//! 8. animations
//! 9. textures
//!
//! ```ignore
//! use fbx_scene::{node::load_json, process, ImportOptions};
//!
//! let root = load_json("scene.json")?;
//! let doc = process(&root, false, &ImportOptions::default())?;
//! doc.walk_models(|model, depth| println!("{:indent$}{}", "", doc.models[model].info.name, indent = depth * 2));
//! ```

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::anim::post_process_animations;
use crate::builders::{read_definitions, read_global_settings, read_header, read_objects};
use crate::connections::resolve_connections;
use crate::core::{ImportOptions, PivotMode};
use crate::geom::{post_process_deformers, remap_materials, triangulate};
use crate::node::{load_json, Node, NodeTag};
use crate::scene::{Document, Geometry, LocalTransform, MatrixSlot, Model};
use crate::util::{decompose, rot_y, Handle, Quat, Result};

/// Pipeline phase, reported with progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Header,
    Definitions,
    Objects,
    Connections,
    Models,
    Pivots,
    Geometries,
    Animations,
    Textures,
}

impl Phase {
    pub const ALL: [Phase; 9] = [
        Phase::Header,
        Phase::Definitions,
        Phase::Objects,
        Phase::Connections,
        Phase::Models,
        Phase::Pivots,
        Phase::Geometries,
        Phase::Animations,
        Phase::Textures,
    ];

    /// Fraction of the pipeline done once this phase finishes.
    pub fn progress(self) -> f32 {
        let index = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        (index + 1) as f32 / Self::ALL.len() as f32
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Header => "header",
            Phase::Definitions => "definitions",
            Phase::Objects => "objects",
            Phase::Connections => "connections",
            Phase::Models => "models",
            Phase::Pivots => "pivots",
            Phase::Geometries => "geometries",
            Phase::Animations => "animations",
            Phase::Textures => "textures",
        };
        f.write_str(name)
    }
}

/// Process a parsed node tree into a document.
pub fn process(root: &Node, is_binary: bool, options: &ImportOptions) -> Result<Document> {
    process_with_progress(root, is_binary, options, |_, _| {})
}

/// [`process`], calling `progress` after each phase with a fraction in `[0, 1]`.
pub fn process_with_progress(
    root: &Node,
    is_binary: bool,
    options: &ImportOptions,
    mut progress: impl FnMut(Phase, f32),
) -> Result<Document> {
    let mut doc = Document::new(options.clone(), is_binary);
    let mut done = |phase: Phase| {
        debug!("phase '{}' done", phase);
        progress(phase, phase.progress());
    };

    read_header(&mut doc, root)?;
    read_global_settings(&mut doc, root);
    done(Phase::Header);

    read_definitions(&mut doc, root);
    doc.preallocate();
    done(Phase::Definitions);

    read_objects(&mut doc, root);
    done(Phase::Objects);

    resolve_connections(&mut doc, root);
    done(Phase::Connections);

    post_process_models(&mut doc);
    done(Phase::Models);

    if doc.options.pivot_mode != PivotMode::Legacy {
        post_process_pivots(&mut doc);
    }
    done(Phase::Pivots);

    if doc.options.import_meshes {
        post_process_geometries(&mut doc)?;
    }
    done(Phase::Geometries);

    post_process_animations(&mut doc)?;
    done(Phase::Animations);

    if doc.options.import_textures {
        post_process_textures(&mut doc);
    }
    done(Phase::Textures);

    info!(
        "FBX {}: {} models, {} geometries, {} materials, {} stacks, {} warnings",
        doc.header.version,
        doc.models.len(),
        doc.geometries.len(),
        doc.materials.len(),
        doc.stacks.len(),
        doc.warnings.len()
    );
    Ok(doc)
}

/// Load a JSON node tree and process it. The encoding is detected from the
/// object names.
pub fn load(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Document> {
    let root = load_json(path)?;
    process(&root, detect_binary(&root), options)
}

/// Binary files name objects `name\0\x01Class`, ASCII files `Class::name`.
pub fn detect_binary(root: &Node) -> bool {
    root.child(NodeTag::Objects)
        .into_iter()
        .flat_map(Node::children)
        .filter_map(|object| object.str_at(1))
        .next()
        .is_some_and(|name| name.contains("\u{0}\u{1}"))
}

// ============================================================================
// Models
// ============================================================================

/// Convert every model's local matrix into the output space.
pub fn post_process_models(doc: &mut Document) {
    let handles: Vec<Handle<Model>> = doc.models.handles().collect();
    for handle in handles {
        let model = &doc.models[handle];
        if !model.rotation_order().is_supported() {
            let message = format!("Model [{}] uses an unsupported rotation order; rotation is ignored.", model.info.name);
            doc.warn(message);
        }
        let transform = local_transform(doc, handle);
        doc.models[handle].transform = transform;
    }
}

// ============================================================================
// Pivots
// ============================================================================

/// Move each rotation pivot into world space for models without bind poses.
///
/// Animated documents keep their baked pivots: any stack with sample times
/// skips the whole pass with a warning.
pub fn post_process_pivots(doc: &mut Document) {
    if doc.stacks.iter().any(|s| !s.animated_times.is_empty()) {
        doc.warn("Pivots of animated models can't be moved; keeping baked pivots.");
        return;
    }
    let mut handles = Vec::with_capacity(doc.models.len());
    doc.walk_models(|handle, _| handles.push(handle));
    for handle in handles {
        let model = &doc.models[handle];
        if !model.bind_poses.is_empty() {
            continue;
        }
        let pivot = doc.coords.convert_vector(model.matrices.get(MatrixSlot::RotationPivot, None), true);
        let (pivot, _) = doc.coords.apply_orientation(pivot, Quat::IDENTITY, model.is_root_child());
        let matrix = doc.global_matrix_no_scale(handle);

        let model = &mut doc.models[handle];
        model.original_global_matrix = matrix;
        model.pivot = matrix.transform_point3(pivot);
        model.has_custom_pivot = true;
    }
    debug!("pivots: {} models", doc.models.iter().filter(|m| m.has_custom_pivot).count());
}

/// Decomposed, converted local transform. Cameras without a target and
/// lights get a half turn about Y to face down the converted forward axis.
pub fn local_transform(doc: &Document, handle: Handle<Model>) -> LocalTransform {
    let model = &doc.models[handle];
    let (t, r, s) = decompose(&model.local_matrix());
    let (translation, mut rotation, scale) = doc.coords.convert_trs(t, r, s, model.is_root_child());
    if model.faces_backward() {
        rotation *= rot_y(180.0);
    }
    LocalTransform { translation, rotation, scale }
}

// ============================================================================
// Geometries
// ============================================================================

/// Bind deformers, then triangulate each model's mesh and resolve its
/// material indices.
pub fn post_process_geometries(doc: &mut Document) -> Result<()> {
    post_process_deformers(doc)?;

    let meshes: Vec<(Handle<Model>, Handle<Geometry>)> =
        doc.models.iter_handles().filter_map(|(h, m)| m.mesh.map(|g| (h, g))).collect();
    for (model, geometry) in meshes {
        if doc.geometries[geometry].mesh.is_some() {
            continue;
        }
        let buffers = {
            let g = &doc.geometries[geometry];
            triangulate(
                &g.layers,
                &g.polygon_vertex_index,
                &doc.coords,
                doc.models[model].geometric_matrix(),
                doc.options.keep_quads,
            )
        };
        if buffers.skipped_polygons > 0 {
            let message = format!(
                "Geometry [{}] has {} polygons that could not be triangulated.",
                doc.geometries[geometry].info.name, buffers.skipped_polygons
            );
            doc.warn(message);
        }
        debug!(
            "mesh '{}': {} vertices, {} triangles, {} quads",
            doc.geometries[geometry].info.name,
            buffers.vertices.len(),
            buffers.triangle_count(),
            buffers.quad_count()
        );
        doc.geometries[geometry].mesh = Some(buffers);
        remap_materials(doc, geometry);
    }
    Ok(())
}

// ============================================================================
// Textures
// ============================================================================

/// Resolve file names (relative first, then the linked video's) and flag
/// embedded media.
pub fn post_process_textures(doc: &mut Document) {
    let handles: Vec<_> = doc.textures.handles().collect();
    for handle in handles {
        let texture = &doc.textures[handle];
        let video = texture.video.and_then(|v| doc.videos.get(v));
        let resolved = texture
            .filename()
            .or_else(|| video.and_then(|v| v.relative_filename.as_deref().or(v.filename.as_deref())))
            .map(str::to_string);
        let embedded = video.is_some_and(|v| v.has_content());

        let texture = &mut doc.textures[handle];
        texture.resolved_filename = resolved;
        texture.has_embedded_content = embedded;
    }
}
