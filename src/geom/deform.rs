//! Skin clusters, blend-shape frames and material remapping.

use tracing::debug;

use crate::scene::{BlendShapeChannel, BoneWeight, Cluster, Document, Geometry, Model};
use crate::util::{try_inverse, Error, Handle, Result};

/// Turn skin clusters into bones, bind poses and per-point weights, and
/// prepare blend-shape frames.
///
/// Runs when animation import or blend shapes are enabled.
pub fn post_process_deformers(doc: &mut Document) -> Result<()> {
    if !doc.options.imports_animation() && !doc.options.import_blend_shapes {
        return Ok(());
    }
    let clusters: Vec<Handle<Cluster>> = doc.clusters.handles().collect();
    for cluster in clusters {
        bind_cluster(doc, cluster)?;
    }
    if doc.options.import_blend_shapes {
        let channels: Vec<Handle<BlendShapeChannel>> = doc.blend_shape_channels.handles().collect();
        for channel in channels {
            bind_blend_shape(doc, channel);
        }
    }
    Ok(())
}

/// Model owning the geometry a sub-deformer's deformer is attached to.
fn deformed_target(doc: &Document, deformer: Option<Handle<crate::scene::Deformer>>) -> Option<(Handle<Geometry>, Handle<Model>)> {
    let geometry = doc.deformers.get(deformer?)?.geometry?;
    let model = doc.geometries.get(geometry)?.model?;
    Some((geometry, model))
}

fn bind_cluster(doc: &mut Document, handle: Handle<Cluster>) -> Result<()> {
    let cluster = &doc.clusters[handle];
    let Some((geometry, owner)) = deformed_target(doc, cluster.deformer) else {
        return Ok(());
    };
    let Some(bone) = cluster.model else {
        let message = format!("Deformer [{}] has no model assigned.", cluster.info.name);
        doc.warn(message);
        return Ok(());
    };
    if doc.models[owner].bones.contains(&bone) {
        return Ok(());
    }

    let link_inverse = try_inverse(&cluster.transform_link).ok_or_else(|| Error::NonInvertibleMatrix(cluster.info.name.clone()))?;
    let bind_pose = doc.coords.convert_matrix(&(link_inverse * doc.global_matrix(owner)), false);
    let influences: Vec<(i32, f32)> = cluster.influences().collect();

    let model = &mut doc.models[owner];
    model.bones.push(bone);
    model.bind_poses.push(bind_pose);
    model.bones_count = model.bones.len();
    let index = model.bones.len() - 1;

    let target = &mut doc.geometries[geometry];
    let mut dropped = 0;
    for (vertex, weight) in influences {
        let added = usize::try_from(vertex).is_ok_and(|v| target.add_bone_weight(v, BoneWeight { bone: index, weight }));
        if !added {
            dropped += 1;
        }
    }
    if dropped > 0 {
        let message = format!(
            "Deformer [{}] has {} weights outside geometry [{}].",
            doc.clusters[handle].info.name, dropped, doc.geometries[geometry].info.name
        );
        doc.warn(message);
    }
    debug!("bone '{}' bound to '{}' as #{}", doc.models[bone].info.name, doc.models[owner].info.name, index);
    Ok(())
}

/// Attach a channel to its geometry. Channels may share a target shape,
/// which is converted only once.
fn bind_blend_shape(doc: &mut Document, handle: Handle<BlendShapeChannel>) {
    let channel = &doc.blend_shape_channels[handle];
    let Some((geometry, _)) = deformed_target(doc, channel.deformer) else {
        return;
    };
    let Some(shape) = channel.shape else {
        return;
    };
    let frame_weight = channel.frame_weight();
    doc.geometries[geometry].blend_shapes.push(handle);
    if doc.blend_shape_geometries[shape].processed {
        return;
    }

    let coords = &doc.coords;
    let target = &mut doc.blend_shape_geometries[shape];
    target.frame_weight = frame_weight;
    for v in &mut target.vertices {
        *v = coords.convert_vector(*v, true);
    }
    if let Some(normals) = &mut target.normals {
        for n in normals {
            *n = coords.convert_vector(*n, false);
        }
    }
    target.processed = true;
}

/// Resolve each submesh's layer material through its model's material list.
pub fn remap_materials(doc: &mut Document, geometry: Handle<Geometry>) {
    let Some(model) = doc.geometries[geometry].model else {
        return;
    };
    let indices: Vec<i32> = doc.models[model]
        .materials
        .iter()
        .map(|&m| doc.materials.get(m).map_or(-1, |m| m.index))
        .collect();
    if let Some(mesh) = &mut doc.geometries[geometry].mesh {
        for submesh in &mut mesh.submeshes {
            submesh.material = usize::try_from(submesh.layer_material)
                .ok()
                .and_then(|i| indices.get(i).copied())
                .unwrap_or(-1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImportOptions;
    use crate::geom::{LayerAccessor, MappingType, MeshBuffers, SubMesh};
    use crate::scene::{BlendShapeGeometry, Deformer, Material, ObjectInfo, Parent};
    use crate::util::{Mat4, Vec3};

    struct Skinned {
        doc: Document,
        owner: Handle<Model>,
        geometry: Handle<Geometry>,
        deformer: Handle<Deformer>,
    }

    fn skinned() -> Skinned {
        let mut doc = Document::new(ImportOptions::default().with_file_scale(false), false);
        let mut owner = Model::new(ObjectInfo::new(1, "body", "Mesh"));
        owner.parent = Some(Parent::Document);
        let owner = doc.add(owner);
        let mut geometry = Geometry::new(ObjectInfo::new(2, "body", "Mesh"));
        geometry.layers.positions = LayerAccessor::new(vec![0.0; 9], None, None, 3, MappingType::ByVertex);
        geometry.model = Some(owner);
        let geometry = doc.add(geometry);
        let mut deformer = Deformer::new(ObjectInfo::new(3, "skin", "Skin"));
        deformer.geometry = Some(geometry);
        let deformer = doc.add(deformer);
        Skinned { doc, owner, geometry, deformer }
    }

    fn cluster(s: &mut Skinned, id: i64, bone: Option<Handle<Model>>) -> Handle<Cluster> {
        let mut c = Cluster::new(ObjectInfo::new(id, format!("cluster{id}"), "Cluster"));
        c.indexes = vec![0, 2];
        c.weights = vec![1.0, 0.5];
        c.model = bone;
        c.deformer = Some(s.deformer);
        s.doc.add(c)
    }

    #[test]
    fn test_cluster_becomes_bone() {
        let mut s = skinned();
        let bone = s.doc.add(Model::new(ObjectInfo::new(10, "arm", "LimbNode")));
        let c = cluster(&mut s, 11, Some(bone));
        s.doc.clusters[c].transform_link = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));

        post_process_deformers(&mut s.doc).unwrap();

        let owner = &s.doc.models[s.owner];
        assert_eq!(owner.bones, vec![bone]);
        assert_eq!(owner.bind_poses.len(), 1);
        assert!(owner.bind_poses[0].w_axis.truncate().abs_diff_eq(Vec3::new(0.0, -2.0, 0.0), 1e-5));
        let weights = &s.doc.geometries[s.geometry].bone_weights;
        assert_eq!(weights[0][0], BoneWeight { bone: 0, weight: 1.0 });
        assert_eq!(weights[2][0], BoneWeight { bone: 0, weight: 0.5 });
        assert!(weights[1].is_empty());
        assert_eq!(weights.len(), 3);
    }

    #[test]
    fn test_weights_past_the_control_points_are_dropped() {
        let mut s = skinned();
        let bone = s.doc.add(Model::new(ObjectInfo::new(10, "arm", "LimbNode")));
        let c = cluster(&mut s, 11, Some(bone));
        s.doc.clusters[c].indexes = vec![1, 5_000_000, i32::MAX, -4];
        s.doc.clusters[c].weights = vec![0.5, 1.0, 1.0, 1.0];

        post_process_deformers(&mut s.doc).unwrap();
        let weights = &s.doc.geometries[s.geometry].bone_weights;
        assert_eq!(weights.len(), 3);
        assert_eq!(weights[1][0], BoneWeight { bone: 0, weight: 0.5 });
        assert_eq!(s.doc.warnings, vec!["Deformer [cluster11] has 3 weights outside geometry [body].".to_string()]);
    }

    #[test]
    fn test_repeated_bone_is_skipped() {
        let mut s = skinned();
        let bone = s.doc.add(Model::new(ObjectInfo::new(10, "arm", "LimbNode")));
        cluster(&mut s, 11, Some(bone));
        cluster(&mut s, 12, Some(bone));

        post_process_deformers(&mut s.doc).unwrap();
        assert_eq!(s.doc.models[s.owner].bones.len(), 1);
        assert_eq!(s.doc.geometries[s.geometry].bone_weights[0].len(), 1);
    }

    #[test]
    fn test_cluster_without_model_warns() {
        let mut s = skinned();
        cluster(&mut s, 11, None);
        post_process_deformers(&mut s.doc).unwrap();
        assert!(s.doc.models[s.owner].bones.is_empty());
        assert_eq!(s.doc.warnings, vec!["Deformer [cluster11] has no model assigned.".to_string()]);
    }

    #[test]
    fn test_singular_link_is_an_error() {
        let mut s = skinned();
        let bone = s.doc.add(Model::new(ObjectInfo::new(10, "arm", "LimbNode")));
        let c = cluster(&mut s, 11, Some(bone));
        s.doc.clusters[c].transform_link = Mat4::ZERO;
        assert!(matches!(post_process_deformers(&mut s.doc), Err(Error::NonInvertibleMatrix(_))));
    }

    #[test]
    fn test_blend_shape_frame_is_converted_once() {
        let mut s = skinned();
        let mut shape = BlendShapeGeometry::new(ObjectInfo::new(20, "smile", "Shape"));
        shape.indexes = vec![1];
        shape.vertices = vec![Vec3::new(1.0, 0.0, 0.0)];
        let shape = s.doc.add(shape);
        let channels: Vec<_> = [21, 22]
            .into_iter()
            .map(|id| {
                let mut ch = BlendShapeChannel::new(ObjectInfo::new(id, "smile", "BlendShapeChannel"));
                ch.shape = Some(shape);
                ch.deformer = Some(s.deformer);
                ch.full_weights = vec![80.0];
                s.doc.add(ch)
            })
            .collect();

        post_process_deformers(&mut s.doc).unwrap();
        let target = &s.doc.blend_shape_geometries[shape];
        assert!(target.processed);
        assert_eq!(target.frame_weight, 80.0);
        // Default axes are right handed, so X is mirrored exactly once.
        assert_eq!(target.vertices[0], Vec3::new(-1.0, 0.0, 0.0));
        // Both channels stay bound even though they share the shape.
        assert_eq!(s.doc.geometries[s.geometry].blend_shapes, channels);
    }

    #[test]
    fn test_disabled_imports_skip_deformers() {
        let mut s = skinned();
        s.doc.options = ImportOptions::default()
            .with_animation_type(crate::core::AnimationType::None)
            .with_blend_shapes(false);
        let bone = s.doc.add(Model::new(ObjectInfo::new(10, "arm", "LimbNode")));
        cluster(&mut s, 11, Some(bone));
        post_process_deformers(&mut s.doc).unwrap();
        assert!(s.doc.models[s.owner].bones.is_empty());
    }

    #[test]
    fn test_remap_materials() {
        let mut s = skinned();
        let red = s.doc.add(Material::new(ObjectInfo::new(30, "red", ""), 4));
        s.doc.models[s.owner].materials.push(red);
        s.doc.geometries[s.geometry].mesh = Some(MeshBuffers {
            submeshes: vec![
                SubMesh { layer_material: 0, material: -1, ..Default::default() },
                SubMesh { layer_material: 3, material: 7, ..Default::default() },
            ],
            ..Default::default()
        });

        remap_materials(&mut s.doc, s.geometry);
        let mesh = s.doc.geometries[s.geometry].mesh.as_ref().unwrap();
        assert_eq!(mesh.submeshes[0].material, 4);
        assert_eq!(mesh.submeshes[1].material, -1);
    }
}
