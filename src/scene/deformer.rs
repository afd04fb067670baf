//! Skin and blend-shape deformers with their sub-deformers.

use crate::util::{Handle, Mat4};

use super::object::scene_object;
use super::{BlendShapeGeometry, Geometry, InheritDefaults, Model, ObjectInfo};

/// `Deformer` object (`Skin` or `BlendShape` class).
#[derive(Clone, Debug, Default)]
pub struct Deformer {
    pub info: ObjectInfo,
    pub link_deform_accuracy: Option<f32>,
    pub geometry: Option<Handle<Geometry>>,
}

scene_object!(Deformer, Deformer);

impl Deformer {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    pub fn is_skin(&self) -> bool {
        self.info.class == "Skin"
    }

    pub fn is_blend_shape(&self) -> bool {
        self.info.class == "BlendShape"
    }
}

impl InheritDefaults for Deformer {
    fn inherit_from(&mut self, template: &Self) {
        self.link_deform_accuracy = self.link_deform_accuracy.or(template.link_deform_accuracy);
    }
}

/// Skin cluster: one bone's influence over a set of control points.
#[derive(Clone, Debug, Default)]
pub struct Cluster {
    pub info: ObjectInfo,
    pub indexes: Vec<i32>,
    pub weights: Vec<f32>,
    pub transform: Mat4,
    pub transform_link: Mat4,
    /// Bone driving the cluster.
    pub model: Option<Handle<Model>>,
    pub deformer: Option<Handle<Deformer>>,
}

scene_object!(Cluster, Cluster);

impl Cluster {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, transform: Mat4::IDENTITY, transform_link: Mat4::IDENTITY, ..Default::default() }
    }

    /// Control point / weight pairs; the shorter array bounds the count.
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.indexes.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Blend-shape channel sub-deformer.
#[derive(Clone, Debug, Default)]
pub struct BlendShapeChannel {
    pub info: ObjectInfo,
    pub deform_percent: Option<f32>,
    pub full_weights: Vec<f32>,
    pub shape: Option<Handle<BlendShapeGeometry>>,
    pub model: Option<Handle<Model>>,
    pub deformer: Option<Handle<Deformer>>,
}

scene_object!(BlendShapeChannel, BlendShapeChannel);

impl BlendShapeChannel {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    /// Weight at which the shape is fully applied.
    pub fn frame_weight(&self) -> f32 {
        self.full_weights.first().copied().unwrap_or(100.0)
    }
}

impl InheritDefaults for BlendShapeChannel {
    fn inherit_from(&mut self, template: &Self) {
        self.deform_percent = self.deform_percent.or(template.deform_percent);
        if self.full_weights.is_empty() {
            self.full_weights.clone_from(&template.full_weights);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_influences_zip() {
        let mut c = Cluster::new(ObjectInfo::new(1, "c", "Cluster"));
        c.indexes = vec![0, 4, 7];
        c.weights = vec![1.0, 0.5];
        let pairs: Vec<_> = c.influences().collect();
        assert_eq!(pairs, vec![(0, 1.0), (4, 0.5)]);
        assert_eq!(c.transform_link, Mat4::IDENTITY);
    }

    #[test]
    fn test_frame_weight_default() {
        let mut ch = BlendShapeChannel::new(ObjectInfo::new(2, "smile", "BlendShapeChannel"));
        assert_eq!(ch.frame_weight(), 100.0);
        ch.full_weights = vec![50.0, 100.0];
        assert_eq!(ch.frame_weight(), 50.0);
    }

    #[test]
    fn test_deformer_class() {
        let d = Deformer::new(ObjectInfo::new(3, "skin", "Skin"));
        assert!(d.is_skin());
        assert!(!d.is_blend_shape());
    }
}
