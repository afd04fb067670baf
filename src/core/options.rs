//! Import options read by the processing pipeline.
//!
//! Each flag gates one optional pass or one per-field conversion; none of
//! them change the structure of the pipeline itself.

/// Which kind of animation the host wants. `None` skips every animation object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AnimationType {
    None,
    Legacy,
    #[default]
    Generic,
    Humanoid,
}

/// Whether model pivots are computed after the model pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PivotMode {
    /// Pivots stay baked into the transforms.
    Legacy,
    /// Compute a world-space pivot from each model's rotation pivot.
    #[default]
    PreservePivot,
}

/// Options controlling what gets imported and how values are converted.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportOptions {
    pub import_meshes: bool,
    pub import_materials: bool,
    pub import_textures: bool,
    pub import_cameras: bool,
    pub import_lights: bool,
    pub import_normals: bool,
    pub import_tangents: bool,
    pub import_colors: bool,
    pub import_blend_shapes: bool,
    pub import_visibility: bool,
    pub animation_type: AnimationType,
    /// Emit quads as quads instead of splitting them into two triangles.
    pub keep_quads: bool,
    /// Bake the document axis conversion into vertices and transforms
    /// instead of applying it on root nodes.
    pub bake_axis_conversion: bool,
    /// Multiply positions by `UnitScaleFactor / 100`.
    pub use_file_scale: bool,
    pub scale_factor: f32,
    /// Multiplier on the frame step of the resampling grid.
    pub resample_frequency: f32,
    pub pivot_mode: PivotMode,
    /// Carried for the host's material mapping; no pass in this crate reads it.
    pub do_pbr_conversion: bool,
    /// Emit user-facing warnings (missing bone models, texture conflicts, ...).
    pub show_loading_warnings: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            import_meshes: true,
            import_materials: true,
            import_textures: true,
            import_cameras: true,
            import_lights: true,
            import_normals: true,
            import_tangents: true,
            import_colors: true,
            import_blend_shapes: true,
            import_visibility: true,
            animation_type: AnimationType::Generic,
            keep_quads: false,
            bake_axis_conversion: false,
            use_file_scale: true,
            scale_factor: 1.0,
            resample_frequency: 1.0,
            pivot_mode: PivotMode::PreservePivot,
            do_pbr_conversion: true,
            show_loading_warnings: true,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn imports_animation(&self) -> bool {
        self.animation_type != AnimationType::None
    }

    pub fn with_animation_type(mut self, animation_type: AnimationType) -> Self {
        self.animation_type = animation_type;
        self
    }

    pub fn with_keep_quads(mut self, keep: bool) -> Self {
        self.keep_quads = keep;
        self
    }

    pub fn with_bake_axis_conversion(mut self, bake: bool) -> Self {
        self.bake_axis_conversion = bake;
        self
    }

    pub fn with_file_scale(mut self, use_file_scale: bool) -> Self {
        self.use_file_scale = use_file_scale;
        self
    }

    pub fn with_scale_factor(mut self, scale: f32) -> Self {
        self.scale_factor = scale;
        self
    }

    pub fn with_resample_frequency(mut self, frequency: f32) -> Self {
        self.resample_frequency = frequency;
        self
    }

    pub fn with_pivot_mode(mut self, mode: PivotMode) -> Self {
        self.pivot_mode = mode;
        self
    }

    pub fn with_blend_shapes(mut self, import: bool) -> Self {
        self.import_blend_shapes = import;
        self
    }

    pub fn with_visibility(mut self, import: bool) -> Self {
        self.import_visibility = import;
        self
    }

    pub fn with_warnings(mut self, show: bool) -> Self {
        self.show_loading_warnings = show;
        self
    }
}
