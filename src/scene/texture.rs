//! Textures, layered textures and the video (media) objects behind them.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::util::{Error, Handle, Result, Vec2, Vec3, Vec4};

use super::object::scene_object;
use super::{InheritDefaults, ObjectInfo};

/// Texture coordinate wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

impl WrapMode {
    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            Self::Clamp
        } else {
            Self::Repeat
        }
    }
}

/// Sub-textures of a `LayeredTexture`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureLayers {
    pub textures: Vec<Handle<Texture>>,
    pub blend_modes: Option<i32>,
    pub weights: Vec<f32>,
}

impl TextureLayers {
    /// Layers without an explicit weight are fully opaque.
    pub fn weight(&self, index: usize) -> f32 {
        self.weights.get(index).copied().unwrap_or(1.0)
    }
}

/// `Texture` or `LayeredTexture` object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture {
    pub info: ObjectInfo,

    pub texture_type_use: Option<i32>,
    pub texture_alpha: Option<f32>,
    pub current_mapping_type: Option<i32>,
    pub wrap_mode_u: Option<WrapMode>,
    pub wrap_mode_v: Option<WrapMode>,
    pub uv_swap: Option<bool>,
    pub premultiply_alpha: Option<bool>,
    pub translation: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scaling: Option<Vec3>,
    pub rotation_pivot: Option<Vec3>,
    pub scaling_pivot: Option<Vec3>,
    pub current_blend_mode: Option<i32>,
    pub uv_set: Option<String>,
    pub use_material: Option<bool>,
    pub use_mip_map: Option<bool>,
    pub alpha_source: Option<i32>,
    pub cropping: Option<Vec4>,

    pub texture_name: Option<String>,
    pub media: Option<String>,
    pub full_filename: Option<String>,
    pub relative_filename: Option<String>,
    pub model_uv_translation: Option<Vec2>,
    pub model_uv_scaling: Option<Vec2>,
    pub alpha_source_name: Option<String>,
    pub kind: Option<String>,

    /// Present on `LayeredTexture` objects.
    pub layers: Option<TextureLayers>,
    pub video: Option<Handle<Video>>,
    /// Final file name after texture post-processing.
    pub resolved_filename: Option<String>,
    /// Set by texture post-processing when the linked video embeds the image.
    pub has_embedded_content: bool,
}

scene_object!(Texture, Texture);

impl Texture {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    pub fn new_layered(info: ObjectInfo) -> Self {
        Self { info, layers: Some(TextureLayers::default()), ..Default::default() }
    }

    #[inline]
    pub fn is_layered(&self) -> bool {
        self.layers.is_some()
    }

    /// Relative name first, then the absolute one.
    pub fn filename(&self) -> Option<&str> {
        self.relative_filename.as_deref().or(self.full_filename.as_deref())
    }

    pub fn uv_scale(&self) -> Vec2 {
        self.scaling.map(|s| s.truncate()).or(self.model_uv_scaling).unwrap_or(Vec2::ONE)
    }

    pub fn uv_offset(&self) -> Vec2 {
        self.translation.map(|t| t.truncate()).or(self.model_uv_translation).unwrap_or(Vec2::ZERO)
    }

    /// Append a sub-texture. No-op on plain textures.
    pub fn add_layer(&mut self, texture: Handle<Texture>) {
        if let Some(layers) = &mut self.layers {
            layers.textures.push(texture);
        }
    }
}

impl InheritDefaults for Texture {
    fn inherit_from(&mut self, t: &Self) {
        macro_rules! fill {
            ($($field:ident),*) => {
                $(if self.$field.is_none() {
                    self.$field.clone_from(&t.$field);
                })*
            };
        }
        fill!(
            texture_type_use,
            texture_alpha,
            current_mapping_type,
            wrap_mode_u,
            wrap_mode_v,
            uv_swap,
            premultiply_alpha,
            translation,
            rotation,
            scaling,
            rotation_pivot,
            scaling_pivot,
            current_blend_mode,
            uv_set,
            use_material,
            use_mip_map,
            alpha_source,
            cropping
        );
    }
}

/// Embedded media payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoContent {
    /// Raw bytes from a binary file.
    Bytes(Vec<u8>),
    /// Base64 text from an ASCII file.
    Base64(String),
}

impl VideoContent {
    /// Decoded payload bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Base64(text) => decode_base64(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Base64(text) => text.trim().is_empty(),
        }
    }
}

/// `Video` object: a file reference with optional embedded content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Video {
    pub info: ObjectInfo,
    pub path: Option<String>,
    pub rel_path: Option<String>,
    pub color: Option<Vec3>,
    pub clip_in: Option<i64>,
    pub clip_out: Option<i64>,
    pub mute: Option<bool>,
    pub image_sequence: Option<bool>,
    pub image_sequence_offset: Option<i32>,
    pub frame_rate: Option<i32>,
    pub last_frame: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub start_frame: Option<i32>,
    pub stop_frame: Option<i32>,
    pub play_offset: Option<f32>,
    pub offset: Option<i64>,
    pub interlace_mode: Option<i32>,
    pub free_running: Option<bool>,
    pub looping: Option<bool>,
    pub access_mode: Option<i32>,

    pub filename: Option<String>,
    pub relative_filename: Option<String>,
    pub kind: Option<String>,
    pub content: Option<VideoContent>,
}

scene_object!(Video, Video);

impl Video {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

impl InheritDefaults for Video {
    fn inherit_from(&mut self, t: &Self) {
        self.color = self.color.or(t.color);
        self.mute = self.mute.or(t.mute);
        self.image_sequence = self.image_sequence.or(t.image_sequence);
        self.frame_rate = self.frame_rate.or(t.frame_rate);
        self.width = self.width.or(t.width);
        self.height = self.height.or(t.height);
        self.interlace_mode = self.interlace_mode.or(t.interlace_mode);
        self.free_running = self.free_running.or(t.free_running);
        self.looping = self.looping.or(t.looping);
        self.access_mode = self.access_mode.or(t.access_mode);
    }
}

/// Standard-alphabet base64; line breaks from ASCII files are dropped first.
fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD
        .decode(compact)
        .map_err(|e| Error::invalid(format!("invalid base64 content: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_prefers_relative() {
        let mut t = Texture::new(ObjectInfo::new(1, "tex", ""));
        t.full_filename = Some("C:/art/wood.png".into());
        assert_eq!(t.filename(), Some("C:/art/wood.png"));
        t.relative_filename = Some("wood.png".into());
        assert_eq!(t.filename(), Some("wood.png"));
    }

    #[test]
    fn test_uv_transform_fallbacks() {
        let mut t = Texture::default();
        assert_eq!(t.uv_scale(), Vec2::ONE);
        t.model_uv_scaling = Some(Vec2::new(2.0, 3.0));
        assert_eq!(t.uv_scale(), Vec2::new(2.0, 3.0));
        t.scaling = Some(Vec3::new(4.0, 5.0, 1.0));
        assert_eq!(t.uv_scale(), Vec2::new(4.0, 5.0));
    }

    #[test]
    fn test_layers() {
        let mut layered = Texture::new_layered(ObjectInfo::new(2, "layered", ""));
        layered.add_layer(Handle::new(0));
        layered.add_layer(Handle::new(1));
        let layers = layered.layers.as_ref().unwrap();
        assert_eq!(layers.textures.len(), 2);
        assert_eq!(layers.weight(1), 1.0);

        let mut plain = Texture::default();
        plain.add_layer(Handle::new(0));
        assert!(plain.layers.is_none());
    }

    #[test]
    fn test_inherit_placement() {
        let mut template = Texture::default();
        template.wrap_mode_u = Some(WrapMode::Clamp);
        template.uv_set = Some("map1".into());
        let mut t = Texture::new(ObjectInfo::new(3, "t", ""));
        t.uv_set = Some("uv2".into());
        t.inherit_from(&template);
        assert_eq!(t.wrap_mode_u, Some(WrapMode::Clamp));
        assert_eq!(t.uv_set.as_deref(), Some("uv2"));
    }

    #[test]
    fn test_base64_content() {
        let content = VideoContent::Base64("aGVs\nbG8=".into());
        assert_eq!(content.decode().unwrap(), b"hello");
        assert!(VideoContent::Base64("@@".into()).decode().is_err());
        assert_eq!(VideoContent::Bytes(vec![1, 2]).decode().unwrap(), vec![1, 2]);
    }
}
