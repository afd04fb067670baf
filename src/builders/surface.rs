//! Surface objects: materials, textures, videos and shader implementations.

use crate::node::{Node, NodeTag, Property};
use crate::scene::{
    BindingTable, Document, Implementation, Material, ObjectInfo, PropertyValue, Texture, Video, VideoContent,
    WrapMode,
};

use super::{child_string, definition_slot, set, ObjectBuilder};

impl ObjectBuilder for Material {
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self {
        let index = if info.is_template() { -1 } else { doc.materials.len() as i32 };
        let mut material = Material::new(info, index);
        for entry in node.properties70() {
            if let Some(value) = PropertyValue::from_entry(&entry) {
                material.properties.insert(entry.short_name(), value);
            }
        }
        material.multi_layer = node.child(NodeTag::MultiLayer).and_then(|n| n.i32_at(0));
        material.shading_model = child_string(node, NodeTag::ShadingModel);
        material
    }

    definition_slot!(materials);
}

impl ObjectBuilder for Texture {
    /// Reads both `Texture` and `LayeredTexture` nodes.
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut texture = if node.tag() == NodeTag::LayeredTexture {
            Texture::new_layered(info)
        } else {
            Texture::new(info)
        };

        for entry in node.properties70() {
            let t = &mut texture;
            match entry.name() {
                "TextureTypeUse" => set(&mut t.texture_type_use, entry.i32()),
                "Texture alpha" => set(&mut t.texture_alpha, entry.f32()),
                "CurrentMappingType" => set(&mut t.current_mapping_type, entry.i32()),
                "WrapModeU" => set(&mut t.wrap_mode_u, entry.i32().map(WrapMode::from_i32)),
                "WrapModeV" => set(&mut t.wrap_mode_v, entry.i32().map(WrapMode::from_i32)),
                "UVSwap" => set(&mut t.uv_swap, entry.bool()),
                "PremultiplyAlpha" => set(&mut t.premultiply_alpha, entry.bool()),
                "Translation" => set(&mut t.translation, entry.vec3()),
                "Rotation" => set(&mut t.rotation, entry.vec3()),
                "Scaling" => set(&mut t.scaling, entry.vec3()),
                "TextureRotationPivot" => set(&mut t.rotation_pivot, entry.vec3()),
                "TextureScalingPivot" => set(&mut t.scaling_pivot, entry.vec3()),
                "CurrentTextureBlendMode" => set(&mut t.current_blend_mode, entry.i32()),
                "UVSet" => set(&mut t.uv_set, entry.str().map(str::to_string)),
                "UseMaterial" => set(&mut t.use_material, entry.bool()),
                "UseMipMap" => set(&mut t.use_mip_map, entry.bool()),
                "AlphaSource" => set(&mut t.alpha_source, entry.i32()),
                "Cropping" => set(&mut t.cropping, entry.vec4()),
                "BlendModes" => {
                    if let Some(layers) = &mut t.layers {
                        set(&mut layers.blend_modes, entry.i32());
                    }
                }
                _ => {}
            }
        }

        texture.texture_name = child_string(node, NodeTag::TextureName);
        texture.media = child_string(node, NodeTag::Media);
        texture.full_filename = child_string(node, NodeTag::FileName);
        texture.relative_filename = child_string(node, NodeTag::RelativeFilename);
        texture.model_uv_translation = node.child(NodeTag::ModelUvTranslation).and_then(|n| n.vec2_at(0));
        texture.model_uv_scaling = node.child(NodeTag::ModelUvScaling).and_then(|n| n.vec2_at(0));
        texture.alpha_source_name = child_string(node, NodeTag::TextureAlphaSource);
        texture.kind = child_string(node, NodeTag::Type);

        if let Some(layers) = &mut texture.layers {
            if let Some(modes) = node.child_named("BlendModes").and_then(|n| n.i32_at(0)) {
                layers.blend_modes = Some(modes);
            }
            if let Some(alphas) = node.child_named("Alphas") {
                layers.weights = alphas.f32_array();
            }
        }
        texture
    }

    definition_slot!(textures);
}

impl ObjectBuilder for Video {
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self {
        let mut video = Video::new(info);
        for entry in node.properties70() {
            let v = &mut video;
            match entry.name() {
                "Path" => set(&mut v.path, entry.str().map(str::to_string)),
                "RelPath" => set(&mut v.rel_path, entry.str().map(str::to_string)),
                "Color" => set(&mut v.color, entry.vec3()),
                "ClipIn" => set(&mut v.clip_in, entry.i64()),
                "ClipOut" => set(&mut v.clip_out, entry.i64()),
                "Mute" => set(&mut v.mute, entry.bool()),
                "ImageSequence" => set(&mut v.image_sequence, entry.bool()),
                "ImageSequenceOffset" => set(&mut v.image_sequence_offset, entry.i32()),
                "FrameRate" => set(&mut v.frame_rate, entry.i32()),
                "LastFrame" => set(&mut v.last_frame, entry.i32()),
                "Width" => set(&mut v.width, entry.i32()),
                "Height" => set(&mut v.height, entry.i32()),
                "StartFrame" => set(&mut v.start_frame, entry.i32()),
                "StopFrame" => set(&mut v.stop_frame, entry.i32()),
                "PlayOffset" => set(&mut v.play_offset, entry.f32()),
                "Offset" => set(&mut v.offset, entry.i64()),
                "InterlaceMode" => set(&mut v.interlace_mode, entry.i32()),
                "FreeRunning" => set(&mut v.free_running, entry.bool()),
                "Loop" => set(&mut v.looping, entry.bool()),
                "AccessMode" => set(&mut v.access_mode, entry.i32()),
                _ => {}
            }
        }

        video.filename = child_string(node, NodeTag::Filename);
        video.relative_filename = child_string(node, NodeTag::RelativeFilename);
        video.kind = child_string(node, NodeTag::Type);
        video.content = node.child(NodeTag::Content).and_then(|c| c.property(0)).and_then(|p| content(p, doc.is_binary));
        video
    }

    definition_slot!(videos);
}

/// Binary files embed raw bytes, ASCII files base64 text.
fn content(property: &Property, is_binary: bool) -> Option<VideoContent> {
    if is_binary {
        property.as_bytes().map(|b| VideoContent::Bytes(b.to_vec()))
    } else {
        property.as_str().map(|s| VideoContent::Base64(s.to_string()))
    }
}

impl ObjectBuilder for Implementation {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut implementation = Implementation::new(info);
        for entry in node.properties70() {
            let i = &mut implementation;
            match entry.name() {
                "ShaderLanguage" => set(&mut i.shader_language, entry.str().map(str::to_string)),
                "ShaderLanguageVersion" => set(&mut i.shader_language_version, entry.i32()),
                "RenderAPI" => set(&mut i.render_api, entry.str().map(str::to_string)),
                "RootBindingName" => set(&mut i.root_binding_name, entry.str().map(str::to_string)),
                _ => {}
            }
        }
        implementation
    }

    definition_slot!(implementations);
}

impl ObjectBuilder for BindingTable {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut table = BindingTable::new(info);
        for entry in node.properties70() {
            match entry.name() {
                "TargetName" => set(&mut table.target_name, entry.str().map(str::to_string)),
                "TargetType" => set(&mut table.target_type, entry.str().map(str::to_string)),
                _ => {}
            }
        }
        for row in node.children_with(NodeTag::Entry) {
            let column = |i| row.str_at(i).unwrap_or_default();
            table.add_entry(column(0), column(1), column(2), column(3));
        }
        table
    }

    definition_slot!(binding_tables);
}
