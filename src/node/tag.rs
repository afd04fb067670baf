//! Closed set of node names the importer dispatches on.
//!
//! Tags are interned once when a [`Node`](super::Node) is created, so lookups
//! compare enum discriminants instead of strings.

macro_rules! node_tags {
    ($($variant:ident => $name:literal,)*) => {
        /// Interned node name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NodeTag {
            $($variant,)*
            /// Any name not in the table.
            Other,
        }

        impl NodeTag {
            /// Intern a node name. Unknown names map to [`NodeTag::Other`].
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => NodeTag::$variant,)*
                    _ => NodeTag::Other,
                }
            }

            /// Canonical spelling, `None` for [`NodeTag::Other`].
            pub fn as_str(self) -> Option<&'static str> {
                match self {
                    $(NodeTag::$variant => Some($name),)*
                    NodeTag::Other => None,
                }
            }
        }
    };
}

node_tags! {
    // Document sections
    HeaderExtension => "FBXHeaderExtension",
    FbxVersion => "FBXVersion",
    OtherFlags => "OtherFlags",
    TcDefinition => "TCDefinition",
    SceneInfo => "SceneInfo",
    CreationTimeStamp => "CreationTimeStamp",
    Year => "Year",
    Month => "Month",
    Day => "Day",
    Hour => "Hour",
    Minute => "Minute",
    Second => "Second",
    Millisecond => "Millisecond",
    GlobalSettings => "GlobalSettings",
    Definitions => "Definitions",
    Count => "Count",
    ObjectType => "ObjectType",
    PropertyTemplate => "PropertyTemplate",
    Objects => "Objects",
    Connections => "Connections",
    Connection => "C",
    Properties70 => "Properties70",
    Property => "P",

    // Object classes
    Model => "Model",
    NodeAttribute => "NodeAttribute",
    Geometry => "Geometry",
    Material => "Material",
    Texture => "Texture",
    LayeredTexture => "LayeredTexture",
    Video => "Video",
    Deformer => "Deformer",
    SubDeformer => "SubDeformer",
    AnimationStack => "AnimationStack",
    AnimStack => "AnimStack",
    AnimationLayer => "AnimationLayer",
    AnimLayer => "AnimLayer",
    AnimationCurve => "AnimationCurve",
    AnimCurve => "AnimCurve",
    AnimationCurveNode => "AnimationCurveNode",
    AnimCurveNode => "AnimCurveNode",
    Implementation => "Implementation",
    BindingTable => "BindingTable",
    Pose => "Pose",

    // Geometry
    Vertices => "Vertices",
    PolygonVertexIndex => "PolygonVertexIndex",
    LayerElementNormal => "LayerElementNormal",
    Normals => "Normals",
    NormalsIndex => "NormalsIndex",
    NormalsW => "NormalsW",
    LayerElementTangent => "LayerElementTangent",
    Tangents => "Tangents",
    TangentsIndex => "TangentsIndex",
    TangentsW => "TangentsW",
    LayerElementColor => "LayerElementColor",
    Colors => "Colors",
    ColorIndex => "ColorIndex",
    LayerElementUv => "LayerElementUV",
    Uv => "UV",
    UvIndex => "UVIndex",
    LayerElementMaterial => "LayerElementMaterial",
    Materials => "Materials",
    MappingInformationType => "MappingInformationType",
    ReferenceInformationType => "ReferenceInformationType",

    // Deformers
    LinkDeformAccuracy => "Link_DeformAcuracy",
    Indexes => "Indexes",
    Weights => "Weights",
    Transform => "Transform",
    TransformLink => "TransformLink",
    DeformPercent => "DeformPercent",
    FullWeights => "FullWeights",

    // Animation curves
    KeyTime => "KeyTime",
    KeyValueFloat => "KeyValueFloat",
    KeyAttrFlags => "KeyAttrFlags",
    KeyAttrDataFloat => "KeyAttrDataFloat",
    KeyAttrRefCount => "KeyAttrRefCount",
    PreExtrapolation => "Pre-Extrapolation",
    PostExtrapolation => "Post-Extrapolation",
    Type => "Type",
    Repetition => "Repetition",

    // Materials, textures and media
    MultiLayer => "MultiLayer",
    ShadingModel => "ShadingModel",
    TextureName => "TextureName",
    Media => "Media",
    FileName => "FileName",
    Filename => "Filename",
    RelativeFilename => "RelativeFilename",
    ModelUvTranslation => "ModelUVTranslation",
    ModelUvScaling => "ModelUVScaling",
    TextureAlphaSource => "Texture_Alpha_Source",
    Content => "Content",
    Entry => "Entry",
}

impl NodeTag {
    /// Object nodes that can appear under `Objects` or `Definitions/ObjectType`.
    pub fn is_object_class(self) -> bool {
        matches!(
            self,
            NodeTag::Model
                | NodeTag::NodeAttribute
                | NodeTag::Geometry
                | NodeTag::Material
                | NodeTag::Texture
                | NodeTag::LayeredTexture
                | NodeTag::Video
                | NodeTag::Deformer
                | NodeTag::SubDeformer
                | NodeTag::AnimationStack
                | NodeTag::AnimStack
                | NodeTag::AnimationLayer
                | NodeTag::AnimLayer
                | NodeTag::AnimationCurve
                | NodeTag::AnimCurve
                | NodeTag::AnimationCurveNode
                | NodeTag::AnimCurveNode
                | NodeTag::Implementation
                | NodeTag::BindingTable
        )
    }
}
