//! Mesh processing: layer element access, triangulation and deformers.

mod deform;
mod layer;
mod triangulate;

pub use deform::{post_process_deformers, remap_materials};
pub use layer::{LayerAccessor, LayerElementKind, LayerValues, MappingType, ReferenceType};
pub use triangulate::{
    tangent_sign, tessellate, triangulate, winding_flipped, MeshBuffers, SubMesh, Triangulator, Vertex,
    MAX_POLYGON_VERTICES,
};
