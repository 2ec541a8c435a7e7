pub mod mesh;
pub mod pipeline;

pub use mesh::PortalMesh;
pub use pipeline::PortalPipeline;
