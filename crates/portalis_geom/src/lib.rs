pub mod frame;
pub mod geometry;
pub mod intersect;
pub mod oblique;
pub mod portal;
pub mod registry;
pub mod scene;
pub mod view;

pub use oblique::ClipDepth;
pub use portal::Portal;
pub use registry::{PortalCrossing, PortalId, PortalRegistry, RegistryError};
