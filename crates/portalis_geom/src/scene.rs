//! TOML description of a portal scene: a viewer camera, portals, pairings and probe segments.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::oblique::ClipDepth;
use crate::portal::Portal;
use crate::registry::{PortalId, PortalRegistry, RegistryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDesc {
    pub position: Vec3,
    pub target: Vec3,
    #[serde(default = "default_up")]
    pub up: Vec3,
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: default_up(),
            fov_degrees: default_fov_degrees(),
            aspect: default_aspect(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl CameraDesc {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, depth: ClipDepth) -> Mat4 {
        let fov = self.fov_degrees.to_radians();
        let aspect = self.aspect.max(0.0001);
        let near = self.near.max(0.0001);
        let far = self.far.max(near + 0.0001);
        match depth {
            ClipDepth::NegativeOneToOne => Mat4::perspective_rh_gl(fov, aspect, near, far),
            ClipDepth::ZeroToOne => Mat4::perspective_rh(fov, aspect, near, far),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalDesc {
    pub name: String,
    pub center: Vec3,
    pub normal: Vec3,
    pub size: Vec2,
    #[serde(default)]
    pub color: Option<Vec3>,
    #[serde(default)]
    pub border_width: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairDesc {
    pub a: String,
    pub b: String,
    /// Only link `a -> b`.
    #[serde(default)]
    pub one_way: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDesc {
    pub name: String,
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub camera: CameraDesc,
    #[serde(default)]
    pub depth: ClipDepth,
    #[serde(default, rename = "portal")]
    pub portals: Vec<PortalDesc>,
    #[serde(default, rename = "pair")]
    pub pairs: Vec<PairDesc>,
    #[serde(default, rename = "segment")]
    pub segments: Vec<SegmentDesc>,
}

#[derive(Debug)]
pub enum SceneError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    DuplicatePortal {
        name: String,
    },
    InvalidSize {
        name: String,
        size: Vec2,
    },
    ZeroNormal {
        name: String,
    },
    UnknownPortal {
        name: String,
    },
    Link(RegistryError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read scene {}: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse scene: {err}"),
            Self::DuplicatePortal { name } => write!(f, "portal '{name}' is defined twice"),
            Self::InvalidSize { name, size } => {
                write!(f, "portal '{name}' has non-positive size {size}")
            }
            Self::ZeroNormal { name } => write!(f, "portal '{name}' has a zero-length normal"),
            Self::UnknownPortal { name } => write!(f, "pair references unknown portal '{name}'"),
            Self::Link(err) => write!(f, "failed to link portals: {err}"),
        }
    }
}

impl std::error::Error for SceneError {}

/// Registry built from a [`SceneDesc`], with the name each portal was declared under.
#[derive(Debug)]
pub struct BuiltScene {
    pub registry: PortalRegistry,
    pub names: HashMap<String, PortalId>,
}

impl BuiltScene {
    pub fn id(&self, name: &str) -> Option<PortalId> {
        self.names.get(name).copied()
    }

    /// Declared name of `id`.
    pub fn name(&self, id: PortalId) -> Option<&str> {
        self.names
            .iter()
            .find_map(|(name, &other)| (other == id).then_some(name.as_str()))
    }
}

impl SceneDesc {
    pub fn from_toml_str(source: &str) -> Result<Self, SceneError> {
        toml::from_str(source).map_err(SceneError::Parse)
    }

    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let source = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn build(&self) -> Result<BuiltScene, SceneError> {
        let mut registry = PortalRegistry::new();
        let mut names = HashMap::new();

        for desc in &self.portals {
            if names.contains_key(&desc.name) {
                return Err(SceneError::DuplicatePortal {
                    name: desc.name.clone(),
                });
            }
            if !(desc.size.x > 0.0 && desc.size.y > 0.0) {
                return Err(SceneError::InvalidSize {
                    name: desc.name.clone(),
                    size: desc.size,
                });
            }
            if desc.normal.length_squared() <= f32::EPSILON {
                return Err(SceneError::ZeroNormal {
                    name: desc.name.clone(),
                });
            }

            let mut portal = match desc.border_width {
                Some(width) => Portal::with_border_width(desc.center, desc.normal, desc.size, width),
                None => Portal::new(desc.center, desc.normal, desc.size),
            };
            if let Some(color) = desc.color {
                portal.set_color(color);
            }
            names.insert(desc.name.clone(), registry.insert(portal));
        }

        let lookup = |name: &str| {
            names
                .get(name)
                .copied()
                .ok_or_else(|| SceneError::UnknownPortal {
                    name: name.to_string(),
                })
        };
        for pair in &self.pairs {
            let a = lookup(&pair.a)?;
            let b = lookup(&pair.b)?;
            if pair.one_way {
                registry.link_portal(a, b).map_err(SceneError::Link)?;
            } else {
                registry.pair_portals(a, b).map_err(SceneError::Link)?;
            }
        }

        info!(
            "Built scene with {} portals and {} pairings",
            registry.len(),
            self.pairs.len()
        );
        Ok(BuiltScene { registry, names })
    }
}

fn default_up() -> Vec3 {
    Vec3::Y
}

fn default_fov_degrees() -> f32 {
    70.0
}

fn default_aspect() -> f32 {
    16.0 / 9.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}
