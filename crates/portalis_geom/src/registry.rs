use std::fmt;

use glam::{Mat4, Vec3};
use tracing::{debug, info, warn};

use crate::geometry::quad_corners;
use crate::intersect::segment_triangle_hit;
use crate::oblique::{oblique_projection_with_depth, ClipDepth};
use crate::portal::Portal;
use crate::view::portal_view_matrix;

/// Handle to a portal stored in a [`PortalRegistry`]. Handles stay valid until the portal is
/// removed and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub usize);

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "portal#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownPortal(PortalId),
    SelfLink(PortalId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPortal(id) => write!(f, "no portal registered as {id}"),
            Self::SelfLink(id) => write!(f, "{id} cannot be linked to itself"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// A segment passing through the front of `entry`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalCrossing {
    pub entry: PortalId,
    pub exit: Option<PortalId>,
    /// Segment parameter of the hit, 0 at the segment start and 1 at its end.
    pub t: f32,
}

#[derive(Debug, Clone)]
struct PortalSlot {
    portal: Portal,
    linked_to: Option<PortalId>,
}

/// Owns every portal and the links between them.
///
/// A link is a plain [`PortalId`], so a portal never keeps its partner alive. Links made with
/// [`link_portal`](Self::link_portal) are one-way; [`pair_portals`](Self::pair_portals) sets both
/// directions at once. Removing a portal clears every link that pointed at it.
#[derive(Debug, Default)]
pub struct PortalRegistry {
    slots: Vec<Option<PortalSlot>>,
}

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, portal: Portal) -> PortalId {
        let id = PortalId(self.slots.len());
        self.slots.push(Some(PortalSlot {
            portal,
            linked_to: None,
        }));
        id
    }

    pub fn remove(&mut self, id: PortalId) -> Option<Portal> {
        let slot = self.slots.get_mut(id.0)?.take()?;
        for other in self.slots.iter_mut().flatten() {
            if other.linked_to == Some(id) {
                other.linked_to = None;
            }
        }
        debug!("Removed {id} and cleared links pointing at it");
        Some(slot.portal)
    }

    pub fn get(&self, id: PortalId) -> Option<&Portal> {
        self.slot(id).map(|slot| &slot.portal)
    }

    pub fn get_mut(&mut self, id: PortalId) -> Option<&mut Portal> {
        self.slot_mut(id).map(|slot| &mut slot.portal)
    }

    pub fn contains(&self, id: PortalId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (PortalId, &Portal)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (PortalId(index), &slot.portal)))
    }

    /// One-way link: `id` will look out of `pair`. The caller decides whether `pair` links back.
    pub fn link_portal(&mut self, id: PortalId, pair: PortalId) -> Result<(), RegistryError> {
        if id == pair {
            return Err(RegistryError::SelfLink(id));
        }
        if !self.contains(pair) {
            return Err(RegistryError::UnknownPortal(pair));
        }
        let slot = self.slot_mut(id).ok_or(RegistryError::UnknownPortal(id))?;
        slot.linked_to = Some(pair);
        debug!("Linked {id} -> {pair}");
        Ok(())
    }

    /// Links `a` and `b` to each other. Former partners that pointed back at `a` or `b` are
    /// unlinked so no stale one-way link is left behind.
    pub fn pair_portals(&mut self, a: PortalId, b: PortalId) -> Result<(), RegistryError> {
        if a == b {
            return Err(RegistryError::SelfLink(a));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(RegistryError::UnknownPortal(id));
            }
        }

        for id in [a, b] {
            if let Some(previous) = self.linked_id(id) {
                if previous != a && previous != b && self.linked_id(previous) == Some(id) {
                    self.unlink(previous);
                }
            }
        }

        self.link_portal(a, b)?;
        self.link_portal(b, a)?;
        info!("Paired {a} <-> {b}");
        Ok(())
    }

    pub fn unlink(&mut self, id: PortalId) {
        if let Some(slot) = self.slot_mut(id) {
            if let Some(previous) = slot.linked_to.take() {
                debug!("Unlinked {id} from {previous}");
            }
        }
    }

    pub fn linked_id(&self, id: PortalId) -> Option<PortalId> {
        self.slot(id)?.linked_to
    }

    pub fn linked_portal(&self, id: PortalId) -> Option<&Portal> {
        self.get(self.linked_id(id)?)
    }

    pub fn is_paired(&self, id: PortalId) -> bool {
        self.linked_portal(id).is_some()
    }

    /// Whether `id`'s partner links back to `id`.
    pub fn is_symmetric(&self, id: PortalId) -> bool {
        self.linked_id(id)
            .is_some_and(|pair| self.linked_id(pair) == Some(id))
    }

    /// View matrix for looking through `id` into its partner. Unpaired portals return
    /// `cam_view` unchanged.
    pub fn calculate_view_matrix(&self, id: PortalId, cam_view: Mat4) -> Mat4 {
        let Some((entry, exit)) = self.entry_and_exit(id) else {
            warn!("No pair found for {id}, returning camera view");
            return cam_view;
        };
        portal_view_matrix(entry, exit, cam_view)
    }

    /// Projection whose near plane lies on the partner's surface. Unpaired portals return
    /// `base_proj` unchanged.
    pub fn oblique_projection(&self, id: PortalId, view: Mat4, base_proj: Mat4) -> Mat4 {
        self.oblique_projection_with_depth(id, view, base_proj, ClipDepth::NegativeOneToOne)
    }

    pub fn oblique_projection_with_depth(
        &self,
        id: PortalId,
        view: Mat4,
        base_proj: Mat4,
        depth: ClipDepth,
    ) -> Mat4 {
        let Some((_, exit)) = self.entry_and_exit(id) else {
            warn!("No pair found for {id}, returning base projection");
            return base_proj;
        };
        oblique_projection_with_depth(exit, view, base_proj, depth)
    }

    /// First portal (smallest `t`) whose window the movement `prev -> curr` passes through from
    /// the front side to the back side.
    pub fn find_crossing(&self, prev: Vec3, curr: Vec3) -> Option<PortalCrossing> {
        let mut best: Option<PortalCrossing> = None;

        for (id, portal) in self.iter() {
            let d_prev = portal.signed_distance_to_plane(prev);
            let d_curr = portal.signed_distance_to_plane(curr);
            if !(d_prev > 0.0 && d_curr <= 0.0) {
                continue;
            }

            let [p0, p1, p2, p3] = quad_corners(&portal.model(), portal.size());
            let Some(hit) = segment_triangle_hit(prev, curr, p0, p1, p2)
                .or_else(|| segment_triangle_hit(prev, curr, p0, p2, p3))
            else {
                continue;
            };

            if best.is_some_and(|current| current.t <= hit.t) {
                continue;
            }
            best = Some(PortalCrossing {
                entry: id,
                exit: self.linked_id(id).filter(|exit| self.contains(*exit)),
                t: hit.t,
            });
        }

        best
    }

    fn entry_and_exit(&self, id: PortalId) -> Option<(&Portal, &Portal)> {
        let entry = self.get(id)?;
        let exit = self.linked_portal(id)?;
        Some((entry, exit))
    }

    fn slot(&self, id: PortalId) -> Option<&PortalSlot> {
        self.slots.get(id.0)?.as_ref()
    }

    fn slot_mut(&mut self, id: PortalId) -> Option<&mut PortalSlot> {
        self.slots.get_mut(id.0)?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec2, Vec3};

    use super::{PortalId, PortalRegistry, RegistryError};
    use crate::portal::Portal;

    fn wall(center: Vec3, normal: Vec3) -> Portal {
        Portal::new(center, normal, Vec2::new(2.0, 2.0))
    }

    fn paired_registry() -> (PortalRegistry, PortalId, PortalId) {
        let mut registry = PortalRegistry::new();
        let a = registry.insert(wall(Vec3::ZERO, Vec3::Z));
        let b = registry.insert(wall(Vec3::new(0.0, 0.0, -10.0), Vec3::Z));
        registry.pair_portals(a, b).expect("pair a and b");
        (registry, a, b)
    }

    #[test]
    fn unpaired_portal_falls_back_to_inputs() {
        let mut registry = PortalRegistry::new();
        let id = registry.insert(wall(Vec3::ZERO, Vec3::Z));

        let view = Mat4::look_at_rh(Vec3::new(3.0, 2.0, 1.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(1.2, 1.5, 0.1, 200.0);

        assert!(!registry.is_paired(id));
        assert!(registry.linked_portal(id).is_none());
        assert_eq!(registry.calculate_view_matrix(id, view), view);
        assert_eq!(registry.oblique_projection(id, view, proj), proj);
    }

    #[test]
    fn pair_portals_links_both_directions() {
        let (registry, a, b) = paired_registry();

        assert!(registry.is_paired(a));
        assert!(registry.is_paired(b));
        assert_eq!(registry.linked_id(a), Some(b));
        assert_eq!(registry.linked_id(b), Some(a));
        assert!(registry.is_symmetric(a));
        assert!(registry.is_symmetric(b));
    }

    #[test]
    fn link_portal_is_one_way() {
        let mut registry = PortalRegistry::new();
        let a = registry.insert(wall(Vec3::ZERO, Vec3::Z));
        let b = registry.insert(wall(Vec3::X * 5.0, Vec3::Z));

        registry.link_portal(a, b).expect("link a -> b");
        assert!(registry.is_paired(a));
        assert!(!registry.is_paired(b));
        assert!(!registry.is_symmetric(a));
    }

    #[test]
    fn paired_view_matrix_matches_free_function() {
        let (registry, a, b) = paired_registry();
        let cam_view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO, Vec3::Y);

        let view = registry.calculate_view_matrix(a, cam_view);
        let expected = crate::view::portal_view_matrix(
            registry.get(a).expect("a"),
            registry.get(b).expect("b"),
            cam_view,
        );
        assert_eq!(view, expected);
        assert_ne!(view, cam_view);

        let base = Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0);
        assert_ne!(registry.oblique_projection(a, view, base), base);
    }

    #[test]
    fn repairing_unlinks_previous_partner() {
        let (mut registry, a, b) = paired_registry();
        let c = registry.insert(wall(Vec3::new(8.0, 0.0, 0.0), Vec3::NEG_X));

        registry.pair_portals(a, c).expect("pair a and c");
        assert_eq!(registry.linked_id(a), Some(c));
        assert_eq!(registry.linked_id(c), Some(a));
        assert_eq!(registry.linked_id(b), None);
    }

    #[test]
    fn removing_a_portal_clears_links_to_it() {
        let (mut registry, a, b) = paired_registry();

        let removed = registry.remove(b).expect("b was registered");
        assert_eq!(removed.center(), Vec3::new(0.0, 0.0, -10.0));
        assert!(!registry.is_paired(a));
        assert!(registry.get(b).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(b).is_none());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let (mut registry, _a, b) = paired_registry();
        registry.remove(b);
        let c = registry.insert(wall(Vec3::ONE, Vec3::Y));
        assert_ne!(b, c);
    }

    #[test]
    fn invalid_links_are_rejected() {
        let (mut registry, a, _b) = paired_registry();
        let missing = PortalId(42);

        assert_eq!(registry.link_portal(a, a), Err(RegistryError::SelfLink(a)));
        assert_eq!(
            registry.link_portal(a, missing),
            Err(RegistryError::UnknownPortal(missing))
        );
        assert_eq!(
            registry.pair_portals(missing, a),
            Err(RegistryError::UnknownPortal(missing))
        );
        assert!(RegistryError::SelfLink(a).to_string().contains("itself"));
    }

    #[test]
    fn colour_can_be_changed_through_the_registry() {
        let (mut registry, a, _b) = paired_registry();
        registry
            .get_mut(a)
            .expect("a")
            .set_color(Vec3::new(0.0, 0.5, 1.0));
        assert_eq!(registry.get(a).expect("a").color(), Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn find_crossing_reports_front_to_back_passage() {
        let (registry, a, b) = paired_registry();

        let crossing = registry
            .find_crossing(Vec3::new(0.2, 0.1, 1.0), Vec3::new(0.2, 0.1, -1.0))
            .expect("moving through a");
        assert_eq!(crossing.entry, a);
        assert_eq!(crossing.exit, Some(b));
        assert!((crossing.t - 0.5).abs() < 1e-5);
    }

    #[test]
    fn find_crossing_ignores_back_to_front_and_misses() {
        let (registry, _a, _b) = paired_registry();

        assert!(registry
            .find_crossing(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0))
            .is_none());
        assert!(registry
            .find_crossing(Vec3::new(5.0, 0.0, 1.0), Vec3::new(5.0, 0.0, -1.0))
            .is_none());
    }

    #[test]
    fn find_crossing_picks_the_nearest_portal() {
        let (registry, a, b) = paired_registry();

        let crossing = registry
            .find_crossing(Vec3::new(0.0, 0.5, 2.0), Vec3::new(0.0, 0.5, -12.0))
            .expect("long segment crosses both portals");
        assert_eq!(crossing.entry, a);
        assert_eq!(crossing.exit, Some(b));
    }
}
