use std::fmt::Write;

use glam::Mat4;
use portalis_geom::scene::{BuiltScene, SceneDesc};
use portalis_geom::view::{virtual_camera_forward, virtual_camera_position};
use portalis_geom::{ClipDepth, PortalId};

pub fn scene_report(scene: &SceneDesc, built: &BuiltScene, depth: ClipDepth) -> String {
    let registry = &built.registry;
    let cam_view = scene.camera.view_matrix();
    let base_proj = scene.camera.projection_matrix(depth);
    let label = |id: PortalId| built.name(id).unwrap_or("?").to_string();

    let mut out = String::new();
    let _ = writeln!(out, "camera at {} looking at {}", scene.camera.position, scene.camera.target);

    for (id, portal) in registry.iter() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "portal '{}': center {} normal {} size {}",
            label(id),
            portal.center(),
            portal.normal(),
            portal.size()
        );
        let _ = writeln!(
            out,
            "  camera side: {:+.3}",
            portal.signed_distance_to_plane(scene.camera.position)
        );

        let Some(exit) = registry.linked_id(id) else {
            let _ = writeln!(out, "  unpaired");
            continue;
        };
        let symmetry = if registry.is_symmetric(id) { "paired" } else { "one-way" };
        let _ = writeln!(out, "  {symmetry} with '{}'", label(exit));

        let view = registry.calculate_view_matrix(id, cam_view);
        let proj = registry.oblique_projection_with_depth(id, view, base_proj, depth);
        let _ = writeln!(
            out,
            "  virtual camera at {} facing {}",
            virtual_camera_position(&view),
            virtual_camera_forward(&view)
        );
        write_matrix(&mut out, "view", &view);
        write_matrix(&mut out, "oblique projection", &proj);
    }

    for segment in &scene.segments {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "segment '{}': {} -> {}",
            segment.name, segment.start, segment.end
        );
        for (id, portal) in registry.iter() {
            let _ = writeln!(
                out,
                "  '{}': side {:+.3} -> {:+.3}, crosses window: {}",
                label(id),
                portal.signed_distance_to_plane(segment.start),
                portal.signed_distance_to_plane(segment.end),
                portal.intersects_line(segment.start, segment.end)
            );
        }
        match registry.find_crossing(segment.start, segment.end) {
            Some(crossing) => {
                let exit = crossing.exit.map(label).unwrap_or_else(|| "nowhere".to_string());
                let _ = writeln!(
                    out,
                    "  teleport: enters '{}' at t={:.3}, exits '{exit}'",
                    label(crossing.entry),
                    crossing.t
                );
            }
            None => {
                let _ = writeln!(out, "  teleport: none");
            }
        }
    }

    out
}

fn write_matrix(out: &mut String, title: &str, m: &Mat4) {
    let _ = writeln!(out, "  {title}:");
    for row in 0..4 {
        let r = m.row(row);
        let _ = writeln!(out, "    [{:9.4} {:9.4} {:9.4} {:9.4}]", r.x, r.y, r.z, r.w);
    }
}
