mod gpu;
mod report;

use std::env;
use std::path::PathBuf;

use portalis_geom::scene::SceneDesc;
use portalis_geom::ClipDepth;
use tracing::info;

struct ProbeArgs {
    scene_path: PathBuf,
    depth: Option<ClipDepth>,
    gpu: bool,
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut scene_path = None;
    let mut depth = None;
    let mut gpu = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gpu" => gpu = true,
            "--depth" => {
                let Some(value) = args.next() else {
                    eprintln!("--depth expects 'gl' or 'zero-to-one'");
                    std::process::exit(2);
                };
                depth = match value.as_str() {
                    "gl" => Some(ClipDepth::NegativeOneToOne),
                    "zero-to-one" => Some(ClipDepth::ZeroToOne),
                    other => {
                        eprintln!("invalid depth range '{other}', expected 'gl' or 'zero-to-one'");
                        std::process::exit(2);
                    }
                };
            }
            "--help" | "-h" => {
                println!("Usage: portal_probe <scene.toml> [--gpu] [--depth gl|zero-to-one]");
                return;
            }
            other if other.starts_with("--") => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
            path => scene_path = Some(PathBuf::from(path)),
        }
    }

    let Some(scene_path) = scene_path else {
        eprintln!("missing scene path; see --help");
        std::process::exit(2);
    };

    let args = ProbeArgs {
        scene_path,
        depth,
        gpu,
    };
    if let Err(err) = run(&args) {
        eprintln!("portal_probe error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &ProbeArgs) -> Result<(), String> {
    let scene = SceneDesc::load(&args.scene_path).map_err(|err| err.to_string())?;
    let built = scene.build().map_err(|err| err.to_string())?;
    let depth = args.depth.unwrap_or(scene.depth);
    info!(
        "Loaded {} with {} portals",
        args.scene_path.display(),
        built.registry.len()
    );

    print!("{}", report::scene_report(&scene, &built, depth));

    if args.gpu {
        let draw_calls = gpu::render_offscreen(&scene, &built).map_err(|err| err.to_string())?;
        println!("gpu: issued {draw_calls} portal draw calls");
    }

    Ok(())
}
