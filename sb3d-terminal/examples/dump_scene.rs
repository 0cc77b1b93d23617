/// Example: Print every snapshot of a scene as text
///
/// Usage: cargo run --example dump_scene -- [scene-name | path/to/file.scene]
use anyhow::{Context, Result};
use sb3d_core::{parse_scene, Scene, Topology};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let arg = env::args().nth(1).unwrap_or_else(|| "spring-tetrahedron".to_string());
    let scene = match Scene::builtin(&arg) {
        Some(scene) => scene,
        None => {
            let path = Path::new(&arg);
            let text = std::fs::read_to_string(path).with_context(|| {
                format!(
                    "'{arg}' is neither a built-in scene ({}) nor a readable file",
                    Scene::BUILTIN_NAMES.join(", ")
                )
            })?;
            parse_scene(&text).with_context(|| format!("failed to parse {}", path.display()))?
        }
    };

    let timeline = scene.run()?;
    println!("scene {} ({} mesh)", scene.name(), scene.mesh().kind());
    match timeline.topology() {
        Topology::Edges(edges) => {
            let pairs: Vec<_> = edges.iter().map(|e| e.indices()).collect();
            println!("edges {pairs:?}");
        }
        Topology::Faces(faces) => {
            let triples: Vec<_> = faces.iter().map(|f| f.indices()).collect();
            println!("faces {triples:?}");
        }
    }

    for (i, snapshot) in timeline.snapshots().iter().enumerate() {
        println!("\n[{i}] {}", snapshot.label);
        for (v, p) in snapshot.vertices.iter().enumerate() {
            println!("  {v:>3}: ({:>8.4}, {:>8.4}, {:>8.4})", p.x, p.y, p.z);
        }
    }
    Ok(())
}
