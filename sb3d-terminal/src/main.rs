/// SB3D Terminal Player
///
/// Plays a built-in scene or a scene script as an ASCII animation.
/// Controls:
///   - Space: Pause / resume
///   - Q/ESC: Quit
use anyhow::{bail, Context, Result};
use clap::Parser;
use sb3d_core::{parse_scene, Scene};
use sb3d_terminal::{PlayerConfig, TerminalApp};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sb3d-terminal", version, about = "Play soft-body mesh scenes in the terminal")]
struct Cli {
    /// Built-in scene to play
    #[arg(long, default_value = "soft-cube", conflicts_with = "script")]
    scene: String,

    /// Scene script file to play instead of a built-in scene
    #[arg(long)]
    script: Option<PathBuf>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Frames spent easing between two snapshots
    #[arg(long)]
    frames_per_stage: Option<usize>,

    /// Frames each snapshot is held
    #[arg(long)]
    hold_frames: Option<usize>,

    /// List the built-in scenes and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn player_config(&self) -> PlayerConfig {
        let defaults = PlayerConfig::default();
        PlayerConfig {
            fps: self.fps.unwrap_or(defaults.fps),
            frames_per_stage: self.frames_per_stage.unwrap_or(defaults.frames_per_stage),
            hold_frames: self.hold_frames.unwrap_or(defaults.hold_frames),
            ..defaults
        }
    }

    fn load_scene(&self) -> Result<Scene> {
        match &self.script {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read scene script {}", path.display()))?;
                parse_scene(&text).with_context(|| format!("failed to parse {}", path.display()))
            }
            None => match Scene::builtin(&self.scene) {
                Some(scene) => Ok(scene),
                None => bail!(
                    "unknown scene '{}' (built-in scenes: {})",
                    self.scene,
                    Scene::BUILTIN_NAMES.join(", ")
                ),
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.list {
        for name in Scene::BUILTIN_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let scene = cli.load_scene()?;
    let timeline = scene
        .run()
        .with_context(|| format!("scene '{}' failed", scene.name()))?;
    log::info!("playing {} ({} snapshots)", scene.name(), timeline.len());

    let mut app = TerminalApp::new(scene.name(), timeline, cli.player_config())?;
    app.run()?;
    Ok(())
}
