/// Terminal player for soft-body scenes
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use nalgebra::Point3;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use sb3d_core::{Timeline, VertexSet};

pub mod player;
pub mod projection;
pub mod renderer;

pub use player::{lerp_vertex_sets, smoothstep, Frame, PlayerConfig, ScenePlayer};
pub use projection::Camera;
pub use renderer::AsciiRenderer;

/// Main application struct: plays a timeline in the terminal
pub struct TerminalApp {
    scene_name: String,
    player: ScenePlayer,
    config: PlayerConfig,
    target: Point3<f64>,
    azimuth: f64,
    renderer: AsciiRenderer,
    running: bool,
    paused: bool,
    frame: usize,
    last_frame: Instant,
    frame_count: u32,
    fps: f64,
}

impl TerminalApp {
    pub fn new(scene_name: impl Into<String>, timeline: Timeline, config: PlayerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let target = centroid(timeline.rest());

        Ok(Self {
            scene_name: scene_name.into(),
            player: ScenePlayer::new(timeline, &config),
            azimuth: config.azimuth,
            config,
            target,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            paused: false,
            frame: 0,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs_f64(1.0 / self.config.fps.max(1) as f64);

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f64 / (now - self.last_frame).as_secs_f64();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
            if kind == KeyEventKind::Release {
                return Ok(());
            }
            match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char(' ') => {
                    self.paused = !self.paused;
                    log::debug!("playback {}", if self.paused { "paused" } else { "resumed" });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self) {
        if self.paused {
            return;
        }
        self.frame = (self.frame + 1) % self.player.period();
        self.azimuth += self.config.orbit_speed / self.config.fps.max(1) as f64;
    }

    fn render(&mut self) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        let mut stdout = stdout();
        if self.renderer.size() != (width as usize, height as usize) {
            self.renderer = AsciiRenderer::new(width as usize, height as usize);
            queue!(stdout, Clear(ClearType::All))?;
        }

        let frame = self
            .player
            .frame(self.frame)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let camera = Camera::orbit(
            self.target,
            self.config.elevation,
            self.azimuth,
            self.config.distance,
            width as u32,
            height as u32,
        );

        self.renderer.clear();
        self.renderer
            .render_snapshot(&frame.vertices, self.player.timeline().topology(), &camera)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.renderer.draw(&mut stdout)?;

        // Stage overlay
        let stages = self.player.timeline().len() - 1;
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "SB3D | {} | stage {}/{}: {}{} | FPS: {:.1} | Space=Pause Q=Quit",
                self.scene_name,
                frame.stage,
                stages,
                frame.label,
                if self.paused { " [paused]" } else { "" },
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Mean vertex position, used as the orbit target
pub fn centroid(vertices: &VertexSet) -> Point3<f64> {
    if vertices.is_empty() {
        return Point3::origin();
    }
    let sum = vertices.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / vertices.len() as f64)
}
