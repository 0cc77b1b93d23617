/// ASCII rasterizer for mesh snapshots
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point3;
use sb3d_core::{face_normal, face_vertices, MeshResult, Topology, VertexSet};
use std::io::Write;

use crate::projection::Camera;

/// Character luminosity ramp for face shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Drawn over every vertex
const VERTEX_MARK: char = 'o';

/// Edges and vertex marks win depth ties against the faces they lie on
const OVERLAY_BIAS: f64 = 1e-3;

type ScreenPoint = (f64, f64, f64);

/// ASCII renderer that draws one vertex set at a time into a character grid
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f64>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f64::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f64::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Draw `vertices` connected by `topology` as seen from `camera`
    pub fn render_snapshot(&mut self, vertices: &VertexSet, topology: &Topology, camera: &Camera) -> MeshResult<()> {
        topology.validate(vertices.len())?;
        match topology {
            Topology::Faces(faces) => {
                for corners in face_vertices(vertices, faces)? {
                    self.render_face(&corners, camera);
                }
            }
            Topology::Edges(edges) => {
                for edge in edges.iter() {
                    let (a, b) = edge.indices();
                    self.render_edge(&vertices[a], &vertices[b], camera);
                }
            }
        }

        for vertex in vertices {
            if let Some((x, y, depth)) = self.project(vertex, camera) {
                self.plot(x, y, depth - 2.0 * OVERLAY_BIAS, VERTEX_MARK);
            }
        }
        Ok(())
    }

    fn project(&self, point: &Point3<f64>, camera: &Camera) -> Option<ScreenPoint> {
        camera.project_to_screen(point, self.width as u32, self.height as u32)
    }

    fn render_face(&mut self, corners: &[Point3<f64>; 3], camera: &Camera) {
        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, corner) in screen.iter_mut().zip(corners) {
            match self.project(corner, camera) {
                Some(point) => *slot = point,
                None => return, // Triangle is clipped
            }
        }

        // Light from the eye; fans are seen from both sides
        let centroid = Point3::from((corners[0].coords + corners[1].coords + corners[2].coords) / 3.0);
        let brightness = match (face_normal(corners), (camera.position - centroid).try_normalize(1e-12)) {
            (Some(normal), Some(to_eye)) => normal.dot(&to_eye).abs(),
            _ => 0.0,
        };
        let char_index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f64) as usize).min(LUMINOSITY_RAMP.len() - 1);
        self.rasterize_triangle(&screen, LUMINOSITY_RAMP[char_index]);
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = *coords;

        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                if let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(p.0, p.1, depth, character);
                    }
                }
            }
        }
    }

    /// Walk the projected segment one cell at a time, depth-testing each cell
    fn render_edge(&mut self, a: &Point3<f64>, b: &Point3<f64>, camera: &Camera) {
        let (Some(start), Some(end)) = (self.project(a, camera), self.project(b, camera)) else {
            return;
        };
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let character = line_char(dx, dy);
        // Long segments are clipped by plot; cap the walk so huge ones stay cheap
        let limit = 4 * (self.width + self.height);
        let steps = (dx.abs().max(dy.abs()).ceil() as usize).clamp(1, limit.max(1));

        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let depth = start.2 + (end.2 - start.2) * t;
            self.plot(start.0 + dx * t, start.1 + dy * t, depth - OVERLAY_BIAS, character);
        }
    }

    fn plot(&mut self, x: f64, y: f64, depth: f64, character: char) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (col, row) = (x as usize, y as usize);
        if col >= self.width || row >= self.height {
            return;
        }
        let idx = row * self.width + col;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
        }
    }

    /// The character grid as text, one string per row
    pub fn rows(&self) -> Vec<String> {
        if self.width == 0 {
            return Vec::new();
        }
        self.char_buffer
            .chunks(self.width)
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (y, row) in self.char_buffer.chunks(self.width.max(1)).enumerate() {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for &c in row {
                let color = match c {
                    '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    '|' | '/' | '\\' | '_' => Color::Green,
                    VERTEX_MARK => Color::Yellow,
                    _ => Color::White,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Pick a line character from the screen-space direction of a segment
fn line_char(dx: f64, dy: f64) -> char {
    // Rows are about twice as tall as columns
    let angle = (-dy * 2.0).atan2(dx).to_degrees().rem_euclid(180.0);
    match angle {
        a if !(22.5..157.5).contains(&a) => '_',
        a if a < 67.5 => '/',
        a if a < 112.5 => '|',
        _ => '\\',
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f64, f64), v1: (f64, f64), v2: (f64, f64), p: (f64, f64)) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
