/// Orbit camera and perspective projection onto a character grid
use nalgebra::{Matrix4, Point3, Vector3};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

/// Camera looking at a target from a point on a z-up sphere around it
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Place the camera `distance` away from `target`.
    ///
    /// `elevation` is measured up from the xy-plane and `azimuth` around the
    /// z axis from +x, both in radians.
    pub fn orbit(
        target: Point3<f64>,
        elevation: f64,
        azimuth: f64,
        distance: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let direction = Vector3::new(
            elevation.cos() * azimuth.cos(),
            elevation.cos() * azimuth.sin(),
            elevation.sin(),
        );
        Self {
            position: target + direction * distance,
            target,
            up: Vector3::z(),
            fov: std::f64::consts::PI / 4.0,
            aspect: width.max(1) as f64 / (height.max(1) as f64 * CELL_ASPECT),
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Project a world point to `(column, row, depth)`.
    ///
    /// Depth is the normalized device z in `[-1, 1]`, smaller is nearer.
    /// Points outside the near/far range give `None`; points off the sides
    /// of the screen are returned and left to the rasterizer to clip.
    pub fn project_to_screen(&self, point: &Point3<f64>, width: u32, height: u32) -> Option<(f64, f64, f64)> {
        let mvp = self.projection_matrix() * self.view_matrix();
        let clip = mvp * point.to_homogeneous();
        // At or behind the eye
        if clip.w <= 1e-9 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f64;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f64;
        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbit(Point3::origin(), 0.35, 0.5, 10.0, 80, 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orbit_distance() {
        let target = Point3::new(0.0, 0.0, 1.5);
        let camera = Camera::orbit(target, 0.4, 1.1, 8.0, 80, 24);
        assert_relative_eq!((camera.position - target).norm(), 8.0, epsilon = 1e-12);
        assert!(camera.position.z > target.z);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = Camera::orbit(Point3::origin(), 0.3, 0.7, 6.0, 80, 24);
        let (x, y, depth) = camera.project_to_screen(&Point3::origin(), 80, 24).unwrap();
        assert_relative_eq!(x, 40.0, epsilon = 1e-9);
        assert_relative_eq!(y, 12.0, epsilon = 1e-9);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_up_is_up_on_screen() {
        let camera = Camera::orbit(Point3::origin(), 0.0, 0.0, 6.0, 80, 24);
        let (_, low, _) = camera.project_to_screen(&Point3::new(0.0, 0.0, -1.0), 80, 24).unwrap();
        let (_, high, _) = camera.project_to_screen(&Point3::new(0.0, 0.0, 1.0), 80, 24).unwrap();
        assert!(high < low);
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let camera = Camera::orbit(Point3::origin(), 0.0, 0.0, 6.0, 80, 24);
        let (_, _, near) = camera.project_to_screen(&Point3::new(1.0, 0.0, 0.0), 80, 24).unwrap();
        let (_, _, far) = camera.project_to_screen(&Point3::new(-1.0, 0.0, 0.0), 80, 24).unwrap();
        assert!(near < far);
    }

    #[test]
    fn test_behind_camera_is_rejected() {
        let camera = Camera::orbit(Point3::origin(), 0.0, 0.0, 6.0, 80, 24);
        assert!(camera.project_to_screen(&Point3::new(10.0, 0.0, 0.0), 80, 24).is_none());
    }
}
