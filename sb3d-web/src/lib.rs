/// SB3D Web - wasm-bindgen surface over recorded scene timelines
///
/// The browser side owns drawing. This crate runs a scene once and hands out
/// flat arrays: positions as `x, y, z` triples, edges as index pairs and
/// faces as index triples.
use sb3d_core::{parse_scene, MeshError, MeshResult, Scene, Snapshot, Timeline, VertexSet};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebScene {
    name: String,
    timeline: Timeline,
    edges: Vec<u32>,
    faces: Vec<u32>,
}

#[wasm_bindgen]
impl WebScene {
    /// Run one of the built-in scenes
    pub fn builtin(name: &str) -> Result<WebScene, JsValue> {
        let scene = Scene::builtin(name).ok_or_else(|| {
            JsValue::from_str(&format!(
                "unknown scene '{name}' (built-in scenes: {})",
                Scene::BUILTIN_NAMES.join(", ")
            ))
        })?;
        Self::from_scene(&scene).map_err(to_js)
    }

    /// Parse and run a scene script
    pub fn from_script(text: &str) -> Result<WebScene, JsValue> {
        parse_scene(text).and_then(|scene| Self::from_scene(&scene)).map_err(to_js)
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn snapshot_count(&self) -> usize {
        self.timeline.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.timeline.rest().len()
    }

    pub fn label(&self, index: usize) -> Result<String, JsValue> {
        self.snapshot(index).map(|s| s.label.clone()).map_err(to_js)
    }

    /// Flat `x, y, z` positions of snapshot `index`
    pub fn positions(&self, index: usize) -> Result<Vec<f64>, JsValue> {
        self.snapshot(index).map(|s| flatten(&s.vertices)).map_err(to_js)
    }

    /// Wireframe edges as index pairs; surface meshes give their face boundaries
    pub fn edges(&self) -> Vec<u32> {
        self.edges.clone()
    }

    /// Face index triples, empty for spring networks
    pub fn faces(&self) -> Vec<u32> {
        self.faces.clone()
    }

    /// Positions a fraction `t` of the way from snapshot `index` to the next.
    ///
    /// Linear; easing is left to the caller. The last snapshot interpolates
    /// to itself.
    pub fn interpolate(&self, index: usize, t: f64) -> Result<Vec<f64>, JsValue> {
        self.blend(index, t).map_err(to_js)
    }
}

impl WebScene {
    fn from_scene(scene: &Scene) -> MeshResult<Self> {
        let timeline = scene.run()?;
        let topology = timeline.topology();
        let edges = topology
            .edges()?
            .iter()
            .flat_map(|e| {
                let (a, b) = e.indices();
                [a as u32, b as u32]
            })
            .collect();
        let faces = topology
            .faces()
            .map(|faces| faces.iter().flat_map(|f| f.indices().map(|i| i as u32)).collect())
            .unwrap_or_default();
        log::debug!("web scene {} ready with {} snapshots", scene.name(), timeline.len());

        Ok(Self {
            name: scene.name().to_string(),
            timeline,
            edges,
            faces,
        })
    }

    fn snapshot(&self, index: usize) -> MeshResult<&Snapshot> {
        self.timeline.snapshots().get(index).ok_or_else(|| {
            MeshError::InvalidParameter(format!(
                "snapshot {index} out of range for {} snapshots",
                self.timeline.len()
            ))
        })
    }

    fn blend(&self, index: usize, t: f64) -> MeshResult<Vec<f64>> {
        let from = &self.snapshot(index)?.vertices;
        let to = match self.timeline.snapshots().get(index + 1) {
            Some(next) => &next.vertices,
            None => from,
        };
        if !t.is_finite() {
            return Err(MeshError::InvalidParameter("interpolation factor must be finite".to_string()));
        }
        let s = t.clamp(0.0, 1.0);
        Ok(from
            .iter()
            .zip(to.iter())
            .flat_map(|(a, b)| {
                let p = a.coords * (1.0 - s) + b.coords * s;
                [p.x, p.y, p.z]
            })
            .collect())
    }
}

fn flatten(vertices: &VertexSet) -> Vec<f64> {
    vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

fn to_js(err: MeshError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(name: &str) -> WebScene {
        WebScene::from_scene(&Scene::builtin(name).unwrap()).unwrap()
    }

    #[test]
    fn test_edge_scene_arrays() {
        let web = scene("spring-tetrahedron");
        assert_eq!(web.snapshot_count(), 3);
        assert_eq!(web.vertex_count(), 4);
        assert_eq!(web.edges().len(), 12);
        assert!(web.faces().is_empty());
        assert_eq!(web.snapshot(1).unwrap().label, "vertex_force");
        assert_eq!(flatten(&web.snapshot(0).unwrap().vertices)[..3], [0.0, 0.0, 3.5]);
    }

    #[test]
    fn test_face_scene_arrays() {
        let web = scene("octahedron");
        assert_eq!(web.faces().len(), 24);
        // Eight triangles share twelve edges
        assert_eq!(web.edges().len(), 24);
        assert!(web.faces().iter().all(|&i| i < 6));
    }

    #[test]
    fn test_blend_endpoints() {
        let web = scene("spring-tetrahedron");
        let start = flatten(&web.snapshot(0).unwrap().vertices);
        let end = flatten(&web.snapshot(1).unwrap().vertices);
        assert_eq!(web.blend(0, 0.0).unwrap(), start);
        assert_eq!(web.blend(0, 1.0).unwrap(), end);
        assert_eq!(web.blend(0, 0.5).unwrap()[1], 0.6);

        let last = flatten(&web.snapshot(2).unwrap().vertices);
        assert_eq!(web.blend(2, 0.7).unwrap(), last);
        assert!(web.blend(3, 0.0).is_err());
        assert!(web.blend(0, f64::NAN).is_err());
    }

    #[test]
    fn test_from_script_errors() {
        assert!(parse_scene("mesh octahedron radius=-1")
            .and_then(|scene| WebScene::from_scene(&scene))
            .is_err());
    }
}
