/// Scene script parser
///
/// A script is line oriented. `#` starts a comment. Each statement is a
/// keyword followed by `key=value` pairs:
///
/// ```text
/// scene soft-cube
/// mesh cube_grid spacing=1.5 height=3 bracing=cross_braced
/// gravity threshold=1 fall_upper=1.2
/// recover_to_rest
/// ```
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, space0, space1},
    combinator::{all_consuming, map, recognize},
    multi::{many0, many0_count, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::deform::Stage;
use crate::error::{MeshError, MeshResult};
use crate::params::{Params, Value};
use crate::scene::{MeshSpec, Scene};

/// One parsed line: a keyword and its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub keyword: String,
    pub params: Params,
}

/// Parse a single statement such as `vertex_force vertex=0 offset=(0, 1.2, -0.5)`
pub fn parse_statement(input: &str) -> MeshResult<Statement> {
    parse_line(1, input)?.ok_or_else(|| MeshError::Parse {
        line: 1,
        message: "empty statement".to_string(),
    })
}

/// Parse a whole scene script
pub fn parse_scene(input: &str) -> MeshResult<Scene> {
    let mut name = None;
    let mut mesh = None;
    let mut stages = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let Some(statement) = parse_line(line, raw)? else {
            continue;
        };
        let at_line = |err: MeshError| located(line, err);

        match statement.keyword.as_str() {
            "scene" => {
                if name.is_some() {
                    return Err(parse_error(line, "scene is named twice"));
                }
                name = Some(scene_name(line, &statement.params)?);
            }
            "mesh" => {
                if mesh.is_some() {
                    return Err(parse_error(line, "a scene has exactly one mesh"));
                }
                mesh = Some(MeshSpec::from_params(&statement.params).map_err(at_line)?);
            }
            keyword => {
                if mesh.is_none() {
                    return Err(parse_error(line, "stages must come after the mesh line"));
                }
                stages.push(Stage::from_params(keyword, &statement.params).map_err(at_line)?);
            }
        }
    }

    let mesh = mesh.ok_or_else(|| parse_error(input.lines().count().max(1), "script has no mesh line"))?;
    log::debug!("parsed scene script with {} stages", stages.len());
    Ok(Scene::new(name.unwrap_or_else(|| "untitled".to_string()), mesh, stages))
}

/// `scene` lines carry the name as a bare word: `scene soft-cube`
fn scene_name(line: usize, params: &Params) -> MeshResult<String> {
    let mut keys = params.keys();
    match (keys.next(), keys.next()) {
        (Some(name), None) if params.get(name) == Some(&Value::Ident(String::new())) => {
            Ok(name.to_string())
        }
        _ => Err(parse_error(line, "expected `scene <name>`")),
    }
}

fn parse_line(line: usize, raw: &str) -> MeshResult<Option<Statement>> {
    let text = match raw.find('#') {
        Some(i) => &raw[..i],
        None => raw,
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let (keyword, entries) = match all_consuming(statement)(text) {
        Ok((_, parsed)) => parsed,
        Err(e) => return Err(parse_error(line, &format!("could not parse '{text}': {e:?}"))),
    };

    let mut params = Params::new();
    for (key, value) in entries {
        if params.insert(key, value).is_some() {
            return Err(parse_error(line, &format!("duplicate parameter '{key}'")));
        }
    }
    Ok(Some(Statement {
        keyword: keyword.to_string(),
        params,
    }))
}

/// Keyword and entries in source order; repeated keys are kept
fn statement(input: &str) -> IResult<&str, (&str, Vec<(&str, Value)>)> {
    let (input, keyword) = ident(input)?;
    let (input, entries) = many0(preceded(space1, entry))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, (keyword, entries)))
}

/// `key=value`, or a bare word (used for the scene name)
fn entry(input: &str) -> IResult<&str, (&str, Value)> {
    alt((
        separated_pair(ident, delimited(space0, char('='), space0), value),
        map(ident, |word| (word, Value::Ident(String::new()))),
    ))(input)
}

fn value(input: &str) -> IResult<&str, Value> {
    alt((
        map(tuple_value, Value::Tuple),
        map(ident, |s: &str| Value::Ident(s.to_string())),
        map(double, Value::Number),
    ))(input)
}

fn tuple_value(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        terminated(char('('), space0),
        separated_list0(tuple((space0, char(','), space0)), value),
        preceded(space0, char(')')),
    )(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_"), tag("-")))),
    ))(input)
}

fn parse_error(line: usize, message: &str) -> MeshError {
    MeshError::Parse {
        line,
        message: message.to_string(),
    }
}

/// Attach a line number to an error raised while interpreting a statement
fn located(line: usize, err: MeshError) -> MeshError {
    MeshError::Parse {
        line,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CubeBracing;
    use crate::deform::Gravity;

    #[test]
    fn test_parse_statement_values() {
        let statement = parse_statement("vertex_force vertex=0 offset=(0, 1.2, -0.5)").unwrap();
        assert_eq!(statement.keyword, "vertex_force");
        assert_eq!(statement.params.get("vertex"), Some(&Value::Number(0.0)));
        assert_eq!(
            statement.params.get("offset"),
            Some(&Value::from([0.0, 1.2, -0.5]))
        );
    }

    #[test]
    fn test_parse_nested_tuples() {
        let statement = parse_statement("mesh fan outline=((1, 0), (0,1),(-1, 0))").unwrap();
        let points = statement.params.points2("outline").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].x, -1.0);
    }

    #[test]
    fn test_parse_spaces_around_equals() {
        let statement = parse_statement("gravity threshold = 1.5  fall_upper=0.8   ").unwrap();
        assert_eq!(statement.params.number("threshold").unwrap(), 1.5);
        assert_eq!(statement.params.number("fall_upper").unwrap(), 0.8);
    }

    #[test]
    fn test_parse_scene() {
        let script = "\
# soft body drop
scene drop-test
mesh cube_grid spacing=1.5 height=3 bracing=tetra_diagonals

gravity threshold=1.5 fall_upper=0.8 fall_lower=0.4  # upper layer sags more
recover_to_rest
";
        let scene = parse_scene(script).unwrap();
        assert_eq!(scene.name(), "drop-test");
        assert_eq!(
            scene.mesh(),
            &MeshSpec::CubeGrid {
                spacing: 1.5,
                height: 3.0,
                bracing: CubeBracing::TetraDiagonals,
            }
        );
        assert_eq!(
            scene.stages(),
            &[
                Stage::Gravity(Gravity {
                    threshold: 1.5,
                    fall_upper: 0.8,
                    fall_lower: 0.4,
                }),
                Stage::RecoverToRest,
            ]
        );
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let script = "mesh octahedron radius=1\nmelt speed=2\n";
        match parse_scene(script) {
            Err(MeshError::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("melt"));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }

        let script = "mesh octahedron radius=1\ngravity threshold=(1\n";
        assert!(matches!(parse_scene(script), Err(MeshError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_parse_rejects_duplicate_keys() {
        match parse_statement("gravity threshold=1 threshold=5 fall_upper=1") {
            Err(MeshError::Parse { line, message }) => {
                assert_eq!(line, 1);
                assert_eq!(message, "duplicate parameter 'threshold'");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }

        let script = "mesh octahedron radius=1\ngravity threshold=1 fall_upper=1 threshold = 5\n";
        assert_eq!(
            parse_scene(script),
            Err(MeshError::Parse {
                line: 2,
                message: "duplicate parameter 'threshold'".to_string(),
            })
        );
        assert!(parse_scene("scene twice twice\nmesh octahedron radius=1\n").is_err());
    }

    #[test]
    fn test_scene_requires_mesh_first() {
        assert!(parse_scene("recover_to_rest\n").is_err());
        assert!(parse_scene("# nothing here\n").is_err());
        assert!(parse_scene("mesh octahedron radius=1\nmesh octahedron radius=2\n").is_err());
    }

    #[test]
    fn test_untitled_scene() {
        let scene = parse_scene("mesh octahedron radius=1").unwrap();
        assert_eq!(scene.name(), "untitled");
        assert!(scene.stages().is_empty());
    }
}
