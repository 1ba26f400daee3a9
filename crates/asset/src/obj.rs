//! Minimal OBJ parser: positions, normals, texture coordinates and faces.
//!
//! Faces are kept exactly as written (one record per `f` line) so the
//! display list can replay them corner by corner.

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader},
    num::NonZeroU32,
    path::Path,
};

use corelib::{LoadError, LoadResult, vec2, vec3};

use crate::mesh::{Face, FaceCorner, ObjModel};

/// What to do with record tags other than `v`, `vn`, `vt` and `f`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    #[default]
    Ignore,
    /// Log each distinct tag once.
    Warn,
    Reject,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjOptions {
    pub unknown_tags: UnknownTagPolicy,
}

/// Load an OBJ model from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: &ObjOptions) -> LoadResult<ObjModel> {
    let path = path.as_ref();
    log::info!("Loading OBJ from {:?}", path);
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    parse_obj(BufReader::new(file), path, options)
}

/// Load an OBJ model from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R, options: &ObjOptions) -> LoadResult<ObjModel> {
    parse_obj(reader, Path::new("<reader>"), options)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, options: &ObjOptions) -> LoadResult<ObjModel> {
    parse_obj(io::Cursor::new(contents), Path::new("<memory>"), options)
}

fn parse_obj<R: BufRead>(reader: R, source: &Path, options: &ObjOptions) -> LoadResult<ObjModel> {
    let mut model = ObjModel::default();
    let mut unknown = UnknownTags::new(options.unknown_tags);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LoadError::io(source, e))?;
        let line_no = line_no + 1;

        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                model.vertices.push(vec3(x, z, y));
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                model.normals.push(vec3(nx, nz, ny));
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                model.texcoords.push(vec2(u, v));
            }
            "f" => {
                let corners = parts
                    .map(|part| parse_face_corner(part, line_no))
                    .collect::<LoadResult<Vec<_>>>()?;
                if corners.is_empty() {
                    return Err(LoadError::Parse {
                        line: line_no,
                        what: "face corner",
                        token: String::new(),
                    });
                }
                model.faces.push(Face::new(corners));
            }
            _ if tag.starts_with('#') => {}
            _ => {
                unknown.skip(tag, line_no)?;
            }
        }
    }

    log::debug!(
        "OBJ {:?}: {} vertices, {} normals, {} texcoords, {} faces",
        source,
        model.vertices.len(),
        model.normals.len(),
        model.texcoords.len(),
        model.faces.len()
    );

    Ok(model)
}

/// Applies [`UnknownTagPolicy`] to skipped records.
#[derive(Debug)]
struct UnknownTags {
    policy: UnknownTagPolicy,
    warned: HashSet<String>,
}

impl UnknownTags {
    fn new(policy: UnknownTagPolicy) -> Self {
        Self {
            policy,
            warned: HashSet::new(),
        }
    }

    /// Returns `true` if this call logged a warning.
    fn skip(&mut self, tag: &str, line_no: usize) -> LoadResult<bool> {
        match self.policy {
            UnknownTagPolicy::Ignore => Ok(false),
            UnknownTagPolicy::Warn => {
                if !self.warned.insert(tag.to_owned()) {
                    return Ok(false);
                }
                log::warn!("Skipping unrecognized OBJ tag '{}' (first seen on line {})", tag, line_no);
                Ok(true)
            }
            UnknownTagPolicy::Reject => Err(LoadError::UnknownTag {
                line: line_no,
                tag: tag.to_owned(),
            }),
        }
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &'static str) -> LoadResult<f32> {
    let token = value.unwrap_or_default();
    token.parse::<f32>().map_err(|_| LoadError::Parse {
        line: line_no,
        what,
        token: token.to_owned(),
    })
}

/// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn parse_face_corner(token: &str, line_no: usize) -> LoadResult<FaceCorner> {
    let mut split = token.split('/');
    let vertex = split.next().unwrap_or_default();
    let vertex = parse_index(vertex, line_no, "vertex index")?.ok_or_else(|| LoadError::Parse {
        line: line_no,
        what: "vertex index",
        token: token.to_owned(),
    })?;

    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => parse_index(value, line_no, "texture index")?,
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => parse_index(value, line_no, "normal index")?,
        _ => None,
    };

    Ok(FaceCorner::new(vertex, texcoord, normal))
}

/// 1-based index; `0` maps to `None`. Relative (negative) indices are not
/// supported and fail like any other malformed token.
fn parse_index(token: &str, line_no: usize, what: &'static str) -> LoadResult<Option<NonZeroU32>> {
    token
        .parse::<u32>()
        .map(NonZeroU32::new)
        .map_err(|_| LoadError::Parse {
            line: line_no,
            what,
            token: token.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> LoadResult<ObjModel> {
        load_obj_from_str(src, &ObjOptions::default())
    }

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            f 1 2 3
        "#;
        let model = parse(src).expect("parse triangle");
        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.faces.len(), 1);

        let face = &model.faces[0];
        assert_eq!(face.vertex_indices().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(face.raw_texture_indices(), vec![0, 0, 0]);
        assert_eq!(face.raw_normal_indices(), vec![0, 0, 0]);
        assert!(face.texture_indices().all(|i| i.is_none()));
    }

    #[test]
    fn vertex_and_normal_swap_y_and_z() {
        let model = parse("v 1.0 2.0 3.0\nvn 0.0 1.0 0.5\n").unwrap();
        assert_eq!(model.vertices, vec![vec3(1.0, 3.0, 2.0)]);
        assert_eq!(model.normals, vec![vec3(0.0, 0.5, 1.0)]);
    }

    #[test]
    fn texcoords_keep_first_two_values() {
        let model = parse("vt 0.25 0.75 0.0\n").unwrap();
        assert_eq!(model.texcoords, vec![vec2(0.25, 0.75)]);
    }

    #[test]
    fn full_corner_form_is_stored_as_given() {
        let model = parse("f 1/2/3 4/5/6 7/8/9\n").unwrap();
        let face = &model.faces[0];
        assert_eq!(face.vertex_indices().collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(face.raw_texture_indices(), vec![2, 5, 8]);
        assert_eq!(face.raw_normal_indices(), vec![3, 6, 9]);
    }

    #[test]
    fn empty_texture_part_is_absent() {
        let model = parse("f 1//4 2//5 3//6\n").unwrap();
        let face = &model.faces[0];
        assert_eq!(face.raw_texture_indices(), vec![0, 0, 0]);
        assert_eq!(face.raw_normal_indices(), vec![4, 5, 6]);
        assert_eq!(face.corners[0].normal, NonZeroU32::new(4));
    }

    #[test]
    fn texture_only_corner() {
        let model = parse("f 1/7 2/8 3/9\n").unwrap();
        let face = &model.faces[0];
        assert_eq!(face.raw_texture_indices(), vec![7, 8, 9]);
        assert_eq!(face.raw_normal_indices(), vec![0, 0, 0]);
    }

    #[test]
    fn blank_lines_comments_and_unknown_tags_are_skipped() {
        let src = "# car\n\n   \no body\ng shell\ns 1\nusemtl paint\nv 0 0 0\n";
        let model = parse(src).unwrap();
        assert_eq!(model.vertices.len(), 1);
        assert!(model.faces.is_empty());
    }

    #[test]
    fn reject_policy_fails_on_unknown_tag() {
        let options = ObjOptions {
            unknown_tags: UnknownTagPolicy::Reject,
        };
        let err = load_obj_from_str("# fine\nv 0 0 0\nusemtl paint\n", &options).unwrap_err();
        match err {
            LoadError::UnknownTag { line, tag } => {
                assert_eq!(line, 3);
                assert_eq!(tag, "usemtl");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn warn_policy_still_loads() {
        let options = ObjOptions {
            unknown_tags: UnknownTagPolicy::Warn,
        };
        let model = load_obj_from_str("o a\no b\nv 0 0 0\n", &options).unwrap();
        assert_eq!(model.vertices.len(), 1);
    }

    #[test]
    fn warn_policy_warns_once_per_tag() {
        let mut unknown = UnknownTags::new(UnknownTagPolicy::Warn);
        assert!(unknown.skip("o", 1).unwrap());
        assert!(!unknown.skip("o", 2).unwrap());
        assert!(unknown.skip("usemtl", 3).unwrap());
        assert!(!unknown.skip("usemtl", 9).unwrap());
        assert_eq!(unknown.warned.len(), 2);
    }

    #[test]
    fn ignore_policy_never_warns() {
        let mut unknown = UnknownTags::new(UnknownTagPolicy::Ignore);
        assert!(!unknown.skip("o", 1).unwrap());
        assert!(!unknown.skip("g", 2).unwrap());
        assert!(unknown.warned.is_empty());
    }

    #[test]
    fn malformed_float_is_parse_error() {
        match parse("v 1.0 abc 3.0\n") {
            Err(LoadError::Parse { line: 1, what, token }) => {
                assert_eq!(what, "y coordinate");
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_component_is_parse_error() {
        assert!(matches!(
            parse("v 0 0 0\nvn 1.0 2.0\n"),
            Err(LoadError::Parse { line: 2, what: "nz coordinate", .. })
        ));
    }

    #[test]
    fn malformed_face_indices_are_parse_errors() {
        for src in ["f 1 x 3\n", "f 1/a 2 3\n", "f -1 2 3\n", "f 0 1 2\n", "f /1/1\n", "f\n"] {
            assert!(
                matches!(parse(src), Err(LoadError::Parse { .. })),
                "expected parse error for {src:?}"
            );
        }
    }

    #[test]
    fn zero_attribute_index_means_absent() {
        let model = parse("f 1/0/0\n").unwrap();
        assert_eq!(model.faces[0].corners[0].texcoord, None);
        assert_eq!(model.faces[0].corners[0].normal, None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("livery-does-not-exist.obj");
        assert!(matches!(
            load_obj_from_path(&path, &ObjOptions::default()),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = std::env::temp_dir().join(format!("livery-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let model = load_obj_from_path(&path, &ObjOptions::default()).unwrap();
        assert_eq!(model.corner_count(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
