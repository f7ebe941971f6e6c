use std::fmt;
use std::path::Path;

/// Mesh file format, detected from the file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Stereolithography, binary or ASCII.
    Stl,
    /// Wavefront OBJ text.
    Obj,
}

impl MeshFormat {
    /// Detect the format from a file name or path.
    ///
    /// Matching is case-insensitive on the final extension; names without a
    /// recognized extension yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "stl" => Some(MeshFormat::Stl),
            "obj" => Some(MeshFormat::Obj),
            _ => None,
        }
    }

    /// Canonical lowercase extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known_suffixes() {
        assert_eq!(MeshFormat::from_name("part.stl"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_name("model.obj"), Some(MeshFormat::Obj));
    }

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(MeshFormat::from_name("PART.STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_name("Model.Obj"), Some(MeshFormat::Obj));
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert_eq!(MeshFormat::from_name("scan.ply"), None);
        assert_eq!(MeshFormat::from_name("archive.stl.gz"), None);
        assert_eq!(MeshFormat::from_name("noext"), None);
        assert_eq!(MeshFormat::from_name(""), None);
    }

    #[test]
    fn test_from_name_uses_final_extension() {
        assert_eq!(MeshFormat::from_name("v2.final.stl"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_name("/tmp/uploads/a.b.obj"), Some(MeshFormat::Obj));
    }

    #[test]
    fn test_display_matches_extension() {
        assert_eq!(MeshFormat::Stl.to_string(), "stl");
        assert_eq!(MeshFormat::Obj.to_string(), "obj");
    }
}
