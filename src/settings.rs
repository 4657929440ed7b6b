use serde::Deserialize;
use std::path::PathBuf;

pub const LANGUAGE_FILE_EXTENSION: &str = "kl";
pub const PROJECT_MANIFEST_NAME: &str = "kiln.toml";

// Rough size heuristics for pre-allocating the arenas and tables built over the course of a
// single file's compilation. These are a starting guess, not a guarantee; actual growth is
// handled by the normal Vec/HashMap reallocation path.
pub const SRC_TO_TOKEN_RATIO: usize = 5;
pub const TOKEN_TO_DECL_RATIO: usize = 35;
pub const TOKEN_TO_NODE_RATIO: usize = 10;
pub const MINIMUM_LIKELY_DECLARATIONS: usize = 10;

/// Programmatic configuration surface for the driver (§2.1.M). Distinct from CLI argument
/// parsing, which is out of scope — this is what an embedding host or `main.rs` builds before
/// calling into the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_name: String,
    pub entry_file: PathBuf,
    /// Additional directories visible to `import` resolution beyond the entry file's own tree.
    pub library_dirs: Vec<PathBuf>,
    pub version: String,
    pub author: String,
    pub license: String,
}

impl Config {
    pub fn new(entry_file: PathBuf) -> Self {
        Self {
            project_name: String::new(),
            entry_file,
            library_dirs: Vec::new(),
            version: String::from("0.1.0"),
            author: String::new(),
            license: String::from("MIT"),
        }
    }

    /// Load configuration from a project manifest (`kiln.toml`), merging it over defaults.
    pub fn from_manifest(manifest_path: &std::path::Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(manifest_path)?;
        let manifest: ProjectManifest = toml::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        let base_dir = manifest_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."));
        Ok(Self {
            project_name: manifest.project.name,
            entry_file: base_dir.join(manifest.project.entry),
            library_dirs: manifest
                .project
                .library_dirs
                .into_iter()
                .map(|d| base_dir.join(d))
                .collect(),
            version: manifest.project.version,
            author: manifest.project.author.unwrap_or_default(),
            license: manifest.project.license.unwrap_or_else(|| "MIT".into()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectManifest {
    project: ProjectManifestBody,
}

#[derive(Debug, Deserialize)]
struct ProjectManifestBody {
    name: String,
    entry: PathBuf,
    #[serde(default)]
    library_dirs: Vec<PathBuf>,
    #[serde(default = "default_version")]
    version: String,
    author: Option<String>,
    license: Option<String>,
}

fn default_version() -> String {
    String::from("0.1.0")
}
