//! Run configuration resolved from command-line input.
//!
//! The resolver validates paths in a fixed order and fails fast: nothing is
//! served until every directory the run depends on has been checked.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_EXTENSION: &str = ".txt";
pub const DEFAULT_TAGS: &str = "PER,ORG,GPE,LOC";

/// Name of the default output directory under the data directory.
pub const DEFAULT_OUTPUT_DIR: &str = "annotations";

/// Minimum number of annotator directories needed to adjudicate.
pub const MIN_ANNOTATION_DIRS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} does not exist", .0.display())]
    DataMissing(PathBuf),

    #[error("{} is not a directory", .0.display())]
    DataNotDirectory(PathBuf),

    #[error("must specify at least two annotation directories")]
    TooFewAnnotationDirs,

    #[error("directory {} does not exist", .0.display())]
    AnnotationDirMissing(PathBuf),

    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which tool the server runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Annotate,
    Adjudicate { annotation_dirs: Vec<PathBuf> },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Annotate => "annotate",
            Mode::Adjudicate { .. } => "adjudicate",
        }
    }

    pub fn annotation_dirs(&self) -> &[PathBuf] {
        match self {
            Mode::Annotate => &[],
            Mode::Adjudicate { annotation_dirs } => annotation_dirs,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw launch options before validation. Everything optional here gets a
/// default during [`RunConfiguration::resolve`].
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub lang: String,
    pub data: PathBuf,
    pub output: Option<PathBuf>,
    pub hints: Option<PathBuf>,
    pub port: Option<u16>,
    pub extension: Option<String>,
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub rtl: bool,
    pub debug: bool,
    /// `Some` selects adjudicate mode, even when the list is empty.
    pub annotation_dirs: Option<Vec<PathBuf>>,
}

/// Validated, immutable configuration for one server run.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub lang: String,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub hints: Option<PathBuf>,
    pub tags: Vec<String>,
    pub port: u16,
    pub extension: String,
    pub rtl: bool,
    /// Normalised URL prefix (`/sub`), never a bare `/`.
    pub prefix: Option<String>,
    pub debug: bool,
    pub mode: Mode,
}

impl RunConfiguration {
    pub fn resolve(options: LaunchOptions) -> Result<Self, ConfigError> {
        let data_dir = options.data;
        if !data_dir.exists() {
            return Err(ConfigError::DataMissing(data_dir));
        }
        if !data_dir.is_dir() {
            return Err(ConfigError::DataNotDirectory(data_dir));
        }

        let mode = match options.annotation_dirs {
            Some(dirs) => {
                check_annotation_dirs(&dirs)?;
                Mode::Adjudicate {
                    annotation_dirs: dirs,
                }
            }
            None => Mode::Annotate,
        };

        let output_dir = options
            .output
            .unwrap_or_else(|| data_dir.join(DEFAULT_OUTPUT_DIR));
        ensure_dir(&output_dir).map_err(|source| ConfigError::CreateOutput {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            lang: options.lang.to_lowercase(),
            data_dir,
            output_dir,
            hints: options.hints,
            tags: parse_tags(options.tags.as_deref().unwrap_or(DEFAULT_TAGS)),
            port: options.port.unwrap_or(DEFAULT_PORT),
            extension: normalize_extension(options.extension.as_deref()),
            rtl: options.rtl,
            prefix: options.prefix.as_deref().and_then(normalize_prefix),
            debug: options.debug,
            mode,
        })
    }
}

fn check_annotation_dirs(dirs: &[PathBuf]) -> Result<(), ConfigError> {
    if dirs.len() < MIN_ANNOTATION_DIRS {
        return Err(ConfigError::TooFewAnnotationDirs);
    }
    for dir in dirs {
        if !dir.exists() {
            return Err(ConfigError::AnnotationDirMissing(dir.clone()));
        }
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Split a comma separated tag list, trimming and upper-casing each tag.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_extension(ext: Option<&str>) -> String {
    match ext.map(str::trim) {
        None | Some("") => DEFAULT_EXTENSION.to_string(),
        Some(ext) if ext.starts_with('.') => ext.to_string(),
        Some(ext) => format!(".{}", ext),
    }
}

/// `sub`, `/sub` and `/sub/` all become `/sub`; `/` and empty mean no prefix.
pub fn normalize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{}", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(data: &Path) -> LaunchOptions {
        LaunchOptions {
            lang: "AMH".to_string(),
            data: data.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let config = RunConfiguration::resolve(options(temp.path())).unwrap();

        assert_eq!(config.lang, "amh");
        assert_eq!(config.output_dir, temp.path().join("annotations"));
        assert!(config.output_dir.is_dir());
        assert_eq!(config.port, 5000);
        assert_eq!(config.extension, ".txt");
        assert_eq!(config.tags, vec!["PER", "ORG", "GPE", "LOC"]);
        assert_eq!(config.prefix, None);
        assert_eq!(config.mode, Mode::Annotate);
    }

    #[test]
    fn test_tags_are_trimmed_and_uppercased() {
        assert_eq!(parse_tags("per, org"), vec!["PER", "ORG"]);
        assert_eq!(parse_tags(" per ,,misc "), vec!["PER", "MISC"]);
    }

    #[test]
    fn test_explicit_output_is_created() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("elsewhere").join("anno");
        let mut opts = options(temp.path());
        opts.output = Some(out.clone());

        let config = RunConfiguration::resolve(opts).unwrap();
        assert_eq!(config.output_dir, out);
        assert!(out.is_dir());
    }

    #[test]
    fn test_missing_data_dir() {
        let temp = TempDir::new().unwrap();
        let err = RunConfiguration::resolve(options(&temp.path().join("nope"))).unwrap_err();
        assert!(matches!(err, ConfigError::DataMissing(_)));
        assert!(err.to_string().ends_with("does not exist"));
    }

    #[test]
    fn test_data_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("doc.txt");
        std::fs::write(&file, "a\n").unwrap();

        let err = RunConfiguration::resolve(options(&file)).unwrap_err();
        assert!(matches!(err, ConfigError::DataNotDirectory(_)));
    }

    #[test]
    fn test_adjudicate_needs_two_dirs() {
        let temp = TempDir::new().unwrap();
        let one = temp.path().join("a1");
        std::fs::create_dir(&one).unwrap();

        let mut opts = options(temp.path());
        opts.annotation_dirs = Some(vec![one]);
        let err = RunConfiguration::resolve(opts).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewAnnotationDirs));

        let mut opts = options(temp.path());
        opts.annotation_dirs = Some(vec![]);
        assert!(RunConfiguration::resolve(opts).is_err());
    }

    #[test]
    fn test_adjudicate_rejects_missing_dir_before_creating_output() {
        let temp = TempDir::new().unwrap();
        let one = temp.path().join("a1");
        std::fs::create_dir(&one).unwrap();

        let mut opts = options(temp.path());
        opts.annotation_dirs = Some(vec![one, temp.path().join("missing")]);
        let err = RunConfiguration::resolve(opts).unwrap_err();

        assert!(matches!(err, ConfigError::AnnotationDirMissing(_)));
        assert!(!temp.path().join("annotations").exists());
    }

    #[test]
    fn test_adjudicate_mode() {
        let temp = TempDir::new().unwrap();
        let dirs: Vec<PathBuf> = ["a1", "a2"].iter().map(|d| temp.path().join(d)).collect();
        for dir in &dirs {
            std::fs::create_dir(dir).unwrap();
        }

        let mut opts = options(temp.path());
        opts.annotation_dirs = Some(dirs.clone());
        let config = RunConfiguration::resolve(opts).unwrap();

        assert_eq!(config.mode.name(), "adjudicate");
        assert_eq!(config.mode.annotation_dirs(), dirs.as_slice());
    }

    #[test]
    fn test_extension_and_prefix_normalisation() {
        assert_eq!(normalize_extension(Some("tsv")), ".tsv");
        assert_eq!(normalize_extension(Some(".conll")), ".conll");
        assert_eq!(normalize_extension(None), ".txt");

        assert_eq!(normalize_prefix("df"), Some("/df".to_string()));
        assert_eq!(normalize_prefix("/df/"), Some("/df".to_string()));
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix(""), None);
    }
}
