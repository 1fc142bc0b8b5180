//! Line sources
//!
//! A line source turns some external resource into an ordered, finite list of
//! newline-stripped lines. Gzip and ANSI escape handling live here so the
//! classifier only ever sees plain text.

use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use flate2::read::MultiGzDecoder;
use regex::Regex;

use tablog_types::{ClassifiedLine, SeverityLevel};

use crate::error::{LogError, Result};

/// CSI, OSC and two-byte escape sequences
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("ANSI escape pattern is valid")
});

/// Absolute path-like token, starting at a token boundary
static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w./:+-])(/[\w./:+-]+)").expect("path token pattern is valid")
});

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Supplier of raw lines for a session
pub trait LineSource: Send + Sync {
    /// Human-readable name (usually a path)
    fn describe(&self) -> String;

    /// Whether lines should go through the classifier or all be `Text`
    fn should_classify(&self) -> bool {
        true
    }

    /// Read all lines. Called again on reload.
    fn read_lines(&self) -> Result<Vec<String>>;
}

/// Log file on disk, optionally gzip-compressed
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    force_classify: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            force_classify: false,
        }
    }

    /// Classify even when the file name does not look like a log
    pub fn force_classify(mut self, force: bool) -> Self {
        self.force_classify = force;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, message: impl Into<String>) -> LogError {
        LogError::source_unavailable(self.path.display().to_string(), message)
    }
}

impl LineSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn should_classify(&self) -> bool {
        self.force_classify || is_log_path(&self.path)
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.unavailable("File not found"));
            }
            Err(e) => return Err(self.unavailable(format!("Cannot access file ({})", e))),
        };
        if !metadata.is_file() {
            return Err(self.unavailable("Not a regular file"));
        }

        let raw = fs::read(&self.path)
            .map_err(|e| self.unavailable(format!("Cannot read file ({})", e)))?;

        let bytes = if is_gzip(&raw, &self.path) {
            let mut decoded = Vec::with_capacity(raw.len() * 4);
            MultiGzDecoder::new(raw.as_slice())
                .read_to_end(&mut decoded)
                .map_err(|e| self.unavailable(format!("Decompression failed ({})", e)))?;
            decoded
        } else {
            raw
        };

        let text = String::from_utf8(bytes)
            .map_err(|_| self.unavailable("Unsupported file type: not UTF-8 text"))?;
        if text.contains('\0') {
            return Err(self.unavailable("Unsupported file type: binary data"));
        }

        tracing::debug!(path = %self.path.display(), bytes = text.len(), "read log file");
        Ok(split_lines(&strip_ansi(&text)))
    }
}

/// Lines held in memory
#[derive(Clone, Debug)]
pub struct MemorySource {
    name: String,
    lines: Vec<String>,
    classify: bool,
}

impl MemorySource {
    pub fn new<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
            classify: true,
        }
    }

    /// Build from a text blob, splitting lines and stripping ANSI escapes
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, split_lines(&strip_ansi(text)))
    }

    pub fn classify(mut self, classify: bool) -> Self {
        self.classify = classify;
        self
    }
}

impl LineSource for MemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn should_classify(&self) -> bool {
        self.classify
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Replacement contents for a store when a source fails: one Error line
/// carrying the message, so the view is never blank.
pub fn failure_lines(error: &LogError) -> Vec<ClassifiedLine> {
    vec![ClassifiedLine::new(
        0,
        SeverityLevel::Error,
        error.to_string(),
    )]
}

/// Files named `*.log` or `*.log.gz` are classified by default
pub fn is_log_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".log") || name.ends_with(".log.gz"))
}

/// Absolute `*.log` / `*.log.gz` paths mentioned in a line, in order.
/// Paths inside URLs are not reported. Existence is not checked.
pub fn referenced_logs(text: &str) -> Vec<PathBuf> {
    PATH_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|token| token.as_str().trim_end_matches(['.', ':']))
        .filter(|token| is_log_path(Path::new(token)))
        .map(PathBuf::from)
        .collect()
}

fn is_gzip(bytes: &[u8], path: &Path) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
        || path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Remove terminal escape sequences
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    ANSI_ESCAPE.replace_all(text, "")
}

/// Split on `\n` or `\r\n`; a trailing newline does not add an empty line
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
