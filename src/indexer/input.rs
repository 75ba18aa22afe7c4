use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IndexError, Result};

/// Extensions picked up when a directory is given as input.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".arc", ".arc.gz", ".warc", ".warc.gz"];

/// Name used for standard input.
pub const STDIN_NAME: &str = "-";

/// One container to index.
pub enum Input {
    /// A file, or a directory to scan for WARC and ARC files.
    Path(PathBuf),
    /// Standard input.
    Stdin,
    /// An already open stream, indexed under `name`.
    Reader {
        name: String,
        reader: Box<dyn BufRead>,
    },
}

impl Input {
    /// `-` means standard input, anything else a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_NAME {
            Input::Stdin
        } else {
            Input::Path(PathBuf::from(arg))
        }
    }

    pub fn reader(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Input::Reader {
            name: name.into(),
            reader: Box::new(reader),
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Stdin => f.write_str("Stdin"),
            Input::Reader { name, .. } => f.debug_struct("Reader").field("name", name).finish(),
        }
    }
}

/// Replace directory inputs by the archive files below them, in a stable order.
pub fn expand_inputs(inputs: Vec<Input>) -> Result<Vec<Input>> {
    let mut expanded = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            Input::Path(path) if path.is_dir() => {
                let before = expanded.len();
                for entry in WalkDir::new(&path).sort_by_file_name() {
                    let entry = entry.map_err(|e| IndexError::OpenInput {
                        path: e.path().map_or_else(|| path.clone(), Path::to_path_buf),
                        source: e.into(),
                    })?;
                    if entry.file_type().is_file() && has_allowed_extension(entry.path()) {
                        expanded.push(Input::Path(entry.into_path()));
                    }
                }
                tracing::debug!(
                    dir = %path.display(),
                    files = expanded.len() - before,
                    "expanded input directory"
                );
            }
            other => expanded.push(other),
        }
    }
    Ok(expanded)
}

fn has_allowed_extension(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    ALLOWED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Name recorded in the `filename` field for an input path.
///
/// `forced` wins; otherwise the path relative to `dir_root` (with `/`
/// separators), otherwise the bare file name.
pub fn resolve_filename(path: &Path, forced: Option<&str>, dir_root: Option<&Path>) -> String {
    if let Some(name) = forced {
        return name.to_string();
    }

    if let Some(root) = dir_root {
        if let Some(relative) = relative_to(path, root) {
            return relative;
        }
        tracing::debug!(
            path = %path.display(),
            root = %root.display(),
            "input is outside --dir-root; using its file name"
        );
    }

    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn relative_to(path: &Path, root: &Path) -> Option<String> {
    let relative = path
        .strip_prefix(root)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| {
            let path = path.canonicalize().ok()?;
            let root = root.canonicalize().ok()?;
            path.strip_prefix(&root).ok().map(Path::to_path_buf)
        })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
