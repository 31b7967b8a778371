use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ContributorsTableConfig;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("unable to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("marker '{marker}' not found")]
    MissingMarker { marker: String },
    #[error("marker '{marker}' occurs {count} times, expected exactly once")]
    DuplicateMarker { marker: String, count: usize },
    #[error("end marker appears before start marker")]
    MarkersOutOfOrder,
}

/// Byte range owned by the table: strictly between the end of the start marker
/// and the beginning of the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSpan {
    pub inner_start: usize,
    pub inner_end: usize,
}

impl MarkerSpan {
    pub fn locate(content: &str, start_marker: &str, end_marker: &str) -> Result<Self, PatchError> {
        let start = find_unique(content, start_marker)?;
        let end = find_unique(content, end_marker)?;
        let inner_start = start + start_marker.len();

        if end < inner_start {
            return Err(PatchError::MarkersOutOfOrder);
        }

        Ok(Self {
            inner_start,
            inner_end: end,
        })
    }

    /// Replaces the owned region with the fragment framed by newlines.
    pub fn splice(&self, content: &str, fragment: &str) -> String {
        debug_assert!(self.inner_start <= self.inner_end && self.inner_end <= content.len());
        let mut patched = String::with_capacity(content.len() + fragment.len() + 2);
        patched.push_str(&content[..self.inner_start]);
        patched.push('\n');
        patched.push_str(fragment);
        patched.push('\n');
        patched.push_str(&content[self.inner_end..]);
        patched
    }
}

fn find_unique(content: &str, marker: &str) -> Result<usize, PatchError> {
    let mut matches = content.match_indices(marker).map(|(index, _)| index);
    let first = matches.next().ok_or_else(|| PatchError::MissingMarker {
        marker: marker.to_string(),
    })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(PatchError::DuplicateMarker {
            marker: marker.to_string(),
            count: extra + 1,
        });
    }
    Ok(first)
}

/// A target file that passed the precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    pub path: PathBuf,
}

/// Rewrites the marker-delimited region of each target file.
#[derive(Debug, Clone)]
pub struct FilePatcher {
    files: Vec<PathBuf>,
    start_marker: String,
    end_marker: String,
}

impl FilePatcher {
    pub fn new(files: Vec<PathBuf>, start_marker: String, end_marker: String) -> Self {
        Self {
            files,
            start_marker,
            end_marker,
        }
    }

    pub fn from_config(config: &ContributorsTableConfig) -> Self {
        Self::new(
            config.files.clone(),
            config.placeholder_start.clone(),
            config.placeholder_end.clone(),
        )
    }

    /// Returns the configured files that exist and carry a usable marker pair.
    /// Unusable files are reported with a warning and left out.
    pub fn writable_targets(&self) -> Vec<TargetFile> {
        self.files
            .iter()
            .filter_map(|path| match self.inspect(path) {
                Ok(_) => Some(TargetFile { path: path.clone() }),
                Err(err) => {
                    warn!(file = %path.display(), reason = %err, "skipping target file");
                    None
                }
            })
            .collect()
    }

    /// Writes the fragment into every target, returning how many files were updated.
    pub fn patch(&self, targets: &[TargetFile], fragment: &str) -> usize {
        let mut written = 0;
        for target in targets {
            match self.patch_file(&target.path, fragment) {
                Ok(changed) => {
                    info!(file = %target.path.display(), changed, "contributors table written");
                    written += 1;
                }
                Err(err) => {
                    warn!(file = %target.path.display(), reason = %err, "skipping target file");
                }
            }
        }
        written
    }

    pub fn patch_file(&self, path: &Path, fragment: &str) -> Result<bool, PatchError> {
        let (content, span) = self.inspect(path)?;
        let patched = span.splice(&content, fragment);
        if patched == content {
            return Ok(false);
        }
        write_atomically(path, &patched)?;
        Ok(true)
    }

    fn inspect(&self, path: &Path) -> Result<(String, MarkerSpan), PatchError> {
        let content = fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let span = MarkerSpan::locate(&content, &self.start_marker, &self.end_marker)?;
        Ok((content, span))
    }
}

/// Writes through symlinks to the real file and keeps its permission bits.
fn write_atomically(path: &Path, content: &str) -> Result<(), PatchError> {
    let io_error = |source: io::Error| PatchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let real_path = fs::canonicalize(path).map_err(io_error)?;
    let permissions = fs::metadata(&real_path).map_err(io_error)?.permissions();

    let mut temp_name = real_path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".contributors.tmp");
    let temp_path = real_path.with_file_name(temp_name);

    let staged = fs::write(&temp_path, content)
        .and_then(|()| fs::set_permissions(&temp_path, permissions))
        .and_then(|()| fs::rename(&temp_path, &real_path));
    if let Err(source) = staged {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(source));
    }
    Ok(())
}
