use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::Builder;

use crate::errors::SubtitleError;

// @module: File and path utilities

/// Marker inserted before the extension of derived output names
pub const DEFAULT_BILINGUAL_MARKER: &str = "bilingual";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @generates: Output path for the bilingual subtitle
    // @params: translated_file, marker
    /// `movie.zh.srt` becomes `movie.zh.bilingual.srt`; a name without an
    /// extension gets `.bilingual.srt` appended.
    pub fn generate_output_path<P: AsRef<Path>>(translated_file: P, marker: &str) -> PathBuf {
        let translated_file = translated_file.as_ref();

        let stem = translated_file.file_stem().unwrap_or_default();
        let mut output_filename = OsString::from(stem);
        output_filename.push(".");
        output_filename.push(marker);
        output_filename.push(".");
        match translated_file.extension() {
            Some(ext) => output_filename.push(ext),
            None => output_filename.push("srt"),
        }

        translated_file.with_file_name(output_filename)
    }

    /// Write a string to `path` atomically, replacing any existing file.
    ///
    /// Content goes to a temporary file in the destination directory which is
    /// renamed over `path` only after it has been fully written and synced. On
    /// any failure the temporary file is removed and `path` is left untouched.
    /// A replaced file keeps its permissions; a new one gets `0o644` minus the
    /// umask on Unix.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<(), SubtitleError> {
        Self::write_via_temp(path.as_ref(), content, true)
    }

    /// Like [`FileManager::write_atomic`], but fails with an `AlreadyExists`
    /// write error instead of replacing a file that appeared at `path`
    pub fn write_atomic_new<P: AsRef<Path>>(path: P, content: &str) -> Result<(), SubtitleError> {
        Self::write_via_temp(path.as_ref(), content, false)
    }

    fn write_via_temp(path: &Path, content: &str, replace: bool) -> Result<(), SubtitleError> {
        let write_error = |source: std::io::Error| SubtitleError::Write {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let existing_permissions = std::fs::metadata(path).ok().map(|metadata| metadata.permissions());

        let mut builder = Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }

        let mut temp = builder.tempfile_in(parent).map_err(write_error)?;
        temp.write_all(content.as_bytes()).map_err(write_error)?;
        temp.as_file_mut().sync_all().map_err(write_error)?;
        // Creation mode is subject to the umask, the replaced file's mode is not
        if let Some(permissions) = existing_permissions {
            temp.as_file().set_permissions(permissions).map_err(write_error)?;
        }
        if replace {
            temp.persist(path).map_err(|e| write_error(e.error))?;
        } else {
            temp.persist_noclobber(path).map_err(|e| write_error(e.error))?;
        }

        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }
}
