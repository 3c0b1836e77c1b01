use percent_encoding::percent_decode_str;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::log_error;
use crate::logging::LoggingExt;

/// A request path resolved against the served root.
///
/// `path` is the filesystem location to stat and serve; `href` is the decoded,
/// query-stripped request path the listing page builds links from.
#[derive(Debug)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub href: String,
}

/// Decode the request path and join it under `base_dir`. Returns `Ok(None)`
/// when the result would escape the served root.
pub fn resolve_path(base_dir: &Path, request_path: &str) -> io::Result<Option<ResolvedPath>> {
    log::debug!(
        "Resolving path - base: {}, request: {}",
        base_dir.display(),
        request_path
    );

    let canonical_base = base_dir.log_operation("canonicalize", || fs::canonicalize(base_dir))?;

    // Strip query parameters from the request path
    let path_without_query = request_path.split('?').next().unwrap_or(request_path);

    let decoded_path = request_path.log_operation("decode_path", || {
        percent_decode_str(path_without_query)
            .decode_utf8()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;
    let href = decoded_path.to_string();

    let cleaned_path = PathBuf::from(decoded_path.as_ref())
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect::<PathBuf>();

    let requested_path = canonical_base.join(&cleaned_path);

    match fs::canonicalize(&requested_path) {
        Ok(path) => {
            if path.starts_with(&canonical_base) {
                Ok(Some(ResolvedPath { path, href }))
            } else {
                log::warn!("Path escapes base directory: {}", path.display());
                Ok(None)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if requested_path.starts_with(&canonical_base) {
                log::debug!(
                    "Using non-canonicalized path (not found): {}",
                    requested_path.display()
                );
                Ok(Some(ResolvedPath {
                    path: requested_path,
                    href,
                }))
            } else {
                log::warn!("Non-existent path would escape base directory");
                Ok(None)
            }
        }
        Err(e) => {
            log_error!(
                e,
                format!("Failed to canonicalize path: {}", requested_path.display())
            );
            Err(e)
        }
    }
}
