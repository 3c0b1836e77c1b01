use mime_guess::from_path;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;

use super::{DirEntryInfo, EntryKind};

/// Enumerate the immediate children of `dir` in filesystem order.
///
/// Each child's metadata is resolved on the rayon pool, so the per-entry
/// stats run in parallel and the pool size bounds the fan-out; the listing is
/// returned only once every child has been classified. No recursion, no
/// sorting, no hidden-entry filtering.
pub fn list_directory(dir: &Path, href_base: &str) -> io::Result<Vec<DirEntryInfo>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    let entries = names
        .par_iter()
        .map(|name| {
            let child = dir.join(name);
            let kind = match fs::metadata(&child) {
                Ok(metadata) if metadata.is_dir() => EntryKind::Dir,
                // An unstat-able child is listed by its MIME guess; following
                // the link surfaces the 404.
                _ => EntryKind::File(from_path(&child).first_or_octet_stream().to_string()),
            };
            DirEntryInfo {
                name: name.clone(),
                kind,
                link: join_href(href_base, name),
            }
        })
        .collect();

    Ok(entries)
}

fn join_href(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}
