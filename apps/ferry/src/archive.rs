//! Directory-to-zip packaging for the send pipeline.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Zips `dir` into a single archive and returns the archive path.
///
/// Entry names are relative to the directory's parent, so unpacking
/// recreates the directory itself. `output` overrides the default
/// archive name (`<dir name>.zip` next to the directory).
pub fn compress_directory(dir: &Path, output: Option<&str>) -> anyhow::Result<PathBuf> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let dir_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("cannot derive an archive name from {}", dir.display()))?;

    // Append ".zip" to the whole directory name; a dotted name like
    // "my.photos" becomes "my.photos.zip", not "my.zip".
    let archive_path = match output {
        Some(name) => PathBuf::from(name),
        None => dir.with_file_name(format!("{dir_name}.zip")),
    };

    info!(dir = %dir.display(), archive = %archive_path.display(), "compressing");

    let archive = File::create(&archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut writer = ZipWriter::new(archive);
    let options = SimpleFileOptions::default();

    let base = dir.parent().unwrap_or(Path::new(""));
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(base)
            .with_context(|| format!("entry outside {}", base.display()))?;
        let name = relative.to_string_lossy().replace('\\', "/");
        debug!(entry = %name, "adding");

        writer.start_file(name.as_str(), options)?;
        let mut source = File::open(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?;
    info!(archive = %archive_path.display(), dir_name, "archive ready");
    Ok(archive_path)
}
