//! Single-entry zip archive of the packaged template.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Zips `source` into `archive` as a single entry named after the source file.
///
/// An existing archive is overwritten. Blocking; callers on the runtime run
/// it through `spawn_blocking`.
pub fn write_single_entry_zip(source: &Path, archive: &Path) -> io::Result<u64> {
    let entry_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no usable file name", source.display()),
            )
        })?;

    let contents = std::fs::read(source)?;

    let mut writer = zip::ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(entry_name, options).map_err(io::Error::other)?;
    writer.write_all(&contents)?;
    let file = writer.finish().map_err(io::Error::other)?;

    Ok(file.metadata()?.len())
}

/// Async wrapper over [`write_single_entry_zip`].
pub async fn create(source: &Path, archive: &Path) -> io::Result<u64> {
    let source: PathBuf = source.to_path_buf();
    let archive: PathBuf = archive.to_path_buf();

    tokio::task::spawn_blocking(move || write_single_entry_zip(&source, &archive))
        .await
        .map_err(|e| io::Error::other(format!("archive task panicked: {e}")))?
}
