use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::error::{Error, Result};

/// Archive the given parts of a mod directory (files or folders, relative to
/// `mod_dir`) into `<mod>_backup_<timestamp>.zip` next to the mod directory.
/// Missing parts are skipped; nothing inside `mod_dir` is touched.
pub fn backup_mod_parts(mod_dir: &Path, parts: &[&str]) -> Result<PathBuf> {
    if !mod_dir.is_dir() {
        return Err(Error::io(
            mod_dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    let parent = mod_dir.parent().unwrap_or(Path::new("."));
    let name = mod_dir.file_name().and_then(|s| s.to_str()).unwrap_or("mod");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_backup_{}.zip", name, ts));

    let file = fs::File::create(&dest).map_err(|e| Error::io(&dest, e))?;
    let mut archive = Archive {
        zip: ZipWriter::new(file),
        options: FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644),
        dest: &dest,
    };
    let mut entries = 0usize;
    for part in parts {
        let root = mod_dir.join(part);
        if !root.exists() {
            continue;
        }
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                path: root.clone(),
                source,
            })?;
            let Ok(rel) = entry.path().strip_prefix(mod_dir) else {
                continue;
            };
            let name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                archive.add_dir(name)?;
            } else {
                archive.add_file(name, entry.path())?;
            }
            entries += 1;
        }
    }
    archive.zip.finish().map_err(|e| zip_error(&dest, e))?;
    tracing::info!(dest = %dest.display(), entries, "backed up mod");
    Ok(dest)
}

struct Archive<'a> {
    zip: ZipWriter<fs::File>,
    options: FileOptions,
    dest: &'a Path,
}

impl Archive<'_> {
    fn add_dir(&mut self, name: String) -> Result<()> {
        self.zip
            .add_directory(name, self.options)
            .map_err(|e| zip_error(self.dest, e))
    }

    fn add_file(&mut self, name: String, path: &Path) -> Result<()> {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        self.zip
            .start_file(name, self.options)
            .map_err(|e| zip_error(self.dest, e))?;
        self.zip
            .write_all(&data)
            .map_err(|e| Error::io(self.dest, e))
    }
}

fn zip_error(dest: &Path, e: zip::result::ZipError) -> Error {
    Error::io(dest, io::Error::other(e.to_string()))
}
