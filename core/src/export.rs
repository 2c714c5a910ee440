//! Zip export of a project's resource files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{} is outside the exported directory", .0.display())]
    OutsideRoot(PathBuf),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub archive_path: PathBuf,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

/// Packs `files` into a zip at `output`, naming each entry by its path
/// relative to `root`. The archive is built next to `output` and moved into
/// place once complete.
pub fn export_zip<'a>(
    root: &Path,
    files: impl IntoIterator<Item = &'a Path>,
    output: &Path,
) -> Result<ExportSummary, ExportError> {
    let mut files: Vec<&Path> = files.into_iter().collect();
    files.sort();
    files.dedup();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp_path = output.with_extension("zip.tmp");
    let mut writer = ZipWriter::new(File::create(&temp_path)?);
    let options = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut entries = Vec::with_capacity(files.len());
    let written = (|| -> Result<(), ExportError> {
        for path in files {
            let name = entry_name(root, path)?;
            writer.start_file(name.as_str(), options.clone())?;
            writer.write_all(&fs::read(path)?)?;
            entries.push(name);
        }
        writer.finish()?;
        Ok(())
    })();

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    fs::rename(&temp_path, output)?;

    info!("exported {} files to {}", entries.len(), output.display());
    Ok(ExportSummary {
        archive_path: output.to_path_buf(),
        entries,
    })
}

fn entry_name(root: &Path, path: &Path) -> Result<String, ExportError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ExportError::OutsideRoot(path.to_path_buf()))?;
    Ok(relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::read::ZipArchive;

    #[test]
    fn entries_are_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Properties");
        fs::create_dir_all(&nested).unwrap();
        let base = nested.join("Strings.resx");
        let variant = nested.join("Strings.fr.resx");
        fs::write(&base, "<root/>").unwrap();
        fs::write(&variant, "<root>fr</root>").unwrap();
        let output = dir.path().join("out").join("export.zip");

        let summary =
            export_zip(dir.path(), [variant.as_path(), base.as_path()], &output).unwrap();

        assert_eq!(
            summary.entries,
            ["Properties/Strings.fr.resx", "Properties/Strings.resx"]
        );
        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("Properties/Strings.fr.resx")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<root>fr</root>");
    }

    #[test]
    fn files_outside_the_root_fail_without_leaving_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let stray = other.path().join("Stray.resx");
        fs::write(&stray, "<root/>").unwrap();
        let output = dir.path().join("export.zip");

        let err = export_zip(dir.path(), [stray.as_path()], &output).unwrap_err();

        assert!(matches!(err, ExportError::OutsideRoot(_)));
        assert!(!output.exists());
        assert!(!dir.path().join("export.zip.tmp").exists());
    }
}
