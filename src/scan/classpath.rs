//! Reading raw class files from classpath roots.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use jnibridge_core::ScanError;

/// The bytes of one class file and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSource {
    /// `path` for loose files, `archive!entry` for archive members.
    pub origin: String,
    pub bytes: Vec<u8>,
}

/// Kinds of classpath root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Directory,
    Archive,
    ClassFile,
}

impl RootKind {
    pub fn of(path: &Path) -> Result<Self, ScanError> {
        let meta = std::fs::metadata(path).map_err(|source| io_error(path, source))?;
        if meta.is_dir() {
            return Ok(RootKind::Directory);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip") => {
                Ok(RootKind::Archive)
            }
            Some("class") => Ok(RootKind::ClassFile),
            _ => Err(io_error(
                path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a directory, .jar, .zip or .class file",
                ),
            )),
        }
    }
}

/// Whether an entry path names a class the scanner should read.
///
/// Skips `module-info`/`package-info` and `META-INF/` (multi-release
/// variants duplicate the base classes).
pub fn is_class_entry(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    let Some(stem) = path.strip_suffix(".class") else {
        return false;
    };
    let simple = stem.rsplit('/').next().unwrap_or(stem);
    !path.starts_with("META-INF/") && simple != "module-info" && simple != "package-info"
}

/// Read every class under one root, in a stable order.
pub fn read_root(root: &Path) -> Result<Vec<ClassSource>, ScanError> {
    let sources = match RootKind::of(root)? {
        RootKind::Directory => read_directory(root)?,
        RootKind::Archive => read_archive(root)?,
        RootKind::ClassFile => vec![ClassSource {
            origin: root.display().to_string(),
            bytes: std::fs::read(root).map_err(|source| io_error(root, source))?,
        }],
    };
    tracing::debug!(root = %root.display(), classes = sources.len(), "read classpath root");
    Ok(sources)
}

fn read_directory(root: &Path) -> Result<Vec<ClassSource>, ScanError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"));
            io_error(&path, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative = relative.to_string_lossy().replace('\\', "/");
        if !is_class_entry(&relative) {
            continue;
        }
        let bytes = std::fs::read(entry.path()).map_err(|source| io_error(entry.path(), source))?;
        sources.push(ClassSource {
            origin: entry.path().display().to_string(),
            bytes,
        });
    }
    Ok(sources)
}

fn read_archive(path: &Path) -> Result<Vec<ClassSource>, ScanError> {
    let archive_error = |message: String| ScanError::Archive {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| is_class_entry(name))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let mut entry = archive
            .by_name(&name)
            .map_err(|e| archive_error(format!("{name}: {e}")))?;
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| archive_error(format!("{name}: {e}")))?;
        sources.push(ClassSource {
            origin: format!("{}!{name}", path.display()),
            bytes,
        });
    }
    Ok(sources)
}

/// Look up a resource (`com/example/extra.jni.cpp`) in classpath order, the
/// way a class loader would. `None` when no directory or archive root has it.
pub fn read_resource(roots: &[PathBuf], resource: &str) -> Result<Option<String>, ScanError> {
    let resource = resource.trim_start_matches('/');
    for root in roots {
        let bytes = match RootKind::of(root)? {
            RootKind::Directory => {
                let path = root.join(resource);
                if !path.is_file() {
                    continue;
                }
                std::fs::read(&path).map_err(|source| io_error(&path, source))?
            }
            RootKind::Archive => match read_archive_entry(root, resource)? {
                Some(bytes) => bytes,
                None => continue,
            },
            RootKind::ClassFile => continue,
        };
        let text = String::from_utf8(bytes).map_err(|e| {
            io_error(
                &root.join(resource),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
        tracing::debug!(root = %root.display(), resource, "loaded resource");
        return Ok(Some(text));
    }
    Ok(None)
}

fn read_archive_entry(path: &Path, name: &str) -> Result<Option<Vec<u8>>, ScanError> {
    let archive_error = |message: String| ScanError::Archive {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(archive_error(format!("{name}: {e}"))),
    };
    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| archive_error(format!("{name}: {e}")))?;
    Ok(Some(bytes))
}

fn io_error(path: &Path, source: io::Error) -> ScanError {
    ScanError::Io {
        path: PathBuf::from(path),
        source,
    }
}
