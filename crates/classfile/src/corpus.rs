//! Enumerates a corpus of `.class` files: loose files under a directory,
//! or entries inside `.jar`/`.zip` archives. Grounded in the teacher's
//! own file-reading (`std::fs::read` of a single path in `file-info`),
//! generalized to a recursive walk plus archive support.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusIoError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
}

/// One `.class` file pulled from the corpus, with a display path
/// (`archive.jar!com/example/Foo.class` for archive members) and its
/// raw bytes.
pub struct CorpusEntry {
    pub display_path: String,
    pub bytes: Vec<u8>,
}

/// Walks `root` for `.class` files. `root` may itself be a directory (walked
/// recursively, descending into any `.jar`/`.zip` archives found along the
/// way), a single `.class` file, or a top-level `.jar`/`.zip` archive.
/// Entries are yielded in directory-listing order; callers that need
/// determinism should sort by `display_path`.
pub fn walk_corpus(root: &Path) -> Result<Vec<CorpusEntry>, CorpusIoError> {
    let mut entries = Vec::new();

    if root.is_file() {
        match root.extension().and_then(|e| e.to_str()) {
            Some("jar") | Some("zip") => read_archive(root, &mut entries)?,
            Some("class") => {
                let bytes = std::fs::read(root).map_err(|source| CorpusIoError::Io {
                    path: root.display().to_string(),
                    source,
                })?;
                entries.push(CorpusEntry {
                    display_path: root.display().to_string(),
                    bytes,
                });
            }
            _ => {
                return Err(CorpusIoError::Io {
                    path: root.display().to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "input file is neither a .class file nor a .jar/.zip archive",
                    ),
                });
            }
        }
        return Ok(entries);
    }

    walk_dir(root, &mut entries)?;
    Ok(entries)
}

fn walk_dir(dir: &Path, out: &mut Vec<CorpusEntry>) -> Result<(), CorpusIoError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| CorpusIoError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    for entry in read_dir {
        let entry = entry.map_err(|source| CorpusIoError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            walk_dir(&path, out)?;
            continue;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("class") => {
                let bytes = std::fs::read(&path).map_err(|source| CorpusIoError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                out.push(CorpusEntry {
                    display_path: path.display().to_string(),
                    bytes,
                });
            }
            Some("jar") | Some("zip") => {
                read_archive(&path, out)?;
            }
            _ => {
                tracing::warn!(path = %path.display(), "skipping non-class corpus entry");
            }
        }
    }

    Ok(())
}

fn read_archive(path: &Path, out: &mut Vec<CorpusEntry>) -> Result<(), CorpusIoError> {
    let file = std::fs::File::open(path).map_err(|source| CorpusIoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| CorpusIoError::Archive {
        path: path.display().to_string(),
        source,
    })?;

    for i in 0..archive.len() {
        let mut member = archive
            .by_index(i)
            .map_err(|source| CorpusIoError::Archive {
                path: path.display().to_string(),
                source,
            })?;
        let member_name = member.name().to_owned();
        if !member_name.ends_with(".class") {
            continue;
        }
        let mut bytes = Vec::with_capacity(member.size() as usize);
        if let Err(source) = std::io::copy(&mut member, &mut bytes) {
            tracing::warn!(archive = %path.display(), entry = %member_name, error = %source, "skipping unreadable archive entry");
            continue;
        }
        out.push(CorpusEntry {
            display_path: format!("{}!{}", path.display(), member_name),
            bytes,
        });
    }

    Ok(())
}
