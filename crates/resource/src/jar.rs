//! `jar:<archive-url>!/<entry>` URLs, naming entries of zip archives on disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use xchain_traits::{ResourceError, SharedResourceData};
use zip::ZipArchive;
use zip::result::ZipError;

pub const JAR_SCHEME: &str = "jar";

/// Splits a jar URL into the archive path and the entry name.
fn split_jar_url(url: &Url) -> Result<(PathBuf, String), ResourceError> {
    let invalid = |message: String| ResourceError::InvalidUrl {
        url: url.to_string(),
        message,
    };
    let rest = url
        .as_str()
        .strip_prefix("jar:")
        .ok_or_else(|| invalid("not a jar URL".to_string()))?;
    let (archive, entry) = rest
        .split_once("!/")
        .ok_or_else(|| invalid("missing '!/' before the entry name".to_string()))?;
    if entry.is_empty() {
        return Err(invalid("empty entry name".to_string()));
    }
    let archive = Url::parse(archive).map_err(|e| invalid(e.to_string()))?;
    let path = archive
        .to_file_path()
        .map_err(|()| invalid("archive is not a local file".to_string()))?;
    Ok((path, entry.to_string()))
}

fn open_archive(url: &Url, path: &Path) -> Result<ZipArchive<File>, ResourceError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ResourceError::NotFound(url.to_string())
        } else {
            ResourceError::LoadFailed {
                system_id: url.to_string(),
                message: e.to_string(),
            }
        }
    })?;
    ZipArchive::new(file).map_err(|e| ResourceError::LoadFailed {
        system_id: url.to_string(),
        message: e.to_string(),
    })
}

/// Whether the archive exists and has the entry.
pub fn jar_entry_exists(url: &Url) -> bool {
    let Ok((path, entry)) = split_jar_url(url) else {
        return false;
    };
    match open_archive(url, &path) {
        Ok(mut archive) => {
            let found = archive.by_name(&entry).is_ok();
            found
        }
        Err(_) => false,
    }
}

pub fn read_jar_entry(url: &Url) -> Result<SharedResourceData, ResourceError> {
    let (path, entry) = split_jar_url(url)?;
    let mut archive = open_archive(url, &path)?;
    let mut file = archive.by_name(&entry).map_err(|e| match e {
        ZipError::FileNotFound => ResourceError::NotFound(url.to_string()),
        other => ResourceError::LoadFailed {
            system_id: url.to_string(),
            message: other.to_string(),
        },
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Arc::new(bytes))
}
