//! File I/O for guide documents
//!
//! Loading maps the whole file read-only and decodes it in one pass; the
//! mapping is released when `load` returns, on success or failure. Storing
//! encodes into memory first and then writes the image in a single call.

use crate::core::config::{LoadOptions, StoreOptions};
use crate::core::decode::decode;
use crate::core::encode::encode;
use crate::core::error::{GuideError, Result};
use crate::core::guide::Guide;
use crate::core::header::{Header, MIN_FILE_SIZE};
use memmap2::Mmap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load a guide from `path`
pub fn load(path: &Path, options: &LoadOptions) -> Result<Guide> {
    info!(
        "Loading guide from {:?} ({}-bit origin)",
        path, options.origin_arch
    );

    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < MIN_FILE_SIZE as u64 {
        return Err(GuideError::TooShort { len });
    }

    // SAFETY: the mapping is read-only and dropped before returning; the file
    // is not modified by this process while it is mapped.
    let map = unsafe { Mmap::map(&file)? };
    let guide = decode(&map, options.origin_arch)?;

    info!("Loaded {} nodes from {:?}", guide.len(), path);
    Ok(guide)
}

/// Read and validate only the header of the file at `path`
pub fn probe(path: &Path) -> Result<Header> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < MIN_FILE_SIZE as u64 {
        return Err(GuideError::TooShort { len });
    }
    // SAFETY: see `load`.
    let map = unsafe { Mmap::map(&file)? };
    Header::from_bytes(&map)
}

/// Store `guide` at `path`
pub fn store(path: &Path, guide: &Guide, options: &StoreOptions) -> Result<()> {
    info!("Storing {} nodes to {:?}", guide.len(), path);
    let bytes = encode(guide, options.ref_width)?;

    if options.atomic {
        let tmp = temp_path(path);
        if let Err(e) = write_file(&tmp, &bytes).and_then(|_| Ok(fs::rename(&tmp, path)?)) {
            fs::remove_file(&tmp).ok();
            return Err(e);
        }
    } else {
        write_file(path, &bytes)?;
    }

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
