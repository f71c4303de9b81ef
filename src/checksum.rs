//! Content checksums used as the deduplication key.
//!
//! A trace file's identity is the MD5 of its bytes as they sit on disk —
//! for gzip-compressed files that is the compressed content.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Calculate the lowercase hex MD5 checksum of a file, reading in 1 MiB
/// chunks so large traces never load fully into memory.
pub fn calc_md5(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; 1024 * 1024];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
