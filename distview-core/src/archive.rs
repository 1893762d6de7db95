//! Archive format detection and unpacking
//!
//! Distribution archives come as gzipped tarballs, plain tarballs or zip
//! files. The format is taken from the file name when it is recognizable and
//! from the leading magic bytes otherwise.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;

/// Container formats that can be unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Guess the format from a file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Identify the format from the first bytes of the file
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if header.starts_with(b"PK\x03\x04") {
            Some(Self::Zip)
        } else if header.len() >= 262 && &header[257..262] == b"ustar" {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detect the format of an archive on disk
    pub fn detect(path: &Path) -> Result<Self, ExtractError> {
        if let Some(format) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
        {
            return Ok(format);
        }

        // Fall back to sniffing the header
        let mut header = Vec::with_capacity(512);
        File::open(path)
            .map_err(ExtractError::Open)?
            .take(512)
            .read_to_end(&mut header)
            .map_err(ExtractError::Open)?;

        Self::from_magic(&header).ok_or(ExtractError::UnsupportedFormat)
    }
}

/// Unpack `archive` into `dest`, preserving the archive's own layout
pub fn unpack(archive: &Path, dest: &Path) -> Result<ArchiveFormat, ExtractError> {
    let format = ArchiveFormat::detect(archive)?;
    debug!(?format, archive = %archive.display(), dest = %dest.display(), "Unpacking archive");

    let file = File::open(archive).map_err(ExtractError::Open)?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::TarGz => {
            let gz_decoder = flate2::read::GzDecoder::new(reader);
            tar::Archive::new(gz_decoder)
                .unpack(dest)
                .map_err(ExtractError::Tar)?;
        }
        ArchiveFormat::Tar => {
            tar::Archive::new(reader)
                .unpack(dest)
                .map_err(ExtractError::Tar)?;
        }
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(reader)?;
            zip.extract(dest)?;
        }
    }

    Ok(format)
}
