use crate::sbom_generation::policies::ExtractionLimits;
use crate::shared::error::PipelineError;
use crate::shared::security::sanitize_member_path;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TAR_BLOCK: usize = 512;

/// Container formats recognised by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

/// Counts reported after a successful extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub members: usize,
    pub files: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    File,
    Dir,
    Skip,
}

/// Validated member, produced by the header pass.
#[derive(Debug)]
struct PlannedMember {
    relative: PathBuf,
    kind: MemberKind,
    mode: Option<u32>,
}

/// ArchiveExtractor unpacks untrusted zip and tar archives (plain, gzip, bzip2
/// or xz compressed).
///
/// Extraction runs in two passes. The first reads only member headers and
/// rejects the archive as a whole if any member escapes the destination, is
/// a link or device, or the member count or declared sizes exceed the
/// limits. Nothing is written until that pass succeeds. The second pass
/// writes regular files and directories, re-checking the byte ceiling
/// against what is actually decompressed.
///
/// The source archive is deleted after every attempt. On failure the
/// destination directory is removed so no partial tree is left behind.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    limits: ExtractionLimits,
}

impl ArchiveExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self { limits }
    }

    /// Extracts on the blocking thread pool.
    pub async fn extract_blocking(
        &self,
        archive: PathBuf,
        dest: PathBuf,
    ) -> Result<ExtractionSummary, PipelineError> {
        let extractor = self.clone();
        let archive_for_cleanup = archive.clone();

        match tokio::task::spawn_blocking(move || extractor.extract(&archive, &dest)).await {
            Ok(result) => result,
            Err(join_error) => {
                let _ = fs::remove_file(&archive_for_cleanup);
                Err(PipelineError::SupervisorFault {
                    details: format!("extraction task failed: {}", join_error),
                })
            }
        }
    }

    /// Extracts `archive` into `dest`, then deletes `archive`.
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractionSummary, PipelineError> {
        let result = self.extract_inner(archive, dest);

        if let Err(e) = &result {
            warn!(archive = %archive.display(), kind = e.kind(), "extraction failed, removing partial output");
            if let Err(cleanup) = fs::remove_dir_all(dest) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(dest = %dest.display(), error = %cleanup, "could not remove extraction directory");
                }
            }
        }

        let _ = fs::remove_file(archive);
        result
    }

    fn extract_inner(&self, archive: &Path, dest: &Path) -> Result<ExtractionSummary, PipelineError> {
        let format = detect_format(archive)?;
        debug!(archive = %archive.display(), ?format, "detected archive format");

        match format {
            ArchiveFormat::Zip => self.extract_zip(archive, dest),
            ArchiveFormat::Tar | ArchiveFormat::TarGz | ArchiveFormat::TarBz2 | ArchiveFormat::TarXz => {
                self.extract_tar(archive, dest, format)
            }
        }
    }

    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<ExtractionSummary, PipelineError> {
        let file = File::open(archive).map_err(|e| PipelineError::io(archive, e))?;
        let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(corrupt)?;

        self.limits.check_member_count(zip.len())?;

        let mut plan = Vec::with_capacity(zip.len());
        let mut declared: u64 = 0;
        for index in 0..zip.len() {
            let entry = zip.by_index_raw(index).map_err(corrupt)?;
            let name = entry.name().to_string();
            let relative = sanitize_member_path(&name)?;

            let mode = entry.unix_mode();
            if let Some(kind) = mode.and_then(unsafe_mode_kind) {
                return Err(PipelineError::UnsafeMember { member: name, kind });
            }

            let kind = if entry.is_dir() {
                MemberKind::Dir
            } else {
                declared = declared.saturating_add(entry.size());
                self.limits.check_total_bytes(declared)?;
                MemberKind::File
            };
            plan.push(PlannedMember {
                relative,
                kind,
                mode,
            });
        }

        let mut sink = Sink::new(dest, self.limits)?;
        for (index, member) in plan.iter().enumerate() {
            match member.kind {
                MemberKind::Dir => sink.dir(&member.relative)?,
                MemberKind::File => {
                    let mut entry = zip.by_index(index).map_err(corrupt)?;
                    sink.file(&member.relative, &mut entry, member.mode)?;
                }
                MemberKind::Skip => {}
            }
        }

        Ok(sink.finish(plan.len()))
    }

    fn extract_tar(
        &self,
        archive: &Path,
        dest: &Path,
        format: ArchiveFormat,
    ) -> Result<ExtractionSummary, PipelineError> {
        let plan = self.plan_tar(archive, format)?;

        let mut sink = Sink::new(dest, self.limits)?;
        let mut tar = open_tar(archive, format)?;
        let entries = tar.entries().map_err(corrupt_io)?;
        let mut planned = plan.iter();

        for entry in entries {
            let mut entry = entry.map_err(corrupt_io)?;
            let Some(member) = planned.next() else {
                return Err(PipelineError::CorruptArchive {
                    details: "archive changed between passes".to_string(),
                });
            };

            match member.kind {
                MemberKind::Dir => sink.dir(&member.relative)?,
                MemberKind::File => sink.file(&member.relative, &mut entry, member.mode)?,
                MemberKind::Skip => {}
            }
        }

        let members = plan.iter().filter(|m| m.kind != MemberKind::Skip).count();
        Ok(sink.finish(members))
    }

    fn plan_tar(&self, archive: &Path, format: ArchiveFormat) -> Result<Vec<PlannedMember>, PipelineError> {
        let mut tar = open_tar(archive, format)?;
        let mut plan = Vec::new();
        let mut members = 0usize;
        let mut declared: u64 = 0;

        for entry in tar.entries().map_err(corrupt_io)? {
            let entry = entry.map_err(corrupt_io)?;
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let entry_type = entry.header().entry_type();

            let kind = match entry_type {
                tar::EntryType::Regular | tar::EntryType::Continuous => MemberKind::File,
                tar::EntryType::Directory => MemberKind::Dir,
                tar::EntryType::Symlink => {
                    return Err(PipelineError::UnsafeMember {
                        member: name,
                        kind: "symbolic link",
                    })
                }
                tar::EntryType::Link => {
                    return Err(PipelineError::UnsafeMember {
                        member: name,
                        kind: "hard link",
                    })
                }
                tar::EntryType::Char | tar::EntryType::Block | tar::EntryType::Fifo => {
                    return Err(PipelineError::UnsafeMember {
                        member: name,
                        kind: "device or fifo",
                    })
                }
                tar::EntryType::XGlobalHeader
                | tar::EntryType::XHeader
                | tar::EntryType::GNULongName
                | tar::EntryType::GNULongLink => MemberKind::Skip,
                _ => {
                    return Err(PipelineError::UnsafeMember {
                        member: name,
                        kind: "unsupported entry type",
                    })
                }
            };

            if kind == MemberKind::Skip {
                plan.push(PlannedMember {
                    relative: PathBuf::new(),
                    kind,
                    mode: None,
                });
                continue;
            }

            members += 1;
            self.limits.check_member_count(members)?;

            let relative = sanitize_member_path(&name)?;
            if kind == MemberKind::File {
                let size = entry.header().size().map_err(corrupt_io)?;
                declared = declared.saturating_add(size);
                self.limits.check_total_bytes(declared)?;
            }

            plan.push(PlannedMember {
                relative,
                kind,
                mode: entry.header().mode().ok(),
            });
        }

        Ok(plan)
    }
}

/// Writes validated members below the destination root.
struct Sink<'a> {
    dest: &'a Path,
    limits: ExtractionLimits,
    written: u64,
    files: usize,
}

impl<'a> Sink<'a> {
    fn new(dest: &'a Path, limits: ExtractionLimits) -> Result<Self, PipelineError> {
        fs::create_dir_all(dest).map_err(|e| PipelineError::io(dest, e))?;
        Ok(Self {
            dest,
            limits,
            written: 0,
            files: 0,
        })
    }

    fn dir(&self, relative: &Path) -> Result<(), PipelineError> {
        if relative.as_os_str().is_empty() {
            return Ok(());
        }
        let target = self.dest.join(relative);
        fs::create_dir_all(&target).map_err(|e| PipelineError::io(&target, e))
    }

    fn file(&mut self, relative: &Path, reader: &mut dyn Read, mode: Option<u32>) -> Result<(), PipelineError> {
        if relative.as_os_str().is_empty() {
            return Ok(());
        }

        let target = self.dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }

        let mut out = File::create(&target).map_err(|e| PipelineError::io(&target, e))?;
        let remaining = self.limits.max_total_bytes.saturating_sub(self.written);
        let copied = io::copy(&mut reader.take(remaining.saturating_add(1)), &mut out)
            .map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => PipelineError::CorruptArchive {
                    details: format!("{}: {}", relative.display(), e),
                },
                _ => PipelineError::io(&target, e),
            })?;

        self.written = self.written.saturating_add(copied);
        self.limits.check_total_bytes(self.written)?;
        self.files += 1;

        apply_mode(&target, mode);
        Ok(())
    }

    fn finish(self, members: usize) -> ExtractionSummary {
        ExtractionSummary {
            members,
            files: self.files,
            bytes: self.written,
        }
    }
}

#[cfg(unix)]
fn apply_mode(target: &Path, mode: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        let sanitized = (mode & 0o755) | 0o600;
        let _ = fs::set_permissions(target, fs::Permissions::from_mode(sanitized));
    }
}

#[cfg(not(unix))]
fn apply_mode(_target: &Path, _mode: Option<u32>) {}

/// Classifies a unix mode that must not be materialised.
fn unsafe_mode_kind(mode: u32) -> Option<&'static str> {
    match mode & 0o170000 {
        0o120000 => Some("symbolic link"),
        0o020000 | 0o060000 | 0o010000 | 0o140000 => Some("device or fifo"),
        _ => None,
    }
}

/// Detects the container format from the leading bytes of the file.
pub fn detect_format(path: &Path) -> Result<ArchiveFormat, PipelineError> {
    let mut file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut header = [0u8; TAR_BLOCK];
    let mut filled = 0;
    while filled < header.len() {
        let n = file
            .read(&mut header[filled..])
            .map_err(|e| PipelineError::io(path, e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let header = &header[..filled];

    if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
        return Ok(ArchiveFormat::Zip);
    }
    if header.starts_with(&[0x1f, 0x8b]) {
        return Ok(ArchiveFormat::TarGz);
    }
    if header.starts_with(b"BZh") {
        return Ok(ArchiveFormat::TarBz2);
    }
    if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
        return Ok(ArchiveFormat::TarXz);
    }
    if header.len() == TAR_BLOCK && (&header[257..262] == b"ustar" || tar_checksum_matches(header)) {
        return Ok(ArchiveFormat::Tar);
    }

    Err(PipelineError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

/// Pre-POSIX tar headers carry no magic; the header checksum identifies them.
fn tar_checksum_matches(header: &[u8]) -> bool {
    let field = &header[148..156];
    let digits: String = field
        .iter()
        .take_while(|b| **b != 0 && **b != b' ')
        .map(|b| *b as char)
        .collect();
    let digits = digits.trim();
    if digits.is_empty() {
        return false;
    }
    let Ok(expected) = u32::from_str_radix(digits, 8) else {
        return false;
    };

    let actual: u32 = header
        .iter()
        .enumerate()
        .map(|(i, b)| if (148..156).contains(&i) { b' ' as u32 } else { *b as u32 })
        .sum();
    actual == expected
}

fn open_tar(archive: &Path, format: ArchiveFormat) -> Result<tar::Archive<Box<dyn Read>>, PipelineError> {
    let file = File::open(archive).map_err(|e| PipelineError::io(archive, e))?;
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(file))),
        ArchiveFormat::TarBz2 => Box::new(bzip2::read::MultiBzDecoder::new(BufReader::new(file))),
        ArchiveFormat::TarXz => Box::new(xz2::read::XzDecoder::new_multi_decoder(BufReader::new(file))),
        ArchiveFormat::Tar | ArchiveFormat::Zip => Box::new(BufReader::new(file)),
    };
    Ok(tar::Archive::new(reader))
}

fn corrupt(e: zip::result::ZipError) -> PipelineError {
    PipelineError::CorruptArchive {
        details: e.to_string(),
    }
}

fn corrupt_io(e: io::Error) -> PipelineError {
    PipelineError::CorruptArchive {
        details: e.to_string(),
    }
}
