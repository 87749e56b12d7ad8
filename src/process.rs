//! Batch driver: resize every image in a folder.
//!
//! ## Pipeline
//!
//! ```text
//!               ┌──────────── rayon pool ────────────┐
//! scan ──► [src] │ read → decode → resolve → transcode │ ──► bounded channel ──► writer
//!                └─────────────────────────────────────┘                   (calling thread)
//! ```
//!
//! Workers never touch the output folder. The single writer claims each
//! output name, writes the bytes to a temporary file inside the output folder
//! and renames it over the final name, so an interrupted run never leaves a
//! half-written image behind.
//!
//! ## Failure Policy
//!
//! Configuration problems, a missing input folder or an output folder that
//! cannot be created are fatal ([`ProcessError`]) and stop the run before any
//! image is opened. Everything that goes wrong with one image (unreadable
//! file, corrupt data, no encoder, write failure, two sources mapping to one
//! output name) becomes a [`FailureRecord`] in the [`BatchSummary`] and the
//! batch carries on.
//!
//! Workers finish in any order, but the writer handles results in scan
//! order (sorted by file name). When two sources map to the same output name,
//! the one whose file name sorts first is written and the other is recorded
//! as [`FailureKind::OutputConflict`], the same way on every run.

use crate::config::{ConfigError, ResizeConfig};
use crate::imaging::{
    Dimensions, ImageBackend, OutputFormat, ResizeRequest, RustBackend, TranscodeError,
    Transcoded, resolve_dimensions,
};
use crate::naming::{NamingRule, planned_format};
use crate::scan::{self, ImageSource, ScanError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("cannot create output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single image was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Decode,
    UnsupportedFormat,
    Encode,
    /// No target size could be computed for the image.
    Resolve,
    Io,
    OutputConflict,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Decode => "decode",
            FailureKind::UnsupportedFormat => "unsupported format",
            FailureKind::Encode => "encode",
            FailureKind::Resolve => "resolve",
            FailureKind::Io => "io",
            FailureKind::OutputConflict => "output conflict",
        })
    }
}

impl From<&TranscodeError> for FailureKind {
    fn from(err: &TranscodeError) -> Self {
        match err {
            TranscodeError::Decode(_) => FailureKind::Decode,
            TranscodeError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            TranscodeError::Encode(_) => FailureKind::Encode,
        }
    }
}

/// One skipped image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    fn new(path: &Path, kind: FailureKind, message: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            message: message.to_string(),
        }
    }

    fn transcode(path: &Path, err: TranscodeError) -> Self {
        Self::new(path, FailureKind::from(&err), err)
    }
}

/// One image written to the output folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original: Dimensions,
    pub resized: Dimensions,
    pub format: OutputFormat,
}

/// Result of a batch run.
///
/// `total == success + failed` always holds. Both lists are sorted by source
/// path regardless of the order workers finished in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub outputs: Vec<ResizedImage>,
    pub failures: Vec<FailureRecord>,
}

impl BatchSummary {
    /// True when the input folder held no images at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Progress events streamed while the batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
        input_dir: PathBuf,
        output_dir: PathBuf,
        width: Option<u32>,
        height: Option<u32>,
        maintain_aspect: bool,
    },
    ImageResized(ResizedImage),
    ImageFailed(FailureRecord),
}

/// What a worker hands the writer for one source.
type Outcome = Result<Encoded, FailureRecord>;

/// A finished transcode on its way from a worker to the writer.
struct Encoded {
    source: PathBuf,
    stem: String,
    original: Dimensions,
    transcoded: Transcoded,
}

/// Resize every image in `input_dir` into `output_dir` with the pure-Rust backend.
pub fn process(
    input_dir: &Path,
    output_dir: &Path,
    config: &ResizeConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchSummary, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, input_dir, output_dir, config, progress)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    input_dir: &Path,
    output_dir: &Path,
    config: &ResizeConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchSummary, ProcessError> {
    config.validate()?;
    let sources = scan::scan(input_dir)?;

    fs::create_dir_all(output_dir).map_err(|source| ProcessError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut writer = BatchWriter::new(output_dir, config.naming(), progress);
    writer.emit(ProcessEvent::BatchStarted {
        total: sources.len(),
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        width: config.resize.width,
        height: config.resize.height,
        maintain_aspect: config.resize.maintain_aspect,
    });

    let request = config.request();
    let (tx, rx) = mpsc::sync_channel(rayon::current_num_threads() * 2);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            sources
                .par_iter()
                .enumerate()
                .for_each_with(tx, |tx, (index, source)| {
                    // The writer drains until every sender is gone.
                    tx.send((index, resize_one(backend, source, &request))).ok();
                });
        });
        for (index, outcome) in rx {
            writer.accept(index, outcome);
        }
    });

    Ok(writer.finish())
}

/// An image a run would process, named from its extension alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedImage {
    pub source: PathBuf,
    /// `None` when the format can only be known after decoding.
    pub output_name: Option<String>,
    /// Another image in the folder is planned under the same name.
    pub conflict: bool,
}

/// Dry run: validate the config and list what [`process`] would write.
///
/// Nothing is decoded and nothing is written. Output formats are guessed from
/// file extensions, so the real run can differ for mislabelled files.
pub fn plan(input_dir: &Path, config: &ResizeConfig) -> Result<Vec<PlannedImage>, ProcessError> {
    config.validate()?;
    let naming = config.naming();
    let sources = scan::scan(input_dir)?;

    let mut planned: Vec<PlannedImage> = sources
        .into_iter()
        .map(|source| {
            let output_name = planned_format(&source.path, config.output.format)
                .map(|format| naming.file_name(&source.stem, format));
            PlannedImage {
                source: source.path,
                output_name,
                conflict: false,
            }
        })
        .collect();

    let mut seen = HashSet::new();
    let duplicates: HashSet<String> = planned
        .iter()
        .filter_map(|p| p.output_name.clone())
        .filter(|name| !seen.insert(name.clone()))
        .collect();
    for p in &mut planned {
        p.conflict = p
            .output_name
            .as_ref()
            .is_some_and(|name| duplicates.contains(name));
    }

    Ok(planned)
}

/// Read, decode, resolve and transcode one source. No output I/O.
fn resize_one(
    backend: &impl ImageBackend,
    source: &ImageSource,
    request: &ResizeRequest,
) -> Result<Encoded, FailureRecord> {
    let path = source.path.as_path();
    let bytes = fs::read(path).map_err(|e| FailureRecord::new(path, FailureKind::Io, e))?;
    let image = backend
        .decode(&bytes)
        .map_err(|e| FailureRecord::transcode(path, e))?;

    let original = image.dimensions();
    let target = resolve_dimensions(original, request)
        .map_err(|e| FailureRecord::new(path, FailureKind::Resolve, e))?;

    let transcoded = backend
        .transcode(&image, target, request)
        .map_err(|e| FailureRecord::transcode(path, e))?;

    Ok(Encoded {
        source: source.path.clone(),
        stem: source.stem.clone(),
        original,
        transcoded,
    })
}

/// Single consumer that owns the output folder for the duration of a run.
///
/// Outcomes arrive tagged with their scan index and are held back until every
/// earlier index has been handled.
struct BatchWriter<'a> {
    output_dir: &'a Path,
    naming: NamingRule,
    claimed: HashSet<String>,
    pending: BTreeMap<usize, Outcome>,
    next: usize,
    summary: BatchSummary,
    progress: Option<Sender<ProcessEvent>>,
}

impl<'a> BatchWriter<'a> {
    fn new(output_dir: &'a Path, naming: NamingRule, progress: Option<Sender<ProcessEvent>>) -> Self {
        Self {
            output_dir,
            naming,
            claimed: HashSet::new(),
            pending: BTreeMap::new(),
            next: 0,
            summary: BatchSummary::default(),
            progress,
        }
    }

    fn emit(&self, event: ProcessEvent) {
        if let Some(tx) = &self.progress {
            tx.send(event).ok();
        }
    }

    fn accept(&mut self, index: usize, outcome: Outcome) {
        self.pending.insert(index, outcome);
        while let Some(outcome) = self.pending.remove(&self.next) {
            self.next += 1;
            self.handle(outcome);
        }
    }

    fn handle(&mut self, outcome: Outcome) {
        self.summary.total += 1;
        match outcome.and_then(|encoded| self.write(encoded)) {
            Ok(resized) => {
                tracing::debug!(
                    source = %resized.source.display(),
                    output = %resized.output.display(),
                    "image written"
                );
                self.summary.success += 1;
                self.summary.outputs.push(resized.clone());
                self.emit(ProcessEvent::ImageResized(resized));
            }
            Err(failure) => {
                tracing::debug!(
                    source = %failure.path.display(),
                    kind = %failure.kind,
                    message = %failure.message,
                    "image skipped"
                );
                self.summary.failed += 1;
                self.summary.failures.push(failure.clone());
                self.emit(ProcessEvent::ImageFailed(failure));
            }
        }
    }

    fn write(&mut self, encoded: Encoded) -> Result<ResizedImage, FailureRecord> {
        let name = self
            .naming
            .file_name(&encoded.stem, encoded.transcoded.format);

        if !self.claimed.insert(name.clone()) {
            return Err(FailureRecord::new(
                &encoded.source,
                FailureKind::OutputConflict,
                format!("output {name} was already written by another image in this run"),
            ));
        }

        let output = write_atomic(self.output_dir, &name, &encoded.transcoded.bytes)
            .map_err(|e| FailureRecord::new(&encoded.source, FailureKind::Io, e))?;

        Ok(ResizedImage {
            source: encoded.source,
            output,
            original: encoded.original,
            resized: encoded.transcoded.dimensions,
            format: encoded.transcoded.format,
        })
    }

    fn finish(mut self) -> BatchSummary {
        // Only reachable when a worker died before sending its result.
        for (_, outcome) in std::mem::take(&mut self.pending) {
            self.handle(outcome);
        }
        let mut summary = self.summary;
        summary.outputs.sort_by(|a, b| a.source.cmp(&b.source));
        summary.failures.sort_by(|a, b| a.path.cmp(&b.path));
        summary
    }
}

/// Write `bytes` to `dir/name` via a temp file in the same folder.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".batch-resize-");
    // Temp files default to 0600; outputs should look like any other written file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;

    let dest = dir.join(name);
    tmp.persist(&dest).map_err(|e| e.error)?;
    Ok(dest)
}
