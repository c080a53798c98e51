//! One job per input file. Queue checks happen up front, the work itself runs in
//! parallel through [`sotes::batch::process_batch`].
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};
use sotes::{
    batch::{process_batch, BatchSummary},
    constants::{BITMAP_EXTENSION, PREVIEW_EXTENSION, RESOURCE_EXTENSION},
    error::{Categorized, DecodeError, EncodeError, ErrorCategory, RasterError, VerifyError},
    pack, read_raster,
    verify::{verify_round_trip_with, Region},
    write_raster, DecodeOptions, RasterImage, SpriteContainer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Unpack,
    Pack,
    Verify,
}

impl Action {
    /// Extension of what the action writes, if it writes anything.
    fn output_extension(self) -> Option<&'static str> {
        match self {
            Action::Unpack => Some(BITMAP_EXTENSION),
            Action::Pack => Some(RESOURCE_EXTENSION),
            Action::Verify => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOptions {
    pub strict: bool,
    pub overwrite: bool,
    pub output_dir: Option<PathBuf>,
    pub preview: bool,
    /// Keep the palette slot of 24 bit resources in the unpacked bitmap.
    pub keep_palette: bool,
    /// Where `pack` looks for the resources it packs over. The bitmap's folder when unset.
    pub reference_dir: Option<PathBuf>,
}

impl JobOptions {
    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            strict: self.strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Unpack { output: PathBuf },
    Pack { reference: PathBuf, output: PathBuf },
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Another input is already written to {}", .path.display())]
    DuplicateDestination { path: PathBuf },
    #[error("{} already exists, pass --overwrite to replace it", .path.display())]
    DestinationExists { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("Re-encoding differs from the original in {regions:?}")]
    RoundTripMismatch { regions: Vec<Region> },
    #[error("Cannot write preview: {source}")]
    Preview {
        #[from]
        source: image::ImageError,
    },
}

impl Categorized for JobError {
    fn category(&self) -> ErrorCategory {
        match self {
            JobError::Queue(_) | JobError::Preview { .. } => ErrorCategory::Io,
            JobError::Decode(err) => err.category(),
            JobError::Encode(err) => err.category(),
            JobError::Raster(err) => err.category(),
            JobError::Verify(err) => err.category(),
            JobError::RoundTripMismatch { .. } => ErrorCategory::Structural,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Written(PathBuf),
    Verified { structurally_equal: bool },
}

/// `<output dir or input dir>/<input stem>.<extension>`
pub fn output_path(input: &Path, extension: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or(Path::new(""));

    dir.join(stem).with_extension(extension)
}

/// The resource an edited bitmap is packed over.
pub fn reference_path(bitmap: &Path, reference_dir: Option<&Path>) -> PathBuf {
    output_path(bitmap, RESOURCE_EXTENSION, reference_dir)
}

/// The `.png` written next to an unpacked bitmap.
pub fn preview_path(bitmap: &Path) -> PathBuf {
    bitmap.with_extension(PREVIEW_EXTENSION)
}

/// Every file a job writes, main output first.
fn destinations_of(action: Action, output: &Path, options: &JobOptions) -> Vec<PathBuf> {
    let mut paths = vec![output.to_path_buf()];

    if action == Action::Unpack && options.preview {
        paths.push(preview_path(output));
    }

    paths
}

/// One entry per input, in input order.
pub fn build_queue(
    action: Action,
    inputs: &[PathBuf],
    options: &JobOptions,
) -> Vec<Result<Job, QueueError>> {
    let mut destinations = HashSet::new();

    inputs
        .iter()
        .map(|input| {
            let output = action
                .output_extension()
                .map(|extension| output_path(input, extension, options.output_dir.as_deref()));

            let written = output
                .as_deref()
                .map(|output| destinations_of(action, output, options))
                .unwrap_or_default();

            if let Some(path) = written.iter().find(|path| destinations.contains(*path)) {
                return Err(QueueError::DuplicateDestination { path: path.clone() });
            }

            destinations.extend(written.iter().cloned());

            if let Some(path) = written
                .iter()
                .find(|path| path.exists() && !options.overwrite)
            {
                return Err(QueueError::DestinationExists { path: path.clone() });
            }

            let task = match (action, output) {
                (Action::Unpack, Some(output)) => Task::Unpack { output },
                (Action::Pack, Some(output)) => Task::Pack {
                    reference: reference_path(input, options.reference_dir.as_deref()),
                    output,
                },
                _ => Task::Verify,
            };

            Ok(Job {
                input: input.clone(),
                task,
            })
        })
        .collect()
}

fn unpack(job: &Job, output: &Path, options: &JobOptions) -> Result<JobOutcome, JobError> {
    let container = SpriteContainer::open_from_file_with(&job.input, options.decode_options())?;

    // preview first, a failed job leaves no bitmap behind
    if options.preview {
        if let Some(preview) = container.to_rgb8(0) {
            preview.save(preview_path(output))?;
        }
    }

    // containers always hold a frame
    if let Some(image) = RasterImage::from_container_with(&container, 0, options.keep_palette) {
        write_raster(output, &image)?;
    }

    Ok(JobOutcome::Written(output.to_path_buf()))
}

fn pack_over(
    job: &Job,
    reference: &Path,
    output: &Path,
    options: &JobOptions,
) -> Result<JobOutcome, JobError> {
    let raster = read_raster(&job.input)?;
    let reference = SpriteContainer::open_from_file_with(reference, options.decode_options())?;

    let packed = pack(&reference, &raster)?;
    packed.write_to_file(output)?;

    Ok(JobOutcome::Written(output.to_path_buf()))
}

fn verify(job: &Job, options: &JobOptions) -> Result<JobOutcome, JobError> {
    let bytes = std::fs::read(&job.input).map_err(|source| DecodeError::IOError { source })?;
    let report = verify_round_trip_with(&bytes, options.decode_options())?;

    if !report.is_byte_exact() {
        return Err(JobError::RoundTripMismatch {
            regions: report
                .mismatches
                .iter()
                .map(|mismatch| mismatch.region)
                .collect(),
        });
    }

    Ok(JobOutcome::Verified {
        structurally_equal: report.structurally_equal,
    })
}

pub fn run_job(job: &Job, options: &JobOptions) -> Result<JobOutcome, JobError> {
    debug!("{:?} {}", job.task, job.input.display());

    match &job.task {
        Task::Unpack { output } => unpack(job, output, options),
        Task::Pack { reference, output } => pack_over(job, reference, output, options),
        Task::Verify => verify(job, options),
    }
}

/// Runs every input, logs each result and a summary.
pub fn run_queue(action: Action, inputs: &[PathBuf], options: &JobOptions) -> BatchSummary {
    let queue = build_queue(action, inputs, options);

    let results = process_batch(&queue, |entry| {
        entry
            .as_ref()
            .map_err(|err| JobError::from(err.clone()))
            .and_then(|job| run_job(job, options))
    });

    inputs
        .iter()
        .zip(&results)
        .for_each(|(input, result)| match result {
            Ok(JobOutcome::Written(path)) => {
                info!("{} -> {}", input.display(), path.display())
            }
            Ok(JobOutcome::Verified { structurally_equal }) => {
                info!(
                    "{}: byte exact (structurally equal: {})",
                    input.display(),
                    structurally_equal
                )
            }
            Err(err) if err.category().is_skippable() => {
                warn!("Skipping {}: {}", input.display(), err)
            }
            Err(err) => error!("{}: {}", input.display(), err),
        });

    let summary = BatchSummary::from_results(&results);

    info!(
        "{} succeeded, {} skipped, {} failed",
        summary.succeeded, summary.skipped, summary.failed
    );

    summary
}

#[cfg(test)]
mod test {
    use super::*;

    /// Smallest resource the game accepts: no obfuscation, both slots at 0.
    fn tiny_resource(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x458];

        bytes[0x004..0x008].copy_from_slice(&width.to_le_bytes());
        bytes[0x420..0x424].copy_from_slice(&height.to_le_bytes());
        bytes[0x430..0x432].copy_from_slice(&8u16.to_le_bytes());
        bytes[0x438..0x43c].copy_from_slice(&10001u32.to_le_bytes());

        // a grey ramp
        (0..256).for_each(|i| {
            let entry = 0x20 + i * 4;
            bytes[entry..entry + 3].fill(i as u8);
        });

        bytes.extend((0..width * height).map(|i| i as u8));
        bytes
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fsunpack_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn output_naming() {
        assert_eq!(
            output_path(Path::new("res/0042.bin"), "bmp", None),
            PathBuf::from("res/0042.bmp")
        );
        assert_eq!(
            output_path(Path::new("res/0042.bin"), "bmp", Some(Path::new("out"))),
            PathBuf::from("out/0042.bmp")
        );
        assert_eq!(
            output_path(Path::new("sprite"), "bin", None),
            PathBuf::from("sprite.bin")
        );
        assert_eq!(
            reference_path(Path::new("edit/0042.bmp"), Some(Path::new("res"))),
            PathBuf::from("res/0042.bin")
        );
    }

    #[test]
    fn duplicate_destinations() {
        let options = JobOptions {
            output_dir: Some(PathBuf::from("fsunpack_nonexistent_out")),
            ..Default::default()
        };
        let inputs = [PathBuf::from("a/1.bin"), PathBuf::from("b/1.bin"), PathBuf::from("a/2.bin")];

        let queue = build_queue(Action::Unpack, &inputs, &options);

        assert!(queue[0].is_ok());
        assert_eq!(
            queue[1],
            Err(QueueError::DuplicateDestination {
                path: PathBuf::from("fsunpack_nonexistent_out/1.bmp")
            })
        );
        assert!(queue[2].is_ok());
    }

    #[test]
    fn existing_destinations() {
        let dir = temp_dir("existing");
        let input = dir.join("7.bin");
        std::fs::write(dir.join("7.bmp"), b"old").unwrap();

        let queue = build_queue(Action::Unpack, &[input.clone()], &JobOptions::default());
        assert_eq!(
            queue[0],
            Err(QueueError::DestinationExists {
                path: dir.join("7.bmp")
            })
        );

        let options = JobOptions {
            overwrite: true,
            ..Default::default()
        };
        let queue = build_queue(Action::Unpack, &[input], &options);
        let _ = std::fs::remove_dir_all(&dir);

        assert!(queue[0].is_ok());
    }

    #[test]
    fn verify_writes_nothing() {
        let queue = build_queue(
            Action::Verify,
            &[PathBuf::from("x.bin"), PathBuf::from("x.bin")],
            &JobOptions::default(),
        );

        assert!(queue
            .iter()
            .all(|job| matches!(job, Ok(Job { task: Task::Verify, .. }))));
    }

    #[test]
    fn unpack_edit_pack_verify() {
        let dir = temp_dir("cycle");
        let resource = dir.join("0001.bin");
        let corrupted = dir.join("0002.bin");
        let original = tiny_resource(5, 3);

        std::fs::write(&resource, &original).unwrap();
        std::fs::write(&corrupted, &original[..original.len() - 4]).unwrap();

        let options = JobOptions {
            strict: true,
            preview: true,
            ..Default::default()
        };

        let summary = run_queue(Action::Unpack, &[resource.clone(), corrupted], &options);
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(dir.join("0001.png").exists());

        // edit the bitmap, then pack it over the resource it came from
        let bitmap = dir.join("0001.bmp");
        let mut image = read_raster(&bitmap).unwrap();
        // first pixel of the bottom row, stored first
        image.pixels[10] = 200;
        write_raster(bitmap.as_path(), &image).unwrap();

        let summary = run_queue(Action::Pack, &[bitmap.clone()], &options);
        assert_eq!(summary.failed, 1, "reference exists and is not overwritten");

        let options = JobOptions {
            overwrite: true,
            ..options
        };
        let summary = run_queue(Action::Pack, &[bitmap], &options);
        assert_eq!(summary.succeeded, 1);

        let packed = std::fs::read(&resource).unwrap();
        assert_eq!(packed.len(), original.len());
        assert_eq!(packed[0x458], 200);
        assert_eq!(packed[0x459..], original[0x459..]);

        let summary = run_queue(Action::Verify, &[resource], &options);
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn existing_preview_is_kept() {
        let dir = temp_dir("preview");
        let resource = dir.join("1.bin");
        let preview = dir.join("1.png");
        std::fs::write(&resource, tiny_resource(2, 2)).unwrap();
        std::fs::write(&preview, b"user file").unwrap();

        let options = JobOptions {
            preview: true,
            ..Default::default()
        };

        let queue = build_queue(Action::Unpack, &[resource.clone()], &options);
        assert_eq!(
            queue[0],
            Err(QueueError::DestinationExists {
                path: preview.clone()
            })
        );

        let summary = run_queue(Action::Unpack, &[resource.clone()], &options);
        assert_eq!((summary.succeeded, summary.failed), (0, 1));
        assert_eq!(std::fs::read(&preview).unwrap(), b"user file");
        assert!(!dir.join("1.bmp").exists());

        let options = JobOptions {
            overwrite: true,
            ..options
        };
        let summary = run_queue(Action::Unpack, &[resource], &options);
        let replaced = std::fs::read(&preview).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(summary.succeeded, 1);
        assert_ne!(replaced, b"user file");
    }

    #[test]
    fn previews_count_as_destinations() {
        let options = JobOptions {
            output_dir: Some(PathBuf::from("fsunpack_nonexistent_out")),
            preview: true,
            ..Default::default()
        };

        let queue = build_queue(
            Action::Unpack,
            &[PathBuf::from("a/1.bin"), PathBuf::from("b/1.bin")],
            &options,
        );

        assert_eq!(
            queue[1],
            Err(QueueError::DuplicateDestination {
                path: PathBuf::from("fsunpack_nonexistent_out/1.bmp")
            })
        );
        assert_eq!(
            preview_path(Path::new("out/1.bmp")),
            PathBuf::from("out/1.png")
        );
    }

    #[test]
    fn failed_preview_leaves_no_bitmap() {
        let dir = temp_dir("preview_fails");
        let resource = dir.join("3.bin");
        std::fs::write(&resource, tiny_resource(2, 2)).unwrap();
        // a folder where the preview should go
        std::fs::create_dir(dir.join("3.png")).unwrap();

        let options = JobOptions {
            preview: true,
            overwrite: true,
            ..Default::default()
        };

        let summary = run_queue(Action::Unpack, &[resource], &options);
        let bitmap_written = dir.join("3.bmp").exists();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(summary.failed, 1);
        assert!(!bitmap_written);
    }

    #[test]
    fn lenient_reference_packs() {
        let dir = temp_dir("lenient_pack");
        let resource = dir.join("4.bin");
        let mut bytes = tiny_resource(3, 2);
        // reserved byte of the first palette entry
        bytes[0x23] = 0x80;
        std::fs::write(&resource, &bytes).unwrap();

        let lenient = JobOptions {
            overwrite: true,
            ..Default::default()
        };
        let strict = JobOptions {
            strict: true,
            ..lenient.clone()
        };

        assert_eq!(run_queue(Action::Unpack, &[resource.clone()], &strict).failed, 1);
        assert_eq!(run_queue(Action::Unpack, &[resource.clone()], &lenient).succeeded, 1);

        let bitmap = dir.join("4.bmp");
        assert_eq!(run_queue(Action::Pack, &[bitmap.clone()], &strict).failed, 1);
        let summary = run_queue(Action::Pack, &[bitmap], &lenient);
        let packed = std::fs::read(&resource).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(packed, bytes);
    }

    #[test]
    fn pack_defaults_to_reference() {
        let dir = temp_dir("pack_target");
        let bitmap = dir.join("5.bmp");
        std::fs::write(dir.join("5.bin"), tiny_resource(1, 1)).unwrap();

        let queue = build_queue(Action::Pack, &[bitmap.clone()], &JobOptions::default());
        assert_eq!(
            queue[0],
            Err(QueueError::DestinationExists {
                path: dir.join("5.bin")
            })
        );

        let options = JobOptions {
            overwrite: true,
            ..Default::default()
        };
        let queue = build_queue(Action::Pack, &[bitmap], &options);
        let _ = std::fs::remove_dir_all(&dir);

        assert!(matches!(
            &queue[0],
            Ok(Job { task: Task::Pack { reference, output }, .. }) if reference == output
        ));
    }

    #[test]
    fn bad_bitmap_fails_pack() {
        let dir = temp_dir("bad_bitmap");
        let bitmap = dir.join("6.bmp");
        std::fs::write(dir.join("6.bin"), tiny_resource(2, 2)).unwrap();
        std::fs::write(&bitmap, b"\x89PNG\r\n\x1a\n not really a bitmap").unwrap();

        let options = JobOptions {
            overwrite: true,
            ..Default::default()
        };

        let summary = run_queue(Action::Pack, &[bitmap], &options);
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!((summary.succeeded, summary.skipped, summary.failed), (0, 0, 1));
    }

    #[test]
    fn non_sprites_are_skipped() {
        let dir = temp_dir("skip");
        let text = dir.join("readme.bin");
        std::fs::write(&text, "not a sprite ".repeat(200)).unwrap();

        let summary = run_queue(Action::Verify, &[text], &JobOptions::default());
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(summary.skipped, 1);
        assert!(summary.nothing_succeeded());
    }
}
