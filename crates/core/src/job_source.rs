//! Job enumeration from an input directory.
//!
//! The directory is listed once, filtered to supported image files and
//! sorted by path; jobs are then built lazily, one per file, as the
//! returned [`Jobs`] iterator is advanced.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::EnumerationError;
use crate::job::Job;
use crate::naming;
use crate::params::RenderParameters;
use crate::selection::EffectSelector;
use crate::types::JobIndex;

/// Accepted input extensions, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Produces the batch's jobs from a directory listing.
#[derive(Debug)]
pub struct JobSource {
    output_dir: PathBuf,
    video_ext: String,
    parameters: RenderParameters,
    selector: EffectSelector,
}

impl JobSource {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        video_ext: impl Into<String>,
        parameters: RenderParameters,
        selector: EffectSelector,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            video_ext: video_ext.into(),
            parameters,
            selector,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory (and parents) if it does not exist.
    pub fn prepare_output_dir(&self) -> Result<(), EnumerationError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| {
            EnumerationError::OutputDirUnavailable {
                path: self.output_dir.clone(),
                source,
            }
        })
    }

    /// List `input_dir` and return a lazy sequence of jobs, one per
    /// supported image. Unsupported files and sub-directories are skipped.
    pub fn enumerate(&mut self, input_dir: &Path) -> Result<Jobs<'_>, EnumerationError> {
        let unreadable = |source| EnumerationError::InputDirUnreadable {
            path: input_dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(input_dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::debug!(
            input_dir = %input_dir.display(),
            files = files.len(),
            "Input directory listed",
        );

        Ok(Jobs {
            files: files.into_iter(),
            next_index: 0,
            claimed: HashMap::new(),
            source: self,
        })
    }
}

/// Lazy job sequence returned by [`JobSource::enumerate`].
#[derive(Debug)]
pub struct Jobs<'a> {
    files: std::vec::IntoIter<PathBuf>,
    next_index: JobIndex,
    /// Output path -> first source that mapped to it.
    claimed: HashMap<PathBuf, PathBuf>,
    source: &'a mut JobSource,
}

impl Iterator for Jobs<'_> {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        let source_path = self.files.next()?;
        let source = &mut *self.source;

        let kind = source.selector.next_effect();
        let output_path =
            naming::output_path(&source.output_dir, &source_path, kind, &source.video_ext);

        // Colliding jobs are kept; the last render to finish owns the file.
        if let Some(previous) = self.claimed.get(&output_path) {
            tracing::warn!(
                output = %output_path.display(),
                first = %previous.display(),
                second = %source_path.display(),
                "Output path collision; the later render will overwrite the earlier one",
            );
        } else {
            self.claimed.insert(output_path.clone(), source_path.clone());
        }

        let job = Job {
            index: self.next_index,
            effect: kind.with_params(source.parameters.preset),
            source_path,
            output_path,
            parameters: source.parameters,
        };
        self.next_index += 1;
        Some(job)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

impl ExactSizeIterator for Jobs<'_> {}

impl Jobs<'_> {
    /// Create the output directory once the input listing has succeeded.
    ///
    /// The default output directory lives inside the input directory, so
    /// creating it any earlier would turn a missing input directory into
    /// an empty batch.
    pub fn prepare_output_dir(&self) -> Result<(), EnumerationError> {
        self.source.prepare_output_dir()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::effect::EffectKind;
    use crate::selection::SelectionPolicy;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").expect("write fixture");
    }

    fn source(output_dir: &Path, enabled: Vec<EffectKind>) -> JobSource {
        let selector = EffectSelector::new(SelectionPolicy::RoundRobin, enabled).expect("selector");
        JobSource::new(output_dir, "mp4", RenderParameters::default(), selector)
    }

    #[test]
    fn supported_extensions_case_insensitive() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(is_supported_image(Path::new("a.Png")));
        assert!(is_supported_image(Path::new("a.webp")));
        assert!(!is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("a")));
        assert!(!is_supported_image(Path::new("jpg")));
    }

    #[test]
    fn skips_unsupported_files_and_directories() {
        let input = tempfile::tempdir().expect("tempdir");
        touch(input.path(), "b.png");
        touch(input.path(), "a.JPG");
        touch(input.path(), "notes.txt");
        touch(input.path(), "clip.mp4");
        std::fs::create_dir(input.path().join("nested.jpg")).expect("mkdir");

        let mut src = source(Path::new("/out"), vec![EffectKind::Zoom]);
        let jobs: Vec<Job> = src.enumerate(input.path()).expect("enumerate").collect();

        let names: Vec<_> = jobs.iter().map(Job::display_name).collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
        assert_eq!(jobs[0].index, 0);
        assert_eq!(jobs[1].index, 1);
        assert_eq!(jobs[0].output_path, PathBuf::from("/out/a_zoom.mp4"));
    }

    #[test]
    fn empty_directory_yields_no_jobs() {
        let input = tempfile::tempdir().expect("tempdir");
        let mut src = source(Path::new("/out"), vec![EffectKind::Zoom]);
        assert_eq!(src.enumerate(input.path()).expect("enumerate").count(), 0);
    }

    #[test]
    fn missing_directory_is_enumeration_error() {
        let input = tempfile::tempdir().expect("tempdir");
        let missing = input.path().join("nope");
        let mut src = source(Path::new("/out"), vec![EffectKind::Zoom]);
        assert_matches!(
            src.enumerate(&missing),
            Err(EnumerationError::InputDirUnreadable { path, .. }) if path == missing
        );
    }

    #[test]
    fn effects_follow_selection_policy() {
        let input = tempfile::tempdir().expect("tempdir");
        for name in ["1.jpg", "2.jpg", "3.jpg"] {
            touch(input.path(), name);
        }
        let mut src = source(Path::new("/out"), vec![EffectKind::Orbital, EffectKind::Dolly]);
        let kinds: Vec<_> = src
            .enumerate(input.path())
            .expect("enumerate")
            .map(|job| job.effect.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![EffectKind::Orbital, EffectKind::Dolly, EffectKind::Orbital]
        );
    }

    #[test]
    fn colliding_outputs_are_both_produced() {
        let input = tempfile::tempdir().expect("tempdir");
        touch(input.path(), "photo.jpg");
        touch(input.path(), "photo.png");

        let mut src = source(Path::new("/out"), vec![EffectKind::Zoom]);
        let jobs: Vec<Job> = src.enumerate(input.path()).expect("enumerate").collect();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].output_path, jobs[1].output_path);
        assert_ne!(jobs[0].source_path, jobs[1].source_path);
    }

    #[test]
    fn jobs_carry_parameter_snapshot() {
        let input = tempfile::tempdir().expect("tempdir");
        touch(input.path(), "x.webp");

        let mut params = RenderParameters::default();
        params.preset.intensity = 0.9;
        params.output.fps = 30;
        let selector =
            EffectSelector::new(SelectionPolicy::RoundRobin, vec![EffectKind::Circle]).expect("selector");
        let mut src = JobSource::new("/out", ".webm", params, selector);

        let job = src.enumerate(input.path()).expect("enumerate").next().expect("one job");
        assert_eq!(job.parameters, params);
        assert_eq!(job.effect.params().intensity, 0.9);
        assert_eq!(job.output_path, PathBuf::from("/out/x_circle.webm"));
    }

    #[test]
    fn prepare_output_dir_creates_parents() {
        let root = tempfile::tempdir().expect("tempdir");
        let out = root.path().join("a").join("b");
        let src = source(&out, vec![EffectKind::Zoom]);
        src.prepare_output_dir().expect("create");
        assert!(out.is_dir());
    }

    #[test]
    fn missing_input_dir_is_not_created_for_nested_output() {
        let root = tempfile::tempdir().expect("tempdir");
        let input = root.path().join("typo_photos");
        let mut src = source(&input.join("output"), vec![EffectKind::Zoom]);

        assert_matches!(
            src.enumerate(&input),
            Err(EnumerationError::InputDirUnreadable { .. })
        );
        assert!(!input.exists());
    }

    #[test]
    fn nested_output_dir_is_created_after_listing() {
        let input = tempfile::tempdir().expect("tempdir");
        touch(input.path(), "a.jpg");
        let output = input.path().join("output");
        let mut src = source(&output, vec![EffectKind::Zoom]);

        let jobs = src.enumerate(input.path()).expect("enumerate");
        jobs.prepare_output_dir().expect("create output dir");
        assert!(output.is_dir());
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn prepare_output_dir_fails_over_a_file() {
        let root = tempfile::tempdir().expect("tempdir");
        touch(root.path(), "blocker");
        let src = source(&root.path().join("blocker"), vec![EffectKind::Zoom]);
        assert_matches!(
            src.prepare_output_dir(),
            Err(EnumerationError::OutputDirUnavailable { .. })
        );
    }
}
