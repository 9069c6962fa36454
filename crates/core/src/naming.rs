//! Output naming convention for rendered clips.
//!
//! Convention: `{output_dir}/{input_stem}_{effect_name}.{video_ext}`.
//! Two inputs sharing a stem and an effect map to the same path; the
//! render that finishes last wins.

use std::path::{Path, PathBuf};

use crate::effect::EffectKind;

/// Default container extension for rendered clips.
pub const DEFAULT_VIDEO_EXT: &str = "mp4";

/// Generate the clip filename for an input stem and effect.
///
/// A leading `.` on `video_ext` is ignored.
///
/// # Examples
///
/// ```
/// use parallax_core::effect::EffectKind;
/// use parallax_core::naming::output_filename;
///
/// assert_eq!(output_filename("photo", EffectKind::Zoom, "mp4"), "photo_zoom.mp4");
/// assert_eq!(output_filename("photo", EffectKind::Dolly, ".webm"), "photo_dolly.webm");
/// ```
pub fn output_filename(stem: &str, effect: EffectKind, video_ext: &str) -> String {
    let ext = video_ext.trim_start_matches('.');
    format!("{stem}_{}.{ext}", effect.name())
}

/// Derive the output path for `source` rendered with `effect`.
pub fn output_path(output_dir: &Path, source: &Path, effect: EffectKind, video_ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(output_filename(&stem, effect, video_ext))
}
