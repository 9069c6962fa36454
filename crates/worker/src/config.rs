use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use parallax_core::effect::{EffectCatalog, EffectKind, DEFAULT_ENABLED_EFFECTS};
use parallax_core::error::CoreError;
use parallax_core::naming::DEFAULT_VIDEO_EXT;
use parallax_core::params::{CameraProfile, OutputParams, PresetParams, RenderParameters};
use parallax_core::selection::SelectionPolicy;
use parallax_engine::renderer::{
    ResourceConfig, DEFAULT_ESTIMATOR, DEFAULT_RENDER_COMMAND, DEFAULT_UPSCALER,
};

/// Upper bound on `CONCURRENCY`; each slot is a GPU render.
pub const MAX_CONCURRENCY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub concurrency: NonZeroUsize,
    /// May be empty; the batch then fails with `NoEffectsEnabled`.
    pub enabled_effects: Vec<EffectKind>,
    pub selection: SelectionPolicy,
    pub parameters: RenderParameters,
    pub video_ext: String,
    pub resource: ResourceConfig,
    /// Where to write the JSON batch report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var            | Default                    |
    /// |--------------------|----------------------------|
    /// | `INPUT_DIR`        | required                   |
    /// | `OUTPUT_DIR`       | `{INPUT_DIR}/output`       |
    /// | `CONCURRENCY`      | `1`                        |
    /// | `ENABLED_EFFECTS`  | `orbital,zoom,horizontal`  |
    /// | `EFFECT_SELECTION` | `random`                   |
    /// | `EFFECT_SEED`      | unset                      |
    /// | `CAMERA_PROFILE`   | `balanced`                 |
    /// | `ISOMETRIC`        | from profile               |
    /// | `HEIGHT`           | from profile               |
    /// | `STEADY`           | `0.1`                      |
    /// | `INTENSITY`        | `0.5`                      |
    /// | `REVERSE`          | `false`                    |
    /// | `LOOPS`            | `1`                        |
    /// | `FPS`              | `24`                       |
    /// | `DURATION_SECS`    | `6`                        |
    /// | `RENDER_HEIGHT`    | `1080`                     |
    /// | `SSAA`             | `1`                        |
    /// | `TURBO`            | `true`                     |
    /// | `VIDEO_EXT`        | `mp4`                      |
    /// | `RENDER_COMMAND`   | `depthflow-render`         |
    /// | `RENDER_ARGS`      | empty                      |
    /// | `DEPTH_ESTIMATOR`  | `DepthAnythingV2`          |
    /// | `UPSCALER`         | `NoUpscaler`               |
    /// | `REPORT_PATH`      | unset                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let input_dir = vars
            .get("INPUT_DIR")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("INPUT_DIR"))?;
        let output_dir = vars
            .get("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| input_dir.join("output"));

        let concurrency: usize = vars.parse("CONCURRENCY", 1, "an integer")?;
        let concurrency = NonZeroUsize::new(concurrency)
            .filter(|n| n.get() <= MAX_CONCURRENCY)
            .ok_or_else(|| ConfigError::Invalid {
                var: "CONCURRENCY",
                value: concurrency.to_string(),
                expected: "between 1 and 64",
            })?;

        let enabled_effects = match vars.get("ENABLED_EFFECTS") {
            Some(list) => EffectCatalog::parse_list(&list)?,
            None => DEFAULT_ENABLED_EFFECTS.to_vec(),
        };

        let seed = vars.parse_opt::<u64>("EFFECT_SEED", "an unsigned integer")?;
        let selection = SelectionPolicy::parse(
            &vars.get("EFFECT_SELECTION").unwrap_or_else(|| "random".into()),
            seed,
        )?;

        let profile = CameraProfile::parse(
            &vars.get("CAMERA_PROFILE").unwrap_or_else(|| "balanced".into()),
        )?;
        let mut camera = profile.camera();
        camera.isometric = vars.parse("ISOMETRIC", camera.isometric, "a number")?;
        camera.height = vars.parse("HEIGHT", camera.height, "a number")?;
        camera.steady = vars.parse("STEADY", camera.steady, "a number")?;

        let preset_defaults = PresetParams::default();
        let loops = vars.parse("LOOPS", preset_defaults.loops, "an integer")?;
        let preset = PresetParams {
            intensity: vars.parse("INTENSITY", preset_defaults.intensity, "a number")?,
            reverse: vars.flag("REVERSE", preset_defaults.reverse)?,
            loops,
        };

        let output_defaults = OutputParams::default();
        let output = OutputParams {
            fps: vars.parse("FPS", output_defaults.fps, "an integer")?,
            duration_secs: vars.parse("DURATION_SECS", output_defaults.duration_secs, "a number")?,
            height: vars.parse("RENDER_HEIGHT", output_defaults.height, "an integer")?,
            loops,
            ssaa: vars.parse("SSAA", output_defaults.ssaa, "an integer")?,
            turbo: vars.flag("TURBO", output_defaults.turbo)?,
        };

        let parameters = RenderParameters {
            camera,
            preset,
            output,
        };
        parameters.validate()?;

        let resource = ResourceConfig {
            program: vars
                .get("RENDER_COMMAND")
                .unwrap_or_else(|| DEFAULT_RENDER_COMMAND.into()),
            args: vars
                .get("RENDER_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            estimator: vars
                .get("DEPTH_ESTIMATOR")
                .unwrap_or_else(|| DEFAULT_ESTIMATOR.into()),
            upscaler: vars
                .get("UPSCALER")
                .unwrap_or_else(|| DEFAULT_UPSCALER.into()),
        };

        Ok(Self {
            input_dir,
            output_dir,
            concurrency,
            enabled_effects,
            selection,
            parameters,
            video_ext: vars
                .get("VIDEO_EXT")
                .unwrap_or_else(|| DEFAULT_VIDEO_EXT.into()),
            resource,
            report_path: vars.get("REPORT_PATH").map(PathBuf::from),
        })
    }
}

struct Vars<L>(L);

impl<L> Vars<L>
where
    L: Fn(&str) -> Option<String>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_opt<T: FromStr>(
        &self,
        var: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        self.get(var)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { var, value, expected })
            })
            .transpose()
    }

    fn parse<T: FromStr>(
        &self,
        var: &'static str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        Ok(self.parse_opt(var, expected)?.unwrap_or(default))
    }

    fn flag(&self, var: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.get(var) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                expected: "a boolean",
            }),
        }
    }
}
