//! Motion effect presets and the process-wide effect catalog.
//!
//! An [`Effect`] is resolved once, when a job is built, by looking its
//! name up in [`EffectCatalog`]. Renderers receive the resolved variant
//! (or its [`animation`](Effect::animation) recipe) and never branch on
//! strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::params::{CameraParams, PresetParams};

/// Effects picked when no explicit subset is configured.
pub const DEFAULT_ENABLED_EFFECTS: &[EffectKind] =
    &[EffectKind::Orbital, EffectKind::Zoom, EffectKind::Horizontal];

// ---------------------------------------------------------------------------
// EffectKind
// ---------------------------------------------------------------------------

/// Name-only discriminant of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Orbital,
    Zoom,
    Horizontal,
    Vertical,
    Dolly,
    Circle,
}

impl EffectKind {
    /// Canonical lowercase name, used in output filenames.
    pub fn name(self) -> &'static str {
        match self {
            Self::Orbital => "orbital",
            Self::Zoom => "zoom",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Dolly => "dolly",
            Self::Circle => "circle",
        }
    }

    /// Build the concrete effect through the catalog.
    pub fn with_params(self, params: PresetParams) -> Effect {
        EffectCatalog::constructor(self)(params)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// A motion preset together with its parameter payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Effect {
    Orbital(PresetParams),
    Zoom(PresetParams),
    Horizontal(PresetParams),
    Vertical(PresetParams),
    Dolly(PresetParams),
    Circle(PresetParams),
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Orbital(_) => EffectKind::Orbital,
            Self::Zoom(_) => EffectKind::Zoom,
            Self::Horizontal(_) => EffectKind::Horizontal,
            Self::Vertical(_) => EffectKind::Vertical,
            Self::Dolly(_) => EffectKind::Dolly,
            Self::Circle(_) => EffectKind::Circle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn params(&self) -> &PresetParams {
        match self {
            Self::Orbital(p)
            | Self::Zoom(p)
            | Self::Horizontal(p)
            | Self::Vertical(p)
            | Self::Dolly(p)
            | Self::Circle(p) => p,
        }
    }

    /// The animation recipe for this effect: the base camera settings
    /// followed by the preset itself.
    pub fn animation(&self, camera: &CameraParams) -> Vec<AnimationStep> {
        vec![
            AnimationStep::Set {
                target: AnimationTarget::Isometric,
                value: camera.isometric,
            },
            AnimationStep::Set {
                target: AnimationTarget::Height,
                value: camera.height,
            },
            AnimationStep::Set {
                target: AnimationTarget::Steady,
                value: camera.steady,
            },
            AnimationStep::Preset(*self),
        ]
    }
}

/// Scene property a [`AnimationStep::Set`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationTarget {
    Isometric,
    Height,
    Steady,
}

/// One entry in an effect's animation recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AnimationStep {
    Set { target: AnimationTarget, value: f64 },
    Preset(Effect),
}

// ---------------------------------------------------------------------------
// EffectCatalog
// ---------------------------------------------------------------------------

type Constructor = fn(PresetParams) -> Effect;

/// Lookup table from effect kind to its constructor.
const CATALOG: &[(EffectKind, Constructor)] = &[
    (EffectKind::Orbital, Effect::Orbital),
    (EffectKind::Zoom, Effect::Zoom),
    (EffectKind::Horizontal, Effect::Horizontal),
    (EffectKind::Vertical, Effect::Vertical),
    (EffectKind::Dolly, Effect::Dolly),
    (EffectKind::Circle, Effect::Circle),
];

/// Read-only registry of every supported effect.
pub struct EffectCatalog;

impl EffectCatalog {
    /// All effect kinds, in catalog order.
    pub fn kinds() -> impl Iterator<Item = EffectKind> {
        CATALOG.iter().map(|(kind, _)| *kind)
    }

    /// Resolve an effect name, ignoring ASCII case and surrounding whitespace.
    pub fn lookup(name: &str) -> Result<EffectKind, CoreError> {
        let trimmed = name.trim();
        Self::kinds()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnknownEffect(trimmed.to_string()))
    }

    /// Parse a comma-separated list of effect names.
    ///
    /// Empty entries are skipped; duplicates are kept only once, in first
    /// occurrence order.
    pub fn parse_list(list: &str) -> Result<Vec<EffectKind>, CoreError> {
        let mut kinds = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind = Self::lookup(name)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    // CATALOG is laid out in discriminant order.
    fn constructor(kind: EffectKind) -> Constructor {
        let (entry, ctor) = CATALOG[kind as usize];
        debug_assert_eq!(entry, kind);
        ctor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
