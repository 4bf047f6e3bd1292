//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::{Mask, PatchSize, ResolutionLevel, ResolutionPlan, SampleData, Volume};

pub use crate::consts::gray::{BACKGROUND, LITS_LIVER, LITS_TUMOR};

pub use crate::error::{PatchError, PatchResult};

pub use crate::sample::{grid, CenterPointSampler, CenterPoints};

pub use crate::extract::{extract, Patch};
pub use crate::mapper::{map_to_resolutions, map_to_scale};
pub use crate::resample::{resample_by_spacing, VolumeResampler, ZoomResampler};

pub use crate::pipeline::{LevelPatches, PatchConfig, PatchPipeline, Patches, SamplingMode};
