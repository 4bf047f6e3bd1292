//! 采样配置.

use crate::consts::{DEFAULT_NUM_NEG, DEFAULT_NUM_POS};
use crate::error::{PatchError, PatchResult};
use crate::{Idx3d, PatchSize, ResolutionPlan};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 中心点的生成方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SamplingMode {
    /// 训练: 随机采样 `num_pos` 个病灶中心和 `num_neg` 个背景中心.
    Training {
        /// 正样本 (病灶) 中心个数上限.
        num_pos: usize,

        /// 负样本 (背景) 中心个数上限.
        num_neg: usize,
    },

    /// 推理: 以 `spacing` 为步长在整个体数据上生成网格中心.
    Inference {
        /// 三个方向上的网格步长, 各分量必须非 0.
        spacing: Idx3d,
    },
}

impl Default for SamplingMode {
    #[inline]
    fn default() -> Self {
        Self::Training {
            num_pos: DEFAULT_NUM_POS,
            num_neg: DEFAULT_NUM_NEG,
        }
    }
}

impl SamplingMode {
    /// 步长为 1 的稠密推理网格.
    #[inline]
    pub const fn dense_inference() -> Self {
        Self::Inference { spacing: (1, 1, 1) }
    }

    /// 是否为训练模式?
    #[inline]
    pub fn is_training(&self) -> bool {
        matches!(self, Self::Training { .. })
    }

    /// 检查参数. 网格步长存在 0 分量时返回 [`PatchError::InvalidSpacing`].
    pub fn validate(&self) -> PatchResult<()> {
        match *self {
            Self::Inference { spacing: (h, w, d) } if h == 0 || w == 0 || d == 0 => {
                Err(PatchError::InvalidSpacing)
            }
            _ => Ok(()),
        }
    }
}

/// 一次完整采样所需的全部参数: 中心点生成方式与多分辨率方案.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatchConfig {
    /// 中心点生成方式.
    pub mode: SamplingMode,

    /// 多分辨率方案. 单分辨率即只含 `scale == 1.0` 一个层级.
    pub plan: ResolutionPlan,
}

impl Default for PatchConfig {
    /// 训练模式, 10 个正样本与 10 个负样本, 原分辨率上 25^3 的 patch.
    fn default() -> Self {
        Self {
            mode: SamplingMode::default(),
            plan: ResolutionPlan::single(PatchSize::DEFAULT),
        }
    }
}

impl PatchConfig {
    /// 构建配置并检查参数.
    pub fn new(mode: SamplingMode, plan: ResolutionPlan) -> PatchResult<Self> {
        let config = Self { mode, plan };
        config.validate()?;
        Ok(config)
    }

    /// 检查参数. `plan` 的合法性已由其类型保证.
    #[inline]
    pub fn validate(&self) -> PatchResult<()> {
        self.mode.validate()
    }
}
