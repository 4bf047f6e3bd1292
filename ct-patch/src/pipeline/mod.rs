//! 单分辨率与多分辨率 patch 生成流程.
//!
//! 两个入口都遵循 "生成中心点 -> (重采样 -> 映射中心点) -> 裁剪" 的顺序.
//! 中心点总是在原分辨率上生成, 随机采样只发生在调用者线程中,
//! 因此固定种子的结果与是否启用 `rayon` 无关.

mod config;

use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::PatchResult;
use crate::extract::{extract, Patch};
use crate::mapper::map_to_resolutions;
use crate::resample::{VolumeResampler, ZoomResampler};
use crate::sample::{grid, CenterPointSampler, CenterPoints};
use crate::{PatchSize, ResolutionLevel, ResolutionPlan, SampleData};

pub use config::{PatchConfig, SamplingMode};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 按采样模式区分的输出.
#[derive(Debug, Clone, PartialEq)]
pub enum Patches<T> {
    /// 训练模式: 正样本与负样本分别给出.
    Training {
        /// 以病灶体素为中心的部分.
        positive: T,

        /// 以背景体素为中心的部分.
        negative: T,
    },

    /// 推理模式: 全部网格中心对应的部分.
    Inference(T),
}

impl<T> Patches<T> {
    /// 对每一部分分别实施 `f`.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Patches<U> {
        match self {
            Self::Training { positive, negative } => Patches::Training {
                positive: f(positive),
                negative: f(negative),
            },
            Self::Inference(all) => Patches::Inference(f(all)),
        }
    }

    /// 以引用形式访问每一部分.
    #[inline]
    pub fn as_ref(&self) -> Patches<&T> {
        match self {
            Self::Training { positive, negative } => Patches::Training { positive, negative },
            Self::Inference(all) => Patches::Inference(all),
        }
    }

    /// 对每一部分分别实施可能失败的 `f`.
    fn try_map<U, F: FnMut(T) -> PatchResult<U>>(self, mut f: F) -> PatchResult<Patches<U>> {
        Ok(match self {
            Self::Training { positive, negative } => Patches::Training {
                positive: f(positive)?,
                negative: f(negative)?,
            },
            Self::Inference(all) => Patches::Inference(f(all)?),
        })
    }

    /// 训练模式下的正样本部分.
    #[inline]
    pub fn positive(&self) -> Option<&T> {
        match self {
            Self::Training { positive, .. } => Some(positive),
            Self::Inference(_) => None,
        }
    }

    /// 训练模式下的负样本部分.
    #[inline]
    pub fn negative(&self) -> Option<&T> {
        match self {
            Self::Training { negative, .. } => Some(negative),
            Self::Inference(_) => None,
        }
    }

    /// 推理模式下的全部内容.
    #[inline]
    pub fn inference(&self) -> Option<&T> {
        match self {
            Self::Inference(all) => Some(all),
            Self::Training { .. } => None,
        }
    }
}

/// 某一分辨率层级上裁剪出的全部 patch.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelPatches {
    /// 按中心点顺序排列的 patch. 中心点位于该层级的坐标系.
    pub patches: Vec<Patch>,

    /// 该层级的缩放因子.
    pub scale: f64,
}

/// patch 生成器: 持有中心点采样器和重采样器.
#[derive(Debug, Clone)]
pub struct PatchPipeline<R = ChaCha8Rng, S = ZoomResampler> {
    sampler: CenterPointSampler<R>,
    resampler: S,
}

impl PatchPipeline {
    /// 使用固定种子与默认重采样器.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(CenterPointSampler::from_seed(seed), ZoomResampler)
    }

    /// 使用 `$CT_PATCH_SEED` (若存在) 或系统熵作为随机源, 以及默认重采样器.
    #[inline]
    pub fn from_env_or_entropy() -> Self {
        Self::new(CenterPointSampler::from_env_or_entropy(), ZoomResampler)
    }
}

impl<R: Rng, S: VolumeResampler> PatchPipeline<R, S> {
    /// 由采样器与重采样器构建.
    #[inline]
    pub fn new(sampler: CenterPointSampler<R>, resampler: S) -> Self {
        Self { sampler, resampler }
    }

    /// 获取中心点采样器.
    #[inline]
    pub fn sampler_mut(&mut self) -> &mut CenterPointSampler<R> {
        &mut self.sampler
    }

    /// 获取重采样器.
    #[inline]
    pub fn resampler(&self) -> &S {
        &self.resampler
    }

    /// 在原分辨率上生成中心点.
    pub fn centers(
        &mut self,
        data: &SampleData,
        mode: &SamplingMode,
    ) -> PatchResult<Patches<CenterPoints>> {
        mode.validate()?;
        Ok(match *mode {
            SamplingMode::Training { num_pos, num_neg } => {
                let (positive, negative) = self.sampler.sample(data.mask(), num_pos, num_neg);
                Patches::Training { positive, negative }
            }
            SamplingMode::Inference { spacing } => Patches::Inference(grid(data.shape(), spacing)?),
        })
    }

    /// 单分辨率 patch 生成.
    ///
    /// 训练模式下分别裁剪正样本与负样本 patch; 推理模式下在网格中心上裁剪全部 patch.
    pub fn single_resolution(
        &mut self,
        data: &SampleData,
        patch_size: PatchSize,
        mode: &SamplingMode,
    ) -> PatchResult<Patches<Vec<Patch>>> {
        let centers = self.centers(data, mode)?;
        centers.try_map(|points| extract(data.volume(), data.mask(), &points, patch_size))
    }

    /// 多分辨率 patch 生成.
    ///
    /// 对 `plan` 的每个层级: 将整个体数据与标签重采样到该层级, 把原分辨率中心点映射到该层级的坐标系,
    /// 再以该层级的 patch 尺寸裁剪. 训练模式下正负样本共享同一次重采样.
    /// 每部分的输出与 `plan` 的层级一一对应且同序.
    pub fn multi_resolution(
        &mut self,
        data: &SampleData,
        plan: &ResolutionPlan,
        mode: &SamplingMode,
    ) -> PatchResult<Patches<Vec<LevelPatches>>> {
        let mapped = self
            .centers(data, mode)?
            .map(|points| map_to_resolutions(&points, plan));

        let per_level = self.per_level(data, plan, &mapped)?;

        let mut out = mapped.as_ref().map(|_| Vec::with_capacity(plan.len()));
        for (level, patches) in plan.iter().zip(per_level) {
            match (&mut out, patches) {
                (
                    Patches::Training { positive, negative },
                    Patches::Training {
                        positive: p,
                        negative: n,
                    },
                ) => {
                    positive.push(LevelPatches {
                        patches: p,
                        scale: level.scale(),
                    });
                    negative.push(LevelPatches {
                        patches: n,
                        scale: level.scale(),
                    });
                }
                (Patches::Inference(all), Patches::Inference(p)) => all.push(LevelPatches {
                    patches: p,
                    scale: level.scale(),
                }),
                _ => unreachable!("all levels share one sampling mode"),
            }
        }
        Ok(out)
    }

    /// 按配置运行多分辨率 patch 生成.
    #[inline]
    pub fn run(
        &mut self,
        data: &SampleData,
        config: &PatchConfig,
    ) -> PatchResult<Patches<Vec<LevelPatches>>> {
        self.multi_resolution(data, &config.plan, &config.mode)
    }

    /// 逐层级重采样并裁剪. 返回值与 `plan` 同序.
    fn per_level(
        &self,
        data: &SampleData,
        plan: &ResolutionPlan,
        mapped: &Patches<Vec<CenterPoints>>,
    ) -> PatchResult<Vec<Patches<Vec<Patch>>>> {
        let resampler = &self.resampler;
        let run = |(index, level): (usize, &ResolutionLevel)| {
            level_patches(resampler, data, level, mapped.as_ref().map(|m| &m[index]))
        };

        #[cfg(feature = "rayon")]
        let out: PatchResult<Vec<_>> = plan.levels().into_par_iter().enumerate().map(run).collect();
        #[cfg(not(feature = "rayon"))]
        let out: PatchResult<Vec<_>> = plan.iter().enumerate().map(run).collect();
        out
    }
}

/// 单个层级上的重采样与裁剪.
fn level_patches<S: VolumeResampler>(
    resampler: &S,
    data: &SampleData,
    level: &ResolutionLevel,
    points: Patches<&CenterPoints>,
) -> PatchResult<Patches<Vec<Patch>>> {
    let (volume, mask) = resampler.resize(data.volume(), Some(data.mask()), level.scale())?;
    let Some(mask) = mask else {
        unreachable!("resampler must return a mask when given one");
    };
    debug!(
        "level {}: resampled {:?} -> {:?}, patch size {:?}",
        level.scale(),
        data.shape(),
        volume.shape(),
        level.patch_size().dim()
    );
    points.try_map(|p| extract(&volume, &mask, p, level.patch_size()))
}
