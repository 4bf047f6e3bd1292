//! patch 中心点采样.
//!
//! 训练阶段从病灶体素中随机采样正样本中心, 从背景体素中随机采样负样本中心;
//! 推理阶段则在规则网格上穷尽地生成中心点.

mod grid;
mod points;

use std::env;

use itertools::Itertools;
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::consts::{gray::*, SEED_ENV};
use crate::error::{PatchError, PatchResult};
use crate::{Idx3d, Mask, Predicate};

pub use grid::GridIter;
pub use points::CenterPoints;

/// 中心点随机采样器. 随机源由调用者注入, 采样器自身不依赖任何全局随机状态.
#[derive(Debug, Clone)]
pub struct CenterPointSampler<R = ChaCha8Rng> {
    rng: R,
}

impl CenterPointSampler<ChaCha8Rng> {
    /// 以固定种子构建采样器. 相同种子、相同输入的采样结果完全一致.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// 以系统熵构建采样器.
    #[inline]
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    /// 若环境变量 `$CT_PATCH_SEED` 能解析为 `u64`, 则以其为种子构建采样器;
    /// 否则以系统熵构建.
    pub fn from_env_or_entropy() -> Self {
        match env::var(SEED_ENV).ok().and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(seed) => {
                debug!("seeding center point sampler from ${SEED_ENV}={seed}");
                Self::from_seed(seed)
            }
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> CenterPointSampler<R> {
    /// 以给定随机源构建采样器.
    #[inline]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 获取底层随机源.
    #[inline]
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// 采样训练用的 `(正样本中心, 负样本中心)`.
    ///
    /// 正样本候选为所有 `label > 0` 的体素, 负样本候选为所有 `label == 0` 的体素.
    /// 若候选个数少于请求个数, 则返回全部候选 (按行优先顺序); 否则无放回地均匀抽取
    /// 恰好请求个数的候选 (按抽取顺序). 候选不足不是错误.
    #[inline]
    pub fn sample(
        &mut self,
        mask: &Mask,
        num_pos: usize,
        num_neg: usize,
    ) -> (CenterPoints, CenterPoints) {
        self.sample_by(mask, is_foreground, num_pos, num_neg)
    }

    /// 与 [`Self::sample`] 相同, 但正样本候选由谓词 `positive` 决定
    /// (如仅肿瘤 [`is_tumor`]). 负样本候选仍然是背景体素.
    pub fn sample_by(
        &mut self,
        mask: &Mask,
        positive: Predicate,
        num_pos: usize,
        num_neg: usize,
    ) -> (CenterPoints, CenterPoints) {
        let pos = self.choose(mask, positive, num_pos);
        if pos.is_empty() && num_pos > 0 {
            warn!("mask has no positive voxel, positive center set is empty");
        }
        let neg = self.choose(mask, is_background, num_neg);
        debug!(
            "sampled {} positive / {} negative centers (requested {num_pos} / {num_neg})",
            pos.len(),
            neg.len()
        );
        (pos, neg)
    }

    /// 从满足 `pred` 的体素中无放回地抽取 `amount` 个.
    ///
    /// 只保存被抽中的坐标, 不会把全部候选 (通常是数百万背景体素) 收集到内存中.
    fn choose(&mut self, mask: &Mask, pred: Predicate, amount: usize) -> CenterPoints {
        let total = mask.count_by(pred);
        if total < amount {
            debug!("only {total} candidates for {amount} requested centers, taking all");
            return mask.filter_pos(pred).into_iter().collect();
        }

        // (候选序号, 输出位置), 按候选序号升序.
        let mut targets = rand::seq::index::sample(&mut self.rng, total, amount)
            .into_iter()
            .enumerate()
            .map(|(slot, rank)| (rank, slot))
            .sorted_unstable()
            .peekable();

        let mut picked: Vec<Idx3d> = vec![(0, 0, 0); amount];
        let view = mask.data();
        let candidates = view
            .indexed_iter()
            .filter_map(|(pos, label)| pred(*label).then_some(pos));
        for (rank, pos) in candidates.enumerate() {
            let Some(&(want, slot)) = targets.peek() else {
                break;
            };
            if rank == want {
                picked[slot] = pos;
                targets.next();
            }
        }
        debug_assert!(targets.peek().is_none());
        CenterPoints::from_points(picked)
    }
}

/// 在 `shape` 范围内以 `spacing` 为步长生成规则网格中心点, 行优先
/// (`H` 最慢, `D` 最快). 纯函数, 相同输入总是得到相同输出.
///
/// `spacing` 任一分量为 0 时返回 [`PatchError::InvalidSpacing`].
pub fn grid(shape: Idx3d, spacing: Idx3d) -> PatchResult<CenterPoints> {
    if spacing.0 == 0 || spacing.1 == 0 || spacing.2 == 0 {
        return Err(PatchError::InvalidSpacing);
    }
    let points = CenterPoints::from_points(GridIter::new(shape, spacing));
    debug!(
        "generated {} grid centers over {shape:?} with spacing {spacing:?}",
        points.len()
    );
    Ok(points)
}
