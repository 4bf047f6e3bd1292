//! 体数据重采样.
//!
//! 采样流程只依赖 [`VolumeResampler`] 这一能力: 按缩放因子调整体数据与标签的空间尺寸.
//! 体数据使用线性插值, 标签使用最近邻插值以保证标签值不被插值成无意义的中间值.
//!
//! [`ZoomResampler`] 是 crate 自带的默认实现.

use log::debug;
use ndarray::{Array3, Array4};

use crate::data::{check_pair, size::check_scale};
use crate::error::{PatchError, PatchResult};
use crate::{Mask, Volume};

/// 默认的目标体素间距 (单位: 毫米), 即 1mm 各向同性.
pub const ISOTROPIC_1MM: [f64; 3] = [1.0; 3];

/// 按缩放因子调整体数据 (及可选的标签) 的空间尺寸.
///
/// 实现必须对体数据使用适用于连续强度值的插值 (如线性插值),
/// 对标签使用保持标签值的插值 (最近邻). 通道方向从不缩放.
pub trait VolumeResampler: Sync {
    /// 在 `(H, W, D)` 三个方向上分别按 `factors` 缩放.
    ///
    /// 若给出 `mask`, 其形状必须与 `volume` 一致, 返回值中的标签与体数据形状一致.
    fn zoom(
        &self,
        volume: &Volume,
        mask: Option<&Mask>,
        factors: [f64; 3],
    ) -> PatchResult<(Volume, Option<Mask>)>;

    /// 三个空间方向使用同一个缩放因子 `scale`.
    #[inline]
    fn resize(
        &self,
        volume: &Volume,
        mask: Option<&Mask>,
        scale: f64,
    ) -> PatchResult<(Volume, Option<Mask>)> {
        self.zoom(volume, mask, [scale; 3])
    }
}

/// 经典的数组缩放.
///
/// 长度为 `n` 的轴缩放后长度为 `round(n * f)` (`n > 0` 时至少为 1),
/// 输出索引 `i` 对应输入坐标 `i * (n - 1) / (m - 1)` (`m == 1` 时为 0),
/// 即两端体素中心对齐. 缩放因子恰为 1 时直接复制.
#[derive(Copy, Clone, Debug, Default)]
pub struct ZoomResampler;

/// 单个轴上, 每个输出索引对应的 (下侧输入索引, 上侧输入索引, 上侧权重).
#[derive(Debug)]
struct AxisMap {
    taps: Vec<(usize, usize, f32)>,
}

impl AxisMap {
    fn new(n: usize, factor: f64) -> Self {
        let m = zoomed_len(n, factor);
        let step = if m > 1 {
            (n - 1) as f64 / (m - 1) as f64
        } else {
            0.0
        };
        let taps = (0..m)
            .map(|i| {
                let x = i as f64 * step;
                let lo = (x.floor() as usize).min(n - 1);
                let hi = (lo + 1).min(n - 1);
                (lo, hi, (x - lo as f64) as f32)
            })
            .collect();
        Self { taps }
    }

    #[inline]
    fn len(&self) -> usize {
        self.taps.len()
    }

    /// 最近邻输入索引.
    #[inline]
    fn nearest(&self, i: usize) -> usize {
        let (lo, hi, t) = self.taps[i];
        if t >= 0.5 {
            hi
        } else {
            lo
        }
    }
}

/// 缩放后的轴长.
#[inline]
fn zoomed_len(n: usize, factor: f64) -> usize {
    if n == 0 {
        0
    } else {
        ((n as f64 * factor).round() as usize).max(1)
    }
}

impl ZoomResampler {
    fn linear(volume: &Volume, [mh, mw, md]: &[AxisMap; 3]) -> Array4<f32> {
        let src = volume.data();
        let c = volume.channels();
        Array4::from_shape_fn((mh.len(), mw.len(), md.len(), c), |(i, j, k, l)| {
            let (h0, h1, th) = mh.taps[i];
            let (w0, w1, tw) = mw.taps[j];
            let (d0, d1, td) = md.taps[k];
            let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
            let plane = |h: usize| {
                lerp(
                    lerp(src[(h, w0, d0, l)], src[(h, w0, d1, l)], td),
                    lerp(src[(h, w1, d0, l)], src[(h, w1, d1, l)], td),
                    tw,
                )
            };
            lerp(plane(h0), plane(h1), th)
        })
    }

    fn nearest(mask: &Mask, [mh, mw, md]: &[AxisMap; 3]) -> Array3<u8> {
        let src = mask.data();
        Array3::from_shape_fn((mh.len(), mw.len(), md.len()), |(i, j, k)| {
            src[(mh.nearest(i), mw.nearest(j), md.nearest(k))]
        })
    }
}

impl VolumeResampler for ZoomResampler {
    fn zoom(
        &self,
        volume: &Volume,
        mask: Option<&Mask>,
        factors: [f64; 3],
    ) -> PatchResult<(Volume, Option<Mask>)> {
        for f in factors {
            check_scale(f)?;
        }
        if let Some(m) = mask {
            check_pair(volume, m)?;
        }
        if factors == [1.0; 3] {
            return Ok((volume.clone(), mask.cloned()));
        }

        let (h, w, d) = volume.shape();
        let maps = [
            AxisMap::new(h, factors[0]),
            AxisMap::new(w, factors[1]),
            AxisMap::new(d, factors[2]),
        ];
        let resized = Volume::new(Self::linear(volume, &maps))?;
        let resized_mask = mask.map(|m| Mask::new(Self::nearest(m, &maps)));
        debug!(
            "zoomed volume {:?} by {factors:?} -> {:?}",
            volume.shape(),
            resized.shape()
        );
        Ok((resized, resized_mask))
    }
}

/// 将体素间距为 `spacing` 的数据重采样到体素间距 `new_spacing` (单位: 毫米).
///
/// 各方向缩放因子为 `spacing / new_spacing`. 任一间距不是有限正数时返回
/// [`PatchError::InvalidSpacing`].
pub fn resample_by_spacing<R: VolumeResampler + ?Sized>(
    resampler: &R,
    volume: &Volume,
    mask: Option<&Mask>,
    spacing: [f64; 3],
    new_spacing: [f64; 3],
) -> PatchResult<(Volume, Option<Mask>)> {
    let valid = |s: &f64| s.is_finite() && *s > 0.0;
    if !spacing.iter().chain(new_spacing.iter()).all(valid) {
        return Err(PatchError::InvalidSpacing);
    }
    let factors = [0, 1, 2].map(|i| spacing[i] / new_spacing[i]);
    resampler.zoom(volume, mask, factors)
}
