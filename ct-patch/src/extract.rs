//! 按中心点裁剪固定尺寸 patch.
//!
//! 语义上等价于: 先在三个空间方向上各填充宽度为 `half = (size - 1) / 2`
//! 的零边界 (通道方向不填充), 再在填充后的坐标系中截取 `[c, c + size)`.
//! 由于填充宽度恰为 `half`, 该区间正好以原坐标系中的 `c` 为中心.
//!
//! 实现上不真正分配填充后的体数据, 而是只把 patch 与原体数据的交集复制进一个全零 patch.

use std::ops::Range;

use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4};
use num::Zero;

use crate::data::check_pair;
use crate::error::PatchResult;
use crate::{CenterPoints, Idx3d, Mask, PatchSize, Volume};

/// 一个裁剪结果: 体数据子块、标签子块, 以及它的中心点.
///
/// 子块是独立的拷贝, 不与原体数据共享内存.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    image: Array4<f32>,
    mask: Array3<u8>,
    center: Idx3d,
}

impl Patch {
    /// 体数据子块, 形状为 `(PatchSize, C)`.
    #[inline]
    pub fn image(&self) -> ArrayView4<'_, f32> {
        self.image.view()
    }

    /// 标签子块, 形状为 `PatchSize`.
    #[inline]
    pub fn mask(&self) -> ArrayView3<'_, u8> {
        self.mask.view()
    }

    /// 该 patch 的中心点 (位于裁剪时所用体数据的坐标系).
    #[inline]
    pub fn center(&self) -> Idx3d {
        self.center
    }

    /// 该 patch 中是否包含前景体素?
    #[inline]
    pub fn has_foreground(&self) -> bool {
        self.mask.iter().any(|p| *p != 0)
    }

    /// 拆分为 `(体数据子块, 标签子块, 中心点)`.
    #[inline]
    pub fn into_parts(self) -> (Array4<f32>, Array3<u8>, Idx3d) {
        (self.image, self.mask, self.center)
    }
}

/// 按 `points` 的顺序依次裁剪 patch.
///
/// 每个 patch 的空间形状恰为 `size`, 超出体数据的部分填零. 任何中心点
/// (包括位于体数据外的点) 都不会导致错误. `size` 的奇数性由 [`PatchSize`]
/// 在构造时保证. 体数据与标签空间形状不一致时返回 `Err`.
pub fn extract(
    volume: &Volume,
    mask: &Mask,
    points: &CenterPoints,
    size: PatchSize,
) -> PatchResult<Vec<Patch>> {
    check_pair(volume, mask)?;
    let (image, label) = (volume.data(), mask.data());

    Ok(points
        .iter()
        .map(|center| Patch {
            image: crop4(&image, center, size),
            mask: crop3(&label, center, size),
            center,
        })
        .collect())
}

/// 在填充坐标系中, 单个轴上 patch 与原数据交集所对应的 (源区间, 目标区间).
///
/// 原数据在填充坐标系中占据 `[half, half + len)`, patch 占据 `[c, c + 2 * half + 1)`.
#[inline]
fn overlap(c: usize, half: usize, len: usize) -> Option<(Range<usize>, Range<usize>)> {
    let (lo, hi) = (c, c.saturating_add(2 * half + 1));
    let (src_lo, src_hi) = (lo.max(half), hi.min(half + len));
    (src_lo < src_hi).then(|| (src_lo - half..src_hi - half, src_lo - lo..src_hi - lo))
}

/// 三个空间轴上的交集. 任一轴为空则整个 patch 为零.
#[inline]
fn overlap3(
    (ch, cw, cd): Idx3d,
    size: PatchSize,
    (h, w, d): Idx3d,
) -> Option<[(Range<usize>, Range<usize>); 3]> {
    let (rh, rw, rd) = size.half();
    Some([
        overlap(ch, rh, h)?,
        overlap(cw, rw, w)?,
        overlap(cd, rd, d)?,
    ])
}

fn crop3<T: Clone + Zero>(src: &ArrayView3<'_, T>, center: Idx3d, size: PatchSize) -> Array3<T> {
    let mut out = Array3::zeros(size.dim());
    if let Some([(sh, dh), (sw, dw), (sd, dd)]) = overlap3(center, size, src.dim()) {
        out.slice_mut(s![dh, dw, dd])
            .assign(&src.slice(s![sh, sw, sd]));
    }
    out
}

fn crop4<T: Clone + Zero>(src: &ArrayView4<'_, T>, center: Idx3d, size: PatchSize) -> Array4<T> {
    let (h, w, d, c) = src.dim();
    let (ph, pw, pd) = size.dim();
    let mut out = Array4::zeros((ph, pw, pd, c));
    if let Some([(sh, dh), (sw, dw), (sd, dd)]) = overlap3(center, size, (h, w, d)) {
        out.slice_mut(s![dh, dw, dd, ..])
            .assign(&src.slice(s![sh, sw, sd, ..]));
    }
    out
}

/// 在三个空间方向上各填充宽度为 `half` 的零边界, 返回新的体数据数组.
/// 通道方向不填充.
pub fn pad_volume(volume: &Volume, (rh, rw, rd): Idx3d) -> Array4<f32> {
    let src = volume.data();
    let (h, w, d, c) = src.dim();
    let mut out = Array4::zeros((h + 2 * rh, w + 2 * rw, d + 2 * rd, c));
    out.slice_mut(s![rh..rh + h, rw..rw + w, rd..rd + d, ..])
        .assign(&src);
    out
}

/// 在三个方向上各填充宽度为 `half` 的背景边界, 返回新的标签数组.
pub fn pad_mask(mask: &Mask, (rh, rw, rd): Idx3d) -> Array3<u8> {
    let src = mask.data();
    let (h, w, d) = src.dim();
    let mut out = Array3::zeros((h + 2 * rh, w + 2 * rw, d + 2 * rd));
    out.slice_mut(s![rh..rh + h, rw..rw + w, rd..rd + d])
        .assign(&src);
    out
}

#[cfg(test)]
mod tests {
    use super::{extract, pad_mask, pad_volume};
    use crate::error::PatchError;
    use crate::{CenterPoints, GridIter, Mask, PatchSize, Volume};
    use ndarray::{s, Array, Array3, Array4};

    fn sevens() -> (Volume, Mask) {
        let v = Volume::new(Array4::from_elem((4, 4, 4, 1), 7.0)).unwrap();
        let m = Mask::new(Array3::from_elem((4, 4, 4), 1));
        (v, m)
    }

    /// 体数据值编码了自身坐标, 便于检查裁剪位置.
    fn coded(shape: (usize, usize, usize), c: usize) -> (Volume, Mask) {
        let (h, w, d) = shape;
        let v = Array::from_shape_fn((h, w, d, c), |(i, j, k, l)| {
            (1 + i * 1000 + j * 100 + k * 10 + l) as f32
        });
        let m = Array::from_shape_fn(shape, |(i, j, k)| ((i + j + k) % 3) as u8);
        (Volume::new(v).unwrap(), Mask::new(m))
    }

    #[test]
    fn test_corner_octant() {
        let (v, m) = sevens();
        let size = PatchSize::cube(3).unwrap();
        let points = CenterPoints::from_points([(0, 0, 0)]);
        let patches = extract(&v, &m, &points, size).unwrap();

        assert_eq!(patches.len(), 1);
        let p = &patches[0];
        assert_eq!(p.image().dim(), (3, 3, 3, 1));
        assert_eq!(p.mask().dim(), (3, 3, 3));
        assert_eq!(p.center(), (0, 0, 0));

        for ((i, j, k, _), val) in p.image().indexed_iter() {
            if i >= 1 && j >= 1 && k >= 1 {
                assert_eq!(*val, 7.0);
            } else {
                assert_eq!(*val, 0.0);
            }
        }
        assert_eq!(p.mask().iter().filter(|x| **x == 1).count(), 8);
    }

    #[test]
    fn test_shape_everywhere() {
        let (v, m) = coded((5, 4, 3), 2);
        for dim in [(1, 1, 1), (3, 5, 7), (9, 1, 3)] {
            let size = PatchSize::new(dim).unwrap();
            // 包括体数据外部的中心点.
            let points: CenterPoints = GridIter::new((12, 12, 12), (1, 1, 1)).collect();
            let patches = extract(&v, &m, &points, size).unwrap();
            assert_eq!(patches.len(), points.len());
            for (p, c) in patches.iter().zip(points.iter()) {
                assert_eq!(p.center(), c);
                assert_eq!(p.image().dim(), (dim.0, dim.1, dim.2, 2));
                assert_eq!(p.mask().dim(), dim);
            }
        }
    }

    #[test]
    fn test_far_outside_is_zero() {
        let (v, m) = coded((4, 4, 4), 1);
        let size = PatchSize::cube(3).unwrap();
        let points = CenterPoints::from_points([(10, 0, 0), (4, 4, 4)]);
        let patches = extract(&v, &m, &points, size).unwrap();
        assert!(patches[0].image().iter().all(|x| *x == 0.0));
        assert!(!patches[0].has_foreground());
        // (4, 4, 4) 紧贴体数据外侧, 只有一个角落体素在内部.
        assert_eq!(patches[1].image().iter().filter(|x| **x != 0.0).count(), 1);
        assert_eq!(patches[1].image()[(0, 0, 0, 0)], v[(3, 3, 3, 0)]);
    }

    #[test]
    fn test_full_volume_round_trip() {
        let (v, m) = coded((5, 7, 3), 2);
        let size = PatchSize::new((5, 7, 3)).unwrap();
        let points = CenterPoints::from_points([(2, 3, 1)]);
        let p = extract(&v, &m, &points, size).unwrap().remove(0);
        assert_eq!(p.image(), v.data());
        assert_eq!(p.mask(), m.data());
    }

    #[test]
    fn test_matches_pad_then_crop() {
        let (v, m) = coded((6, 5, 4), 3);
        let size = PatchSize::new((3, 5, 1)).unwrap();
        let (rh, rw, rd) = size.half();
        let (ph, pw, pd) = size.dim();
        let padded_v = pad_volume(&v, size.half());
        let padded_m = pad_mask(&m, size.half());
        assert_eq!(padded_v.dim(), (6 + 2 * rh, 5 + 2 * rw, 4 + 2 * rd, 3));

        let points: CenterPoints = GridIter::new((6, 5, 4), (1, 1, 1)).collect();
        for p in extract(&v, &m, &points, size).unwrap() {
            let (h, w, d) = p.center();
            assert_eq!(
                p.image(),
                padded_v.slice(s![h..h + ph, w..w + pw, d..d + pd, ..])
            );
            assert_eq!(p.mask(), padded_m.slice(s![h..h + ph, w..w + pw, d..d + pd]));
        }
    }

    #[test]
    fn test_no_aliasing_and_empty_points() {
        let (v, m) = sevens();
        let size = PatchSize::cube(3).unwrap();
        let patches = extract(&v, &m, &CenterPoints::empty(), size).unwrap();
        assert!(patches.is_empty());

        let mut p = extract(&v, &m, &CenterPoints::from_points([(1, 1, 1)]), size)
            .unwrap()
            .remove(0)
            .into_parts();
        p.0.fill(0.0);
        assert_eq!(v[(1, 1, 1, 0)], 7.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let v = Volume::new(Array4::zeros((4, 4, 4, 1))).unwrap();
        let m = Mask::new(Array3::zeros((4, 3, 4)));
        let err = extract(&v, &m, &CenterPoints::empty(), PatchSize::cube(1).unwrap());
        assert!(matches!(err, Err(PatchError::DimensionMismatch { .. })));
    }
}
