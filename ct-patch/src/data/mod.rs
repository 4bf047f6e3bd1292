use std::ops::Index;

use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis};

use crate::consts::gray::*;
use crate::error::{PatchError, PatchResult};
use crate::{Idx3d, Predicate};

pub(crate) mod size;

pub use size::{PatchSize, ResolutionLevel, ResolutionPlan};

/// 多通道 3D 体数据, 按 `(H, W, D, C)` 组织, 体素值以 `f32` 保存.
///
/// 采样过程从不修改体数据, 只会读取或复制其中的一部分.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array4<f32>,
}

impl Index<(usize, usize, usize, usize)> for Volume {
    type Output = f32;

    #[inline]
    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self.data[index]
    }
}

impl Volume {
    /// 由 `(H, W, D, C)` 数组直接创建体数据. 通道数为 0 时返回 `Err`.
    pub fn new(data: Array4<f32>) -> PatchResult<Self> {
        if data.len_of(Axis(3)) == 0 {
            return Err(PatchError::EmptyChannels);
        }
        Ok(Self { data })
    }

    /// 由单通道 `(H, W, D)` 数组创建体数据. 该操作不会失败.
    pub fn from_single_channel(data: Array3<f32>) -> Self {
        Self {
            data: data.insert_axis(Axis(3)),
        }
    }

    /// 获取空间形状 `(H, W, D)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let (h, w, d, _) = self.data.dim();
        (h, w, d)
    }

    /// 获取通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_inner(self) -> Array4<f32> {
        self.data
    }
}

/// 3D 分割标签, 按 `(H, W, D)` 组织. `0` 为背景, 任何正值都为前景 (病灶).
#[derive(Debug, Clone)]
pub struct Mask {
    data: Array3<u8>,
}

impl Index<Idx3d> for Mask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<u8>> for Mask {
    #[inline]
    fn from(data: Array3<u8>) -> Self {
        Self::new(data)
    }
}

impl Mask {
    /// 由 `(H, W, D)` 数组直接创建标签.
    #[inline]
    pub fn new(data: Array3<u8>) -> Self {
        Self { data }
    }

    /// 获取形状 `(H, W, D)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_inner(self) -> Array3<u8> {
        self.data
    }

    /// 获取满足谓词 `pred` 的体素个数.
    #[inline]
    pub fn count_by(&self, pred: Predicate) -> usize {
        self.data.iter().filter(|p| pred(**p)).count()
    }

    /// 收集满足谓词 `pred` 的所有体素对应的下标, 结果按行优先存储.
    pub fn filter_pos(&self, pred: Predicate) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, label)| pred(*label).then_some(pos))
            .collect()
    }

    /// 收集所有前景体素 (`label > 0`) 对应的下标. 结果按行优先存储.
    #[inline]
    pub fn foreground_pos(&self) -> Vec<Idx3d> {
        self.filter_pos(is_foreground)
    }

    /// 收集所有背景体素 (`label == 0`) 对应的下标. 结果按行优先存储.
    #[inline]
    pub fn background_pos(&self) -> Vec<Idx3d> {
        self.filter_pos(is_background)
    }
}

/// 成对的体数据与分割标签.
///
/// 构造时保证两者空间形状一致, 之后该结构只读.
#[derive(Debug, Clone)]
pub struct SampleData {
    volume: Volume,
    mask: Mask,
}

impl SampleData {
    /// 组合体数据与标签. 若两者空间形状不一致, 则返回
    /// [`PatchError::DimensionMismatch`].
    pub fn new(volume: Volume, mask: Mask) -> PatchResult<Self> {
        check_pair(&volume, &mask)?;
        Ok(Self { volume, mask })
    }

    /// 体数据.
    #[inline]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// 分割标签.
    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// 空间形状 `(H, W, D)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.mask.shape()
    }

    /// 拆分为 `(体数据, 标签)`.
    #[inline]
    pub fn into_parts(self) -> (Volume, Mask) {
        (self.volume, self.mask)
    }
}

/// 检查体数据与标签的空间形状是否一致.
#[inline]
pub(crate) fn check_pair(volume: &Volume, mask: &Mask) -> PatchResult<()> {
    let (v, m) = (volume.shape(), mask.shape());
    if v == m {
        Ok(())
    } else {
        Err(PatchError::DimensionMismatch { volume: v, mask: m })
    }
}
