//! patch 尺寸与多分辨率采样方案.

use crate::consts::DEFAULT_PATCH_EDGE;
use crate::error::{PatchError, PatchResult};
use crate::Idx3d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// patch 的空间尺寸 `(H, W, D)`.
///
/// 三个分量都必须是正奇数, 这样 patch 才有确定的中心: 半径
/// `(size - 1) / 2` 是整数.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "[usize; 3]", into = "[usize; 3]"))]
pub struct PatchSize {
    h: usize,
    w: usize,
    d: usize,
}

impl PatchSize {
    /// 默认 patch 尺寸, 三个方向均为 25.
    pub const DEFAULT: Self = match Self::cube(DEFAULT_PATCH_EDGE) {
        Ok(size) => size,
        Err(_) => panic!("default patch edge must be odd"),
    };

    /// 构建 patch 尺寸. 任一分量为偶数 (包括 0) 时返回
    /// [`PatchError::InvalidPatchSize`].
    pub const fn new((h, w, d): Idx3d) -> PatchResult<Self> {
        if h % 2 == 1 && w % 2 == 1 && d % 2 == 1 {
            Ok(Self { h, w, d })
        } else {
            Err(PatchError::InvalidPatchSize((h, w, d)))
        }
    }

    /// 三个方向边长都为 `edge` 的立方体 patch.
    #[inline]
    pub const fn cube(edge: usize) -> PatchResult<Self> {
        Self::new((edge, edge, edge))
    }

    /// 尺寸 `(H, W, D)`.
    #[inline]
    pub const fn dim(&self) -> Idx3d {
        (self.h, self.w, self.d)
    }

    /// 每个方向上中心到边缘的体素数, 即 `(size - 1) / 2`.
    #[inline]
    pub const fn half(&self) -> Idx3d {
        (self.h / 2, self.w / 2, self.d / 2)
    }

    /// patch 内体素个数.
    #[inline]
    pub const fn size(&self) -> usize {
        self.h * self.w * self.d
    }
}

impl TryFrom<[usize; 3]> for PatchSize {
    type Error = PatchError;

    #[inline]
    fn try_from([h, w, d]: [usize; 3]) -> Result<Self, Self::Error> {
        Self::new((h, w, d))
    }
}

impl From<PatchSize> for [usize; 3] {
    #[inline]
    fn from(value: PatchSize) -> Self {
        [value.h, value.w, value.d]
    }
}

/// 多分辨率方案中的一个层级: 缩放因子与该层级上的 patch 尺寸.
///
/// 缩放因子一般位于 `(0, 1]`, 但任何有限正数都合法.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "(f64, PatchSize)", into = "(f64, PatchSize)")
)]
pub struct ResolutionLevel {
    scale: f64,
    patch_size: PatchSize,
}

impl ResolutionLevel {
    /// 构建层级. `scale` 不是有限正数时返回 [`PatchError::InvalidScaleFactor`].
    pub fn new(scale: f64, patch_size: PatchSize) -> PatchResult<Self> {
        check_scale(scale)?;
        Ok(Self { scale, patch_size })
    }

    /// 缩放因子.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 该层级上的 patch 尺寸.
    #[inline]
    pub fn patch_size(&self) -> PatchSize {
        self.patch_size
    }
}

impl TryFrom<(f64, PatchSize)> for ResolutionLevel {
    type Error = PatchError;

    #[inline]
    fn try_from((scale, patch_size): (f64, PatchSize)) -> Result<Self, Self::Error> {
        Self::new(scale, patch_size)
    }
}

impl From<ResolutionLevel> for (f64, PatchSize) {
    #[inline]
    fn from(value: ResolutionLevel) -> Self {
        (value.scale, value.patch_size)
    }
}

/// 检查缩放因子是否为有限正数.
#[inline]
pub(crate) fn check_scale(scale: f64) -> PatchResult<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(PatchError::InvalidScaleFactor(scale))
    }
}

/// 有序、非空的多分辨率方案.
///
/// 层级顺序只决定输出顺序, 不影响采样语义.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<ResolutionLevel>", into = "Vec<ResolutionLevel>")
)]
pub struct ResolutionPlan {
    levels: Vec<ResolutionLevel>,
}

impl ResolutionPlan {
    /// 由层级列表构建方案. 列表为空时返回 [`PatchError::EmptyPlan`].
    pub fn new<I: IntoIterator<Item = ResolutionLevel>>(levels: I) -> PatchResult<Self> {
        let levels: Vec<_> = levels.into_iter().collect();
        if levels.is_empty() {
            return Err(PatchError::EmptyPlan);
        }
        Ok(Self { levels })
    }

    /// 由 `(缩放因子, patch 尺寸)` 列表构建方案, 例如
    /// `[(1.0, (25, 25, 25)), (0.33, (19, 19, 19))]`.
    pub fn from_pairs<I: IntoIterator<Item = (f64, Idx3d)>>(pairs: I) -> PatchResult<Self> {
        let levels = pairs
            .into_iter()
            .map(|(scale, size)| ResolutionLevel::new(scale, PatchSize::new(size)?))
            .collect::<PatchResult<Vec<_>>>()?;
        Self::new(levels)
    }

    /// 仅包含原分辨率一个层级的方案.
    #[inline]
    pub fn single(patch_size: PatchSize) -> Self {
        Self {
            levels: vec![ResolutionLevel {
                scale: 1.0,
                patch_size,
            }],
        }
    }

    /// 层级个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// 恒为 `false`. 方案至少包含一个层级.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// 所有层级.
    #[inline]
    pub fn levels(&self) -> &[ResolutionLevel] {
        &self.levels
    }

    /// 按顺序迭代所有层级.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ResolutionLevel> {
        self.levels.iter()
    }
}

impl TryFrom<Vec<ResolutionLevel>> for ResolutionPlan {
    type Error = PatchError;

    #[inline]
    fn try_from(value: Vec<ResolutionLevel>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResolutionPlan> for Vec<ResolutionLevel> {
    #[inline]
    fn from(value: ResolutionPlan) -> Self {
        value.levels
    }
}
