//! 运行时错误.

use crate::Idx3d;
use thiserror::Error;

/// 采样、坐标映射、裁剪和重采样过程中的配置错误.
///
/// 这些错误都不是暂时性的: 调用者应当修正输入参数, 而不是重试.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    /// patch 尺寸存在偶数 (或 0) 分量, 无法确定中心偏移量.
    #[error("patch size must consist of odd positive integers, got {0:?}")]
    InvalidPatchSize(Idx3d),

    /// 体数据与分割标签的空间形状不一致.
    #[error("volume spatial shape {volume:?} does not match mask shape {mask:?}")]
    DimensionMismatch {
        /// 体数据 `(H, W, D)`.
        volume: Idx3d,

        /// 标签 `(H, W, D)`.
        mask: Idx3d,
    },

    /// 缩放因子必须是有限正数.
    #[error("scale factor must be finite and positive, got {0}")]
    InvalidScaleFactor(f64),

    /// 网格步长为 0, 或体素间距不是正数.
    #[error("grid spacing and voxel spacing must be positive")]
    InvalidSpacing,

    /// 多分辨率方案中没有任何层级.
    #[error("resolution plan contains no level")]
    EmptyPlan,

    /// 体数据通道数为 0.
    #[error("volume must have at least one channel")]
    EmptyChannels,
}

/// 采样 / 裁剪运行时结果.
pub type PatchResult<T> = Result<T, PatchError>;
