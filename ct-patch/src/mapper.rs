//! 中心点的多分辨率坐标映射.
//!
//! 中心点总是在原分辨率坐标系下采样的. 在从重采样后的体数据中裁剪之前,
//! 需要将其投影到对应层级的坐标系: 每个分量 `floor(c * scale)`.
//! 这里不做越界截断, 越界部分由裁剪时的零填充处理.

use crate::data::size::check_scale;
use crate::error::PatchResult;
use crate::{CenterPoints, ResolutionPlan};

/// 将原分辨率中心点映射到单个缩放因子 `scale` 的坐标系.
///
/// `scale` 不是有限正数时返回 `Err`.
pub fn map_to_scale(points: &CenterPoints, scale: f64) -> PatchResult<CenterPoints> {
    check_scale(scale)?;
    Ok(rescale(points, scale))
}

/// 将原分辨率中心点映射到 `plan` 的每个层级. 输出与 `plan` 一一对应且同序.
pub fn map_to_resolutions(points: &CenterPoints, plan: &ResolutionPlan) -> Vec<CenterPoints> {
    plan.iter()
        .map(|level| rescale(points, level.scale()))
        .collect()
}

#[inline]
fn rescale(points: &CenterPoints, scale: f64) -> CenterPoints {
    if scale == 1.0 {
        return points.clone();
    }
    points.map_coords(|c| (c as f64 * scale).floor() as usize)
}
