#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为 3D 医学影像 (CT 体数据及其肝脏/肿瘤标签) 的分割网络训练与推理生成固定尺寸的 patch.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据布局为 `(H, W, D, C)`, 标签布局为 `(H, W, D)`, 二者空间形状必须一致.
//!    文件读写 (nii 等) 与强度归一化不在本 crate 的范围内, 由调用者完成.
//! 2. 标签遵循 LiTS 约定: `0` 为背景, 非 `0` 为病灶 (`1` 肝脏, `2` 肿瘤).
//! 3. 所有随机性都来自调用者注入的随机源, 固定种子即可复现结果.
//!
//! # 开发计划
//!
//! ### 训练中心点采样 ✅
//!
//! 从病灶体素采样正样本中心, 从背景体素采样负样本中心. 候选不足时返回全部候选.
//!
//! 实现位于 `ct-patch/src/sample`.
//!
//! ### 推理网格中心点 ✅
//!
//! 以给定步长在整个体数据上行优先地生成网格中心.
//!
//! 实现位于 `ct-patch/src/sample/grid.rs`.
//!
//! ### 零填充 patch 裁剪 ✅
//!
//! 以中心点为中心裁剪奇数尺寸的 patch, 越界部分填零, 不会因中心点位置而失败.
//!
//! 实现位于 `ct-patch/src/extract.rs`.
//!
//! ### 体数据重采样 ✅
//!
//! 体数据三线性插值, 标签最近邻插值. 支持按缩放因子或按体素间距重采样.
//!
//! 实现位于 `ct-patch/src/resample.rs`.
//!
//! ### 多分辨率 patch 生成 ✅
//!
//! 中心点在原分辨率上生成一次, 经 `floor(c * scale)` 映射到各层级,
//! 再从各层级重采样后的体数据中裁剪. 启用 `rayon` 时各层级并行处理, 输出顺序不变.
//!
//! 实现位于 `ct-patch/src/mapper.rs` 与 `ct-patch/src/pipeline`.
//!
//! ### 配置 ✅
//!
//! 采样模式与多分辨率方案可由 `serde` 从 JSON 等格式读取.
//!
//! 实现位于 `ct-patch/src/pipeline/config.rs`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 三维索引 `(h, w, d)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 标签值谓词, 用于挑选候选体素.
pub type Predicate = fn(u8) -> bool;

/// 体数据与标签的基础数据结构.
mod data;

pub use data::{Mask, PatchSize, ResolutionLevel, ResolutionPlan, SampleData, Volume};

pub mod consts;
pub mod error;

pub mod sample;

pub use sample::{CenterPointSampler, CenterPoints, GridIter};

pub mod extract;
pub mod mapper;
pub mod resample;

pub mod pipeline;

pub mod prelude;
