//! 通用常量.

/// 单通道标签值.
pub mod gray {
    /// 背景的标签值. 其它任何正值都视为前景 (病灶).
    pub const BACKGROUND: u8 = 0;

    /// LiTS 数据集中, 肝脏的标签值.
    pub const LITS_LIVER: u8 = 1;

    /// LiTS 数据集中, 肿瘤的标签值.
    pub const LITS_TUMOR: u8 = 2;

    /// 标签是否是前景?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != BACKGROUND
    }

    /// 标签是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        p == BACKGROUND
    }

    /// 标签是否是肿瘤?
    #[inline]
    pub const fn is_tumor(p: u8) -> bool {
        matches!(p, LITS_TUMOR)
    }
}

/// 训练模式下默认采样的正样本中心点个数.
pub const DEFAULT_NUM_POS: usize = 10;

/// 训练模式下默认采样的负样本中心点个数.
pub const DEFAULT_NUM_NEG: usize = 10;

/// 默认 patch 边长.
pub const DEFAULT_PATCH_EDGE: usize = 25;

/// 若该环境变量存在且能解析为 `u64`, 则用它作为中心点采样器的随机种子.
pub const SEED_ENV: &str = "CT_PATCH_SEED";
