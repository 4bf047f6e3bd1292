use ndarray::{Array2, ArrayView2};

use crate::Idx3d;

/// 有序中心点集合, 以 `(3, N)` 坐标矩阵保存: 每一列是一个 `(h, w, d)` 体素坐标.
///
/// 坐标只在采样它的体数据 (或其对应分辨率层级) 的索引空间内有意义.
/// `N` 可以为 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterPoints {
    data: Array2<usize>,
}

impl Default for CenterPoints {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl CenterPoints {
    /// 空集合.
    #[inline]
    pub fn empty() -> Self {
        Self {
            data: Array2::zeros((3, 0)),
        }
    }

    /// 按顺序由坐标构建集合.
    pub fn from_points<I: IntoIterator<Item = Idx3d>>(points: I) -> Self {
        let points: Vec<Idx3d> = points.into_iter().collect();
        let mut data = Array2::zeros((3, points.len()));
        for (mut col, (h, w, d)) in data.columns_mut().into_iter().zip(points) {
            col[0] = h;
            col[1] = w;
            col[2] = d;
        }
        Self { data }
    }

    /// 由 `(3, N)` 矩阵构建集合. 行数不为 3 时返回 `None`.
    pub fn from_array(data: Array2<usize>) -> Option<Self> {
        (data.nrows() == 3).then_some(Self { data })
    }

    /// 中心点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取第 `index` 个中心点. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Idx3d> {
        (index < self.len()).then(|| {
            (
                self.data[(0, index)],
                self.data[(1, index)],
                self.data[(2, index)],
            )
        })
    }

    /// 按列顺序迭代所有中心点.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Idx3d> + '_ {
        (0..self.len()).map(move |i| {
            (
                self.data[(0, i)],
                self.data[(1, i)],
                self.data[(2, i)],
            )
        })
    }

    /// 获得坐标矩阵的一份不可变 shallow copy.
    #[inline]
    pub fn as_array(&self) -> ArrayView2<'_, usize> {
        self.data.view()
    }

    /// 将每个坐标逐分量映射, 保持顺序.
    pub(crate) fn map_coords<F: Fn(usize) -> usize>(&self, f: F) -> Self {
        Self {
            data: self.data.mapv(f),
        }
    }
}

impl FromIterator<Idx3d> for CenterPoints {
    #[inline]
    fn from_iter<T: IntoIterator<Item = Idx3d>>(iter: T) -> Self {
        Self::from_points(iter)
    }
}
