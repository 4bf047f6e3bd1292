use crate::Idx3d;

/// 按固定步长、行优先遍历三维网格的索引迭代器.
///
/// 最外层为 `H` 方向, 最内层为 `D` 方向. 与如下写法结果相同:
///
/// ```
/// type Idx3d = (usize, usize, usize);
///
/// fn grid_auto((h, w, d): Idx3d, (sh, sw, sd): Idx3d) -> impl Iterator<Item = Idx3d> {
///     (0..h).step_by(sh).flat_map(move |i| {
///         (0..w)
///             .step_by(sw)
///             .flat_map(move |j| (0..d).step_by(sd).map(move |k| (i, j, k)))
///     })
/// }
/// ```
///
/// 但手写的版本可以精确给出剩余长度, 便于预分配坐标矩阵.
#[derive(Debug, Clone)]
pub struct GridIter {
    cur: Idx3d,
    shape: Idx3d,
    step: Idx3d,
    remaining: usize,
}

impl GridIter {
    /// 在 `shape` 范围内以 `step` 为步长构建迭代器. `step` 各分量必须非 0.
    #[inline]
    pub fn new(shape: Idx3d, step: Idx3d) -> Self {
        debug_assert!(step.0 != 0 && step.1 != 0 && step.2 != 0);
        let (h, w, d) = shape;
        let (sh, sw, sd) = step;
        Self {
            cur: (0, 0, 0),
            shape,
            step,
            remaining: h.div_ceil(sh) * w.div_ceil(sw) * d.div_ceil(sd),
        }
    }
}

impl Iterator for GridIter {
    type Item = Idx3d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let ret_pos = self.cur;
        let (h, w, d) = &mut self.cur;
        *d += self.step.2;
        if *d >= self.shape.2 {
            *d = 0;
            *w += self.step.1;
            if *w >= self.shape.1 {
                *w = 0;
                *h += self.step.0;
            }
        }
        Some(ret_pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridIter {}
