use serde::{Deserialize, Serialize};

/// A costing function over the ExMem sizes of a builtin's arguments.
///
/// Arguments are named `x`, `y`, `z` by position. Results saturate at the
/// bounds of `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "arguments", rename_all = "snake_case")]
pub enum CostingFun {
    ConstantCost(i64),
    LinearInX(Linear),
    LinearInY(Linear),
    LinearInZ(Linear),
    /// Linear in the sum of all argument sizes.
    AddedSizes(Linear),
    SubtractedSizes(Subtracted),
    MultipliedSizes(Linear),
    MinSize(Linear),
    MaxSize(Linear),
    /// `intercept + slope * x` when `x == y`, `constant` otherwise.
    LinearOnDiagonal(OnDiagonal),
    /// `constant` when `x < y`, `model` otherwise.
    ConstAboveDiagonal(OffDiagonal),
    /// `constant` when `x > y`, `model` otherwise.
    ConstBelowDiagonal(OffDiagonal),
    QuadraticInX(Quadratic),
    QuadraticInY(Quadratic),
    QuadraticInZ(Quadratic),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Linear {
    pub intercept: i64,
    pub slope: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtracted {
    pub intercept: i64,
    pub slope: i64,
    pub minimum: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDiagonal {
    pub constant: i64,
    pub intercept: i64,
    pub slope: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffDiagonal {
    pub constant: i64,
    pub model: Box<CostingFun>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadratic {
    pub c0: i64,
    pub c1: i64,
    pub c2: i64,
}

impl Linear {
    fn at(&self, size: i64) -> i64 {
        self.intercept.saturating_add(self.slope.saturating_mul(size))
    }
}

impl Quadratic {
    fn at(&self, size: i64) -> i64 {
        self.c0
            .saturating_add(self.c1.saturating_mul(size))
            .saturating_add(self.c2.saturating_mul(size.saturating_mul(size)))
    }
}

impl CostingFun {
    /// Evaluates the function at the given argument sizes. Missing
    /// positions count as size zero.
    pub fn cost(&self, sizes: &[i64]) -> i64 {
        let arg = |i: usize| sizes.get(i).copied().unwrap_or(0);
        let (x, y, z) = (arg(0), arg(1), arg(2));
        match self {
            CostingFun::ConstantCost(c) => *c,
            CostingFun::LinearInX(line) => line.at(x),
            CostingFun::LinearInY(line) => line.at(y),
            CostingFun::LinearInZ(line) => line.at(z),
            CostingFun::AddedSizes(line) => {
                line.at(sizes.iter().fold(0i64, |acc, s| acc.saturating_add(*s)))
            }
            CostingFun::SubtractedSizes(sub) => sub
                .intercept
                .saturating_add(sub.slope.saturating_mul(x.saturating_sub(y).max(sub.minimum))),
            CostingFun::MultipliedSizes(line) => line.at(x.saturating_mul(y)),
            CostingFun::MinSize(line) => line.at(x.min(y)),
            CostingFun::MaxSize(line) => line.at(x.max(y)),
            CostingFun::LinearOnDiagonal(diag) => {
                if x == y {
                    diag.intercept.saturating_add(diag.slope.saturating_mul(x))
                } else {
                    diag.constant
                }
            }
            CostingFun::ConstAboveDiagonal(off) => {
                if x < y {
                    off.constant
                } else {
                    off.model.cost(sizes)
                }
            }
            CostingFun::ConstBelowDiagonal(off) => {
                if x > y {
                    off.constant
                } else {
                    off.model.cost(sizes)
                }
            }
            CostingFun::QuadraticInX(quad) => quad.at(x),
            CostingFun::QuadraticInY(quad) => quad.at(y),
            CostingFun::QuadraticInZ(quad) => quad.at(z),
        }
    }

    /// Smallest coefficient anywhere in the function, including the model
    /// under an off-diagonal constant.
    pub fn min_coefficient(&self) -> i64 {
        match self {
            CostingFun::ConstantCost(c) => *c,
            CostingFun::LinearInX(line)
            | CostingFun::LinearInY(line)
            | CostingFun::LinearInZ(line)
            | CostingFun::AddedSizes(line)
            | CostingFun::MultipliedSizes(line)
            | CostingFun::MinSize(line)
            | CostingFun::MaxSize(line) => line.intercept.min(line.slope),
            CostingFun::SubtractedSizes(sub) => sub.intercept.min(sub.slope).min(sub.minimum),
            CostingFun::LinearOnDiagonal(diag) => {
                diag.constant.min(diag.intercept).min(diag.slope)
            }
            CostingFun::ConstAboveDiagonal(off) | CostingFun::ConstBelowDiagonal(off) => {
                off.constant.min(off.model.min_coefficient())
            }
            CostingFun::QuadraticInX(quad)
            | CostingFun::QuadraticInY(quad)
            | CostingFun::QuadraticInZ(quad) => quad.c0.min(quad.c1).min(quad.c2),
        }
    }

    /// Highest argument position the function reads, if any.
    pub fn max_argument(&self) -> Option<usize> {
        match self {
            CostingFun::ConstantCost(_) => None,
            CostingFun::LinearInX(_) | CostingFun::QuadraticInX(_) => Some(0),
            CostingFun::LinearInY(_) | CostingFun::QuadraticInY(_) => Some(1),
            CostingFun::LinearInZ(_) | CostingFun::QuadraticInZ(_) => Some(2),
            CostingFun::AddedSizes(_) => Some(0),
            CostingFun::SubtractedSizes(_)
            | CostingFun::MultipliedSizes(_)
            | CostingFun::MinSize(_)
            | CostingFun::MaxSize(_)
            | CostingFun::LinearOnDiagonal(_) => Some(1),
            CostingFun::ConstAboveDiagonal(off) | CostingFun::ConstBelowDiagonal(off) => {
                Some(off.model.max_argument().map_or(1, |inner| inner.max(1)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn linear(intercept: i64, slope: i64) -> Linear {
        Linear { intercept, slope }
    }

    #[test]
    fn test_shapes() {
        assert_eq!(CostingFun::ConstantCost(7).cost(&[100, 100]), 7);
        assert_eq!(CostingFun::LinearInX(linear(1, 2)).cost(&[5, 9]), 11);
        assert_eq!(CostingFun::LinearInY(linear(1, 2)).cost(&[5, 9]), 19);
        assert_eq!(CostingFun::LinearInZ(linear(1, 2)).cost(&[5, 9, 3]), 7);
        assert_eq!(CostingFun::AddedSizes(linear(1, 2)).cost(&[5, 9]), 29);
        assert_eq!(CostingFun::MultipliedSizes(linear(1, 2)).cost(&[5, 9]), 91);
        assert_eq!(CostingFun::MinSize(linear(1, 2)).cost(&[5, 9]), 11);
        assert_eq!(CostingFun::MaxSize(linear(1, 2)).cost(&[5, 9]), 19);
        assert_eq!(
            CostingFun::QuadraticInY(Quadratic { c0: 1, c1: 2, c2: 3 }).cost(&[0, 4]),
            1 + 8 + 48
        );
    }

    #[test]
    fn test_subtracted_sizes_has_a_floor() {
        let fun = CostingFun::SubtractedSizes(Subtracted {
            intercept: 10,
            slope: 2,
            minimum: 1,
        });
        assert_eq!(fun.cost(&[9, 4]), 20);
        assert_eq!(fun.cost(&[4, 9]), 12);
    }

    #[test]
    fn test_diagonals() {
        let on = CostingFun::LinearOnDiagonal(OnDiagonal {
            constant: 5,
            intercept: 1,
            slope: 10,
        });
        assert_eq!(on.cost(&[3, 3]), 31);
        assert_eq!(on.cost(&[3, 4]), 5);

        let above = CostingFun::ConstAboveDiagonal(OffDiagonal {
            constant: 99,
            model: Box::new(CostingFun::MultipliedSizes(linear(0, 1))),
        });
        assert_eq!(above.cost(&[2, 3]), 99);
        assert_eq!(above.cost(&[4, 3]), 12);

        let below = CostingFun::ConstBelowDiagonal(OffDiagonal {
            constant: 99,
            model: Box::new(CostingFun::ConstantCost(1)),
        });
        assert_eq!(below.cost(&[4, 3]), 99);
        assert_eq!(below.cost(&[3, 3]), 1);
    }

    #[test]
    fn test_saturation() {
        let fun = CostingFun::MultipliedSizes(linear(i64::MAX, i64::MAX));
        assert_eq!(fun.cost(&[i64::MAX, 2]), i64::MAX);
    }

    #[test]
    fn test_json_shape() {
        let fun: CostingFun = serde_json::from_str(
            r#"{"type": "const_above_diagonal",
                "arguments": {"constant": 85848,
                              "model": {"type": "multiplied_sizes",
                                        "arguments": {"intercept": 228465, "slope": 122}}}}"#,
        )
        .unwrap();
        assert_eq!(
            fun,
            CostingFun::ConstAboveDiagonal(OffDiagonal {
                constant: 85848,
                model: Box::new(CostingFun::MultipliedSizes(linear(228465, 122))),
            })
        );
        let constant: CostingFun =
            serde_json::from_str(r#"{"type": "constant_cost", "arguments": 4}"#).unwrap();
        assert_eq!(constant, CostingFun::ConstantCost(4));
    }
}
