//! Conic problem description.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// A block of constraint rows and the cone its slack must lie in.
///
/// Every block states `b - A x ∈ K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConeBlock {
    /// `A x = b`.
    Zero(usize),
    /// `A x <= b`.
    Nonnegative(usize),
    /// `(b - A x)[0] >= ||(b - A x)[1..]||`.
    SecondOrder(usize),
}

impl ConeBlock {
    /// Number of rows in the block.
    #[must_use]
    pub fn dim(&self) -> usize {
        match *self {
            Self::Zero(n) | Self::Nonnegative(n) | Self::SecondOrder(n) => n,
        }
    }
}

/// A convex quadratic program with optional second-order-cone constraints:
///
/// ```text
/// minimize    ½ xᵀ P x + qᵀ x
/// subject to  b_k - A_k x ∈ K_k   for every block k
/// ```
#[derive(Debug, Clone)]
pub struct ConicProblem {
    n: usize,
    quadratic: Option<DMatrix<f64>>,
    linear: DVector<f64>,
    blocks: Vec<(ConeBlock, DMatrix<f64>, DVector<f64>)>,
}

impl ConicProblem {
    /// Creates an unconstrained problem with `n` variables and a zero objective.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            n,
            quadratic: None,
            linear: DVector::zeros(n),
            blocks: Vec::new(),
        }
    }

    /// Sets the quadratic cost `P` (symmetric positive semi-definite).
    #[must_use]
    pub fn with_quadratic(mut self, p: DMatrix<f64>) -> Self {
        self.quadratic = Some(p);
        self
    }

    /// Sets the linear cost `q`.
    #[must_use]
    pub fn with_linear(mut self, q: DVector<f64>) -> Self {
        self.linear = q;
        self
    }

    /// Adds rows `A x = b`.
    #[must_use]
    pub fn with_equalities(self, a: DMatrix<f64>, b: DVector<f64>) -> Self {
        let rows = a.nrows();
        self.with_block(ConeBlock::Zero(rows), a, b)
    }

    /// Adds rows `A x <= b`.
    #[must_use]
    pub fn with_inequalities(self, a: DMatrix<f64>, b: DVector<f64>) -> Self {
        let rows = a.nrows();
        self.with_block(ConeBlock::Nonnegative(rows), a, b)
    }

    /// Adds a second-order cone `b - A x ∈ Q`.
    #[must_use]
    pub fn with_second_order_cone(self, a: DMatrix<f64>, b: DVector<f64>) -> Self {
        let rows = a.nrows();
        self.with_block(ConeBlock::SecondOrder(rows), a, b)
    }

    fn with_block(mut self, cone: ConeBlock, a: DMatrix<f64>, b: DVector<f64>) -> Self {
        if cone.dim() > 0 {
            self.blocks.push((cone, a, b));
        }
        self
    }

    /// Number of decision variables.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.n
    }

    /// Total number of constraint rows.
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.blocks.iter().map(|(cone, _, _)| cone.dim()).sum()
    }

    /// The quadratic cost, if any.
    #[must_use]
    pub fn quadratic(&self) -> Option<&DMatrix<f64>> {
        self.quadratic.as_ref()
    }

    /// The linear cost.
    #[must_use]
    pub fn linear(&self) -> &DVector<f64> {
        &self.linear
    }

    /// Cone blocks in insertion order.
    pub fn cones(&self) -> impl Iterator<Item = ConeBlock> + '_ {
        self.blocks.iter().map(|(cone, _, _)| *cone)
    }

    /// Evaluates the objective at `x`.
    #[must_use]
    pub fn objective(&self, x: &DVector<f64>) -> f64 {
        let quadratic = self.quadratic.as_ref().map_or(0.0, |p| 0.5 * x.dot(&(p * x)));
        quadratic + self.linear.dot(x)
    }

    /// Stacks every block into a single `(A, b)` pair.
    #[must_use]
    pub fn stacked_constraints(&self) -> (DMatrix<f64>, DVector<f64>) {
        let m = self.num_constraints();
        let mut a = DMatrix::zeros(m, self.n);
        let mut b = DVector::zeros(m);

        let mut offset = 0;
        for (cone, block_a, block_b) in &self.blocks {
            let rows = cone.dim();
            a.view_mut((offset, 0), (rows, self.n)).copy_from(block_a);
            b.rows_mut(offset, rows).copy_from(block_b);
            offset += rows;
        }
        (a, b)
    }

    /// Checks that every piece of problem data has consistent dimensions.
    pub fn validate(&self) -> MathResult<()> {
        if self.n == 0 {
            return Err(MathError::invalid_input("Problem has no variables"));
        }
        if self.linear.len() != self.n {
            return Err(MathError::dimension_mismatch(
                (self.linear.len(), 1),
                (self.n, 1),
            ));
        }
        if let Some(p) = &self.quadratic {
            if p.nrows() != self.n || p.ncols() != self.n {
                return Err(MathError::dimension_mismatch(p.shape(), (self.n, self.n)));
            }
        }
        for (cone, a, b) in &self.blocks {
            if a.ncols() != self.n || a.nrows() != cone.dim() {
                return Err(MathError::dimension_mismatch(a.shape(), (cone.dim(), self.n)));
            }
            if b.len() != cone.dim() {
                return Err(MathError::dimension_mismatch((b.len(), 1), (cone.dim(), 1)));
            }
        }
        let non_finite = self.linear.iter().any(|v| !v.is_finite())
            || self
                .quadratic
                .as_ref()
                .is_some_and(|p| p.iter().any(|v| !v.is_finite()))
            || self
                .blocks
                .iter()
                .any(|(_, a, b)| a.iter().chain(b.iter()).any(|v| !v.is_finite()));
        if non_finite {
            return Err(MathError::invalid_input("Problem data contains NaN or infinity"));
        }
        Ok(())
    }
}
