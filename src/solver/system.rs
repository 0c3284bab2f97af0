//! Dense residual/Jacobian system and its LU solve.

use crate::error::{NodalError, Result};

use super::PIVOT_EPSILON;

/// Linearized system `J Δ = F` over the dynamic unknowns.
#[derive(Debug, Clone)]
pub struct NodalSystem {
    /// Residual vector F (net current into each dynamic node)
    pub residual: Vec<f64>,
    /// Jacobian J = dF/dx (row-major)
    pub jacobian: Vec<f64>,
    /// Newton step Δ, solution of J Δ = F
    pub delta: Vec<f64>,
    /// Matrix dimension
    pub size: usize,
    /// LU decomposition of J
    lu: Vec<f64>,
    /// Pivot indices for LU decomposition
    pivots: Vec<usize>,
}

impl NodalSystem {
    /// Create a new system for `size` dynamic unknowns.
    pub fn new(size: usize) -> Self {
        Self {
            residual: vec![0.0; size],
            jacobian: vec![0.0; size * size],
            delta: vec![0.0; size],
            size,
            lu: vec![0.0; size * size],
            pivots: vec![0; size],
        }
    }

    /// Clear the residual and Jacobian to zero.
    pub fn clear(&mut self) {
        self.residual.fill(0.0);
        self.jacobian.fill(0.0);
    }

    /// Get Jacobian element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.jacobian[row * self.size + col]
    }

    /// Add to Jacobian element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.jacobian[row * self.size + col] += value;
    }

    /// Add to residual element.
    pub fn add_residual(&mut self, row: usize, value: f64) {
        self.residual[row] += value;
    }

    /// Largest residual magnitude (infinity norm of F).
    pub fn residual_norm(&self) -> f64 {
        max_abs(&self.residual)
    }

    /// Largest step magnitude (infinity norm of Δ).
    pub fn delta_norm(&self) -> f64 {
        max_abs(&self.delta)
    }

    /// First non-finite entry as (row, value), checking F then J.
    pub fn find_non_finite(&self) -> Option<(usize, f64)> {
        if let Some((row, &value)) = self
            .residual
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Some((row, value));
        }
        self.jacobian
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
            .map(|(idx, &value)| (idx / self.size.max(1), value))
    }

    /// Factor J in place as `P J = L U` (Doolittle, partial pivoting).
    ///
    /// `lu` holds both triangles, row-major: U on and above the diagonal,
    /// the multipliers of the unit-diagonal L below it. `pivots[k]` is the
    /// row of J that ended up in row `k`.
    pub fn factor(&mut self) -> Result<()> {
        let n = self.size;
        self.lu.copy_from_slice(&self.jacobian);
        self.pivots.iter_mut().enumerate().for_each(|(i, p)| *p = i);

        for k in 0..n {
            let (pivot_row, magnitude) = (k..n)
                .map(|i| (i, self.lu[i * n + k].abs()))
                .fold((k, -1.0), |best, cand| if cand.1 > best.1 { cand } else { best });

            // NaN magnitudes also fail here
            if !(magnitude >= PIVOT_EPSILON) {
                return Err(NodalError::SingularMatrix);
            }

            if pivot_row != k {
                self.pivots.swap(k, pivot_row);
                let (upper, lower) = self.lu.split_at_mut(pivot_row * n);
                upper[k * n..(k + 1) * n].swap_with_slice(&mut lower[..n]);
            }

            let pivot = self.lu[k * n + k];
            for i in (k + 1)..n {
                let m = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = m;
                if m != 0.0 {
                    for j in (k + 1)..n {
                        self.lu[i * n + j] -= m * self.lu[k * n + j];
                    }
                }
            }
        }

        Ok(())
    }

    /// Solve `J Δ = F` into `delta` from the factors left by [`factor`].
    ///
    /// [`factor`]: NodalSystem::factor
    pub fn solve(&mut self) -> Result<()> {
        let n = self.size;

        for (d, &p) in self.delta.iter_mut().zip(&self.pivots) {
            *d = self.residual[p];
        }

        // L y = P F, unit diagonal
        for i in 1..n {
            let row = &self.lu[i * n..i * n + i];
            let dot: f64 = row.iter().zip(&self.delta[..i]).map(|(l, y)| l * y).sum();
            self.delta[i] -= dot;
        }

        // U Δ = y
        for i in (0..n).rev() {
            let row = &self.lu[i * n + i + 1..(i + 1) * n];
            let dot: f64 = row.iter().zip(&self.delta[i + 1..]).map(|(u, x)| u * x).sum();
            self.delta[i] = (self.delta[i] - dot) / self.lu[i * n + i];
        }

        if self.delta.iter().any(|d| !d.is_finite()) {
            return Err(NodalError::SingularMatrix);
        }

        Ok(())
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}
