//! Dense BFGS with a backtracking Armijo line search
//!
//! Sized for rating fits: one variable per model (or tier), so the
//! inverse-Hessian approximation stays small enough to keep dense.

/// Sufficient-decrease constant for the Armijo condition
const ARMIJO: f64 = 1e-4;
/// Step halvings tried before a line search is declared failed
const MAX_BACKTRACKS: usize = 60;
/// Curvature below which the inverse-Hessian update is skipped
const MIN_CURVATURE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub(crate) struct Minimum {
    pub x: Vec<f64>,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MinimizeError {
    /// Objective or gradient produced NaN or infinity
    NonFinite,
    /// No step along the search direction decreased the objective
    LineSearch { gradient_norm: f64 },
    /// Iteration cap reached before the gradient fell below tolerance
    IterationLimit { gradient_norm: f64 },
}

impl std::fmt::Display for MinimizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => f.write_str("objective is not finite"),
            Self::LineSearch { gradient_norm } => {
                write!(f, "line search stalled with gradient norm {gradient_norm:e}")
            }
            Self::IterationLimit { gradient_norm } => {
                write!(f, "iteration limit reached with gradient norm {gradient_norm:e}")
            }
        }
    }
}

/// Minimize `objective` from `x0`
///
/// `objective(x, grad)` returns f(x) and writes ∇f(x) into `grad`.
/// Converged once the largest gradient component is at most `tolerance`.
pub(crate) fn minimize<F>(
    mut objective: F,
    x0: Vec<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Minimum, MinimizeError>
where
    F: FnMut(&[f64], &mut [f64]) -> f64,
{
    let n = x0.len();
    let mut x = x0;
    let mut grad = vec![0.0; n];
    let mut value = objective(&x, &mut grad);

    if !value.is_finite() || !all_finite(&grad) {
        return Err(MinimizeError::NonFinite);
    }

    let mut inverse_hessian = identity(n);
    let mut scaled = false;
    let mut fresh = true;

    let mut direction = vec![0.0; n];
    let mut candidate = vec![0.0; n];
    let mut candidate_grad = vec![0.0; n];

    for iteration in 0..max_iterations {
        let gradient_norm = inf_norm(&grad);
        if gradient_norm <= tolerance {
            return Ok(Minimum { x, iterations: iteration });
        }

        mat_vec(&inverse_hessian, &grad, &mut direction);
        direction.iter_mut().for_each(|d| *d = -*d);

        let mut slope = dot(&grad, &direction);
        if slope >= 0.0 {
            reset(&mut inverse_hessian);
            scaled = false;
            fresh = true;
            direction.iter_mut().zip(&grad).for_each(|(d, g)| *d = -g);
            slope = dot(&grad, &direction);
        }

        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            candidate
                .iter_mut()
                .zip(x.iter().zip(&direction))
                .for_each(|(c, (xi, di))| *c = xi + step * di);

            let next = objective(&candidate, &mut candidate_grad);
            if next.is_finite() && all_finite(&candidate_grad) && next <= value + ARMIJO * step * slope {
                accepted = Some(next);
                break;
            }
            step *= 0.5;
        }

        let Some(next_value) = accepted else {
            // Rounding can stall the search right at the optimum
            if gradient_norm <= tolerance.sqrt() {
                return Ok(Minimum { x, iterations: iteration });
            }
            if fresh {
                return Err(MinimizeError::LineSearch { gradient_norm });
            }
            reset(&mut inverse_hessian);
            scaled = false;
            fresh = true;
            continue;
        };

        let s: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
        let y: Vec<f64> = candidate_grad.iter().zip(&grad).map(|(c, g)| c - g).collect();
        let sy = dot(&s, &y);

        if sy > MIN_CURVATURE {
            if !scaled {
                let gamma = sy / dot(&y, &y);
                inverse_hessian.iter_mut().for_each(|h| *h *= gamma);
                scaled = true;
            }
            update_inverse_hessian(&mut inverse_hessian, &s, &y, sy);
            fresh = false;
        }

        std::mem::swap(&mut x, &mut candidate);
        std::mem::swap(&mut grad, &mut candidate_grad);
        value = next_value;
    }

    let gradient_norm = inf_norm(&grad);
    if gradient_norm <= tolerance {
        Ok(Minimum {
            x,
            iterations: max_iterations,
        })
    } else {
        Err(MinimizeError::IterationLimit { gradient_norm })
    }
}

/// H ← (I - ρ s yᵀ) H (I - ρ y sᵀ) + ρ s sᵀ, expanded for symmetric H
fn update_inverse_hessian(h: &mut [f64], s: &[f64], y: &[f64], sy: f64) {
    let n = s.len();
    let rho = 1.0 / sy;

    let mut hy = vec![0.0; n];
    mat_vec(h, y, &mut hy);
    let yhy = dot(y, &hy);
    let ss_coeff = rho * rho * yhy + rho;

    for ((row, &si), &hyi) in h.chunks_exact_mut(n).zip(s).zip(&hy) {
        for ((cell, &sj), &hyj) in row.iter_mut().zip(s).zip(&hy) {
            *cell += ss_coeff * si * sj - rho * (hyi * sj + si * hyj);
        }
    }
}

fn identity(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    reset(&mut m);
    m
}

fn reset(m: &mut [f64]) {
    let n = m.len().isqrt();
    m.iter_mut().for_each(|v| *v = 0.0);
    m.iter_mut().step_by(n + 1).for_each(|v| *v = 1.0);
}

fn mat_vec(m: &[f64], v: &[f64], out: &mut [f64]) {
    let n = v.len();
    for (i, o) in out.iter_mut().enumerate() {
        *o = dot(&m[i * n..(i + 1) * n], v);
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}
