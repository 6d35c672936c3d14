//! 제약 조건부 평균-분산 최적화.
//!
//! [`ConstraintSet`]이 조립한 선형 제약 행을 그대로 볼록 QP 솔버(clarabel)에 넘깁니다.
//! 최소분산, 평균-분산, 목표수익, 최대 샤프 네 가지 모드를 지원합니다.
//!
//! clarabel은 `½xᵀPx + qᵀx`를 최소화하고 `Ax + s = b, s ∈ K` 형태의 제약을 받으므로
//! `P = 2Σ`로 두고, 등식 행은 Zero 콘, 부등식 행은 Nonnegative 콘에 배치합니다.

use clarabel::algebra::*;
use clarabel::solver::*;
use quant_core::{Asset, PortfolioConfig, QuantError, QuantResult, SolverConfig};
use serde::{Deserialize, Serialize};

use crate::constraints::{ConstraintKind, ConstraintSet, LinearConstraint};
use crate::covariance::{CovarianceMatrix, ExpectedReturns};

/// 솔버 잡음으로 간주해 범위 안으로 잘라내는 최대 위반량.
const CLIP_TOLERANCE: f64 = 1e-7;

/// 최종 비중 검증 허용 오차.
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// 최적화 모드.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OptimizationMode {
    /// `min wᵀΣw`
    MinVariance,
    /// `min wᵀΣw − λ·μᵀw`
    MeanVariance { risk_aversion: f64 },
    /// `min wᵀΣw` s.t. `μᵀw = target`
    TargetReturn { target: f64 },
    /// `max (μᵀw − rf) / √(wᵀΣw)`
    MaxSharpe { risk_free_rate: f64 },
}

impl OptimizationMode {
    /// 제약 집합의 설정으로 모드를 결정합니다.
    ///
    /// 목표수익과 위험회피 계수는 함께 설정할 수 없으며, 둘 다 없으면 최소분산입니다.
    pub fn from_constraints(constraints: &ConstraintSet) -> QuantResult<Self> {
        match (constraints.target_return(), constraints.risk_aversion()) {
            (Some(_), Some(_)) => Err(QuantError::Config(
                "target_return과 risk_aversion은 동시에 설정할 수 없습니다".to_string(),
            )),
            (Some(target), None) => Ok(Self::TargetReturn { target }),
            (None, Some(risk_aversion)) => Ok(Self::MeanVariance { risk_aversion }),
            (None, None) => Ok(Self::MinVariance),
        }
    }

    /// 기대수익률 벡터가 필요한 모드인지 여부.
    pub fn needs_expected_returns(&self) -> bool {
        !matches!(self, Self::MinVariance)
    }
}

impl std::fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinVariance => write!(f, "min_variance"),
            Self::MeanVariance { risk_aversion } => write!(f, "mean_variance(λ={})", risk_aversion),
            Self::TargetReturn { target } => write!(f, "target_return({})", target),
            Self::MaxSharpe { risk_free_rate } => write!(f, "max_sharpe(rf={})", risk_free_rate),
        }
    }
}

/// 직렬화용 (종목, 비중) 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRow {
    pub symbol: String,
    pub weight: f64,
}

/// 최적화 결과 비중 벡터.
///
/// 유니버스 순서로 종목당 하나의 비중을 가지며 합은 1입니다.
/// 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Vec<WeightRow>")]
pub struct WeightVector {
    assets: Vec<Asset>,
    weights: Vec<f64>,
}

impl WeightVector {
    /// 비중을 검사 없이 감쌉니다. 외부 비중(예: 동일가중 벤치마크) 평가용입니다.
    pub fn new(assets: Vec<Asset>, weights: Vec<f64>) -> QuantResult<Self> {
        if assets.len() != weights.len() {
            return Err(QuantError::InvalidInput(format!(
                "비중 개수({})가 종목 수({})와 다릅니다",
                weights.len(),
                assets.len()
            )));
        }
        Ok(Self { assets, weights })
    }

    /// 동일가중 벡터.
    pub fn equal_weight(assets: &[Asset]) -> Self {
        let w = 1.0 / assets.len().max(1) as f64;
        Self {
            assets: assets.to_vec(),
            weights: vec![w; assets.len()],
        }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// 심볼의 비중.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a.symbol == symbol)
            .map(|i| self.weights[i])
    }

    /// 섹터 합계 비중.
    pub fn sector_weight(&self, sector: &str) -> f64 {
        self.assets
            .iter()
            .zip(&self.weights)
            .filter(|(a, _)| a.sector.as_deref() == Some(sector))
            .map(|(_, w)| w)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Asset, f64)> {
        self.assets.iter().zip(self.weights.iter().copied())
    }

    /// `(symbol, weight)` 행 목록.
    pub fn to_rows(&self) -> Vec<WeightRow> {
        self.iter()
            .map(|(asset, weight)| WeightRow {
                symbol: asset.symbol.clone(),
                weight,
            })
            .collect()
    }
}

impl From<WeightVector> for Vec<WeightRow> {
    fn from(weights: WeightVector) -> Self {
        weights.to_rows()
    }
}

/// 최적화 실행 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// 최적 비중
    pub weights: WeightVector,
    /// 사용된 모드
    pub mode: OptimizationMode,
    /// 포트폴리오 분산 `wᵀΣw`
    pub variance: f64,
    /// 포트폴리오 기대수익률 `μᵀw` (μ가 주어진 경우)
    pub expected_return: Option<f64>,
    /// 솔버 반복 횟수
    pub iterations: u32,
}

impl OptimizationResult {
    /// 포트폴리오 변동성 `√(wᵀΣw)`.
    pub fn volatility(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// 솔버 원시 결과.
struct QpSolution {
    x: Vec<f64>,
    iterations: u32,
}

/// 제약 조건부 포트폴리오 최적화기.
///
/// 상태가 없으며 같은 입력에 대해 같은 결과를 반환합니다.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedOptimizer {
    settings: SolverConfig,
}

impl ConstrainedOptimizer {
    pub fn new(settings: SolverConfig) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &PortfolioConfig) -> Self {
        Self::new(config.solver.clone())
    }

    /// 제약 집합의 설정에 따라 최소분산 / 평균-분산 / 목표수익 문제를 풉니다.
    ///
    /// # 에러
    ///
    /// - μ가 필요한 모드인데 `expected`가 없음: `InvalidInput`
    /// - 사전 검사 또는 솔버가 실현 불가능을 보고: `InfeasibleConstraints`
    /// - 반복 한도 초과, 수치 오류: `NonConvergence`
    pub fn optimize(
        &self,
        covariance: &CovarianceMatrix,
        constraints: &ConstraintSet,
        expected: Option<&ExpectedReturns>,
    ) -> QuantResult<OptimizationResult> {
        let mode = OptimizationMode::from_constraints(constraints)?;
        if mode.needs_expected_returns() && expected.is_none() {
            return Err(QuantError::InvalidInput(format!(
                "{} 모드에는 기대수익률이 필요합니다",
                mode
            )));
        }
        check_alignment(covariance, constraints, expected)?;
        constraints.validate()?;

        let n = covariance.dim();
        let mu = expected.map(|e| e.values());

        let p: Vec<Vec<f64>> = covariance
            .values()
            .iter()
            .map(|row| row.iter().map(|v| 2.0 * v).collect())
            .collect();
        let q: Vec<f64> = match (mode, mu) {
            (OptimizationMode::MeanVariance { risk_aversion }, Some(mu)) => {
                mu.iter().map(|m| -risk_aversion * m).collect()
            }
            _ => vec![0.0; n],
        };
        let rows = constraints.linear_constraints(mu);

        tracing::debug!(
            mode = %mode,
            assets = n,
            constraint_rows = rows.len(),
            "Solving portfolio QP"
        );

        let solution = self.solve(&p, &q, &rows)?;
        let weights = finalize_weights(solution.x, constraints, mu, solution.iterations)?;

        let result = OptimizationResult {
            variance: covariance.portfolio_variance(&weights),
            expected_return: expected.map(|e| e.portfolio_return(&weights)),
            weights: WeightVector {
                assets: constraints.assets().to_vec(),
                weights,
            },
            mode,
            iterations: solution.iterations,
        };

        tracing::info!(
            mode = %mode,
            variance = result.variance,
            iterations = result.iterations,
            "Portfolio optimization complete"
        );

        Ok(result)
    }

    /// 최대 샤프 비율 포트폴리오.
    ///
    /// 동차화(homogenization)로 QP로 바꿔 풉니다:
    /// `min yᵀΣy` s.t. `(μ−rf)ᵀy = 1`, `Σy = κ`, `κ ≥ 0`, `min·κ ≤ y ≤ max·κ`,
    /// 섹터 합 `≤ 상한·κ`. 해는 `w = y/κ`.
    ///
    /// 제약 집합의 `target_return`/`risk_aversion`은 사용하지 않습니다.
    pub fn optimize_max_sharpe(
        &self,
        covariance: &CovarianceMatrix,
        expected: &ExpectedReturns,
        constraints: &ConstraintSet,
        risk_free_rate: f64,
    ) -> QuantResult<OptimizationResult> {
        check_alignment(covariance, constraints, Some(expected))?;
        constraints.validate()?;

        let excess: Vec<f64> = expected
            .values()
            .iter()
            .map(|m| m - risk_free_rate)
            .collect();
        if excess.iter().all(|e| *e <= 0.0) {
            return Err(QuantError::InfeasibleConstraints(format!(
                "무위험 이자율 {}를 초과하는 기대수익률을 가진 종목이 없습니다",
                risk_free_rate
            )));
        }

        let n = covariance.dim();

        // (y, κ) 변수 공간
        let mut p = vec![vec![0.0; n + 1]; n + 1];
        for (i, row) in covariance.values().iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                p[i][j] = 2.0 * v;
            }
        }
        let q = vec![0.0; n + 1];

        let mut rows: Vec<LinearConstraint> = constraints
            .linear_constraints(None)
            .into_iter()
            .map(|row| {
                let mut coefficients = row.coefficients;
                coefficients.push(-row.rhs);
                LinearConstraint {
                    coefficients,
                    rhs: 0.0,
                    kind: row.kind,
                    label: row.label,
                }
            })
            .collect();

        let mut scale = excess.clone();
        scale.push(0.0);
        rows.push(LinearConstraint {
            coefficients: scale,
            rhs: 1.0,
            kind: ConstraintKind::Equality,
            label: "excess_return".to_string(),
        });

        let mut kappa = vec![0.0; n + 1];
        kappa[n] = -1.0;
        rows.push(LinearConstraint {
            coefficients: kappa,
            rhs: 0.0,
            kind: ConstraintKind::UpperBound,
            label: "kappa".to_string(),
        });

        tracing::debug!(
            assets = n,
            constraint_rows = rows.len(),
            risk_free_rate,
            "Solving homogenized max-Sharpe QP"
        );

        let solution = self.solve(&p, &q, &rows)?;
        let y = &solution.x[..n];
        let y_sum: f64 = y.iter().sum();
        if !y_sum.is_finite() || y_sum <= f64::EPSILON {
            return Err(QuantError::NonConvergence {
                iterations: solution.iterations,
                status: format!("degenerate scale κ={:e}", y_sum),
            });
        }
        let raw: Vec<f64> = y.iter().map(|v| v / y_sum).collect();
        let weights = finalize_weights(raw, constraints, None, solution.iterations)?;

        let mode = OptimizationMode::MaxSharpe { risk_free_rate };
        let result = OptimizationResult {
            variance: covariance.portfolio_variance(&weights),
            expected_return: Some(expected.portfolio_return(&weights)),
            weights: WeightVector {
                assets: constraints.assets().to_vec(),
                weights,
            },
            mode,
            iterations: solution.iterations,
        };

        tracing::info!(
            mode = %mode,
            variance = result.variance,
            expected_return = ?result.expected_return,
            iterations = result.iterations,
            "Portfolio optimization complete"
        );

        Ok(result)
    }

    /// 선형 제약 행으로 QP를 풉니다.
    fn solve(&self, p: &[Vec<f64>], q: &[f64], rows: &[LinearConstraint]) -> QuantResult<QpSolution> {
        let n = q.len();

        let equalities: Vec<&LinearConstraint> = rows
            .iter()
            .filter(|r| r.kind == ConstraintKind::Equality)
            .collect();
        let inequalities: Vec<&LinearConstraint> = rows
            .iter()
            .filter(|r| r.kind == ConstraintKind::UpperBound)
            .collect();
        let ordered: Vec<&LinearConstraint> = equalities
            .iter()
            .chain(inequalities.iter())
            .copied()
            .collect();

        let p_csc = upper_triangular_csc(p);
        let a_csc = rows_to_csc(&ordered, n);
        let b: Vec<f64> = ordered.iter().map(|r| r.rhs).collect();

        let mut cones = Vec::with_capacity(2);
        if !equalities.is_empty() {
            cones.push(ZeroConeT(equalities.len()));
        }
        if !inequalities.is_empty() {
            cones.push(NonnegativeConeT(inequalities.len()));
        }

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iter)
            .tol_gap_abs(self.settings.tolerance)
            .tol_gap_rel(self.settings.tolerance)
            .tol_feas(self.settings.tolerance)
            .verbose(false)
            .build()
            .map_err(|e| QuantError::Config(format!("솔버 설정 생성 실패: {}", e)))?;

        let mut solver = DefaultSolver::new(&p_csc, q, &a_csc, &b, &cones, settings)
            .map_err(|e| QuantError::InvalidInput(format!("솔버 생성 실패: {:?}", e)))?;

        solver.solve();

        let iterations = solver.info.iterations;
        match solver.solution.status {
            SolverStatus::Solved => {}
            SolverStatus::AlmostSolved => {
                tracing::warn!(iterations, "Solver reached reduced accuracy only");
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(QuantError::InfeasibleConstraints(format!(
                    "솔버가 실현 불가능을 보고했습니다 ({:?})",
                    solver.solution.status
                )));
            }
            other => {
                tracing::warn!(iterations, status = ?other, "Solver did not converge");
                return Err(QuantError::NonConvergence {
                    iterations,
                    status: format!("{:?}", other),
                });
            }
        }

        Ok(QpSolution {
            x: solver.solution.x.clone(),
            iterations,
        })
    }
}

/// 공분산, 제약, 기대수익률의 종목 순서가 같은지 확인합니다.
fn check_alignment(
    covariance: &CovarianceMatrix,
    constraints: &ConstraintSet,
    expected: Option<&ExpectedReturns>,
) -> QuantResult<()> {
    let same = |a: &[Asset], b: &[Asset]| {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.symbol == y.symbol)
    };
    if !same(covariance.assets(), constraints.assets()) {
        return Err(QuantError::InvalidInput(
            "공분산 행렬과 제약 집합의 종목 순서가 다릅니다".to_string(),
        ));
    }
    if let Some(e) = expected {
        if !same(covariance.assets(), e.assets()) {
            return Err(QuantError::InvalidInput(
                "공분산 행렬과 기대수익률의 종목 순서가 다릅니다".to_string(),
            ));
        }
    }
    Ok(())
}

/// 솔버 잡음을 범위 안으로 자르고 불변식을 다시 확인합니다.
fn finalize_weights(
    mut x: Vec<f64>,
    constraints: &ConstraintSet,
    expected: Option<&[f64]>,
    iterations: u32,
) -> QuantResult<Vec<f64>> {
    x.truncate(constraints.len());
    for (w, (asset, b)) in x
        .iter_mut()
        .zip(constraints.assets().iter().zip(constraints.bounds()))
    {
        let excess = (b.min - *w).max(*w - b.max);
        if excess > CLIP_TOLERANCE {
            return Err(QuantError::NonConvergence {
                iterations,
                status: format!(
                    "{} 비중 {:.9}가 범위 [{}, {}]를 벗어났습니다",
                    asset.symbol, w, b.min, b.max
                ),
            });
        }
        *w = w.clamp(b.min, b.max);
    }

    constraints
        .check_weights(&x, expected, WEIGHT_TOLERANCE)
        .map_err(|e| QuantError::NonConvergence {
            iterations,
            status: e.to_string(),
        })?;

    Ok(x)
}

/// 대칭 행렬의 상삼각 부분을 CSC로 변환합니다.
fn upper_triangular_csc(matrix: &[Vec<f64>]) -> CscMatrix<f64> {
    let n = matrix.len();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..n {
        for (i, row) in matrix.iter().enumerate().take(j + 1) {
            let v = row[j];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// 제약 행(행 우선)을 CSC(열 우선)로 변환합니다.
fn rows_to_csc(rows: &[&LinearConstraint], ncols: usize) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(ncols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..ncols {
        for (i, row) in rows.iter().enumerate() {
            let v = row.coefficients[j];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix::new(rows.len(), ncols, colptr, rowval, nzval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_assets() -> (CovarianceMatrix, Vec<Asset>) {
        let assets = vec![Asset::new("510300.SH"), Asset::new("511010.SH")];
        let cov = CovarianceMatrix::from_values(
            assets.clone(),
            vec![vec![0.04, 0.0], vec![0.0, 0.01]],
            60,
        )
        .unwrap();
        (cov, assets)
    }

    #[test]
    fn test_min_variance_two_assets() {
        // 무상관 두 자산: w1 = σ2² / (σ1² + σ2²) = 0.2
        let (cov, assets) = two_assets();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0);
        let result = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, None)
            .unwrap();

        assert_eq!(result.mode, OptimizationMode::MinVariance);
        assert!((result.weights.weights()[0] - 0.2).abs() < 1e-5);
        assert!((result.weights.sum() - 1.0).abs() < 1e-6);
        assert!((result.variance - 0.008).abs() < 1e-6);
    }

    #[test]
    fn test_upper_bound_binds() {
        let (cov, assets) = two_assets();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 0.7);
        let result = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, None)
            .unwrap();
        assert!((result.weights.weights()[1] - 0.7).abs() < 1e-6);
        assert!(result.weights.weights()[1] <= 0.7);
    }

    #[test]
    fn test_mode_requires_expected_returns() {
        let (cov, assets) = two_assets();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0).with_target_return(0.05);
        let err = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, None)
            .unwrap_err();
        assert!(matches!(err, QuantError::InvalidInput(_)));
    }

    #[test]
    fn test_target_return_is_met() {
        let (cov, assets) = two_assets();
        let mu = ExpectedReturns::new(assets.clone(), vec![0.12, 0.03]).unwrap();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0).with_target_return(0.09);
        let result = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, Some(&mu))
            .unwrap();

        // 0.12·w + 0.03·(1−w) = 0.09 → w = 2/3
        assert!((result.weights.weights()[0] - 2.0 / 3.0).abs() < 1e-5);
        assert!((result.expected_return.unwrap() - 0.09).abs() < 1e-5);
    }

    #[test]
    fn test_iteration_cap_is_non_convergence() {
        let (cov, assets) = two_assets();
        let optimizer = ConstrainedOptimizer::new(SolverConfig {
            max_iter: 1,
            ..Default::default()
        });
        let err = optimizer
            .optimize(&cov, &ConstraintSet::uniform(&assets, 0.0, 1.0), None)
            .unwrap_err();
        match err {
            QuantError::NonConvergence { iterations, status } => {
                assert!(iterations <= 1);
                assert!(status.contains("MaxIterations"), "status: {}", status);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_target_return_rechecked_after_solve() {
        let (_, assets) = two_assets();
        let mu = [0.12, 0.03];
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0).with_target_return(0.09);

        let on_target = finalize_weights(vec![2.0 / 3.0, 1.0 / 3.0], &constraints, Some(&mu), 7);
        assert!(on_target.is_ok());

        let off_target = finalize_weights(vec![0.5, 0.5], &constraints, Some(&mu), 7).unwrap_err();
        match off_target {
            QuantError::NonConvergence { iterations, status } => {
                assert_eq!(iterations, 7);
                assert!(status.contains("target_return"), "status: {}", status);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_target_is_infeasible() {
        let (cov, assets) = two_assets();
        let mu = ExpectedReturns::new(assets.clone(), vec![0.12, 0.03]).unwrap();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0).with_target_return(0.50);
        let err = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, Some(&mu))
            .unwrap_err();
        assert!(matches!(err, QuantError::InfeasibleConstraints(_)));
    }

    #[test]
    fn test_mean_variance_tilts_toward_return() {
        let (cov, assets) = two_assets();
        let mu = ExpectedReturns::new(assets.clone(), vec![0.12, 0.03]).unwrap();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0).with_risk_aversion(0.5);
        let result = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, Some(&mu))
            .unwrap();

        // 1계 조건: 2·0.04·w − 2·0.01·(1−w) = 0.5·(0.12 − 0.03) → w = 0.65
        assert!((result.weights.weights()[0] - 0.65).abs() < 1e-5);
        assert!(matches!(result.mode, OptimizationMode::MeanVariance { .. }));
    }

    #[test]
    fn test_max_sharpe_two_assets() {
        let (cov, assets) = two_assets();
        let mu = ExpectedReturns::new(assets.clone(), vec![0.10, 0.05]).unwrap();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0);
        let result = ConstrainedOptimizer::default()
            .optimize_max_sharpe(&cov, &mu, &constraints, 0.0)
            .unwrap();

        // 무상관 접점 포트폴리오: w ∝ μ/σ² = (2.5, 5.0) → (1/3, 2/3)
        assert!((result.weights.weights()[0] - 1.0 / 3.0).abs() < 1e-5);
        assert!((result.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_sharpe_without_positive_excess() {
        let (cov, assets) = two_assets();
        let mu = ExpectedReturns::new(assets.clone(), vec![0.01, 0.02]).unwrap();
        let constraints = ConstraintSet::uniform(&assets, 0.0, 1.0);
        let err = ConstrainedOptimizer::default()
            .optimize_max_sharpe(&cov, &mu, &constraints, 0.025)
            .unwrap_err();
        assert!(matches!(err, QuantError::InfeasibleConstraints(_)));
    }

    #[test]
    fn test_misaligned_inputs() {
        let (cov, _) = two_assets();
        let other = vec![Asset::new("600519.SH"), Asset::new("511010.SH")];
        let constraints = ConstraintSet::uniform(&other, 0.0, 1.0);
        assert!(matches!(
            ConstrainedOptimizer::default().optimize(&cov, &constraints, None),
            Err(QuantError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_weight_vector_rows_serialize() {
        let assets = vec![Asset::new("510300.SH"), Asset::new("518880.SH")];
        let weights = WeightVector::new(assets, vec![0.6, 0.4]).unwrap();
        let json = serde_json::to_value(&weights).unwrap();
        assert_eq!(json[0]["symbol"], "510300.SH");
        assert_eq!(json[1]["weight"], 0.4);
        assert_eq!(weights.get("518880.SH"), Some(0.4));
    }

    #[test]
    fn test_csc_upper_triangle() {
        let m = upper_triangular_csc(&[vec![1.0, 2.0], vec![2.0, 3.0]]);
        assert_eq!(m.colptr, vec![0, 1, 3]);
        assert_eq!(m.rowval, vec![0, 0, 1]);
        assert_eq!(m.nzval, vec![1.0, 2.0, 3.0]);
    }
}
