//! 가격 테이블 → 비중 → 성과 지표까지의 자산배분 실행 흐름.

use quant_core::{run_span, PortfolioConfig, QuantResult};
use serde::Serialize;

use crate::constraints::ConstraintSet;
use crate::covariance::CovarianceEstimator;
use crate::optimizer::{ConstrainedOptimizer, OptimizationMode, OptimizationResult};
use crate::performance::PerformanceMetrics;
use crate::returns::{PriceTable, ReturnSeries};
use crate::trend_filter::{UniverseSelection, UniverseTrendFilter};

/// 한 번의 자산배분 실행 결과.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    /// 유니버스 선택 결과
    pub selection: UniverseSelection,
    /// 최적화 결과
    pub optimization: OptimizationResult,
    /// 표본 내 성과 지표
    pub metrics: PerformanceMetrics,
}

/// 설정 기반 자산배분 실행기.
///
/// 공분산과 기대수익률은 `periods_per_year`로 연율화해 같은 척도에서 최적화합니다.
#[derive(Debug, Clone)]
pub struct AllocationPipeline {
    config: PortfolioConfig,
}

impl AllocationPipeline {
    pub fn new(config: PortfolioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// 설정의 제약 모드(최소분산 / 평균-분산 / 목표수익)로 실행합니다.
    pub fn run(&self, prices: &PriceTable) -> QuantResult<AllocationReport> {
        self.execute(prices, false)
    }

    /// 최대 샤프 비율 모드로 실행합니다.
    pub fn run_max_sharpe(&self, prices: &PriceTable) -> QuantResult<AllocationReport> {
        self.execute(prices, true)
    }

    fn execute(&self, prices: &PriceTable, max_sharpe: bool) -> QuantResult<AllocationReport> {
        let as_of = prices
            .dates()
            .last()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let span = run_span!("allocation", as_of, prices.assets().len());
        let _guard = span.enter();

        self.allocate(prices, max_sharpe).inspect_err(|e| {
            tracing::warn!(
                error = %e,
                data_error = e.is_data_error(),
                config_error = e.is_config_error(),
                "Allocation run failed"
            );
        })
    }

    fn allocate(&self, prices: &PriceTable, max_sharpe: bool) -> QuantResult<AllocationReport> {
        let returns = ReturnSeries::from_prices(prices)?;
        let selection = UniverseTrendFilter::new(self.config.trend_filter.clone())
            .select(prices, &returns)?;
        let universe = returns.select(&selection.selected)?;

        let periods = self.config.periods_per_year;
        let estimator = CovarianceEstimator::from_config(&self.config);
        let covariance = estimator.estimate(&universe)?.scaled(periods as f64);
        let constraints = ConstraintSet::from_config(universe.assets(), &self.config.constraints)?;
        let optimizer = ConstrainedOptimizer::from_config(&self.config);

        let optimization = if max_sharpe {
            let expected = estimator.expected_returns(&universe, periods)?;
            optimizer.optimize_max_sharpe(
                &covariance,
                &expected,
                &constraints,
                self.config.risk_free_rate,
            )?
        } else if OptimizationMode::from_constraints(&constraints)?.needs_expected_returns() {
            let expected = estimator.expected_returns(&universe, periods)?;
            optimizer.optimize(&covariance, &constraints, Some(&expected))?
        } else {
            optimizer.optimize(&covariance, &constraints, None)?
        };

        let metrics =
            PerformanceMetrics::compute_with_config(&optimization.weights, &universe, &self.config)?;

        Ok(AllocationReport {
            selection,
            optimization,
            metrics,
        })
    }
}
