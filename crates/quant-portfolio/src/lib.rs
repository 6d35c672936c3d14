//! # Quant Portfolio
//!
//! 제약 조건부 평균-분산 자산배분.
//!
//! - [`returns`]: 가격 테이블, 일간 수익률 시계열
//! - [`covariance`]: 표본 공분산, 연율화 기대수익률
//! - [`constraints`]: 종목/섹터 비중 제약과 선형 제약 조립
//! - [`optimizer`]: clarabel 기반 QP 최적화 (최소분산, 평균-분산, 목표수익, 최대 샤프)
//! - [`performance`]: 연율화 수익률, 변동성, 샤프, 최대 낙폭
//! - [`trend_filter`]: 이동평균 추세 기반 유니버스 필터
//! - [`pipeline`]: 설정 기반 실행 흐름

pub mod constraints;
pub mod covariance;
pub mod optimizer;
pub mod performance;
pub mod pipeline;
pub mod returns;
pub mod trend_filter;

pub use constraints::{AssetBounds, ConstraintKind, ConstraintSet, LinearConstraint, SectorLimit};
pub use covariance::{CovarianceEstimator, CovarianceMatrix, ExpectedReturns};
pub use optimizer::{
    ConstrainedOptimizer, OptimizationMode, OptimizationResult, WeightRow, WeightVector,
};
pub use performance::{
    calculate_max_drawdown, portfolio_returns, PerformanceMetrics, TRADING_DAYS_PER_YEAR,
};
pub use pipeline::{AllocationPipeline, AllocationReport};
pub use returns::{PriceTable, ReturnSeries};
pub use trend_filter::{AssetTrend, TrendStatus, UniverseSelection, UniverseTrendFilter};
