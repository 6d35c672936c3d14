//! # Quant Event
//!
//! 涨停 이벤트 기반 섹터 신호와 매크로 시장 레짐.
//!
//! - [`sector_heat`]: 하루치 涨停 이벤트의 섹터별 집계
//! - [`strength`]: 섹터 강도 점수와 관심/관망 라벨
//! - [`regime`]: 매크로 지표 → 위험 점수 → 레짐
//! - [`heat_history`]: 롤링 섹터 열기 테이블
//! - [`scan`]: 일일 스캔 흐름
//! - [`correlation`]: Pearson 상관계수
//! - [`backtest`]: 신호 유효성 검증과 임계값 연속성 연구

pub mod backtest;
pub mod correlation;
pub mod heat_history;
pub mod regime;
pub mod scan;
pub mod sector_heat;
pub mod strength;

pub use backtest::{
    BacktestPair, BacktestSummary, EventBacktester, ForwardReturnSource, InMemoryForwardReturns,
    RollingCorrelation, ThresholdResult, ThresholdStudy, ThresholdStudyReport,
};
pub use heat_history::{HeatRecord, SectorHeatHistory};
pub use regime::{
    MacroContribution, MacroFactor, MacroIndicatorMapper, MacroIndicators, MarketRegimeClassifier,
};
pub use scan::{DailyScan, EventScanner};
pub use sector_heat::{SectorHeat, SectorHeatAggregator};
pub use strength::{strength_score, StrengthScorer, WATCH_THRESHOLD};
