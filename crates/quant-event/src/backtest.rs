//! 이벤트 스코어링 검증 백테스트.
//!
//! 과거 신호의 강도 점수와 해당 섹터의 선행 N일 수익률을 짝지어
//! 상관계수, 관심 신호 승률, 관심 신호 평균 수익률을 계산합니다.
//! 신호 히스토리는 읽기만 하며 변경하거나 걸러내지 않습니다.
//!
//! 涨停 수 임계값별 다음 날 연속성 연구([`ThresholdStudy`])도 함께 제공합니다.

use chrono::NaiveDate;
use quant_core::{EventScanConfig, QuantError, QuantResult, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::correlation::{pearson, rolling_pearson};
use crate::heat_history::HeatRecord;

/// 연속성 연구에서 임계값을 채택하기 위한 최소 표본 수 (초과해야 함).
const MIN_STUDY_SAMPLES: usize = 10;

/// 섹터 선행 수익률 조회.
///
/// 수집기가 구현합니다. 데이터가 없으면 `None`을 반환합니다.
pub trait ForwardReturnSource {
    /// `date` 다음 거래일부터 `horizon`일 동안의 누적 수익률.
    fn forward_return(&self, sector: &str, date: NaiveDate, horizon: usize) -> Option<f64>;
}

/// 섹터 지수 일간 수익률을 메모리에 보관하는 구현.
#[derive(Debug, Clone, Default)]
pub struct InMemoryForwardReturns {
    daily: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl InMemoryForwardReturns {
    pub fn new() -> Self {
        Self::default()
    }

    /// 섹터의 하루 수익률을 추가합니다.
    pub fn insert(&mut self, sector: impl Into<String>, date: NaiveDate, daily_return: f64) {
        self.daily
            .entry(sector.into())
            .or_default()
            .insert(date, daily_return);
    }

    /// 섹터의 일간 수익률 시계열을 한 번에 추가합니다.
    pub fn with_series<I>(mut self, sector: &str, series: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        for (date, r) in series {
            self.insert(sector, date, r);
        }
        self
    }
}

impl ForwardReturnSource for InMemoryForwardReturns {
    fn forward_return(&self, sector: &str, date: NaiveDate, horizon: usize) -> Option<f64> {
        if horizon == 0 {
            return None;
        }
        let series = self.daily.get(sector)?;
        let ahead: Vec<f64> = series
            .range(date.succ_opt()?..)
            .take(horizon)
            .map(|(_, r)| *r)
            .collect();
        if ahead.len() < horizon {
            return None;
        }
        Some(ahead.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0)
    }
}

/// 신호와 실현 수익률 한 쌍.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestPair {
    pub date: NaiveDate,
    pub sector: String,
    pub strength_score: f64,
    pub forward_return: f64,
    pub is_watch: bool,
}

/// 롤링 상관계수 한 점 (구간 마지막 쌍의 날짜 기준).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingCorrelation {
    pub end_date: NaiveDate,
    pub correlation: Option<f64>,
}

/// 백테스트 검증 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// 사용된 (신호, 수익률) 쌍 수
    pub samples: usize,
    /// 선행 수익률 기간 (일)
    pub horizon: usize,
    /// 전체 표본 상관계수 (강도 vs 선행 수익률)
    pub correlation: Option<f64>,
    /// 최근 구간 상관계수
    pub latest_correlation: Option<f64>,
    /// 구간별 상관계수
    pub rolling_correlation: Vec<RollingCorrelation>,
    /// 관심 신호 수
    pub watch_count: usize,
    /// 관심 신호 중 선행 수익률 > 0 비율
    pub win_rate: Option<f64>,
    /// 관심 신호 평균 선행 수익률
    pub avg_watch_return: Option<f64>,
    /// 승률과 평균 수익률이 모두 기준 이상인지 여부
    pub is_effective: bool,
}

impl BacktestSummary {
    /// 요약 문자열 생성 (로그/리포트용).
    pub fn summary(&self) -> String {
        let pct = |v: Option<f64>| {
            v.map(|x| format!("{:.1}%", x * 100.0))
                .unwrap_or_else(|| "N/A".to_string())
        };
        let num = |v: Option<f64>| {
            v.map(|x| format!("{:.4}", x))
                .unwrap_or_else(|| "N/A".to_string())
        };
        format!(
            "표본: {}쌍 (T+{})\n상관계수: {} (최근 {})\n관심 신호: {}건, 승률 {}, 평균 수익 {}\n판정: {}",
            self.samples,
            self.horizon,
            num(self.correlation),
            num(self.latest_correlation),
            self.watch_count,
            pct(self.win_rate),
            pct(self.avg_watch_return),
            if self.is_effective { "有效" } else { "无效" }
        )
    }
}

/// 이벤트 백테스터.
#[derive(Debug, Clone)]
pub struct EventBacktester {
    correlation_window: usize,
    forward_days: usize,
    win_rate_threshold: f64,
    avg_return_threshold: f64,
}

impl Default for EventBacktester {
    fn default() -> Self {
        Self::new(&EventScanConfig::default())
    }
}

impl EventBacktester {
    pub fn new(config: &EventScanConfig) -> Self {
        Self {
            correlation_window: config.correlation_window,
            forward_days: config.forward_days,
            win_rate_threshold: config.win_rate_threshold,
            avg_return_threshold: config.avg_return_threshold,
        }
    }

    /// 선행 수익률이 있는 신호만 짝을 지어 (날짜, 섹터) 순으로 정렬합니다.
    pub fn pairs<S>(&self, signals: &[Signal], source: &S) -> Vec<BacktestPair>
    where
        S: ForwardReturnSource + ?Sized,
    {
        let mut pairs: Vec<BacktestPair> = signals
            .iter()
            .filter_map(|s| {
                source
                    .forward_return(&s.sector, s.date, self.forward_days)
                    .filter(|r| r.is_finite())
                    .map(|r| BacktestPair {
                        date: s.date,
                        sector: s.sector.clone(),
                        strength_score: s.strength_score,
                        forward_return: r,
                        is_watch: s.is_watch(),
                    })
            })
            .collect();
        pairs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.sector.cmp(&b.sector)));
        pairs
    }

    /// 신호 히스토리를 검증합니다.
    ///
    /// # 에러
    ///
    /// 유효한 쌍이 `correlation_window`개 미만이면 `InsufficientSample`.
    pub fn run<S>(&self, signals: &[Signal], source: &S) -> QuantResult<BacktestSummary>
    where
        S: ForwardReturnSource + ?Sized,
    {
        let pairs = self.pairs(signals, source);
        if pairs.len() < self.correlation_window {
            return Err(QuantError::InsufficientSample {
                required: self.correlation_window,
                provided: pairs.len(),
            });
        }
        if pairs.len() < signals.len() {
            tracing::debug!(
                signals = signals.len(),
                paired = pairs.len(),
                "Some signals have no forward return"
            );
        }

        let strength: Vec<f64> = pairs.iter().map(|p| p.strength_score).collect();
        let forward: Vec<f64> = pairs.iter().map(|p| p.forward_return).collect();

        let correlation = pearson(&strength, &forward);
        let rolling_correlation: Vec<RollingCorrelation> =
            rolling_pearson(&strength, &forward, self.correlation_window)
                .into_iter()
                .enumerate()
                .map(|(i, correlation)| RollingCorrelation {
                    end_date: pairs[i + self.correlation_window - 1].date,
                    correlation,
                })
                .collect();
        let latest_correlation = rolling_correlation.last().and_then(|r| r.correlation);

        let watch: Vec<f64> = pairs
            .iter()
            .filter(|p| p.is_watch)
            .map(|p| p.forward_return)
            .collect();
        let (win_rate, avg_watch_return) = if watch.is_empty() {
            (None, None)
        } else {
            let n = watch.len() as f64;
            (
                Some(watch.iter().filter(|r| **r > 0.0).count() as f64 / n),
                Some(watch.iter().sum::<f64>() / n),
            )
        };

        let is_effective = matches!(
            (win_rate, avg_watch_return),
            (Some(w), Some(a)) if w >= self.win_rate_threshold && a >= self.avg_return_threshold
        );

        let summary = BacktestSummary {
            samples: pairs.len(),
            horizon: self.forward_days,
            correlation,
            latest_correlation,
            rolling_correlation,
            watch_count: watch.len(),
            win_rate,
            avg_watch_return,
            is_effective,
        };

        tracing::info!(
            samples = summary.samples,
            correlation = ?summary.correlation,
            win_rate = ?summary.win_rate,
            effective = summary.is_effective,
            "Event backtest complete"
        );

        Ok(summary)
    }
}

/// 임계값 하나의 연속성 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: usize,
    /// `count ≥ threshold`인 (날짜, 섹터) 수
    pub samples: usize,
    /// 해당 표본의 평균 涨停 수
    pub mean_count: f64,
    /// 해당 표본 중 `count > threshold` 비율
    pub continuation_rate: f64,
}

/// 연속성 연구 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStudyReport {
    pub results: Vec<ThresholdResult>,
    /// 연속 비율이 가장 높은 임계값
    pub best: Option<ThresholdResult>,
}

/// 涨停 수 임계값별 연속성 연구.
#[derive(Debug, Clone)]
pub struct ThresholdStudy {
    thresholds: Vec<usize>,
}

impl Default for ThresholdStudy {
    fn default() -> Self {
        Self::new(&EventScanConfig::default())
    }
}

impl ThresholdStudy {
    pub fn new(config: &EventScanConfig) -> Self {
        Self {
            thresholds: config.study_thresholds.clone(),
        }
    }

    /// 열기 히스토리 행으로 연구를 실행합니다.
    ///
    /// 표본이 10개 이하인 임계값은 결과에서 제외합니다.
    pub fn run(&self, records: &[HeatRecord]) -> ThresholdStudyReport {
        let results: Vec<ThresholdResult> = self
            .thresholds
            .iter()
            .filter_map(|&threshold| {
                let subset: Vec<usize> = records
                    .iter()
                    .map(|r| r.limit_up_count)
                    .filter(|c| *c >= threshold)
                    .collect();
                if subset.len() <= MIN_STUDY_SAMPLES {
                    tracing::debug!(threshold, samples = subset.len(), "Threshold skipped");
                    return None;
                }
                let n = subset.len() as f64;
                Some(ThresholdResult {
                    threshold,
                    samples: subset.len(),
                    mean_count: subset.iter().sum::<usize>() as f64 / n,
                    continuation_rate: subset.iter().filter(|c| **c > threshold).count() as f64
                        / n,
                })
            })
            .collect();

        let best = results
            .iter()
            .fold(None::<&ThresholdResult>, |best, r| match best {
                Some(b) if b.continuation_rate >= r.continuation_rate => Some(b),
                _ => Some(r),
            })
            .cloned();

        ThresholdStudyReport { results, best }
    }
}
