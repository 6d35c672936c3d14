//! 이동평균 추세 기반 유니버스 필터.
//!
//! 장기 이동평균과 그 기울기로 종목별 추세 상태를 판정하고,
//! 상승 추세이면서 이력이 충분한 종목만 최적화 유니버스에 남깁니다.
//! 통과 종목이 2개 미만이면 전체 유니버스를 그대로 사용합니다.

use quant_core::{QuantResult, TrendFilterConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::returns::{PriceTable, ReturnSeries};

/// 분산 투자에 필요한 최소 종목 수.
const MIN_SELECTED: usize = 2;

/// 종목 추세 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    StrongUp,
    Up,
    Neutral,
    Down,
    StrongDown,
}

impl TrendStatus {
    /// 유니버스 통과 대상 여부.
    pub fn is_uptrend(self) -> bool {
        matches!(self, Self::StrongUp | Self::Up)
    }
}

impl fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StrongUp => "强势上涨",
            Self::Up => "上涨",
            Self::Neutral => "震荡",
            Self::Down => "下跌",
            Self::StrongDown => "强势下跌",
        };
        write!(f, "{}", s)
    }
}

/// 종목별 판정 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTrend {
    pub symbol: String,
    pub status: TrendStatus,
    /// 유효 수익률 개수
    pub valid_returns: usize,
    /// 필터 통과 여부
    pub passed: bool,
}

/// 필터 적용 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSelection {
    /// 최종 선택된 종목 열 인덱스 (원래 순서)
    pub selected: Vec<usize>,
    /// 종목별 판정
    pub trends: Vec<AssetTrend>,
    /// 통과 종목 부족으로 전체 유니버스를 사용했는지 여부
    pub fell_back: bool,
}

/// 유니버스 추세 필터.
#[derive(Debug, Clone, Default)]
pub struct UniverseTrendFilter {
    config: TrendFilterConfig,
}

impl UniverseTrendFilter {
    pub fn new(config: TrendFilterConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 유효 가격 시계열의 추세 상태를 판정합니다.
    ///
    /// 기울기는 `slope_window` 구간 이동평균의 상대 변화를 구간 길이로 나눈 값입니다.
    /// 데이터가 `ma_period + slope_window`개 미만이면 `Neutral`입니다.
    pub fn trend_status(&self, prices: &[f64]) -> TrendStatus {
        let period = self.config.ma_period;
        let window = self.config.slope_window;
        if period == 0 || window == 0 || prices.len() < period + window {
            return TrendStatus::Neutral;
        }

        let ma_at = |end: usize| prices[end + 1 - period..=end].iter().sum::<f64>() / period as f64;
        let last = prices.len() - 1;
        let ma_now = ma_at(last);
        let ma_then = ma_at(last - window);
        if ma_then <= 0.0 {
            return TrendStatus::Neutral;
        }

        let slope = (ma_now / ma_then - 1.0) / window as f64;
        let price = prices[last];
        let strong = self.config.strong_slope;

        if price > ma_now && slope > strong {
            TrendStatus::StrongUp
        } else if price > ma_now && slope > 0.0 {
            TrendStatus::Up
        } else if price < ma_now && slope < -strong {
            TrendStatus::StrongDown
        } else if price < ma_now && slope < 0.0 {
            TrendStatus::Down
        } else {
            TrendStatus::Neutral
        }
    }

    /// 가격 테이블과 수익률 시계열로 유니버스를 선택합니다.
    ///
    /// 필터가 비활성화되어 있으면 전체 유니버스를 반환합니다.
    pub fn select(
        &self,
        prices: &PriceTable,
        returns: &ReturnSeries,
    ) -> QuantResult<UniverseSelection> {
        let all: Vec<usize> = (0..prices.assets().len()).collect();

        let trends: Vec<AssetTrend> = prices
            .assets()
            .iter()
            .enumerate()
            .map(|(idx, asset)| {
                let column: Vec<f64> = prices.column(idx).into_iter().flatten().collect();
                let status = self.trend_status(&column);
                let valid_returns = returns
                    .index_of(&asset.symbol)
                    .map(|i| returns.valid_count(i))
                    .unwrap_or(0);
                AssetTrend {
                    symbol: asset.symbol.clone(),
                    status,
                    valid_returns,
                    passed: status.is_uptrend() && valid_returns >= self.config.min_history,
                }
            })
            .collect();

        if !self.config.enabled {
            return Ok(UniverseSelection {
                selected: all,
                trends,
                fell_back: false,
            });
        }

        let passed: Vec<usize> = trends
            .iter()
            .enumerate()
            .filter(|(_, t)| t.passed)
            .map(|(i, _)| i)
            .collect();

        for t in trends.iter().filter(|t| t.passed) {
            tracing::debug!(symbol = %t.symbol, status = %t.status, "Asset passed trend filter");
        }

        if passed.len() < MIN_SELECTED {
            tracing::warn!(
                passed = passed.len(),
                universe = all.len(),
                "Too few assets passed trend filter, using full universe"
            );
            return Ok(UniverseSelection {
                selected: all,
                trends,
                fell_back: true,
            });
        }

        tracing::info!(
            selected = passed.len(),
            universe = all.len(),
            "Trend filter applied"
        );

        Ok(UniverseSelection {
            selected: passed,
            trends,
            fell_back: false,
        })
    }
}
