//! 성과 지표 계산 모듈
//!
//! 고정 비중 포트폴리오의 일간 수익률로부터 다음 지표를 계산합니다:
//! - 누적 수익률 / 연율화 수익률
//! - 연율화 변동성 (표본 표준편차)
//! - 샤프 비율 (Sharpe Ratio)
//! - 최대 낙폭 (Maximum Drawdown): 복리 자산곡선 기준 양수 비율
//! - 칼마 비율 (Calmar Ratio)
//!
//! 변동성이 0이거나 낙폭이 0인 경우처럼 비율이 정의되지 않으면 `NaN`을 반환합니다.

use chrono::NaiveDate;
use quant_core::{PortfolioConfig, QuantError, QuantResult};
use serde::{Deserialize, Serialize};

use crate::optimizer::WeightVector;
use crate::returns::ReturnSeries;

/// 연간 거래일 수 (연율화 계산에 사용)
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// 이 값보다 작은 변동성은 0으로 간주합니다.
const ZERO_VOLATILITY: f64 = 1e-12;

/// 포트폴리오 성과 지표.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 누적 수익률 `∏(1+r) − 1`
    pub total_return: f64,
    /// 연율화 수익률 `(∏(1+r))^(P/T) − 1`
    pub annualized_return: f64,
    /// 연율화 변동성 `std(r)·√P`
    pub annualized_volatility: f64,
    /// 샤프 비율 (변동성 0이면 NaN)
    pub sharpe_ratio: f64,
    /// 최대 낙폭 (양수 비율, 예: 0.15 = 15%)
    pub max_drawdown: f64,
    /// 칼마 비율 (낙폭 0이면 NaN)
    pub calmar_ratio: f64,
    /// 사용된 관측치 수
    pub observations: usize,
    /// 결측으로 제외된 행 수
    pub skipped_rows: usize,
}

impl PerformanceMetrics {
    /// 비중과 수익률 시계열로 성과 지표를 계산합니다.
    ///
    /// # 인자
    ///
    /// * `weights` - 포트폴리오 비중 (시계열과 같은 종목 순서)
    /// * `series` - 일간 수익률
    /// * `periods_per_year` - 연율화 기간 수
    /// * `risk_free_rate` - 연간 무위험 이자율
    pub fn compute(
        weights: &WeightVector,
        series: &ReturnSeries,
        periods_per_year: u32,
        risk_free_rate: f64,
    ) -> QuantResult<Self> {
        let (returns, skipped_rows) = portfolio_returns(weights, series)?;
        if returns.is_empty() {
            return Err(QuantError::InsufficientHistory {
                required: 1,
                provided: 0,
                context: "성과 계산 (완전한 행 없음)".to_string(),
            });
        }
        if skipped_rows > 0 {
            tracing::debug!(skipped_rows, "Skipped incomplete rows in performance calculation");
        }

        let values: Vec<f64> = returns.iter().map(|(_, r)| *r).collect();
        let metrics = Self::from_returns(&values, periods_per_year, risk_free_rate, skipped_rows);

        tracing::info!(
            annualized_return = metrics.annualized_return,
            annualized_volatility = metrics.annualized_volatility,
            sharpe = metrics.sharpe_ratio,
            max_drawdown = metrics.max_drawdown,
            "Performance metrics computed"
        );

        Ok(metrics)
    }

    /// 설정의 연율화 기간과 무위험 이자율을 사용합니다.
    pub fn compute_with_config(
        weights: &WeightVector,
        series: &ReturnSeries,
        config: &PortfolioConfig,
    ) -> QuantResult<Self> {
        Self::compute(weights, series, config.periods_per_year, config.risk_free_rate)
    }

    /// 포트폴리오 수익률 벡터에서 지표를 계산합니다.
    fn from_returns(
        returns: &[f64],
        periods_per_year: u32,
        risk_free_rate: f64,
        skipped_rows: usize,
    ) -> Self {
        let t = returns.len();
        let p = periods_per_year as f64;

        let growth = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r));
        let total_return = growth - 1.0;
        let annualized_return = if growth > 0.0 {
            growth.powf(p / t as f64) - 1.0
        } else {
            -1.0
        };

        let annualized_volatility = match sample_std(returns) {
            Some(std) if std * p.sqrt() < ZERO_VOLATILITY => 0.0,
            Some(std) => std * p.sqrt(),
            None => f64::NAN,
        };

        let sharpe_ratio = if annualized_volatility.is_finite() && annualized_volatility > 0.0 {
            (annualized_return - risk_free_rate) / annualized_volatility
        } else {
            f64::NAN
        };

        let max_drawdown = calculate_max_drawdown(returns);
        let calmar_ratio = if max_drawdown > 0.0 {
            annualized_return / max_drawdown
        } else {
            f64::NAN
        };

        Self {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            calmar_ratio,
            observations: t,
            skipped_rows,
        }
    }
}

/// 고정 비중 포트폴리오의 일간 수익률 `r_t = Σ w_a · r[t][a]`.
///
/// 결측 값이 있는 행은 제외하고, 제외한 행 수를 함께 반환합니다.
pub fn portfolio_returns(
    weights: &WeightVector,
    series: &ReturnSeries,
) -> QuantResult<(Vec<(NaiveDate, f64)>, usize)> {
    let aligned = weights.len() == series.asset_count()
        && weights
            .assets()
            .iter()
            .zip(series.assets())
            .all(|(a, b)| a.symbol == b.symbol);
    if !aligned {
        return Err(QuantError::InvalidInput(
            "비중 벡터와 수익률 시계열의 종목 순서가 다릅니다".to_string(),
        ));
    }

    let complete = series.complete_rows();
    let skipped = series.len() - complete.len();
    let returns = complete
        .into_iter()
        .map(|(date, row)| {
            let r = row
                .iter()
                .zip(weights.weights())
                .map(|(r, w)| r * w)
                .sum();
            (date, r)
        })
        .collect();

    Ok((returns, skipped))
}

/// 표본 표준편차 (n−1 분모). 관측치가 2개 미만이면 None.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// 복리 자산곡선의 최대 낙폭 (양수 비율).
pub fn calculate_max_drawdown(returns: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = 1.0;
    let mut max_dd: f64 = 0.0;

    for r in returns {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - wealth) / peak);
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_drawdown() {
        // 1.0 → 1.1 → 0.88 → 0.968
        let dd = calculate_max_drawdown(&[0.10, -0.20, 0.10]);
        assert!((dd - 0.20).abs() < 1e-12);
        assert_eq!(calculate_max_drawdown(&[0.01, 0.02]), 0.0);
        assert_eq!(calculate_max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_drawdown_from_initial_capital() {
        let dd = calculate_max_drawdown(&[-0.10, -0.10]);
        assert!((dd - 0.19).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std() {
        assert!(sample_std(&[0.01]).is_none());
        let std = sample_std(&[0.01, 0.03]).unwrap();
        assert!((std - 0.02_f64.sqrt() * 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_from_returns_basic() {
        let m = PerformanceMetrics::from_returns(&[0.01, -0.02, 0.03, 0.00], 252, 0.0, 0);
        let growth = 1.01 * 0.98 * 1.03;
        assert!((m.total_return - (growth - 1.0)).abs() < 1e-12);
        assert!((m.annualized_return - (growth.powf(63.0) - 1.0)).abs() < 1e-9);
        assert!(m.sharpe_ratio.is_finite());
        assert!((m.max_drawdown - 0.02).abs() < 1e-12);
        assert_eq!(m.observations, 4);
    }

    #[test]
    fn test_single_observation_has_undefined_ratios() {
        let m = PerformanceMetrics::from_returns(&[0.01], 252, 0.0, 0);
        assert!(m.annualized_volatility.is_nan());
        assert!(m.sharpe_ratio.is_nan());
        assert!(m.calmar_ratio.is_nan());
    }

    #[test]
    fn test_total_loss() {
        let m = PerformanceMetrics::from_returns(&[-1.0, 0.1], 252, 0.0, 0);
        assert_eq!(m.annualized_return, -1.0);
        assert!((m.max_drawdown - 1.0).abs() < 1e-12);
    }
}
