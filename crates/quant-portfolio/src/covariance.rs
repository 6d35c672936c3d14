//! 공분산 및 기대수익률 추정.
//!
//! 모든 종목에 값이 있는 행만 사용하는 표본 공분산(n−1 분모)입니다.
//! 수축(shrinkage) 같은 정규화는 적용하지 않습니다.

use quant_core::{Asset, PortfolioConfig, QuantError, QuantResult};
use serde::{Deserialize, Serialize};

use crate::returns::ReturnSeries;

/// 표본 공분산 행렬.
///
/// 행/열 순서는 원본 [`ReturnSeries`]의 종목 순서와 같습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    assets: Vec<Asset>,
    values: Vec<Vec<f64>>,
    /// 추정에 사용된 행 수
    observations: usize,
}

impl CovarianceMatrix {
    /// 외부에서 계산된 행렬로 생성합니다 (정방·대칭 검사).
    pub fn from_values(
        assets: Vec<Asset>,
        values: Vec<Vec<f64>>,
        observations: usize,
    ) -> QuantResult<Self> {
        let n = assets.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(QuantError::InvalidInput(format!(
                "공분산 행렬이 {}x{} 정방 행렬이 아닙니다",
                n, n
            )));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if (values[i][j] - values[j][i]).abs() > 1e-12 {
                    return Err(QuantError::InvalidInput(format!(
                        "공분산 행렬이 대칭이 아닙니다: ({}, {})",
                        assets[i].symbol, assets[j].symbol
                    )));
                }
            }
        }
        Ok(Self {
            assets,
            values,
            observations,
        })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.assets.len()
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// 일정 배율을 곱한 행렬 (예: 연율화 시 `periods_per_year`).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            assets: self.assets.clone(),
            values: self
                .values
                .iter()
                .map(|row| row.iter().map(|v| v * factor).collect())
                .collect(),
            observations: self.observations,
        }
    }

    /// 포트폴리오 분산 `wᵀΣw`.
    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        self.values
            .iter()
            .zip(weights)
            .map(|(row, wi)| wi * row.iter().zip(weights).map(|(c, wj)| c * wj).sum::<f64>())
            .sum()
    }
}

/// 종목별 연율화 기대수익률.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedReturns {
    assets: Vec<Asset>,
    values: Vec<f64>,
}

impl ExpectedReturns {
    /// 외부 추정치로 생성합니다.
    pub fn new(assets: Vec<Asset>, values: Vec<f64>) -> QuantResult<Self> {
        if assets.len() != values.len() {
            return Err(QuantError::InvalidInput(format!(
                "기대수익률 개수({})가 종목 수({})와 다릅니다",
                values.len(),
                assets.len()
            )));
        }
        Ok(Self { assets, values })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 포트폴리오 기대수익률 `μᵀw`.
    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        self.values.iter().zip(weights).map(|(m, w)| m * w).sum()
    }
}

/// 공분산 추정기.
#[derive(Debug, Clone, Copy, Default)]
pub struct CovarianceEstimator {
    lookback: Option<usize>,
}

impl CovarianceEstimator {
    /// `lookback`이 `Some(n)`이면 최근 n행만 사용합니다.
    pub fn new(lookback: Option<usize>) -> Self {
        Self { lookback }
    }

    pub fn from_config(config: &PortfolioConfig) -> Self {
        Self::new(config.lookback_days)
    }

    /// 추정에 사용할 완전한 행들을 고릅니다.
    fn usable_rows(&self, series: &ReturnSeries) -> QuantResult<Vec<Vec<f64>>> {
        let window = match self.lookback {
            Some(n) => series.tail(n),
            None => series.clone(),
        };
        let rows: Vec<Vec<f64>> = window
            .complete_rows()
            .into_iter()
            .map(|(_, values)| values)
            .collect();

        let required = series.asset_count() + 1;
        if rows.len() < required {
            return Err(QuantError::InsufficientHistory {
                required,
                provided: rows.len(),
                context: format!("공분산 추정 {}", window.range_label()),
            });
        }
        Ok(rows)
    }

    /// 표본 공분산을 추정합니다.
    ///
    /// # 에러
    ///
    /// 사용 가능한 완전한 행이 `종목 수 + 1`개 미만이면 `InsufficientHistory`.
    pub fn estimate(&self, series: &ReturnSeries) -> QuantResult<CovarianceMatrix> {
        let rows = self.usable_rows(series)?;
        let n = series.asset_count();
        let t = rows.len();
        let means = column_means(&rows, n);

        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let cov = rows
                    .iter()
                    .map(|row| (row[i] - means[i]) * (row[j] - means[j]))
                    .sum::<f64>()
                    / (t - 1) as f64;
                values[i][j] = cov;
                values[j][i] = cov;
            }
        }

        tracing::debug!(
            assets = n,
            observations = t,
            "Estimated sample covariance"
        );

        Ok(CovarianceMatrix {
            assets: series.assets().to_vec(),
            values,
            observations: t,
        })
    }

    /// 같은 사용 구간의 산술평균 수익률을 연율화합니다.
    pub fn expected_returns(
        &self,
        series: &ReturnSeries,
        periods_per_year: u32,
    ) -> QuantResult<ExpectedReturns> {
        let rows = self.usable_rows(series)?;
        let means = column_means(&rows, series.asset_count());
        Ok(ExpectedReturns {
            assets: series.assets().to_vec(),
            values: means
                .into_iter()
                .map(|m| m * periods_per_year as f64)
                .collect(),
        })
    }
}

fn column_means(rows: &[Vec<f64>], n: usize) -> Vec<f64> {
    let t = rows.len() as f64;
    (0..n)
        .map(|i| rows.iter().map(|row| row[i]).sum::<f64>() / t)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(rows: Vec<Vec<Option<f64>>>) -> ReturnSeries {
        let dates = (0..rows.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        ReturnSeries::new(
            vec![Asset::new("510300.SH"), Asset::new("518880.SH")],
            dates,
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_sample_covariance() {
        let s = series(vec![
            vec![Some(0.01), Some(0.02)],
            vec![Some(0.03), Some(0.00)],
            vec![Some(-0.01), Some(0.04)],
        ]);
        let cov = CovarianceEstimator::new(None).estimate(&s).unwrap();

        // 평균 0.01 / 0.02, 편차 (0, 0), (0.02, -0.02), (-0.02, 0.02)
        assert!((cov.get(0, 0) - 0.0004).abs() < 1e-12);
        assert!((cov.get(1, 1) - 0.0004).abs() < 1e-12);
        assert!((cov.get(0, 1) + 0.0004).abs() < 1e-12);
        assert_eq!(cov.get(0, 1), cov.get(1, 0));
        assert_eq!(cov.observations(), 3);
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let s = series(vec![
            vec![Some(0.01), Some(0.02)],
            vec![None, Some(0.00)],
            vec![Some(0.03), Some(0.00)],
            vec![Some(-0.01), Some(0.04)],
        ]);
        let cov = CovarianceEstimator::new(None).estimate(&s).unwrap();
        assert_eq!(cov.observations(), 3);
    }

    #[test]
    fn test_insufficient_rows() {
        let s = series(vec![
            vec![Some(0.01), Some(0.02)],
            vec![Some(0.03), None],
            vec![Some(-0.01), Some(0.04)],
        ]);
        match CovarianceEstimator::new(None).estimate(&s) {
            Err(QuantError::InsufficientHistory {
                required, provided, ..
            }) => {
                assert_eq!(required, 3);
                assert_eq!(provided, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_lookback_window() {
        let s = series(vec![
            vec![Some(0.50), Some(-0.50)],
            vec![Some(0.01), Some(0.02)],
            vec![Some(0.03), Some(0.00)],
            vec![Some(-0.01), Some(0.04)],
        ]);
        let cov = CovarianceEstimator::new(Some(3)).estimate(&s).unwrap();
        assert_eq!(cov.observations(), 3);
        assert!((cov.get(0, 0) - 0.0004).abs() < 1e-12);
    }

    #[test]
    fn test_expected_returns_annualized() {
        let s = series(vec![
            vec![Some(0.01), Some(0.02)],
            vec![Some(0.03), Some(0.00)],
            vec![Some(-0.01), Some(0.04)],
        ]);
        let mu = CovarianceEstimator::new(None)
            .expected_returns(&s, 252)
            .unwrap();
        assert!((mu.values()[0] - 2.52).abs() < 1e-12);
        assert!((mu.values()[1] - 5.04).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_variance() {
        let cov = CovarianceMatrix::from_values(
            vec![Asset::new("A.SH"), Asset::new("B.SH")],
            vec![vec![0.04, 0.01], vec![0.01, 0.09]],
            30,
        )
        .unwrap();
        let var = cov.portfolio_variance(&[0.5, 0.5]);
        assert!((var - 0.0375).abs() < 1e-12);
        assert!(CovarianceMatrix::from_values(
            vec![Asset::new("A.SH"), Asset::new("B.SH")],
            vec![vec![0.04, 0.02], vec![0.01, 0.09]],
            30,
        )
        .is_err());
    }
}
