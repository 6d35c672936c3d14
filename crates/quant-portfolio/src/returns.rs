//! 가격 테이블과 수익률 시계열.
//!
//! 수집기가 넘겨준 수정종가 테이블(날짜 × 종목)을 일간 수익률로 변환합니다.
//! 빈 값은 0으로 채우지 않고 `None`으로 유지합니다.

use chrono::NaiveDate;
use quant_core::{Asset, QuantError, QuantResult};
use serde::{Deserialize, Serialize};

/// 날짜 × 종목 테이블의 공통 형태 검사.
fn validate_shape(
    assets: &[Asset],
    dates: &[NaiveDate],
    rows: &[Vec<Option<f64>>],
) -> QuantResult<()> {
    if dates.len() != rows.len() {
        return Err(QuantError::InvalidInput(format!(
            "날짜 수({})와 행 수({})가 다릅니다",
            dates.len(),
            rows.len()
        )));
    }
    if let Some((idx, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != assets.len())
    {
        return Err(QuantError::InvalidInput(format!(
            "{} 행의 열 수({})가 종목 수({})와 다릅니다",
            dates[idx],
            row.len(),
            assets.len()
        )));
    }
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(QuantError::InvalidInput(format!(
            "날짜가 오름차순이 아닙니다: {} → {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// 수정종가 테이블.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    assets: Vec<Asset>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// 형태를 검사하고 테이블을 생성합니다.
    pub fn new(
        assets: Vec<Asset>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> QuantResult<Self> {
        validate_shape(&assets, &dates, &rows)?;
        Ok(Self {
            assets,
            dates,
            rows,
        })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 특정 종목 열을 반환합니다.
    pub fn column(&self, asset_idx: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row[asset_idx]).collect()
    }
}

/// 일간 수익률 시계열.
///
/// 모든 행은 유니버스의 종목 수만큼 값을 가지며, 데이터가 없는 칸은 `None`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    assets: Vec<Asset>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Option<f64>>>,
}

impl ReturnSeries {
    /// 이미 계산된 수익률로 시계열을 생성합니다.
    pub fn new(
        assets: Vec<Asset>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> QuantResult<Self> {
        validate_shape(&assets, &dates, &rows)?;
        Ok(Self {
            assets,
            dates,
            rows,
        })
    }

    /// 가격 테이블에서 수익률을 계산합니다.
    ///
    /// `r[t][a] = p[t][a] / p[t-1][a] - 1`. 결과는 첫 행을 제외한 같은 형태입니다.
    ///
    /// # 에러
    ///
    /// - 가격 행이 2개 미만: `InsufficientHistory`
    /// - 값이 하나도 없는 종목: `MissingAsset`
    pub fn from_prices(prices: &PriceTable) -> QuantResult<Self> {
        if prices.len() < 2 {
            return Err(QuantError::InsufficientHistory {
                required: 2,
                provided: prices.len(),
                context: "수익률 계산".to_string(),
            });
        }

        for (idx, asset) in prices.assets.iter().enumerate() {
            if prices.rows.iter().all(|row| row[idx].is_none()) {
                return Err(QuantError::MissingAsset {
                    asset: asset.symbol.clone(),
                });
            }
        }

        let rows: Vec<Vec<Option<f64>>> = prices
            .rows
            .windows(2)
            .map(|w| {
                w[0].iter()
                    .zip(w[1].iter())
                    .map(|(prev, cur)| match (prev, cur) {
                        (Some(p0), Some(p1)) if *p0 > 0.0 => Some(p1 / p0 - 1.0),
                        _ => None,
                    })
                    .collect()
            })
            .collect();

        let missing = rows.iter().flatten().filter(|v| v.is_none()).count();
        if missing > 0 {
            tracing::debug!(missing, "Return series contains explicit gaps");
        }

        Ok(Self {
            assets: prices.assets.clone(),
            dates: prices.dates[1..].to_vec(),
            rows,
        })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// 심볼의 열 인덱스를 찾습니다.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.symbol == symbol)
    }

    /// 특정 종목 열을 반환합니다.
    pub fn column(&self, asset_idx: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row[asset_idx]).collect()
    }

    /// 특정 종목의 유효 수익률 개수.
    pub fn valid_count(&self, asset_idx: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row[asset_idx].is_some())
            .count()
    }

    /// 최근 `n`행만 남긴 시계열.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.rows.len().saturating_sub(n);
        Self {
            assets: self.assets.clone(),
            dates: self.dates[start..].to_vec(),
            rows: self.rows[start..].to_vec(),
        }
    }

    /// 주어진 열만 남긴 부분 유니버스 시계열.
    pub fn select(&self, asset_indices: &[usize]) -> QuantResult<Self> {
        if let Some(&bad) = asset_indices.iter().find(|&&i| i >= self.assets.len()) {
            return Err(QuantError::InvalidInput(format!(
                "열 인덱스 {}가 종목 수 {}를 벗어납니다",
                bad,
                self.assets.len()
            )));
        }
        Ok(Self {
            assets: asset_indices
                .iter()
                .map(|&i| self.assets[i].clone())
                .collect(),
            dates: self.dates.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| asset_indices.iter().map(|&i| row[i]).collect())
                .collect(),
        })
    }

    /// 모든 종목에 값이 있는 행만 반환합니다.
    pub fn complete_rows(&self) -> Vec<(NaiveDate, Vec<f64>)> {
        self.dates
            .iter()
            .zip(self.rows.iter())
            .filter_map(|(date, row)| {
                let values: Option<Vec<f64>> = row.iter().copied().collect();
                values.map(|v| (*date, v))
            })
            .collect()
    }

    /// 첫 날짜와 마지막 날짜.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// 에러 메시지용 기간 문자열.
    pub(crate) fn range_label(&self) -> String {
        match self.date_range() {
            Some((start, end)) => format!("{}~{}", start, end),
            None => "빈 구간".to_string(),
        }
    }
}
