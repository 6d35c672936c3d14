//! 섹터 열기 히스토리.
//!
//! 날짜별 섹터 涨停 수를 최근 `lookback_days` 거래일만큼 보관합니다.
//! 핫 섹터 필터 이전의 전체 집계를 기록하므로 `min_zt_count` 미만인 날도 포함됩니다.
//! 연속성 연구([`crate::backtest::ThresholdStudy`])의 입력이 됩니다.

use chrono::NaiveDate;
use quant_core::{EventScanConfig, LimitUpEvent, QuantResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sector_heat::count_by_sector;

/// 히스토리 한 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatRecord {
    pub date: NaiveDate,
    pub sector: String,
    pub limit_up_count: usize,
}

/// 롤링 섹터 열기 테이블.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorHeatHistory {
    lookback_days: usize,
    /// 날짜 → (섹터 → 涨停 수)
    days: BTreeMap<NaiveDate, BTreeMap<String, usize>>,
}

impl SectorHeatHistory {
    pub fn new(lookback_days: usize) -> Self {
        Self {
            lookback_days: lookback_days.max(1),
            days: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &EventScanConfig) -> Self {
        Self::new(config.lookback_days)
    }

    /// 하루치 섹터별 涨停 수를 추가합니다.
    ///
    /// 같은 날짜를 다시 추가하면 해당 날짜를 대체합니다.
    /// 보관 기간을 넘는 오래된 날짜는 제거됩니다.
    pub fn record_day<I, S>(&mut self, date: NaiveDate, counts: I)
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let day: BTreeMap<String, usize> = counts
            .into_iter()
            .map(|(sector, count)| (sector.into(), count))
            .collect();
        self.days.insert(date, day);

        while self.days.len() > self.lookback_days {
            if let Some((&oldest, _)) = self.days.iter().next() {
                self.days.remove(&oldest);
                tracing::debug!(date = %oldest, "Evicted heat history day");
            }
        }
    }

    /// 하루치 涨停 이벤트를 섹터별로 세어 추가합니다.
    pub fn record_events(&mut self, date: NaiveDate, events: &[LimitUpEvent]) -> QuantResult<()> {
        let counts = count_by_sector(date, events)?;
        self.record_day(date, counts);
        Ok(())
    }

    /// 보관 중인 거래일 수.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    /// 섹터의 날짜별 涨停 수 (기록이 없는 날은 0).
    pub fn sector_series(&self, sector: &str) -> Vec<(NaiveDate, usize)> {
        self.days
            .iter()
            .map(|(date, counts)| (*date, counts.get(sector).copied().unwrap_or(0)))
            .collect()
    }

    /// 전체 행 (날짜, 섹터 순).
    pub fn records(&self) -> Vec<HeatRecord> {
        self.days
            .iter()
            .flat_map(|(date, counts)| {
                counts.iter().map(move |(sector, count)| HeatRecord {
                    date: *date,
                    sector: sector.clone(),
                    limit_up_count: *count,
                })
            })
            .collect()
    }
}
