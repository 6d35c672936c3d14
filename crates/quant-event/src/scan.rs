//! 일일 스캔 흐름.
//!
//! 집계, 채점, 히스토리 기록을 한 번에 수행합니다.

use chrono::NaiveDate;
use quant_core::{run_span, EventScanConfig, LimitUpEvent, QuantResult, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::heat_history::SectorHeatHistory;
use crate::sector_heat::{count_by_sector, SectorHeat, SectorHeatAggregator};
use crate::strength::StrengthScorer;

/// 하루 스캔 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScan {
    pub date: NaiveDate,
    /// 필터 이전 섹터별 涨停 수
    pub sector_counts: BTreeMap<String, usize>,
    pub hot_sectors: Vec<SectorHeat>,
    pub signals: Vec<Signal>,
}

impl DailyScan {
    /// 관심 라벨 신호만.
    pub fn watch_signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.is_watch())
    }
}

/// 涨停 이벤트 스캐너.
///
/// 열기 히스토리만 상태로 가지며, 날짜마다 [`EventScanner::scan_day`]를 한 번 호출합니다.
#[derive(Debug, Clone)]
pub struct EventScanner {
    aggregator: SectorHeatAggregator,
    scorer: StrengthScorer,
    history: SectorHeatHistory,
}

impl EventScanner {
    pub fn new(config: &EventScanConfig) -> Self {
        Self {
            aggregator: SectorHeatAggregator::new(config),
            scorer: StrengthScorer::new(),
            history: SectorHeatHistory::from_config(config),
        }
    }

    /// 하루치 이벤트를 스캔합니다.
    ///
    /// 히스토리에는 핫 섹터만이 아니라 그날의 전체 섹터별 涨停 수를 기록합니다.
    pub fn scan_day(
        &mut self,
        date: NaiveDate,
        events: &[LimitUpEvent],
        membership: &HashMap<String, usize>,
    ) -> QuantResult<DailyScan> {
        let span = run_span!("event_scan", date);
        let _guard = span.enter();

        let hot_sectors = self
            .aggregator
            .aggregate(date, events, membership)
            .inspect_err(|e| {
                tracing::warn!(error = %e, data_error = e.is_data_error(), "Daily scan rejected")
            })?;
        let signals = self.scorer.score_all(&hot_sectors);
        let sector_counts = count_by_sector(date, events)?;
        self.history.record_day(date, sector_counts.clone());

        Ok(DailyScan {
            date,
            sector_counts,
            hot_sectors,
            signals,
        })
    }

    pub fn history(&self) -> &SectorHeatHistory {
        &self.history
    }
}
