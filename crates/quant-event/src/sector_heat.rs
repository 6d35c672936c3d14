//! 섹터 열기(热度) 집계.
//!
//! 하루치 涨停 이벤트를 섹터별로 묶어 핫 섹터를 찾습니다.
//!
//! # 처리 순서
//!
//! 1. 섹터별 그룹화 (다른 날짜 이벤트는 입력 오류)
//! 2. 상장 종목 수가 `min_industry_stocks` 미만인 섹터 제외 (알 수 없는 섹터는 0개로 간주)
//! 3. 섹터별 涨停 수, 대장주 硬板 여부, 다수결 추세 계산 (동률은 Up > Flat > Down)
//! 4. `count ≥ min_zt_count`인 섹터만 남기고 수 내림차순, 섹터명 오름차순 정렬

use chrono::NaiveDate;
use quant_core::{EventScanConfig, LimitUpEvent, QuantError, QuantResult, TrendDirection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 하루 동안 한 섹터의 열기.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorHeat {
    /// 섹터명
    pub sector: String,
    /// 거래일
    pub date: NaiveDate,
    /// 涨停 종목 수
    pub count: usize,
    /// 대장주 중 硬板이 있는지 여부
    pub leader_hard_limit: bool,
    /// 다수결 추세
    pub dominant_trend: TrendDirection,
    /// 대장주 심볼 (硬板 대장주 우선)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
}

/// 섹터 열기 집계기.
#[derive(Debug, Clone)]
pub struct SectorHeatAggregator {
    min_zt_count: usize,
    min_industry_stocks: usize,
}

impl Default for SectorHeatAggregator {
    fn default() -> Self {
        Self::new(&EventScanConfig::default())
    }
}

impl SectorHeatAggregator {
    pub fn new(config: &EventScanConfig) -> Self {
        Self {
            min_zt_count: config.min_zt_count,
            min_industry_stocks: config.min_industry_stocks,
        }
    }

    /// 하루치 이벤트에서 핫 섹터를 집계합니다.
    ///
    /// # 인자
    ///
    /// * `date` - 스캔 거래일
    /// * `events` - 해당일 涨停 이벤트
    /// * `membership` - 섹터명 → 상장 종목 수
    pub fn aggregate(
        &self,
        date: NaiveDate,
        events: &[LimitUpEvent],
        membership: &HashMap<String, usize>,
    ) -> QuantResult<Vec<SectorHeat>> {
        let groups = group_by_sector(date, events)?;

        let sized: Vec<(&str, Vec<&LimitUpEvent>)> = groups
            .into_iter()
            .filter(|(sector, _)| {
                let members = membership.get(*sector).copied().unwrap_or(0);
                if members < self.min_industry_stocks {
                    tracing::debug!(
                        sector = %sector,
                        members,
                        "Skipping sector below minimum size"
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        let mut heats: Vec<SectorHeat> = sized
            .into_iter()
            .map(|(sector, group)| summarize(sector, date, &group))
            .filter(|heat| heat.count >= self.min_zt_count)
            .collect();

        heats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sector.cmp(&b.sector)));

        tracing::info!(
            date = %date,
            events = events.len(),
            hot_sectors = heats.len(),
            "Sector heat aggregated"
        );

        Ok(heats)
    }
}

/// 필터 없이 섹터별 涨停 수를 셉니다. 열기 히스토리에 기록되는 값입니다.
///
/// 다른 날짜 이벤트가 섞여 있으면 `InvalidInput`.
pub fn count_by_sector(
    date: NaiveDate,
    events: &[LimitUpEvent],
) -> QuantResult<BTreeMap<String, usize>> {
    Ok(group_by_sector(date, events)?
        .into_iter()
        .map(|(sector, group)| (sector.to_string(), group.len()))
        .collect())
}

fn group_by_sector(
    date: NaiveDate,
    events: &[LimitUpEvent],
) -> QuantResult<BTreeMap<&str, Vec<&LimitUpEvent>>> {
    if let Some(stray) = events.iter().find(|e| e.date != date) {
        return Err(QuantError::InvalidInput(format!(
            "{} 스캔에 다른 날짜({})의 이벤트가 포함되어 있습니다: {}",
            date, stray.date, stray.asset
        )));
    }

    let mut groups: BTreeMap<&str, Vec<&LimitUpEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.sector.as_str()).or_default().push(event);
    }
    Ok(groups)
}

/// 한 섹터의 이벤트를 요약합니다.
fn summarize(sector: &str, date: NaiveDate, group: &[&LimitUpEvent]) -> SectorHeat {
    let leader_hard_limit = group.iter().any(|e| e.is_hard_limit_leader());
    let leader = group
        .iter()
        .find(|e| e.is_hard_limit_leader())
        .or_else(|| group.iter().find(|e| e.is_leader_stock))
        .map(|e| e.asset.clone());

    SectorHeat {
        sector: sector.to_string(),
        date,
        count: group.len(),
        leader_hard_limit,
        dominant_trend: dominant_trend(group),
        leader,
    }
}

/// 다수결 추세. 동률이면 Up, Flat, Down 순으로 우선합니다.
pub fn dominant_trend(group: &[&LimitUpEvent]) -> TrendDirection {
    let votes = |dir: TrendDirection| group.iter().filter(|e| e.recent_trend == dir).count();
    [TrendDirection::Up, TrendDirection::Flat, TrendDirection::Down]
        .into_iter()
        .max_by_key(|dir| (votes(*dir), dir.tie_break_rank()))
        .unwrap_or(TrendDirection::Flat)
}
