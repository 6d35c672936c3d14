//! 섹터 강도 점수.
//!
//! # 계산 공식
//!
//! `strength = 0.5·min(count/10, 1) + 0.3·[대장주 硬板] + 0.2·[다수결 추세 상승]`
//!
//! 점수가 0.5 이상이면 관심(关注), 미만이면 관망(观望)입니다.

use quant_core::{Signal, SignalLabel, TrendDirection};

use crate::sector_heat::SectorHeat;

/// 涨停 수 항목이 만점이 되는 종목 수.
const SATURATION_COUNT: f64 = 10.0;

const COUNT_WEIGHT: f64 = 0.5;
const LEADER_WEIGHT: f64 = 0.3;
const TREND_WEIGHT: f64 = 0.2;

/// 관심 라벨 기준 점수.
pub const WATCH_THRESHOLD: f64 = 0.5;

/// 강도 점수 계산 (0.0 ~ 1.0).
pub fn strength_score(count: usize, leader_hard_limit: bool, trend: TrendDirection) -> f64 {
    let breadth = (count as f64 / SATURATION_COUNT).min(1.0);
    let leader = if leader_hard_limit { 1.0 } else { 0.0 };
    let momentum = if trend == TrendDirection::Up { 1.0 } else { 0.0 };

    (COUNT_WEIGHT * breadth + LEADER_WEIGHT * leader + TREND_WEIGHT * momentum).clamp(0.0, 1.0)
}

/// 핫 섹터를 신호로 변환하는 채점기. 상태가 없습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrengthScorer;

impl StrengthScorer {
    pub fn new() -> Self {
        Self
    }

    /// 섹터 열기 하나를 채점합니다.
    pub fn score(&self, heat: &SectorHeat) -> Signal {
        let strength = strength_score(heat.count, heat.leader_hard_limit, heat.dominant_trend);
        let label = if strength >= WATCH_THRESHOLD {
            SignalLabel::Watch
        } else {
            SignalLabel::HoldOff
        };

        let reason = match &heat.leader {
            Some(leader) => format!("涨停{}家，龙头{}", heat.count, leader),
            None => format!("涨停{}家", heat.count),
        };

        Signal {
            sector: heat.sector.clone(),
            date: heat.date,
            strength_score: strength,
            label,
            reason,
        }
    }

    /// 여러 섹터를 입력 순서대로 채점합니다.
    pub fn score_all(&self, heats: &[SectorHeat]) -> Vec<Signal> {
        let signals: Vec<Signal> = heats.iter().map(|h| self.score(h)).collect();
        for s in &signals {
            tracing::debug!(
                sector = %s.sector,
                strength = s.strength_score,
                label = s.label.label_zh(),
                "Sector signal"
            );
        }
        tracing::debug!(
            signals = signals.len(),
            watch = signals.iter().filter(|s| s.is_watch()).count(),
            "Scored hot sectors"
        );
        signals
    }
}
