//! 매크로 지표 기반 시장 레짐 분류.
//!
//! 환율, 북향자금, 금 가격 세 가지 관측치를 위험 점수 기여분으로 바꾸고,
//! 합산 점수(0~10)로 레짐과 권장 포지션을 결정합니다.
//!
//! | 지표 | 조건 | 점수 |
//! |------|------|------|
//! | 환율 5일 변화 | > 2% | 4 (汇率快速贬值) |
//! | 환율 5일 변화 | > 1% | 2 |
//! | 북향자금 3일 평균 | < −50억 | 4 (北向资金大幅流出) |
//! | 북향자금 3일 평균 | < −20억 | 2 |
//! | 금 5일 변화 | > 2% | 2 (避险情绪升温) |

use quant_core::{
    MacroThresholds, Regime, RegimeConfig, RegimeState, SectorPreferences, MAX_RISK_SCORE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 매크로 위험 요인.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroFactor {
    /// 달러/위안 환율
    Currency,
    /// 북향자금
    NorthboundFlow,
    /// 금 (안전자산 선호)
    Gold,
}

impl fmt::Display for MacroFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency => write!(f, "currency"),
            Self::NorthboundFlow => write!(f, "northbound_flow"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

/// 한 요인의 위험 점수 기여분.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroContribution {
    pub factor: MacroFactor,
    pub points: u8,
    /// 리포트용 사유 (강한 신호에만 존재)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MacroContribution {
    pub fn new(factor: MacroFactor, points: u8) -> Self {
        Self {
            factor,
            points,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// 수집기가 제공하는 매크로 관측치. 값이 없으면 해당 요인은 0점입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicators {
    /// 달러/위안 5일 변화율 (0.02 = 2% 위안 약세)
    pub currency_change_5d: Option<f64>,
    /// 북향자금 최근 3일 평균 순유입 (억 위안)
    pub northbound_flow_3d_avg: Option<f64>,
    /// 금 가격 5일 변화율
    pub gold_change_5d: Option<f64>,
}

/// 매크로 관측치 → 위험 점수 기여분 변환기.
#[derive(Debug, Clone, Default)]
pub struct MacroIndicatorMapper {
    thresholds: MacroThresholds,
}

impl MacroIndicatorMapper {
    pub fn new(thresholds: MacroThresholds) -> Self {
        Self { thresholds }
    }

    /// 0점이 아닌 기여분만 반환합니다.
    pub fn map(&self, indicators: &MacroIndicators) -> Vec<MacroContribution> {
        let t = &self.thresholds;
        let mut contributions = Vec::new();

        if let Some(change) = indicators.currency_change_5d {
            if change > t.currency_fast_change {
                contributions.push(
                    MacroContribution::new(MacroFactor::Currency, 4).with_reason("汇率快速贬值"),
                );
            } else if change > t.currency_mild_change {
                contributions.push(MacroContribution::new(MacroFactor::Currency, 2));
            }
        }

        if let Some(flow) = indicators.northbound_flow_3d_avg {
            if flow < t.north_heavy_outflow {
                contributions.push(
                    MacroContribution::new(MacroFactor::NorthboundFlow, 4)
                        .with_reason("北向资金大幅流出"),
                );
            } else if flow < t.north_outflow {
                contributions.push(MacroContribution::new(MacroFactor::NorthboundFlow, 2));
            }
        }

        if let Some(change) = indicators.gold_change_5d {
            if change > t.gold_surge {
                contributions
                    .push(MacroContribution::new(MacroFactor::Gold, 2).with_reason("避险情绪升温"));
            }
        }

        contributions
    }
}

/// 시장 레짐 분류기.
#[derive(Debug, Clone, Default)]
pub struct MarketRegimeClassifier {
    mapper: MacroIndicatorMapper,
    preferences: SectorPreferences,
}

impl MarketRegimeClassifier {
    pub fn new(config: &RegimeConfig) -> Self {
        Self {
            mapper: MacroIndicatorMapper::new(config.thresholds.clone()),
            preferences: config.sector_preferences.clone(),
        }
    }

    /// 기여분을 합산(0~10으로 제한)해 레짐을 판정합니다.
    pub fn classify(&self, contributions: &[MacroContribution]) -> RegimeState {
        let total: u32 = contributions.iter().map(|c| c.points as u32).sum();
        let score = total.min(MAX_RISK_SCORE as u32) as u8;
        let reasons = contributions
            .iter()
            .filter_map(|c| c.reason.clone())
            .collect();

        let state = RegimeState::from_score(score).with_reasons(reasons);
        tracing::info!(
            risk_score = state.risk_score,
            regime = %state.regime,
            position_pct = %state.recommended_position_pct,
            "Market regime classified"
        );
        state
    }

    /// 관측치에서 바로 레짐을 판정합니다.
    pub fn evaluate(&self, indicators: &MacroIndicators) -> RegimeState {
        let contributions = self.mapper.map(indicators);
        for c in &contributions {
            tracing::debug!(factor = %c.factor, points = c.points, "Macro risk contribution");
        }
        self.classify(&contributions)
    }

    /// 레짐별 추천 섹터 (표시용).
    pub fn preferred_sectors(&self, regime: Regime) -> &[String] {
        self.preferences.for_regime(regime)
    }
}
