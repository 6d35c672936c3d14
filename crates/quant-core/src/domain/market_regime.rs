//! Regime - 매크로 위험 기반 시장 레짐.
//!
//! 환율, 북향자금, 안전자산 추세를 합산한 위험 점수(0~10)를
//! 세 단계 레짐과 권장 포지션 비율로 매핑합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 위험 점수 상한.
pub const MAX_RISK_SCORE: u8 = 10;

/// 시장 레짐.
///
/// # 상태 설명
///
/// - **Aggressive**: 위험 점수 0~2, 포지션 100%
/// - **Neutral**: 위험 점수 3~5, 포지션 70%
/// - **Defensive**: 위험 점수 6~10, 포지션 40%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    /// 공격
    Aggressive,
    /// 중립
    Neutral,
    /// 방어
    Defensive,
}

impl Regime {
    /// 위험 점수로부터 레짐을 판정합니다. 10 초과 점수는 10으로 간주합니다.
    pub fn from_score(risk_score: u8) -> Self {
        match risk_score.min(MAX_RISK_SCORE) {
            0..=2 => Self::Aggressive,
            3..=5 => Self::Neutral,
            _ => Self::Defensive,
        }
    }

    /// 권장 포지션 비율 (1.0 = 100%).
    pub fn position_pct(self) -> Decimal {
        match self {
            Self::Aggressive => dec!(1.0),
            Self::Neutral => dec!(0.7),
            Self::Defensive => dec!(0.4),
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Aggressive => "AGGRESSIVE",
            Self::Neutral => "NEUTRAL",
            Self::Defensive => "DEFENSIVE",
        };
        write!(f, "{}", s)
    }
}

/// 한 번의 실행에서 계산된 레짐 상태.
///
/// 실행마다 새로 계산되며 히스토리 저장은 수집기 쪽 책임입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    /// 위험 점수 (0 ~ 10)
    pub risk_score: u8,
    /// 레짐
    pub regime: Regime,
    /// 권장 포지션 비율 (1.0 = 100%)
    pub recommended_position_pct: Decimal,
    /// 점수를 올린 위험 요인
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl RegimeState {
    /// 위험 점수에서 상태를 생성합니다.
    pub fn from_score(risk_score: u8) -> Self {
        let risk_score = risk_score.min(MAX_RISK_SCORE);
        let regime = Regime::from_score(risk_score);
        Self {
            risk_score,
            regime,
            recommended_position_pct: regime.position_pct(),
            reasons: Vec::new(),
        }
    }

    /// 위험 요인 설명을 붙입니다.
    pub fn with_reasons(mut self, reasons: Vec<String>) -> Self {
        self.reasons = reasons;
        self
    }

    /// 요약 문자열 생성 (로그/알림용).
    ///
    /// ```text
    /// 시장 레짐: NEUTRAL
    /// 위험 점수: 4/10
    /// 권장 포지션: 70%
    /// 위험 요인: 北向资金大幅流出
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "시장 레짐: {}\n위험 점수: {}/{}\n권장 포지션: {}%\n위험 요인: {}",
            self.regime,
            self.risk_score,
            MAX_RISK_SCORE,
            (self.recommended_position_pct * dec!(100)).normalize(),
            if self.reasons.is_empty() {
                "없음".to_string()
            } else {
                self.reasons.join(", ")
            }
        )
    }
}
