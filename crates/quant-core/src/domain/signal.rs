//! 섹터 열기(热度) 신호.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 신호 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLabel {
    /// 관심 (关注)
    Watch,
    /// 관망 (观望)
    HoldOff,
}

impl SignalLabel {
    /// 리포트용 중국어 라벨.
    pub fn label_zh(self) -> &'static str {
        match self {
            Self::Watch => "关注",
            Self::HoldOff => "观望",
        }
    }

    /// 매수 관심 대상 여부.
    pub fn is_actionable(self) -> bool {
        matches!(self, Self::Watch)
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watch => write!(f, "WATCH"),
            Self::HoldOff => write!(f, "HOLD_OFF"),
        }
    }
}

/// 핫 섹터 하나에 대한 일일 신호.
///
/// `SectorHeat`에서 결정적으로 파생되며 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// 섹터명
    pub sector: String,
    /// 거래일
    pub date: NaiveDate,
    /// 강도 점수 (0.0 ~ 1.0)
    pub strength_score: f64,
    /// 라벨
    pub label: SignalLabel,
    /// 사유 (예: "涨停6家，龙头002230.SZ")
    pub reason: String,
}

impl Signal {
    /// 매수 관심 신호인지 확인합니다.
    pub fn is_watch(&self) -> bool {
        self.label.is_actionable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_text() {
        assert_eq!(SignalLabel::Watch.label_zh(), "关注");
        assert_eq!(SignalLabel::HoldOff.label_zh(), "观望");
        assert_eq!(SignalLabel::HoldOff.to_string(), "HOLD_OFF");
    }

    #[test]
    fn test_signal_serialization() {
        let signal = Signal {
            sector: "半导体".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            strength_score: 0.8,
            label: SignalLabel::Watch,
            reason: "涨停6家".to_string(),
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["label"], "watch");
        assert_eq!(json["date"], "2024-05-06");
        assert!(signal.is_watch());
    }
}
