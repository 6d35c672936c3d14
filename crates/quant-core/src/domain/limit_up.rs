//! 涨停(상한가) 이벤트.
//!
//! 외부 수집기가 하루치 涨停 종목 테이블을 이 타입의 행으로 공급합니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 종목의 최근 단기 추세 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// 상승
    Up,
    /// 횡보
    Flat,
    /// 하락
    Down,
}

impl TrendDirection {
    /// 다수결 동률 시 우선순위 (높을수록 우선).
    pub fn tie_break_rank(self) -> u8 {
        match self {
            Self::Up => 3,
            Self::Flat => 2,
            Self::Down => 1,
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Up => "UP",
            Self::Flat => "FLAT",
            Self::Down => "DOWN",
        };
        write!(f, "{}", s)
    }
}

/// 하루 동안 상한가에 도달한 종목 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitUpEvent {
    /// 거래일
    pub date: NaiveDate,
    /// 종목 심볼
    pub asset: String,
    /// 소속 섹터(행업)
    pub sector: String,
    /// 섹터 대장주 여부
    pub is_leader_stock: bool,
    /// 한도(硬板)까지 밀어붙였는지 여부
    pub is_hard_limit: bool,
    /// 최근 추세
    pub recent_trend: TrendDirection,
}

impl LimitUpEvent {
    /// 일반 종목(대장주 아님) 이벤트를 생성합니다.
    pub fn new(
        date: NaiveDate,
        asset: impl Into<String>,
        sector: impl Into<String>,
        recent_trend: TrendDirection,
    ) -> Self {
        Self {
            date,
            asset: asset.into(),
            sector: sector.into(),
            is_leader_stock: false,
            is_hard_limit: false,
            recent_trend,
        }
    }

    /// 대장주로 표시합니다.
    pub fn leader(mut self, hard_limit: bool) -> Self {
        self.is_leader_stock = true;
        self.is_hard_limit = hard_limit;
        self
    }

    /// 대장주이면서 硬板인지 확인합니다.
    pub fn is_hard_limit_leader(&self) -> bool {
        self.is_leader_stock && self.is_hard_limit
    }
}
