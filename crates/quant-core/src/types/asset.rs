//! 자산(종목) 식별자.
//!
//! 거래소가 포함된 심볼(`600519.SH`)과 선택적 섹터 태그로 구성됩니다.
//! 한번 로드된 자산은 변경되지 않습니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 유니버스를 구성하는 자산.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// 거래소 포함 심볼 (예: "600519.SH")
    pub symbol: String,
    /// 섹터 태그 (선택)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl Asset {
    /// 섹터 없이 새 자산을 생성합니다. 심볼은 대문자로 정규화됩니다.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            sector: None,
        }
    }

    /// 섹터 태그를 설정합니다.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_creation() {
        let asset = Asset::new("600519.sh").with_sector("白酒");
        assert_eq!(asset.symbol, "600519.SH");
        assert_eq!(asset.sector.as_deref(), Some("白酒"));
        assert_eq!(asset.to_string(), "600519.SH");
    }

    #[test]
    fn test_sector_is_omitted_when_absent() {
        let json = serde_json::to_value(Asset::new("510300.sh")).unwrap();
        assert_eq!(json["symbol"], "510300.SH");
        assert!(json.get("sector").is_none());
    }
}
