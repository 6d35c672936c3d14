//! 설정 관리.
//!
//! 모든 컴포넌트는 전역 상태 대신 이 모듈의 불변 설정 값을 인자로 받습니다.
//! 파일(TOML)과 환경 변수(`QUANT__...`)에서 로드할 수 있으며,
//! 각 섹션은 문서화된 기본값을 가집니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::Regime;
use crate::error::{QuantError, QuantResult};
use crate::logging::LogFormat;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuantConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 포트폴리오 최적화 설정
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    /// 이벤트(涨停) 스캔 설정
    #[serde(default)]
    pub event: EventScanConfig,
    /// 시장 레짐 설정
    #[serde(default)]
    pub regime: RegimeConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 레벨 필터 (예: "info", "info,quant_portfolio=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력 여부
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            span_events: false,
        }
    }
}

// ==================== 포트폴리오 ====================

/// 포트폴리오 최적화 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortfolioConfig {
    /// 비중 제약 조건
    #[serde(default)]
    pub constraints: ConstraintConfig,
    /// 공분산 추정 기간 (최근 N행, None이면 전체)
    #[serde(default)]
    pub lookback_days: Option<usize>,
    /// 연간 거래일 수 (연율화 계산용, 기본값: 252)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// 연간 무위험 이자율 (기본값: 2.5%)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// QP 솔버 설정
    #[serde(default)]
    pub solver: SolverConfig,
    /// 유니버스 추세 필터 설정
    #[serde(default)]
    pub trend_filter: TrendFilterConfig,
}

/// 비중 제약 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConstraintConfig {
    /// 종목별 최대 비중 (기본값: 0.20)
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    /// 종목별 최소 비중 (기본값: 0.02)
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    /// 섹터별 비중 상한 (섹터명 → 상한)
    #[serde(default)]
    pub sector_limits: HashMap<String, f64>,
    /// 목표 수익률 (연율, 설정 시 목표수익 모드)
    #[serde(default)]
    pub target_return: Option<f64>,
    /// 위험회피 계수 (target_return 미설정 시에만 사용)
    #[serde(default)]
    pub risk_aversion: Option<f64>,
    /// 종목별 비중 범위 (전역 범위 재정의)
    #[serde(default)]
    pub asset_bounds: HashMap<String, AssetBoundsConfig>,
}

/// 종목별 비중 범위 재정의.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssetBoundsConfig {
    /// 이 종목의 최소 비중
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_weight: Option<f64>,
    /// 이 종목의 최대 비중
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,
}

/// QP 솔버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverConfig {
    /// 최대 반복 횟수
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    /// 수렴 허용 오차
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// 이동평균 기반 유니버스 추세 필터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendFilterConfig {
    /// 필터 활성화 여부 (기본값: false)
    #[serde(default)]
    pub enabled: bool,
    /// 이동평균 기간 (기본값: 250)
    #[serde(default = "default_ma_period")]
    pub ma_period: usize,
    /// 이동평균 기울기 계산 구간 (기본값: 20)
    #[serde(default = "default_slope_window")]
    pub slope_window: usize,
    /// 강한 추세로 판단하는 기울기 (기본값: 0.001)
    #[serde(default = "default_strong_slope")]
    pub strong_slope: f64,
    /// 최소 유효 수익률 개수 (기본값: 250)
    #[serde(default = "default_min_history")]
    pub min_history: usize,
}

// ==================== 이벤트 스캔 ====================

/// 이벤트(涨停) 스캔 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventScanConfig {
    /// 핫 섹터로 판정하는 최소 涨停 수 (기본값: 5)
    #[serde(default = "default_min_zt_count")]
    pub min_zt_count: usize,
    /// 열기 히스토리 보관 일수 (기본값: 20)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: usize,
    /// 섹터 최소 상장 종목 수 (기본값: 10)
    #[serde(default = "default_min_industry_stocks")]
    pub min_industry_stocks: usize,
    /// 상관계수 롤링 구간 (기본값: 10)
    #[serde(default = "default_correlation_window")]
    pub correlation_window: usize,
    /// 유효 판정 승률 기준 (기본값: 0.6)
    #[serde(default = "default_win_rate_threshold")]
    pub win_rate_threshold: f64,
    /// 유효 판정 평균 수익률 기준 (기본값: 0.005)
    #[serde(default = "default_avg_return_threshold")]
    pub avg_return_threshold: f64,
    /// 선행 수익률 기간 N일 (기본값: 1)
    #[serde(default = "default_forward_days")]
    pub forward_days: usize,
    /// 연속성 연구에 사용할 涨停 수 임계값들
    #[serde(default = "default_study_thresholds")]
    pub study_thresholds: Vec<usize>,
}

// ==================== 시장 레짐 ====================

/// 시장 레짐 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegimeConfig {
    /// 매크로 지표 위험 임계값
    #[serde(default)]
    pub thresholds: MacroThresholds,
    /// 레짐별 추천 섹터 (표시용)
    #[serde(default)]
    pub sector_preferences: SectorPreferences,
}

/// 매크로 지표를 위험 점수로 변환하는 임계값.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MacroThresholds {
    /// 환율 5일 급변 기준 (+4점, 기본값: 0.02)
    #[serde(default = "default_currency_fast")]
    pub currency_fast_change: f64,
    /// 환율 5일 변동 기준 (+2점, 기본값: 0.01)
    #[serde(default = "default_currency_mild")]
    pub currency_mild_change: f64,
    /// 북향자금 3일 평균 대규모 유출 기준 (억 위안, +4점, 기본값: -50)
    #[serde(default = "default_north_heavy_outflow")]
    pub north_heavy_outflow: f64,
    /// 북향자금 3일 평균 유출 기준 (억 위안, +2점, 기본값: -20)
    #[serde(default = "default_north_outflow")]
    pub north_outflow: f64,
    /// 금 5일 급등 기준 (+2점, 기본값: 0.02)
    #[serde(default = "default_gold_surge")]
    pub gold_surge: f64,
}

/// 레짐별 추천 섹터 테이블. 빠진 레짐은 기본 목록을 사용합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SectorPreferences {
    /// 공격 레짐 추천 섹터
    pub aggressive: Vec<String>,
    /// 중립 레짐 추천 섹터
    pub neutral: Vec<String>,
    /// 방어 레짐 추천 섹터
    pub defensive: Vec<String>,
}

// 기본값 함수들
fn default_periods_per_year() -> u32 {
    252
}

fn default_risk_free_rate() -> f64 {
    0.025
}

fn default_max_weight() -> f64 {
    0.20
}

fn default_min_weight() -> f64 {
    0.02
}

fn default_max_iter() -> u32 {
    200
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_ma_period() -> usize {
    250
}

fn default_slope_window() -> usize {
    20
}

fn default_strong_slope() -> f64 {
    0.001
}

fn default_min_history() -> usize {
    250
}

fn default_min_zt_count() -> usize {
    5
}

fn default_lookback_days() -> usize {
    20
}

fn default_min_industry_stocks() -> usize {
    10
}

fn default_correlation_window() -> usize {
    10
}

fn default_win_rate_threshold() -> f64 {
    0.6
}

fn default_avg_return_threshold() -> f64 {
    0.005
}

fn default_forward_days() -> usize {
    1
}

fn default_study_thresholds() -> Vec<usize> {
    vec![3, 5, 8, 10]
}

fn default_currency_fast() -> f64 {
    0.02
}

fn default_currency_mild() -> f64 {
    0.01
}

fn default_north_heavy_outflow() -> f64 {
    -50.0
}

fn default_north_outflow() -> f64 {
    -20.0
}

fn default_gold_surge() -> f64 {
    0.02
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            constraints: ConstraintConfig::default(),
            lookback_days: None,
            periods_per_year: default_periods_per_year(),
            risk_free_rate: default_risk_free_rate(),
            solver: SolverConfig::default(),
            trend_filter: TrendFilterConfig::default(),
        }
    }
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            max_weight: default_max_weight(),
            min_weight: default_min_weight(),
            sector_limits: HashMap::new(),
            target_return: None,
            risk_aversion: None,
            asset_bounds: HashMap::new(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for TrendFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ma_period: default_ma_period(),
            slope_window: default_slope_window(),
            strong_slope: default_strong_slope(),
            min_history: default_min_history(),
        }
    }
}

impl Default for EventScanConfig {
    fn default() -> Self {
        Self {
            min_zt_count: default_min_zt_count(),
            lookback_days: default_lookback_days(),
            min_industry_stocks: default_min_industry_stocks(),
            correlation_window: default_correlation_window(),
            win_rate_threshold: default_win_rate_threshold(),
            avg_return_threshold: default_avg_return_threshold(),
            forward_days: default_forward_days(),
            study_thresholds: default_study_thresholds(),
        }
    }
}

impl Default for MacroThresholds {
    fn default() -> Self {
        Self {
            currency_fast_change: default_currency_fast(),
            currency_mild_change: default_currency_mild(),
            north_heavy_outflow: default_north_heavy_outflow(),
            north_outflow: default_north_outflow(),
            gold_surge: default_gold_surge(),
        }
    }
}

impl Default for SectorPreferences {
    fn default() -> Self {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            aggressive: to_vec(&["科技", "新能源", "消费", "券商"]),
            neutral: to_vec(&["中特估", "高股息", "半导体"]),
            defensive: to_vec(&["黄金", "军工", "医药", "公用事业"]),
        }
    }
}

impl SectorPreferences {
    /// 레짐에 해당하는 추천 섹터 목록을 반환합니다.
    pub fn for_regime(&self, regime: Regime) -> &[String] {
        match regime {
            Regime::Aggressive => &self.aggressive,
            Regime::Neutral => &self.neutral,
            Regime::Defensive => &self.defensive,
        }
    }
}

impl ConstraintConfig {
    /// 설정값 자체의 모순을 검사합니다.
    ///
    /// 유니버스에 의존하는 실현 가능성(최소 비중 합 등)은
    /// 제약 집합을 구성할 때 별도로 검사합니다.
    pub fn validate(&self) -> QuantResult<()> {
        if self.target_return.is_some() && self.risk_aversion.is_some() {
            return Err(QuantError::Config(
                "target_return과 risk_aversion은 동시에 설정할 수 없습니다".to_string(),
            ));
        }
        if let Some(lambda) = self.risk_aversion {
            if !lambda.is_finite() || lambda < 0.0 {
                return Err(QuantError::Config(format!(
                    "risk_aversion은 0 이상이어야 합니다: {}",
                    lambda
                )));
            }
        }
        if let Some(target) = self.target_return {
            if !target.is_finite() {
                return Err(QuantError::Config(format!(
                    "target_return이 유효하지 않습니다: {}",
                    target
                )));
            }
        }
        for (sector, ceiling) in &self.sector_limits {
            if !(0.0..=1.0).contains(ceiling) {
                return Err(QuantError::Config(format!(
                    "섹터 {} 한도는 0~1 범위여야 합니다: {}",
                    sector, ceiling
                )));
            }
        }
        Ok(())
    }
}

impl EventScanConfig {
    /// 스캔 설정값을 검사합니다.
    pub fn validate(&self) -> QuantResult<()> {
        if self.correlation_window < 2 {
            return Err(QuantError::Config(format!(
                "correlation_window는 2 이상이어야 합니다: {}",
                self.correlation_window
            )));
        }
        if self.lookback_days == 0 {
            return Err(QuantError::Config("lookback_days는 1 이상이어야 합니다".to_string()));
        }
        if !(0.0..=1.0).contains(&self.win_rate_threshold) {
            return Err(QuantError::Config(format!(
                "win_rate_threshold는 0~1 범위여야 합니다: {}",
                self.win_rate_threshold
            )));
        }
        Ok(())
    }
}

impl QuantConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `QUANT__PORTFOLIO__CONSTRAINTS__MAX_WEIGHT=0.25` 형식으로 재정의합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> QuantResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUANT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: QuantConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> QuantResult<Self> {
        Self::load("config/default.toml")
    }

    /// `[logging]` 섹션으로 전역 로깅을 설치합니다. 프로세스당 한 번 호출합니다.
    pub fn init_logging(&self) -> QuantResult<()> {
        crate::logging::init_logging(&self.logging)
    }

    /// 모든 섹션을 검사합니다.
    pub fn validate(&self) -> QuantResult<()> {
        self.portfolio.constraints.validate()?;
        self.event.validate()?;
        if self.portfolio.periods_per_year == 0 {
            return Err(QuantError::Config("periods_per_year는 1 이상이어야 합니다".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = QuantConfig::default();
        assert_eq!(cfg.portfolio.constraints.max_weight, 0.20);
        assert_eq!(cfg.portfolio.constraints.min_weight, 0.02);
        assert_eq!(cfg.portfolio.periods_per_year, 252);
        assert_eq!(cfg.event.min_zt_count, 5);
        assert_eq!(cfg.event.lookback_days, 20);
        assert_eq!(cfg.event.min_industry_stocks, 10);
        assert_eq!(cfg.event.correlation_window, 10);
        assert_eq!(cfg.event.win_rate_threshold, 0.6);
        assert_eq!(cfg.event.avg_return_threshold, 0.005);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_target_and_risk_aversion_are_exclusive() {
        let cfg = ConstraintConfig {
            target_return: Some(0.08),
            risk_aversion: Some(2.0),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(QuantError::Config(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: QuantConfig = toml::from_str(
            r#"
            [portfolio.constraints]
            max_weight = 0.3

            [portfolio.constraints.sector_limits]
            "银行" = 0.25

            [event]
            min_zt_count = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.portfolio.constraints.max_weight, 0.3);
        assert_eq!(cfg.portfolio.constraints.min_weight, 0.02);
        assert_eq!(cfg.portfolio.constraints.sector_limits["银行"], 0.25);
        assert_eq!(cfg.event.min_zt_count, 3);
        assert_eq!(cfg.event.correlation_window, 10);
    }

    #[test]
    fn test_sector_preferences_by_regime() {
        let prefs = SectorPreferences::default();
        assert!(prefs.for_regime(Regime::Defensive).contains(&"黄金".to_string()));
        assert!(prefs.for_regime(Regime::Aggressive).contains(&"券商".to_string()));
        assert_eq!(prefs.for_regime(Regime::Neutral).len(), 3);
    }

    #[test]
    fn test_event_config_rejects_tiny_window() {
        let cfg = EventScanConfig {
            correlation_window: 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_sector_preferences_keep_defaults() {
        let cfg: QuantConfig = toml::from_str(
            r#"
            [regime.sector_preferences]
            defensive = ["黄金", "电力"]
            "#,
        )
        .unwrap();
        let prefs = &cfg.regime.sector_preferences;
        assert_eq!(prefs.for_regime(Regime::Defensive), &["黄金", "电力"]);
        assert_eq!(prefs.for_regime(Regime::Neutral), &["中特估", "高股息", "半导体"]);
        assert_eq!(prefs.aggressive.len(), 4);
    }
}
