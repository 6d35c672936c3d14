//! 로깅 초기화와 실행 단위 span.
//!
//! `[logging]` 설정 섹션으로 전역 subscriber를 한 번 설치합니다.
//! `RUST_LOG`가 있으면 설정 파일의 레벨보다 우선합니다.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::Registry,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;
use crate::error::{QuantError, QuantResult};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 로컬 실행용
    #[default]
    Pretty,
    /// 스케줄러/로그 수집기용
    Json,
    Compact,
}

/// 레벨 필터. `RUST_LOG`가 설정되어 있으면 그 값을 사용합니다.
fn level_filter(level: &str) -> QuantResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| QuantError::Config(format!("로그 레벨 '{}' 해석 실패: {}", level, e)))
}

fn output_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let spans = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let base = fmt::layer().with_target(true).with_span_events(spans);
    match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// 전역 subscriber를 설치합니다.
///
/// 이미 설치되어 있으면 `QuantError::Config`를 반환합니다.
pub fn init_logging(config: &LoggingConfig) -> QuantResult<()> {
    let filter = level_filter(&config.level)?;
    tracing_subscriber::registry()
        .with(output_layer(config))
        .with(filter)
        .try_init()
        .map_err(|e| QuantError::Config(format!("로깅 초기화 실패: {}", e)))?;

    tracing::info!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// 실행 단위(최적화 1회, 스캔 1일)의 공통 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! run_span {
    ($name:expr, $date:expr) => {
        tracing::info_span!($name, date = %$date)
    };
    ($name:expr, $date:expr, $universe:expr) => {
        tracing::info_span!($name, date = %$date, universe = $universe)
    };
}
