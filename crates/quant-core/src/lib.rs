//! # Quant Core
//!
//! 자산배분 최적화기와 涨停 이벤트 스캐너가 공유하는 핵심 타입을 제공합니다:
//! - 자산 식별자
//! - 涨停 이벤트, 섹터 신호, 시장 레짐 도메인 모델
//! - 에러 분류
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
