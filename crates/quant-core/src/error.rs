//! 퀀트 엔진의 에러 타입.
//!
//! 최적화, 성과 분석, 이벤트 스캔 전반에서 사용되는 에러 분류를 정의합니다.
//! 모든 에러는 문제가 된 입력(종목, 섹터, 기간)을 메시지에 포함합니다.

use thiserror::Error;

/// 핵심 퀀트 엔진 에러.
#[derive(Debug, Error)]
pub enum QuantError {
    /// 수익률/공분산 계산에 필요한 데이터 행이 부족함
    #[error("히스토리 부족 ({context}): 최소 {required}행 필요, {provided}행 제공")]
    InsufficientHistory {
        required: usize,
        provided: usize,
        context: String,
    },

    /// 유니버스 종목의 데이터가 전혀 없음
    #[error("종목 데이터 누락: {asset}")]
    MissingAsset { asset: String },

    /// 제약 조건을 동시에 만족할 수 없음
    #[error("제약 조건 불가능: {0}")]
    InfeasibleConstraints(String),

    /// 솔버가 반복 한도 내에 수렴하지 못함
    #[error("최적화 미수렴: {iterations}회 반복 후 상태 {status}")]
    NonConvergence { iterations: u32, status: String },

    /// 백테스트 표본 부족
    #[error("표본 부족: 최소 {required}쌍 필요, {provided}쌍 제공")]
    InsufficientSample { required: usize, provided: usize },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 퀀트 엔진 작업을 위한 Result 타입.
pub type QuantResult<T> = Result<T, QuantError>;

impl QuantError {
    /// 입력 데이터 부족/누락으로 인한 에러인지 확인합니다.
    ///
    /// 수집기(collaborator)가 데이터를 보강한 뒤 재실행할 수 있는 경우입니다.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            QuantError::InsufficientHistory { .. }
                | QuantError::MissingAsset { .. }
                | QuantError::InsufficientSample { .. }
        )
    }

    /// 설정을 고쳐야 해결되는 에러인지 확인합니다.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            QuantError::Config(_) | QuantError::InfeasibleConstraints(_)
        )
    }
}

impl From<config::ConfigError> for QuantError {
    fn from(err: config::ConfigError) -> Self {
        QuantError::Config(err.to_string())
    }
}
