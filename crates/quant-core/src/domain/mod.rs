//! 스캔/레짐 결과를 표현하는 도메인 모델.

mod limit_up;
mod market_regime;
mod signal;

pub use limit_up::*;
pub use market_regime::*;
pub use signal::*;
