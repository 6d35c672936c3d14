//! 상관계수 계산 모듈.
//!
//! 신호 강도와 선행 수익률 사이의 선형 관계를 측정합니다.
//!
//! # 예시
//!
//! ```rust
//! use quant_event::correlation::pearson;
//!
//! let strength = vec![0.3, 0.5, 0.7, 0.9];
//! let forward = vec![-0.01, 0.0, 0.01, 0.02];
//!
//! let corr = pearson(&strength, &forward).unwrap();
//! assert!((corr - 1.0).abs() < 1e-9);
//! ```

/// Pearson 상관계수.
///
/// # 반환
///
/// 상관계수 (-1.0 ~ 1.0). 길이가 다르거나 2 미만, 또는 한쪽 분산이 0이면 None.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // 변동 없음
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// 길이 `window`의 연속 구간마다 상관계수를 계산합니다.
///
/// 결과 길이는 `len − window + 1`이며, `window`가 2 미만이거나 데이터보다 길면 빈 벡터입니다.
pub fn rolling_pearson(x: &[f64], y: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 || x.len() != y.len() || x.len() < window {
        return Vec::new();
    }
    x.windows(window)
        .zip(y.windows(window))
        .map(|(wx, wy)| pearson(wx, wy))
        .collect()
}
