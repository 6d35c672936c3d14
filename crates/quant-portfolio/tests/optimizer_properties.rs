//! 최적화기 불변식 속성 테스트.
//!
//! 임의의 수익률 시계열과 제약 조건에 대해 다음을 확인합니다:
//! 1. 비중 합 = 1 (1e-6 이내)
//! 2. 모든 비중이 종목 범위 안
//! 3. 섹터 합이 상한 이하
//! 4. 범위를 완화하면 최소분산 목적함수가 증가하지 않음

use chrono::NaiveDate;
use proptest::prelude::*;

use quant_core::Asset;
use quant_portfolio::{ConstrainedOptimizer, ConstraintSet, CovarianceEstimator, ReturnSeries};

const TOL: f64 = 1e-6;

fn series_from(rows: Vec<Vec<f64>>) -> ReturnSeries {
    let n = rows[0].len();
    let assets: Vec<Asset> = (0..n)
        .map(|i| {
            let asset = Asset::new(format!("60000{}.SH", i));
            if i < 2 {
                asset.with_sector("白酒")
            } else {
                asset
            }
        })
        .collect();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = (0..rows.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let rows = rows
        .into_iter()
        .map(|row| row.into_iter().map(Some).collect())
        .collect();
    ReturnSeries::new(assets, dates, rows).unwrap()
}

fn returns_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (4usize..7).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(-0.05f64..0.05, n), (n + 5)..40)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn weights_respect_all_constraints(
        rows in returns_strategy(),
        min in 0.0f64..0.1,
        max in 0.4f64..1.0,
        ceiling in 0.3f64..0.9,
    ) {
        let series = series_from(rows);
        let cov = CovarianceEstimator::new(None).estimate(&series).unwrap().scaled(252.0);
        let constraints = ConstraintSet::uniform(series.assets(), min, max)
            .with_sector_limit("白酒", ceiling);

        let result = ConstrainedOptimizer::default()
            .optimize(&cov, &constraints, None)
            .unwrap();
        let weights = result.weights.weights();

        prop_assert!((result.weights.sum() - 1.0).abs() <= TOL);
        for w in weights {
            prop_assert!(*w >= min && *w <= max, "weight {} outside [{}, {}]", w, min, max);
        }
        prop_assert!(result.weights.sector_weight("白酒") <= ceiling + TOL);
    }

    #[test]
    fn relaxing_bounds_never_increases_variance(rows in returns_strategy()) {
        let series = series_from(rows);
        let cov = CovarianceEstimator::new(None).estimate(&series).unwrap().scaled(252.0);
        let optimizer = ConstrainedOptimizer::default();

        let tight = ConstraintSet::uniform(series.assets(), 0.05, 0.30);
        let looser = ConstraintSet::uniform(series.assets(), 0.02, 0.50);
        let free = ConstraintSet::uniform(series.assets(), 0.0, 1.0);

        let v_tight = optimizer.optimize(&cov, &tight, None).unwrap().variance;
        let v_looser = optimizer.optimize(&cov, &looser, None).unwrap().variance;
        let v_free = optimizer.optimize(&cov, &free, None).unwrap().variance;

        prop_assert!(v_looser <= v_tight + 1e-7, "{} > {}", v_looser, v_tight);
        prop_assert!(v_free <= v_looser + 1e-7, "{} > {}", v_free, v_looser);
    }
}
