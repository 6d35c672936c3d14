//! 신호 백테스트 통합 테스트.

use chrono::{Duration, NaiveDate};
use quant_core::{EventScanConfig, QuantError, Signal, SignalLabel};
use quant_event::{EventBacktester, InMemoryForwardReturns};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// 강도와 선행 수익률이 선형으로 증가하는 신호 12건.
/// 인덱스 6 이상은 관심 라벨이며 모두 양(+)의 수익률을 가집니다.
fn linear_history() -> (Vec<Signal>, InMemoryForwardReturns) {
    let mut signals = Vec::new();
    let mut source = InMemoryForwardReturns::new();
    for i in 0..12 {
        let date = start() + Duration::days(i);
        signals.push(Signal {
            sector: "半导体".to_string(),
            date,
            strength_score: 0.2 + 0.05 * i as f64,
            label: if i >= 6 {
                SignalLabel::Watch
            } else {
                SignalLabel::HoldOff
            },
            reason: format!("涨停{}家", 5 + i),
        });
        source.insert("半导体", date + Duration::days(1), -0.01 + 0.002 * i as f64);
    }
    (signals, source)
}

#[test]
fn test_effective_signal_history() {
    let (signals, source) = linear_history();
    let summary = EventBacktester::default().run(&signals, &source).unwrap();

    assert_eq!(summary.samples, 12);
    assert_eq!(summary.horizon, 1);
    assert!((summary.correlation.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(summary.rolling_correlation.len(), 3);
    assert_eq!(
        summary.rolling_correlation[2].end_date,
        start() + Duration::days(11)
    );
    assert!((summary.latest_correlation.unwrap() - 1.0).abs() < 1e-9);

    assert_eq!(summary.watch_count, 6);
    assert_eq!(summary.win_rate, Some(1.0));
    // 0.002 + 0.004 + ... + 0.012 = 0.042, 평균 0.007
    assert!((summary.avg_watch_return.unwrap() - 0.007).abs() < 1e-12);
    assert!(summary.is_effective);
}

#[test]
fn test_verdict_requires_both_thresholds() {
    let (signals, source) = linear_history();
    let strict = EventScanConfig {
        avg_return_threshold: 0.01,
        ..Default::default()
    };
    let summary = EventBacktester::new(&strict).run(&signals, &source).unwrap();
    assert_eq!(summary.win_rate, Some(1.0));
    assert!(!summary.is_effective);
}

#[test]
fn test_no_watch_signals() {
    let (mut signals, source) = linear_history();
    for s in &mut signals {
        s.label = SignalLabel::HoldOff;
    }
    let summary = EventBacktester::default().run(&signals, &source).unwrap();
    assert_eq!(summary.watch_count, 0);
    assert!(summary.win_rate.is_none());
    assert!(summary.avg_watch_return.is_none());
    assert!(!summary.is_effective);
}

#[test]
fn test_unpaired_signals_reduce_sample() {
    let (mut signals, source) = linear_history();
    // 수익률 데이터가 없는 섹터의 신호 3건
    for s in signals.iter_mut().take(3) {
        s.sector = "军工".to_string();
    }
    let before = signals.clone();

    let err = EventBacktester::default()
        .run(&signals, &source)
        .unwrap_err();
    match err {
        QuantError::InsufficientSample { required, provided } => {
            assert_eq!(required, 10);
            assert_eq!(provided, 9);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(signals, before);
}

#[test]
fn test_pairs_ordered_by_date_then_sector() {
    let (mut signals, mut source) = linear_history();
    let date = start() + Duration::days(3);
    signals.push(Signal {
        sector: "军工".to_string(),
        date,
        strength_score: 0.6,
        label: SignalLabel::Watch,
        reason: "涨停6家".to_string(),
    });
    source.insert("军工", date + Duration::days(1), 0.01);
    signals.reverse();

    let pairs = EventBacktester::default().pairs(&signals, &source);
    assert_eq!(pairs.len(), 13);
    assert!(pairs
        .windows(2)
        .all(|w| (w[0].date, &w[0].sector) <= (w[1].date, &w[1].sector)));
    assert_eq!(pairs[3].sector, "军工");
    assert_eq!(pairs[4].sector, "半导体");
}

#[test]
fn test_multi_day_horizon() {
    let (signals, source) = linear_history();
    let cfg = EventScanConfig {
        forward_days: 3,
        ..Default::default()
    };
    // 마지막 두 신호는 3일 선행 수익률이 없음
    let pairs = EventBacktester::new(&cfg).pairs(&signals, &source);
    assert_eq!(pairs.len(), 10);
    let expected = (1.0 - 0.01) * (1.0 - 0.008) * (1.0 - 0.006) - 1.0;
    assert!((pairs[0].forward_return - expected).abs() < 1e-12);
}

#[test]
fn test_summary_serializes() {
    let (signals, source) = linear_history();
    let summary = EventBacktester::default().run(&signals, &source).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["samples"], 12);
    assert_eq!(json["is_effective"], true);
}
