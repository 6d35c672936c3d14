//! 일일 스캔 → 히스토리 → 연속성 연구 → 백테스트 흐름 테스트.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use quant_core::{EventScanConfig, LimitUpEvent, Regime, RegimeConfig, TrendDirection};
use quant_event::{
    EventBacktester, EventScanner, InMemoryForwardReturns, MacroIndicators,
    MarketRegimeClassifier, ThresholdStudy,
};

const DAYS: i64 = 15;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn membership() -> HashMap<String, usize> {
    [("半导体", 100), ("军工", 80), ("医药", 50), ("小盘概念", 4)]
        .into_iter()
        .map(|(s, n)| (s.to_string(), n))
        .collect()
}

/// k일차 이벤트: 半导体 5 + k%4건 (짝수일 硬板 대장주), 军工 6 + k%3건,
/// 医药 3 + k%2건 (핫 섹터 미달), 小盘概念 6건.
fn events_for(k: i64) -> Vec<LimitUpEvent> {
    let date = start() + Duration::days(k);
    let mut events = Vec::new();

    let semis = 5 + (k % 4) as usize;
    for i in 0..semis {
        let event = LimitUpEvent::new(date, format!("6880{:02}.SH", i), "半导体", TrendDirection::Up);
        events.push(if i == 0 && k % 2 == 0 {
            event.leader(true)
        } else {
            event
        });
    }
    for i in 0..6 + (k % 3) as usize {
        events.push(LimitUpEvent::new(
            date,
            format!("6000{:02}.SH", i),
            "军工",
            TrendDirection::Up,
        ));
    }
    for i in 0..3 + (k % 2) as usize {
        events.push(LimitUpEvent::new(
            date,
            format!("6003{:02}.SH", i),
            "医药",
            TrendDirection::Down,
        ));
    }
    for i in 0..6 {
        events.push(LimitUpEvent::new(
            date,
            format!("3000{:02}.SZ", i),
            "小盘概念",
            TrendDirection::Up,
        ));
    }
    events
}

fn run_scans() -> (EventScanner, Vec<quant_core::Signal>) {
    let mut scanner = EventScanner::new(&EventScanConfig::default());
    let mut signals = Vec::new();
    for k in 0..DAYS {
        let scan = scanner
            .scan_day(start() + Duration::days(k), &events_for(k), &membership())
            .unwrap();
        signals.extend(scan.signals);
    }
    (scanner, signals)
}

#[test]
fn test_daily_scan_filters_and_scores() {
    let mut scanner = EventScanner::new(&EventScanConfig::default());
    let scan = scanner
        .scan_day(start(), &events_for(0), &membership())
        .unwrap();

    // 小盘概念은 상장 종목이 부족해 제외
    let sectors: Vec<&str> = scan.hot_sectors.iter().map(|h| h.sector.as_str()).collect();
    assert_eq!(sectors, vec!["军工", "半导体"]);
    assert_eq!(scan.sector_counts["医药"], 3);
    assert_eq!(scan.sector_counts["小盘概念"], 6);

    let semis = scan.signals.iter().find(|s| s.sector == "半导体").unwrap();
    assert!((semis.strength_score - 0.75).abs() < 1e-12);
    assert!(semis.is_watch());
    assert_eq!(semis.reason, "涨停5家，龙头688000.SH");
    assert_eq!(scan.watch_signals().count(), 2);
}

#[test]
fn test_history_feeds_threshold_study() {
    let (scanner, signals) = run_scans();
    assert_eq!(signals.len(), 30);

    let history = scanner.history();
    assert_eq!(history.len(), DAYS as usize);
    // 필터 이전 집계: 네 섹터 × 15일
    assert_eq!(history.records().len(), 60);
    assert!(history.sector_series("小盘概念").iter().all(|(_, c)| *c == 6));
    assert_eq!(history.sector_series("医药")[0], (start(), 3));

    let report = ThresholdStudy::default().run(&history.records());
    let thresholds: Vec<usize> = report.results.iter().map(|r| r.threshold).collect();
    assert_eq!(thresholds, vec![3, 5]);

    let three = &report.results[0];
    assert_eq!(three.samples, 60);
    // 医药 짝수일(8일)은 정확히 3건
    assert!((three.continuation_rate - 52.0 / 60.0).abs() < 1e-12);

    let five = &report.results[1];
    assert_eq!(five.samples, 45);
    // 半导体 0,4,8,12일차만 정확히 5건
    assert!((five.continuation_rate - 41.0 / 45.0).abs() < 1e-12);
    assert_eq!(report.best.unwrap().threshold, 5);
}

#[test]
fn test_scanned_signals_backtest() {
    let (_, signals) = run_scans();

    let mut source = InMemoryForwardReturns::new();
    for s in &signals {
        source.insert(
            s.sector.clone(),
            s.date + Duration::days(1),
            (s.strength_score - 0.5) * 0.04,
        );
    }

    let summary = EventBacktester::default().run(&signals, &source).unwrap();
    assert_eq!(summary.samples, 30);
    assert!(summary.correlation.unwrap() > 0.99);
    assert_eq!(summary.rolling_correlation.len(), 21);
}

#[test]
fn test_lookback_bounds_history() {
    let cfg = EventScanConfig {
        lookback_days: 5,
        ..Default::default()
    };
    let mut scanner = EventScanner::new(&cfg);
    for k in 0..DAYS {
        scanner
            .scan_day(start() + Duration::days(k), &events_for(k), &membership())
            .unwrap();
    }
    assert_eq!(scanner.history().len(), 5);
    assert_eq!(
        scanner.history().dates().first().copied(),
        Some(start() + Duration::days(DAYS - 5))
    );
}

#[test]
fn test_regime_alongside_scan() {
    let classifier = MarketRegimeClassifier::new(&RegimeConfig::default());
    let state = classifier.evaluate(&MacroIndicators {
        currency_change_5d: Some(0.012),
        northbound_flow_3d_avg: Some(-25.0),
        gold_change_5d: None,
    });
    assert_eq!(state.risk_score, 4);
    assert_eq!(state.regime, Regime::Neutral);
    assert!(state.reasons.is_empty());
    assert!(classifier
        .preferred_sectors(state.regime)
        .iter()
        .any(|s| s == "半导体"));

    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("risk_score"));
}
