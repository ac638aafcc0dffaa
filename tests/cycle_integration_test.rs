mod common;

use common::{MockMarketSource, trending_bars, wavy_bars, write_csv};
use marketradar::adapters::csv_adapter::CsvAdapter;
use marketradar::adapters::file_config_adapter::FileConfigAdapter;
use marketradar::adapters::fixed_sentiment_adapter::FixedSentimentAdapter;
use marketradar::domain::config_validation::CycleConfig;
use marketradar::domain::error::FailureCategory;
use marketradar::domain::radar::RadarId;
use marketradar::domain::signal::AlertTag;
use marketradar::ports::sentiment_port::SentimentSource;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
[cycle]
benchmark = SPY
universe = AAPL, MSFT, XOM, GONE
period = 1y
interval = 1d
scan_strategy = mixed
worker_threads = 3
paired_reference = QQQ

[acquisition]
max_attempts = 1
fallback_periods = 6mo

[sentiment]
equity = 12
"#;

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "SPY", &wavy_bars(520, 380.0, 0.25));
    write_csv(dir.path(), "QQQ", &wavy_bars(520, 300.0, 0.3));
    write_csv(dir.path(), "AAPL", &wavy_bars(400, 150.0, 0.15));
    write_csv(dir.path(), "MSFT", &trending_bars(400, 250.0, 0.4));
    write_csv(dir.path(), "XOM", &trending_bars(400, 140.0, -0.2));
    dir
}

fn runner_for(
    dir: &TempDir,
    config_text: &str,
) -> marketradar::domain::cycle::CycleRunner {
    let adapter = FileConfigAdapter::from_string(config_text).unwrap();
    let config = CycleConfig::from_config(&adapter).unwrap();
    let sentiment = FixedSentimentAdapter::from_config(&adapter)
        .unwrap()
        .map(|s| Arc::new(s) as Arc<dyn SentimentSource>);
    marketradar::domain::cycle::CycleRunner::new(
        Arc::new(CsvAdapter::new(dir.path().to_path_buf())),
        sentiment,
        config,
    )
}

#[tokio::test]
async fn csv_cycle_produces_ordered_records() {
    let dir = data_dir();
    let report = runner_for(&dir, CONFIG).run().await.unwrap();

    assert_eq!(report.regime.benchmark, "SPY");
    let tickers: Vec<_> = report.signals.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(tickers, ["AAPL", "MSFT", "XOM"]);
    assert_eq!(report.analysed, 3);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].ticker, "GONE");
    assert_eq!(report.failures[0].category, FailureCategory::DataUnavailable);

    for signal in &report.signals {
        assert!(!signal.alerts.is_empty());
        if signal.alerts.contains(AlertTag::SinSenales) {
            assert_eq!(signal.alerts.len(), 1);
        }
    }

    assert_eq!(report.sentiment, Some(12.0));
    for candidate in &report.scan {
        assert_eq!(candidate.breakdown.sentiment_adjustment, 10.0);
        assert!((0.0..=100.0).contains(&candidate.breakdown.total));
    }
    assert!(
        report
            .scan
            .windows(2)
            .all(|w| w[0].breakdown.total >= w[1].breakdown.total)
    );
    assert!(report.radar.windows(2).all(|w| w[0].score >= w[1].score));
    let active = RadarId::active_for(report.regime.regime);
    assert!(report.radar.iter().all(|c| active.contains(&c.radar_id)));
}

#[tokio::test]
async fn worker_count_does_not_change_results() {
    let dir = data_dir();
    let sequential = CONFIG.replace("worker_threads = 3", "worker_threads = 1");
    let a = runner_for(&dir, &sequential).run().await.unwrap();
    let b = runner_for(&dir, CONFIG).run().await.unwrap();

    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}

#[tokio::test]
async fn report_serialises_spanish_labels() {
    let dir = data_dir();
    let report = runner_for(&dir, CONFIG).run().await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    let regime = json["regime"]["regime"].as_str().unwrap();
    assert!(["ALCISTA", "BAJISTA", "LATERAL"].contains(&regime));
    let rec = json["signals"][0]["recommendation"].as_str().unwrap();
    assert!(["COMPRAR", "VENDER", "MANTENER"].contains(&rec));
    assert_eq!(json["failures"][0]["category"], "DATA_UNAVAILABLE");
}

#[tokio::test(start_paused = true)]
async fn mock_source_retries_benchmark_before_cycle() {
    let source = MockMarketSource::new()
        .with_bars("SPY", wavy_bars(520, 380.0, 0.25))
        .with_bars("AAPL", wavy_bars(300, 150.0, 0.15))
        .failing_first("SPY", "2y", 1);
    let source = Arc::new(source);

    let adapter = FileConfigAdapter::from_string("[cycle]\nuniverse = AAPL\n").unwrap();
    let config = CycleConfig::from_config(&adapter).unwrap();
    let runner = marketradar::domain::cycle::CycleRunner::new(source.clone(), None, config);
    let report = runner.run().await.unwrap();

    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.sentiment, None);
    assert_eq!(source.periods_requested("SPY"), vec!["2y", "2y"]);
}
