//! Wires every collaborator into an `AppOrchestrator` (§4.15). This is the
//! only place in the crate that knows every concrete adapter type; everything
//! downstream talks to trait objects.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::application::agents::scan_engine::ScanEngine;
use crate::application::market_data::MarketDataStore;
use crate::application::pipeline::stages::{
    AdaptiveFilterStage, CircuitBreakerGateStage, CompositeScoringStage, ConfirmationStage,
    DuplicateFilterStage, ExitMonitoringStage, NewsSentimentStage, PersistAndDeliverStage,
    RankingStage, RegimeContextStage, RiskSizingStage, StrategyEvalStage, UserConfigStage,
};
use crate::application::pipeline::{Pipeline, PipelineStage};
use crate::application::risk_management::{
    AdaptiveManager, CircuitBreaker, ConfirmationDetector, ExitMonitor, NewsSentimentGate,
    RegimeClassifier, RegimeClassifierWeights, RiskSizer,
};
use crate::application::strategies::{GapAndGoStrategy, OrbStrategy, Strategy, VwapReversalStrategy};
use crate::application::system::AppOrchestrator;
use crate::config::Config;
use crate::domain::market::Instrument;
use crate::domain::ports::{BrokerTransport, ChatGateway, HistoricalProvider};
use crate::domain::sentiment::SentimentProvider;
use crate::infrastructure::broker::MockBrokerTransport;
use crate::infrastructure::chat::ConsoleChatGateway;
use crate::infrastructure::historical::MockHistoricalProvider;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::{Database, SqliteRepositories};
use crate::infrastructure::sentiment::RssSentimentProvider;

/// Resolves `config.symbols` to fabricated `Instrument`s for the mock broker
/// (§6/§10.4: no production broker SDK, so there is no real instrument master
/// to query ahead of time).
fn fabricate_instruments(symbols: &[String]) -> Vec<Instrument> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, symbol)| Instrument::new(symbol.clone(), format!("{}", 10_000 + i), "NSE", 1))
        .collect()
}

fn build_strategies(config: &Config) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(GapAndGoStrategy::new(config.gap_and_go.clone())),
        Box::new(OrbStrategy::new(config.orb.clone())),
        Box::new(VwapReversalStrategy::new(config.vwap_reversal.clone())),
    ]
}

/// Assembles every collaborator and returns a ready-to-`startup` orchestrator.
/// Does not call `startup` itself -- that's the caller's job, once it decides
/// whether this is a cold start or a crash recovery.
pub async fn build(config: Config) -> anyhow::Result<Arc<AppOrchestrator>> {
    let db = Database::new(&config.database_url).await?;
    let repos = Arc::new(SqliteRepositories::new(db.pool.clone()));

    let signals: Arc<dyn crate::domain::repositories::SignalRepository> = repos.clone();
    let trades: Arc<dyn crate::domain::repositories::TradeRepository> = repos.clone();
    let user_config: Arc<dyn crate::domain::repositories::UserConfigRepository> = repos.clone();
    let circuit_log: Arc<dyn crate::domain::repositories::CircuitBreakerLogRepository> =
        repos.clone();
    let earnings: Arc<dyn crate::domain::repositories::EarningsCalendarRepository> =
        repos.clone();
    let regime_repo: Arc<dyn crate::domain::repositories::RegimeRepository> = repos.clone();
    let watchlist: Arc<dyn crate::domain::repositories::WatchlistRepository> = repos.clone();
    let performance: Arc<dyn crate::domain::repositories::StrategyPerformanceRepository> =
        repos.clone();

    let store = Arc::new(MarketDataStore::new());

    let instruments = fabricate_instruments(&config.symbols);
    let broker: Arc<dyn BrokerTransport> = Arc::new(MockBrokerTransport::new(instruments));
    let historical: Arc<dyn HistoricalProvider> = Arc::new(MockHistoricalProvider::new());
    let sentiment: Arc<dyn SentimentProvider> = Arc::new(RssSentimentProvider::new(
        config.news_feed_urls.clone(),
        config.news_gate.strong_negative_threshold,
    ));
    let chat: Arc<dyn ChatGateway> = Arc::new(ConsoleChatGateway::new());
    let calendar = crate::infrastructure::calendar::build();

    let today = chrono::Utc::now().date_naive();
    let circuit_state = circuit_log.load_today(today).await.unwrap_or_default();
    let circuit = Arc::new(Mutex::new(CircuitBreaker::new(
        config.circuit.clone(),
        circuit_state,
    )));
    let adaptive = Arc::new(Mutex::new(AdaptiveManager::new(config.adaptive.clone())));
    let news_gate = Arc::new(Mutex::new(NewsSentimentGate::new(config.news_gate.clone())));
    let regime_classifier = Arc::new(RegimeClassifier::new(RegimeClassifierWeights::default()));
    let exit_monitor = Arc::new(Mutex::new(ExitMonitor::new(config.trailing.clone())));
    let pending_circuit_override = Arc::new(Mutex::new(false));

    let signal_stages: Vec<Box<dyn PipelineStage>> = vec![
        Box::new(CircuitBreakerGateStage::new(circuit.clone())),
        Box::new(RegimeContextStage::new(regime_repo.clone())),
        Box::new(UserConfigStage::new(user_config.clone(), config.max_positions)),
        Box::new(StrategyEvalStage::new(
            build_strategies(&config),
            store.clone(),
            config.symbols.clone(),
        )),
        Box::new(DuplicateFilterStage::new(trades.clone(), signals.clone())),
        Box::new(ConfirmationStage::new(ConfirmationDetector::new(
            config.confirmation_window_minutes,
        ))),
        Box::new(CompositeScoringStage::new(
            config.scoring_weights.clone(),
            performance.clone(),
            regime_repo.clone(),
        )),
        Box::new(AdaptiveFilterStage::new(adaptive.clone())),
        Box::new(RankingStage),
        Box::new(NewsSentimentStage::new(
            news_gate.clone(),
            sentiment.clone(),
            earnings.clone(),
        )),
        Box::new(RiskSizingStage::new(
            RiskSizer::new(config.risk_sizer.clone()),
            trades.clone(),
        )),
        Box::new(PersistAndDeliverStage::new(signals.clone(), chat.clone())),
    ];
    let always_stages: Vec<Box<dyn PipelineStage>> = vec![Box::new(ExitMonitoringStage::new(
        exit_monitor.clone(),
        circuit.clone(),
        store.clone(),
        trades.clone(),
        circuit_log.clone(),
        chat.clone(),
    ))];

    let pipeline = Pipeline::new(signal_stages, always_stages);
    let scan_engine = Arc::new(ScanEngine::new(
        pipeline,
        chat.clone(),
        Duration::from_secs(config.scan_interval_seconds),
        config.max_consecutive_scan_errors,
    ));

    let metrics = Metrics::new()?;

    let orchestrator = Arc::new(AppOrchestrator::new(
        config,
        db,
        store,
        broker,
        historical,
        sentiment,
        chat,
        scan_engine,
        calendar,
        signals,
        trades,
        user_config,
        circuit_log,
        earnings,
        regime_repo,
        watchlist,
        performance,
        circuit,
        adaptive,
        news_gate,
        regime_classifier,
        exit_monitor,
        pending_circuit_override,
        metrics,
    ));

    Ok(orchestrator)
}
