//! End-to-end scenario tests exercising the pieces SignalPilot's scan cycle
//! and chat surface are built from, each one grounded in a concrete walk-through:
//! a Gap & Go entry, a trailing-stop promotion and hit, cross-strategy dedup,
//! a circuit breaker trip gating the following cycle, news-driven suppression,
//! and a signal expiring before it is acted on.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use signalpilot::application::market_data::MarketDataStore;
use signalpilot::application::pipeline::stages::{CircuitBreakerGateStage, ExitMonitoringStage};
use signalpilot::application::pipeline::{Pipeline, ScanContext};
use signalpilot::application::risk_management::{CircuitBreaker, DuplicateChecker, ExitMonitor};
use signalpilot::application::strategies::{Strategy, StrategyInputs};
use signalpilot::application::strategies::GapAndGoStrategy;
use signalpilot::config::{CircuitConfig, GapAndGoConfig, TrailingConfig};
use signalpilot::domain::circuit::CircuitState;
use signalpilot::domain::market::phase::StrategyPhase;
use signalpilot::domain::market::{HistoricalReference, Tick};
use signalpilot::domain::ports::{ChatGateway, ChatMessage};
use signalpilot::domain::repositories::{
    CircuitBreakerLogRepository, SignalRepository, TradeRepository,
};
use signalpilot::domain::signal::{
    CandidateFeatures, CandidateSignal, Direction, FinalSignal, RankedSignal, SignalStatus,
    StrategyName,
};
use signalpilot::domain::trade::{ExitReason, Trade};
use signalpilot::infrastructure::persistence::{Database, SqliteRepositories};

async fn in_memory_repos() -> Arc<SqliteRepositories> {
    let db = Database::new("sqlite::memory:").await.unwrap();
    Arc::new(SqliteRepositories::new(db.pool))
}

fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

fn trade_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

struct RecordingChatGateway {
    sent: StdMutex<Vec<ChatMessage>>,
}

impl RecordingChatGateway {
    fn new() -> Self {
        Self {
            sent: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatGateway for RecordingChatGateway {
    async fn send(&self, message: ChatMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

fn gap_and_go_config() -> GapAndGoConfig {
    GapAndGoConfig {
        gap_min_pct: dec!(3.0),
        gap_max_pct: dec!(5.0),
        volume_threshold_pct: dec!(50.0),
        max_risk_pct: dec!(3.0),
        t1_pct: dec!(5.0),
        t2_pct: dec!(7.0),
    }
}

/// Scenario A: a gap within band that fails the volume check produces no
/// candidate; once cumulative volume crosses the threshold and price confirms
/// above the opening print during the entry window, Gap & Go emits exactly one
/// signal with the documented entry/SL/T1/T2.
#[tokio::test]
async fn scenario_a_gap_and_go_entry_after_volume_confirmation() {
    let store = MarketDataStore::new();
    store
        .set_historical(
            "SBIN",
            HistoricalReference {
                prev_close: dec!(100),
                prev_high: dec!(102),
                avg_daily_volume: dec!(10000),
            },
        )
        .await;

    let mut strategy = GapAndGoStrategy::new(gap_and_go_config());
    let symbols = vec!["SBIN".to_string()];
    let excluded: HashSet<String> = HashSet::new();

    store
        .update_tick(
            "SBIN",
            Tick::new(dec!(104.5), dec!(104), dec!(104.5), dec!(104), dec!(104.5), 4000, ts(9, 16)),
        )
        .await;
    let opening = strategy
        .evaluate(
            &store,
            &StrategyInputs {
                symbols: &symbols,
                phase: StrategyPhase::Opening,
                now: ts(9, 16),
                gap_flagged_symbols: &excluded,
            },
        )
        .await;
    assert!(opening.is_empty(), "volume at 40% of ADV must not qualify yet");

    store
        .update_tick(
            "SBIN",
            Tick::new(dec!(104.5), dec!(104), dec!(104.5), dec!(104), dec!(104.5), 6000, ts(9, 20)),
        )
        .await;
    let still_opening = strategy
        .evaluate(
            &store,
            &StrategyInputs {
                symbols: &symbols,
                phase: StrategyPhase::Opening,
                now: ts(9, 20),
                gap_flagged_symbols: &excluded,
            },
        )
        .await;
    assert!(still_opening.is_empty(), "Opening phase never emits signals itself");

    store
        .update_tick(
            "SBIN",
            Tick::new(dec!(105.0), dec!(104), dec!(105.0), dec!(104), dec!(105.0), 6000, ts(9, 31)),
        )
        .await;
    let entry = strategy
        .evaluate(
            &store,
            &StrategyInputs {
                symbols: &symbols,
                phase: StrategyPhase::EntryWindow,
                now: ts(9, 31),
                gap_flagged_symbols: &excluded,
            },
        )
        .await;

    assert_eq!(entry.len(), 1);
    let signal = &entry[0];
    assert_eq!(signal.entry, dec!(105.0));
    assert_eq!(signal.stop_loss, dec!(104.0), "max(open, entry * 0.97)");
    assert_eq!(signal.target1, dec!(110.25));
    assert_eq!(signal.target2, dec!(112.35));
}

fn trailing_config() -> TrailingConfig {
    TrailingConfig {
        trail_trigger_pct: dec!(4.0),
        trail_distance_pct: dec!(2.0),
        breakeven_trigger_pct: dec!(2.0),
        sl_proximity_pct: dec!(0.5),
        sl_proximity_cooldown_secs: 60,
        near_t2_pct: dec!(0.3),
    }
}

fn gap_and_go_trade(entry: Decimal, sl: Decimal, t1: Decimal, t2: Decimal) -> Trade {
    Trade {
        id: 1,
        signal_id: 1,
        symbol: "SBIN".to_string(),
        entry_price: entry,
        stop_loss: sl,
        target1: t1,
        target2: t2,
        quantity: 100,
        taken_at: ts(9, 31),
        closed: None,
    }
}

async fn store_with_ltp(ltp: Decimal, at: DateTime<Utc>) -> MarketDataStore {
    let store = MarketDataStore::new();
    store
        .update_tick("SBIN", Tick::new(ltp, dec!(100), ltp, dec!(99), ltp, 1000, at))
        .await;
    store
}

/// Scenario B: price runs to +6%, promoting the trailing SL to 103.88; a pullback
/// to +4% (which would recompute a *lower* trail) leaves the SL untouched since
/// trailing only ratchets up; touching 103.88 exits as `trailing_sl` at +3.88%.
#[tokio::test]
async fn scenario_b_trailing_stop_promotes_then_exits() {
    let mut monitor = ExitMonitor::new(trailing_config());
    let trade = gap_and_go_trade(dec!(100), dec!(97), dec!(110), dec!(115));

    let store = store_with_ltp(dec!(106), ts(10, 0)).await;
    let (closed, alerts) = monitor.evaluate(&[trade.clone()], &store, ts(10, 0)).await;
    assert!(closed.is_empty());
    assert!(alerts
        .iter()
        .any(|a| matches!(a, signalpilot::application::risk_management::ExitAlert::TrailingSlUpdate { new_sl, .. } if *new_sl == dec!(103.88))));

    let store = store_with_ltp(dec!(104), ts(10, 5)).await;
    let (closed, _) = monitor.evaluate(&[trade.clone()], &store, ts(10, 5)).await;
    assert!(closed.is_empty(), "trailing SL never moves down");

    let store = store_with_ltp(dec!(103.88), ts(10, 10)).await;
    let (closed, _) = monitor.evaluate(&[trade], &store, ts(10, 10)).await;
    assert_eq!(closed.len(), 1);
    let (_, closed_trade) = &closed[0];
    assert_eq!(closed_trade.exit_reason, ExitReason::TrailingSl);
    assert_eq!(closed_trade.realized_pnl_pct, dec!(3.88));
}

fn candidate(symbol: &str, strategy: StrategyName) -> CandidateSignal {
    CandidateSignal {
        symbol: symbol.to_string(),
        direction: Direction::Buy,
        strategy,
        setup: None,
        entry: dec!(100),
        stop_loss: dec!(98),
        target1: dec!(105),
        target2: dec!(110),
        features: CandidateFeatures::default(),
        generated_at: ts(9, 40),
    }
}

fn ranked_from(candidate: CandidateSignal, strength: u8) -> RankedSignal {
    RankedSignal {
        candidate,
        composite_score: dec!(70),
        rank: 1,
        signal_strength: strength,
        confirmation: signalpilot::domain::signal::ConfirmationLevel::Single,
        contributing_strategies: vec![StrategyName::GapAndGo],
    }
}

fn final_signal(ranked: RankedSignal, expires_at: DateTime<Utc>) -> FinalSignal {
    FinalSignal {
        ranked,
        quantity: 10,
        capital_required: dec!(1000),
        expires_at,
    }
}

/// Scenario C: Gap & Go already sent a signal for SBIN today. When ORB produces
/// candidates for both SBIN and TCS on a later tick, the duplicate filter drops
/// SBIN (an active signal already exists for it today) and only TCS survives.
#[tokio::test]
async fn scenario_c_cross_strategy_dedup_drops_already_signaled_symbol() {
    let repos = in_memory_repos().await;
    let today = trade_date();

    let sbin_gap_and_go = candidate("SBIN", StrategyName::GapAndGo);
    let ranked = ranked_from(sbin_gap_and_go.clone(), 4);
    let sent = final_signal(ranked, ts(10, 0));
    repos.insert_signal(&sent).await.unwrap();

    let orb_candidates = vec![
        candidate("SBIN", StrategyName::OpeningRangeBreakout),
        candidate("TCS", StrategyName::OpeningRangeBreakout),
    ];

    let survivors = DuplicateChecker::filter(orb_candidates, today, repos.as_ref(), repos.as_ref())
        .await
        .unwrap();

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].symbol, "TCS");
}

/// Scenario D: three SL-hit exits trip the circuit breaker via
/// `ExitMonitoringStage`. On the tick that follows, `ScanEngine`'s persisted
/// `accepting_signals = false` means the signal stages (here, the circuit
/// breaker gate itself) never run again, while `ExitMonitoringStage` keeps
/// running for any trade still open.
#[tokio::test]
async fn scenario_d_circuit_breaker_trip_gates_the_next_cycle() {
    let repos = in_memory_repos().await;
    let store = Arc::new(MarketDataStore::new());
    let chat: Arc<dyn ChatGateway> = Arc::new(RecordingChatGateway::new());
    let circuit = Arc::new(Mutex::new(CircuitBreaker::new(
        CircuitConfig { sl_limit: 3 },
        CircuitState::default(),
    )));
    let exit_monitor = Arc::new(Mutex::new(ExitMonitor::new(trailing_config())));

    for (id, symbol) in [(1i64, "SBIN"), (2, "RELIANCE"), (3, "INFY")] {
        let trade = Trade {
            id,
            signal_id: id,
            symbol: symbol.to_string(),
            entry_price: dec!(100),
            stop_loss: dec!(97),
            target1: dec!(110),
            target2: dec!(115),
            quantity: 10,
            taken_at: ts(9, 31),
            closed: None,
        };
        repos.insert_trade(&trade).await.unwrap();
        store
            .update_tick(symbol, Tick::new(dec!(95), dec!(100), dec!(100), dec!(95), dec!(95), 1000, ts(10, 0)))
            .await;
    }

    let signal_stages: Vec<Box<dyn signalpilot::application::pipeline::PipelineStage>> =
        vec![Box::new(CircuitBreakerGateStage::new(circuit.clone()))];
    let always_stages: Vec<Box<dyn signalpilot::application::pipeline::PipelineStage>> =
        vec![Box::new(ExitMonitoringStage::new(
            exit_monitor.clone(),
            circuit.clone(),
            store.clone(),
            repos.clone(),
            repos.clone(),
            chat.clone(),
        ))];
    let pipeline = Pipeline::new(signal_stages, always_stages);

    let ctx = ScanContext::new(1, ts(10, 0), StrategyPhase::Continuous, true);
    let ctx = pipeline.run(ctx).await.unwrap();
    assert!(circuit.lock().await.is_active(), "third SL hit trips inside this cycle's always_stages");
    // The real ScanEngine persists ctx.accepting_signals across ticks; this cycle
    // itself already ran its signal stages (accepting_signals was true on entry).
    assert!(ctx.accepting_signals);

    // Next tick: ScanEngine hands in accepting_signals=false, observed before
    // Pipeline::run checks ACTIVE_SIGNAL_PHASES.
    let next_ctx = ScanContext::new(2, ts(10, 1), StrategyPhase::Continuous, false);
    let next_ctx = pipeline.run(next_ctx).await.unwrap();
    assert!(
        !next_ctx.accepting_signals,
        "gate stage does not run, so nothing resets accepting_signals"
    );

    let remaining = repos.get_active_trades().await.unwrap();
    assert!(
        remaining.is_empty(),
        "all three trades closed as sl_hit during the always_stages pass"
    );
}

/// Scenario E: a strongly negative sentiment reading suppresses a ranked
/// candidate entirely; it never becomes a `FinalSignal`.
#[tokio::test]
async fn scenario_e_strong_negative_sentiment_suppresses_signal() {
    use signalpilot::application::risk_management::NewsSentimentGate;
    use signalpilot::config::NewsGateConfig;
    use signalpilot::domain::sentiment::{SentimentLabel, SymbolSentiment};
    use std::collections::HashMap;

    struct NoEarnings;
    #[async_trait]
    impl signalpilot::domain::repositories::EarningsCalendarRepository for NoEarnings {
        async fn has_earnings_today(&self, _symbol: &str, _date: NaiveDate) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    let gate = NewsSentimentGate::new(NewsGateConfig {
        enabled: true,
        strong_negative_threshold: -0.5,
        mild_negative_threshold: 0.0,
        earnings_blackout_enabled: true,
    });

    let mut sentiment = HashMap::new();
    sentiment.insert(
        "SBIN".to_string(),
        SymbolSentiment {
            symbol: "SBIN".to_string(),
            label: SentimentLabel::StrongNegative,
            score: -0.72,
            headline: None,
            earnings_today: false,
            fetched_at: ts(8, 0),
        },
    );

    let four_star = ranked_from(candidate("SBIN", StrategyName::GapAndGo), 4);
    let (kept, suppressed) = gate
        .apply(vec![four_star], &sentiment, trade_date(), &NoEarnings)
        .await
        .unwrap();

    assert!(kept.is_empty(), "no FinalSignal is ever produced for SBIN");
    assert_eq!(suppressed.len(), 1);
    assert_eq!(suppressed[0].symbol, "SBIN");
    assert_eq!(suppressed[0].reason, "strong negative sentiment");
}

/// Scenario F: a signal created at 14:20 with a 30-minute TTL expires at 14:50.
/// `TAKEN <id>` before expiry succeeds; after expiry it is rejected even though
/// the caller supplied the exact signal ID.
#[tokio::test]
async fn scenario_f_signal_expires_at_cutoff() {
    use signalpilot::application::chat::{dispatch, ChatCommand, ChatDeps};
    use signalpilot::application::risk_management::{AdaptiveManager, RegimeClassifier, RegimeClassifierWeights};
    use signalpilot::config::AdaptiveConfig;
    use signalpilot::domain::repositories::PersistedSignal;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex2;

    struct SingleSignalRepo {
        signal: PersistedSignal,
        statuses: StdMutex2<HashMap<i64, SignalStatus>>,
    }

    #[async_trait]
    impl signalpilot::domain::repositories::SignalRepository for SingleSignalRepo {
        async fn insert_signal(&self, _signal: &FinalSignal) -> anyhow::Result<i64> {
            Ok(self.signal.id)
        }
        async fn update_signal_status(&self, id: i64, status: SignalStatus) -> anyhow::Result<()> {
            self.statuses.lock().unwrap().insert(id, status);
            Ok(())
        }
        async fn get_active_signals(
            &self,
            _date: NaiveDate,
            _now: DateTime<Utc>,
        ) -> anyhow::Result<Vec<PersistedSignal>> {
            Ok(vec![self.signal.clone()])
        }
        async fn get_signal(&self, id: i64) -> anyhow::Result<Option<PersistedSignal>> {
            if id == self.signal.id {
                Ok(Some(self.signal.clone()))
            } else {
                Ok(None)
            }
        }
        async fn expire_stale_signals(&self, _now: DateTime<Utc>) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn has_signal_for_stock_today(&self, _symbol: &str, _date: NaiveDate) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    let created_at = ts(14, 20);
    let expires_at = created_at + chrono::Duration::minutes(30);
    let ranked = ranked_from(candidate("SBIN", StrategyName::GapAndGo), 4);
    let signal = final_signal(ranked, expires_at);
    let persisted = PersistedSignal {
        id: 42,
        signal,
        status: SignalStatus::Sent,
    };
    let signals: Arc<dyn signalpilot::domain::repositories::SignalRepository> =
        Arc::new(SingleSignalRepo {
            signal: persisted,
            statuses: StdMutex2::new(HashMap::new()),
        });

    let repos = in_memory_repos().await;
    let trades: Arc<dyn signalpilot::domain::repositories::TradeRepository> = repos.clone();
    let user_config: Arc<dyn signalpilot::domain::repositories::UserConfigRepository> = repos.clone();
    let watchlist: Arc<dyn signalpilot::domain::repositories::WatchlistRepository> = repos.clone();
    let performance: Arc<dyn signalpilot::domain::repositories::StrategyPerformanceRepository> =
        repos.clone();
    let earnings: Arc<dyn signalpilot::domain::repositories::EarningsCalendarRepository> =
        repos.clone();
    let regime_repo: Arc<dyn signalpilot::domain::repositories::RegimeRepository> = repos.clone();
    let circuit_log: Arc<dyn CircuitBreakerLogRepository> = repos.clone();

    let deps = ChatDeps {
        signals: signals.clone(),
        trades,
        user_config,
        watchlist,
        performance,
        earnings,
        regime_repo,
        regime_classifier: Arc::new(RegimeClassifier::new(RegimeClassifierWeights::default())),
        circuit_log,
        circuit: Arc::new(Mutex::new(CircuitBreaker::new(
            CircuitConfig { sl_limit: 3 },
            CircuitState::default(),
        ))),
        adaptive: Arc::new(Mutex::new(AdaptiveManager::new(AdaptiveConfig {
            consecutive_losses_throttle: 2,
            consecutive_losses_pause: 4,
            five_day_win_rate_warn_pct: dec!(40),
            ten_day_win_rate_pause_pct: dec!(30),
        }))),
        news_gate: Arc::new(Mutex::new(signalpilot::application::risk_management::NewsSentimentGate::new(
            signalpilot::config::NewsGateConfig {
                enabled: false,
                strong_negative_threshold: -0.5,
                mild_negative_threshold: 0.0,
                earnings_blackout_enabled: false,
            },
        ))),
        pending_circuit_override: Arc::new(Mutex::new(false)),
        default_max_positions: 5,
    };

    let before_expiry = dispatch(
        ChatCommand::Taken { force: false, signal_id: Some(42) },
        &deps,
        ts(14, 49),
    )
    .await
    .unwrap();
    assert!(before_expiry.text.contains("Trade logged"));

    let after_expiry = dispatch(
        ChatCommand::Taken { force: false, signal_id: Some(42) },
        &deps,
        ts(14, 51),
    )
    .await
    .unwrap();
    assert!(after_expiry.text.contains("expired"));
}
