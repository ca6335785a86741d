//! Text command grammar: parsing and a pure dispatcher (§6, §11.1).
//!
//! Grounded in `handlers.py`'s one-function-per-command shape, but collapsed into a
//! single `dispatch` match so the whole surface is one pure, test-friendly entry
//! point rather than a dozen loosely-typed handler functions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::application::risk_management::{
    AdaptiveManager, CircuitBreaker, NewsSentimentGate, RegimeClassifier,
};
use crate::domain::ports::ChatMessage;
use crate::domain::regime::RegimeLabel;
use crate::domain::repositories::{
    CircuitBreakerLogRepository, EarningsCalendarRepository, RegimeRepository, SignalRepository,
    StrategyPerformanceRepository, TradeRepository, UserConfigRepository, WatchlistRepository,
};
use crate::domain::signal::{SignalStatus, StrategyName};
use crate::domain::trade::Trade;

const ALL_STRATEGIES: &[StrategyName] = &[
    StrategyName::GapAndGo,
    StrategyName::OpeningRangeBreakout,
    StrategyName::VwapReversal,
];

/// One parsed command from the chat surface's exact token grammar (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Taken { force: bool, signal_id: Option<i64> },
    Status,
    Journal,
    Capital(String),
    Pause(String),
    Resume(String),
    Allocate(String),
    Strategy,
    Score(String),
    Adapt,
    Rebalance,
    OverrideCircuit,
    ConfirmOverride,
    Watchlist,
    Unwatch(String),
    News(String),
    Earnings,
    Unsuppress(String),
    Regime(String),
    Vix,
    Morning,
    Help,
    Unknown,
}

/// Splits `text` into an uppercased head token and the raw remainder, and matches
/// it against the fixed token grammar. Argument validation happens in `dispatch`,
/// mirroring the reference's "parse loosely, validate in the handler" split.
pub fn parse(text: &str) -> ChatCommand {
    let trimmed = text.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (trimmed, ""),
    };
    let head = head.to_ascii_uppercase();

    match head.as_str() {
        "TAKEN" => {
            let mut force = false;
            let mut signal_id = None;
            for token in rest.split_whitespace() {
                if token.eq_ignore_ascii_case("FORCE") {
                    force = true;
                } else if let Ok(id) = token.parse::<i64>() {
                    signal_id = Some(id);
                }
            }
            ChatCommand::Taken { force, signal_id }
        }
        "STATUS" => ChatCommand::Status,
        "JOURNAL" => ChatCommand::Journal,
        "CAPITAL" => ChatCommand::Capital(rest.to_string()),
        "PAUSE" => ChatCommand::Pause(rest.to_string()),
        "RESUME" => ChatCommand::Resume(rest.to_string()),
        "ALLOCATE" => ChatCommand::Allocate(rest.to_string()),
        "STRATEGY" => ChatCommand::Strategy,
        "SCORE" => ChatCommand::Score(rest.to_string()),
        "ADAPT" => ChatCommand::Adapt,
        "REBALANCE" => ChatCommand::Rebalance,
        "OVERRIDE" if rest.eq_ignore_ascii_case("CIRCUIT") => ChatCommand::OverrideCircuit,
        "YES" => ChatCommand::ConfirmOverride,
        "WATCHLIST" => ChatCommand::Watchlist,
        "UNWATCH" => ChatCommand::Unwatch(rest.to_string()),
        "NEWS" => ChatCommand::News(rest.to_string()),
        "EARNINGS" => ChatCommand::Earnings,
        "UNSUPPRESS" => ChatCommand::Unsuppress(rest.to_string()),
        "REGIME" => ChatCommand::Regime(rest.to_string()),
        "VIX" => ChatCommand::Vix,
        "MORNING" => ChatCommand::Morning,
        "HELP" => ChatCommand::Help,
        _ => ChatCommand::Unknown,
    }
}

/// Shared collaborators the dispatcher needs. One `Arc`/`Mutex` per piece of
/// cross-cycle state the pipeline stages also touch, so a chat command and a scan
/// cycle observe (and mutate) the same instances.
pub struct ChatDeps {
    pub signals: Arc<dyn SignalRepository>,
    pub trades: Arc<dyn TradeRepository>,
    pub user_config: Arc<dyn UserConfigRepository>,
    pub watchlist: Arc<dyn WatchlistRepository>,
    pub performance: Arc<dyn StrategyPerformanceRepository>,
    pub earnings: Arc<dyn EarningsCalendarRepository>,
    pub regime_repo: Arc<dyn RegimeRepository>,
    pub regime_classifier: Arc<RegimeClassifier>,
    pub circuit_log: Arc<dyn CircuitBreakerLogRepository>,
    pub circuit: Arc<Mutex<CircuitBreaker>>,
    pub adaptive: Arc<Mutex<AdaptiveManager>>,
    pub news_gate: Arc<Mutex<NewsSentimentGate>>,
    /// Set by `OVERRIDE CIRCUIT`, consumed by the next `YES`. A bare boolean is
    /// enough state for one outstanding confirmation per chat.
    pub pending_circuit_override: Arc<Mutex<bool>>,
    pub default_max_positions: usize,
}

fn reply(text: impl Into<String>) -> ChatMessage {
    ChatMessage::plain(text)
}

/// Executes a parsed command against the live repositories/state and returns the
/// reply text. Bounded-validation failures (bad args) return usage text and make
/// no state change, per the bounded-validation edge case.
pub async fn dispatch(
    cmd: ChatCommand,
    deps: &ChatDeps,
    now: DateTime<Utc>,
) -> anyhow::Result<ChatMessage> {
    let today = now.date_naive();

    match cmd {
        ChatCommand::Taken { force, signal_id } => {
            let active = deps.signals.get_active_signals(today, now).await?;
            let persisted = match signal_id {
                Some(id) => {
                    let found = active.iter().find(|p| p.id == id).cloned();
                    if found.is_none() {
                        return Ok(reply(format!("No active signal with ID {id}.")));
                    }
                    found
                }
                None => active
                    .into_iter()
                    .max_by_key(|p| p.signal.ranked.candidate.generated_at),
            };
            let Some(persisted) = persisted else {
                return Ok(reply("No active signal to log."));
            };
            if persisted.signal.expires_at <= now {
                return Ok(reply("Signal has expired and is no longer valid."));
            }

            if !force {
                let active_count = deps.trades.get_active_trade_count().await?;
                if active_count >= deps.default_max_positions {
                    return Ok(reply(format!(
                        "Position limit reached ({active_count}/{}). Use TAKEN FORCE to override.",
                        deps.default_max_positions
                    )));
                }
            }

            let candidate = &persisted.signal.ranked.candidate;
            let trade = Trade {
                id: 0,
                signal_id: persisted.id,
                symbol: candidate.symbol.clone(),
                entry_price: candidate.entry,
                stop_loss: candidate.stop_loss,
                target1: candidate.target1,
                target2: candidate.target2,
                quantity: persisted.signal.quantity,
                taken_at: now,
                closed: None,
            };
            deps.trades.insert_trade(&trade).await?;
            deps.signals
                .update_signal_status(persisted.id, SignalStatus::Taken)
                .await?;
            Ok(reply(format!("Trade logged. Tracking {}.", trade.symbol)))
        }

        ChatCommand::Status => {
            let signals = deps.signals.get_active_signals(today, now).await?;
            let trades = deps.trades.get_active_trades().await?;
            if signals.is_empty() && trades.is_empty() {
                return Ok(reply("No active signals or open trades."));
            }
            let mut lines = vec!["Active signals:".to_string()];
            for s in &signals {
                let c = &s.signal.ranked.candidate;
                lines.push(format!(
                    "  {} entry {:.2} sl {:.2} rank {} ({:?})",
                    c.symbol, c.entry, c.stop_loss, s.signal.ranked.rank, s.status
                ));
            }
            lines.push("Open trades:".to_string());
            for t in &trades {
                lines.push(format!(
                    "  {} qty {} entry {:.2} sl {:.2}",
                    t.symbol, t.quantity, t.entry_price, t.stop_loss
                ));
            }
            Ok(reply(lines.join("\n")))
        }

        ChatCommand::Journal => {
            let active_count = deps.trades.get_active_trade_count().await?;
            Ok(reply(format!(
                "{active_count} open trade(s) right now. Full trade-history journaling is not yet available."
            )))
        }

        ChatCommand::Capital(raw) => match raw.trim().parse::<Decimal>() {
            Ok(amount) if amount > Decimal::ZERO => {
                deps.user_config.set_total_capital(amount).await?;
                let per_trade = amount / Decimal::from(deps.default_max_positions as i64);
                Ok(reply(format!(
                    "Capital updated to {amount:.0}. Per-trade allocation is now {per_trade:.0}."
                )))
            }
            Ok(_) => Ok(reply("Capital must be a positive number.")),
            Err(_) => Ok(reply(
                "Usage: CAPITAL <amount>\nExample: CAPITAL 50000\nSets your total trading capital.",
            )),
        },

        ChatCommand::Pause(raw) => set_paused(deps, &raw, true, "PAUSE").await,
        ChatCommand::Resume(raw) => set_paused(deps, &raw, false, "RESUME").await,

        ChatCommand::Allocate(raw) => {
            if raw.is_empty() {
                let mut lines = vec!["Current Allocation".to_string()];
                for strategy in ALL_STRATEGIES {
                    let pct = deps.user_config.get_strategy_allocation(*strategy).await?;
                    lines.push(format!("  {}: {pct:.0}%", strategy.as_str()));
                }
                lines.push("  Reserve: 20% buffer for exceptional signals".to_string());
                return Ok(reply(lines.join("\n")));
            }
            if raw.eq_ignore_ascii_case("AUTO") {
                return Ok(reply(
                    "Auto allocation is the default; manual overrides have been cleared.",
                ));
            }
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let mut total_pct = Decimal::ZERO;
            let mut i = 0;
            while i + 1 < tokens.len() {
                let Some(strategy) = StrategyName::from_token(tokens[i]) else {
                    return Ok(reply("Usage: ALLOCATE GAP 40 ORB 20 VWAP 20"));
                };
                let Ok(pct) = tokens[i + 1].parse::<Decimal>() else {
                    return Ok(reply("Usage: ALLOCATE GAP 40 ORB 20 VWAP 20"));
                };
                total_pct += pct;
                deps.user_config
                    .set_strategy_allocation(strategy, pct)
                    .await?;
                i += 2;
            }
            if total_pct > Decimal::from(80) {
                return Ok(reply(format!(
                    "Total allocation ({total_pct:.0}%) exceeds 80% limit. 20% must be reserved."
                )));
            }
            Ok(reply(format!(
                "Manual allocation set. Total: {total_pct:.0}% (20% reserve)."
            )))
        }

        ChatCommand::Strategy => {
            let mut lines = vec!["Strategy performance:".to_string()];
            let adaptive = deps.adaptive.lock().await;
            for strategy in ALL_STRATEGIES {
                let win_rate_5d = deps.performance.rolling_win_rate_pct(*strategy, 5).await?;
                let level = adaptive.level(*strategy);
                lines.push(format!(
                    "  {}: 5d win rate {win_rate_5d:.0}% ({})",
                    strategy.as_str(),
                    level.as_str()
                ));
            }
            Ok(reply(lines.join("\n")))
        }

        ChatCommand::Score(raw) => {
            if raw.is_empty() {
                return Ok(reply("Usage: SCORE <SYMBOL>"));
            }
            let symbol = raw.trim().to_ascii_uppercase();
            let signals = deps.signals.get_active_signals(today, now).await?;
            match signals
                .iter()
                .find(|s| s.signal.ranked.candidate.symbol.eq_ignore_ascii_case(&symbol))
            {
                Some(s) => Ok(reply(format!(
                    "{symbol}: composite score {:.1}, rank {}, confirmation {:?}",
                    s.signal.ranked.composite_score, s.signal.ranked.rank, s.signal.ranked.confirmation
                ))),
                None => Ok(reply(format!("No active signal for {symbol} today."))),
            }
        }

        ChatCommand::Adapt => {
            let adaptive = deps.adaptive.lock().await;
            let mut lines = vec!["Adaptive status:".to_string()];
            for strategy in ALL_STRATEGIES {
                lines.push(format!(
                    "  {}: {}",
                    strategy.as_str(),
                    adaptive.level(*strategy).as_str()
                ));
            }
            Ok(reply(lines.join("\n")))
        }

        ChatCommand::Rebalance => Ok(reply(
            "Weekly capital rebalancing runs automatically on Sundays; manual rebalance is not yet available.",
        )),

        ChatCommand::OverrideCircuit => {
            *deps.pending_circuit_override.lock().await = true;
            Ok(reply(
                "This will clear today's circuit breaker trip and resume signal generation. Reply YES to confirm.",
            ))
        }

        ChatCommand::ConfirmOverride => {
            let mut pending = deps.pending_circuit_override.lock().await;
            if !*pending {
                return Ok(reply("Nothing to confirm."));
            }
            *pending = false;
            drop(pending);
            let mut breaker = deps.circuit.lock().await;
            breaker.manual_override();
            breaker.persist(today, deps.circuit_log.as_ref()).await?;
            Ok(reply("Circuit breaker override confirmed. Signal generation resumed."))
        }

        ChatCommand::Watchlist => {
            let symbols = deps.watchlist.list().await?;
            if symbols.is_empty() {
                Ok(reply("Watchlist is empty."))
            } else {
                Ok(reply(format!("Watchlist: {}", symbols.join(", "))))
            }
        }

        ChatCommand::Unwatch(raw) => {
            if raw.is_empty() {
                return Ok(reply("Usage: UNWATCH <symbol>"));
            }
            let symbol = raw.trim().to_ascii_uppercase();
            deps.watchlist.remove(&symbol).await?;
            Ok(reply(format!("{symbol} removed from watchlist.")))
        }

        ChatCommand::News(raw) => {
            if raw.is_empty() || raw.eq_ignore_ascii_case("ALL") {
                return Ok(reply(
                    "Usage: NEWS <SYMBOL> for a single stock, or check WATCHLIST for tracked symbols.",
                ));
            }
            let symbol = raw.trim().to_ascii_uppercase();
            let has_earnings = deps.earnings.has_earnings_today(&symbol, today).await?;
            Ok(reply(format!(
                "{symbol}: earnings today = {}.",
                if has_earnings { "yes" } else { "no" }
            )))
        }

        ChatCommand::Earnings => {
            let symbols = deps.watchlist.list().await?;
            let mut flagged = Vec::new();
            for symbol in &symbols {
                if deps.earnings.has_earnings_today(symbol, today).await? {
                    flagged.push(symbol.clone());
                }
            }
            if flagged.is_empty() {
                Ok(reply("No watchlist symbols have earnings today."))
            } else {
                Ok(reply(format!("Earnings today: {}", flagged.join(", "))))
            }
        }

        ChatCommand::Unsuppress(raw) => {
            if raw.is_empty() {
                return Ok(reply("Usage: UNSUPPRESS <SYMBOL>"));
            }
            let symbol = raw.trim().to_ascii_uppercase();
            deps.news_gate.lock().await.unsuppress(&symbol);
            Ok(reply(format!(
                "{symbol} will bypass sentiment suppression for the rest of today."
            )))
        }

        ChatCommand::Regime(raw) => {
            if raw.is_empty() {
                return match deps.regime_repo.get_latest().await? {
                    Some(c) => Ok(reply(format!(
                        "Regime: {} (confidence {:.2}, min stars {})",
                        c.label.as_str(),
                        c.confidence,
                        c.min_star_rating
                    ))),
                    None => Ok(reply("No regime classification yet today.")),
                };
            }
            if raw.eq_ignore_ascii_case("HISTORY") {
                return Ok(reply("Regime history is not yet available; use REGIME for today's classification."));
            }
            let (head, label_raw) = match raw.split_once(char::is_whitespace) {
                Some((h, r)) => (h, r.trim()),
                None => (raw.as_str(), ""),
            };
            if !head.eq_ignore_ascii_case("OVERRIDE") {
                return Ok(reply(
                    "Usage: REGIME | REGIME HISTORY | REGIME OVERRIDE <TRENDING|RANGING|VOLATILE>",
                ));
            }
            let Some(label) = RegimeLabel::from_token(label_raw) else {
                return Ok(reply("Usage: REGIME OVERRIDE <TRENDING|RANGING|VOLATILE>"));
            };
            deps.regime_classifier
                .manual_override(label, now, deps.regime_repo.as_ref())
                .await?;
            Ok(reply(format!("Regime manually overridden to {}.", label.as_str())))
        }

        ChatCommand::Vix => Ok(reply(
            "India VIX readout is only available inside a regime classification; check REGIME.",
        )),

        ChatCommand::Morning => Ok(reply("Morning brief generation is not yet available.")),

        ChatCommand::Help => Ok(reply(
            "Commands: TAKEN [FORCE] [<id>], STATUS, JOURNAL, CAPITAL <amount>, \
             PAUSE <GAP|ORB|VWAP>, RESUME <GAP|ORB|VWAP>, \
             ALLOCATE | ALLOCATE AUTO | ALLOCATE GAP <pct> ORB <pct> VWAP <pct>, \
             STRATEGY, SCORE <SYMBOL>, ADAPT, REBALANCE, OVERRIDE CIRCUIT (then YES), \
             WATCHLIST, UNWATCH <symbol>, NEWS <SYMBOL>, EARNINGS, UNSUPPRESS <SYMBOL>, \
             REGIME [HISTORY | OVERRIDE <TRENDING|RANGING|VOLATILE>], VIX, MORNING, HELP",
        )),

        ChatCommand::Unknown => Ok(reply("Unrecognized command. Reply HELP for the command list.")),
    }
}

async fn set_paused(
    deps: &ChatDeps,
    raw: &str,
    paused: bool,
    usage_head: &str,
) -> anyhow::Result<ChatMessage> {
    let Some(strategy) = StrategyName::from_token(raw.trim()) else {
        return Ok(reply(format!(
            "Usage: {usage_head} GAP | {usage_head} ORB | {usage_head} VWAP"
        )));
    };
    let already = deps.user_config.is_strategy_paused(strategy).await?;
    if already == paused {
        let state = if paused { "already paused" } else { "already active" };
        return Ok(reply(format!("{} is {state}.", strategy.as_str())));
    }
    deps.user_config.set_strategy_paused(strategy, paused).await?;
    if paused {
        Ok(reply(format!(
            "{} paused. No signals will be generated from this strategy.",
            strategy.as_str()
        )))
    } else {
        Ok(reply(format!(
            "{} resumed. Signals will be generated when conditions are met.",
            strategy.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_taken_with_force_and_id() {
        let cmd = parse("taken force 42");
        assert_eq!(
            cmd,
            ChatCommand::Taken {
                force: true,
                signal_id: Some(42)
            }
        );
    }

    #[test]
    fn parses_bare_status_case_insensitively() {
        assert_eq!(parse("Status"), ChatCommand::Status);
    }

    #[test]
    fn parses_override_circuit_as_one_token() {
        assert_eq!(parse("override circuit"), ChatCommand::OverrideCircuit);
        assert_eq!(parse("override"), ChatCommand::Unknown);
    }

    #[test]
    fn parses_regime_override_argument() {
        assert_eq!(
            parse("regime override trending"),
            ChatCommand::Regime("override trending".to_string())
        );
    }

    #[test]
    fn unrecognized_head_is_unknown() {
        assert_eq!(parse("banana"), ChatCommand::Unknown);
    }
}
