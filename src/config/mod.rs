use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::domain::errors::ConfigError;

fn env_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("failed to parse {key}"))
}

fn env_decimal(key: &str, default: &str) -> Result<Decimal> {
    Decimal::from_str(&env::var(key).unwrap_or_else(|_| default.to_string()))
        .with_context(|| format!("failed to parse {key} as decimal"))
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub client_id: String,
    pub api_key: String,
    pub api_secret: String,
    pub totp_secret: String,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub bot_token: String,
    pub authorized_chat_id: String,
}

#[derive(Debug, Clone)]
pub struct GapAndGoConfig {
    pub gap_min_pct: Decimal,
    pub gap_max_pct: Decimal,
    pub volume_threshold_pct: Decimal,
    pub max_risk_pct: Decimal,
    pub t1_pct: Decimal,
    pub t2_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct OrbConfig {
    pub window_end_hour: u32,
    pub window_end_minute: u32,
    pub range_size_min_pct: Decimal,
    pub range_size_max_pct: Decimal,
    pub volume_multiplier: Decimal,
    pub max_risk_pct: Decimal,
    pub t1_pct: Decimal,
    pub t2_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct VwapReversalConfig {
    pub window_start_hour: u32,
    pub window_start_minute: u32,
    pub window_end_hour: u32,
    pub window_end_minute: u32,
    pub touch_threshold_pct: Decimal,
    pub pullback_volume_mult: Decimal,
    pub reclaim_volume_mult: Decimal,
    pub setup1_sl_below_vwap_pct: Decimal,
    pub t1_pct: Decimal,
    pub t2_pct: Decimal,
    pub max_signals_per_day: u32,
    pub min_inter_signal_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub strategy: Decimal,
    pub win_rate: Decimal,
    pub risk_reward: Decimal,
    pub confirmation: Decimal,
}

impl ScoringWeights {
    /// Per §4.5, all weights are positive and must sum to 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.strategy + self.win_rate + self.risk_reward + self.confirmation;
        let within_tolerance = (sum - Decimal::ONE).abs() < Decimal::new(1, 3);
        let all_positive = self.strategy > Decimal::ZERO
            && self.win_rate > Decimal::ZERO
            && self.risk_reward > Decimal::ZERO
            && self.confirmation > Decimal::ZERO;
        if !within_tolerance || !all_positive {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TrailingConfig {
    pub trail_trigger_pct: Decimal,
    pub trail_distance_pct: Decimal,
    pub breakeven_trigger_pct: Decimal,
    pub sl_proximity_pct: Decimal,
    pub sl_proximity_cooldown_secs: i64,
    pub near_t2_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    pub consecutive_losses_throttle: u32,
    pub consecutive_losses_pause: u32,
    pub five_day_win_rate_warn_pct: Decimal,
    pub ten_day_win_rate_pause_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct CircuitConfig {
    pub sl_limit: u32,
}

#[derive(Debug, Clone)]
pub struct NewsGateConfig {
    pub enabled: bool,
    pub strong_negative_threshold: f64,
    pub mild_negative_threshold: f64,
    pub earnings_blackout_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RiskSizerConfig {
    pub confirmed_double_cap: Decimal,
    pub confirmed_triple_cap: Decimal,
    pub signal_expiry_minutes: i64,
    pub max_trade_risk_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub broker: BrokerConfig,
    pub chat: ChatConfig,
    pub symbols: Vec<String>,
    pub total_capital: Decimal,
    pub max_positions: usize,
    pub confirmation_window_minutes: i64,
    pub max_consecutive_scan_errors: u32,
    pub gap_and_go: GapAndGoConfig,
    pub orb: OrbConfig,
    pub vwap_reversal: VwapReversalConfig,
    pub scoring_weights: ScoringWeights,
    pub trailing: TrailingConfig,
    pub adaptive: AdaptiveConfig,
    pub circuit: CircuitConfig,
    pub news_gate: NewsGateConfig,
    pub retry: RetryConfig,
    pub risk_sizer: RiskSizerConfig,
    pub scan_interval_seconds: u64,
    pub news_feed_urls: Vec<String>,
    pub metrics_report_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://signalpilot.db".to_string());

        let broker = BrokerConfig {
            client_id: env::var("BROKER_CLIENT_ID").unwrap_or_default(),
            api_key: env::var("BROKER_API_KEY").unwrap_or_default(),
            api_secret: env::var("BROKER_API_SECRET").unwrap_or_default(),
            totp_secret: env::var("BROKER_TOTP_SECRET").unwrap_or_default(),
        };

        let chat = ChatConfig {
            bot_token: env::var("CHAT_BOT_TOKEN").unwrap_or_default(),
            authorized_chat_id: env::var("CHAT_AUTHORIZED_ID").unwrap_or_default(),
        };

        let symbols_str = env::var("SYMBOLS").unwrap_or_else(|_| "RELIANCE,SBIN,TCS".to_string());
        let symbols: Vec<String> = symbols_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let total_capital = env_decimal("TOTAL_CAPITAL", "500000")?;
        let max_positions: usize = env_parse("MAX_POSITIONS", "5")?;
        let confirmation_window_minutes: i64 = env_parse("CONFIRMATION_WINDOW_MINUTES", "5")?;
        let max_consecutive_scan_errors: u32 = env_parse("MAX_CONSECUTIVE_SCAN_ERRORS", "10")?;

        let gap_and_go = GapAndGoConfig {
            gap_min_pct: env_decimal("GAP_MIN_PCT", "2.0")?,
            gap_max_pct: env_decimal("GAP_MAX_PCT", "10.0")?,
            volume_threshold_pct: env_decimal("GAP_VOLUME_THRESHOLD_PCT", "20.0")?,
            max_risk_pct: env_decimal("GAP_MAX_RISK_PCT", "1.5")?,
            t1_pct: env_decimal("GAP_T1_PCT", "1.5")?,
            t2_pct: env_decimal("GAP_T2_PCT", "3.0")?,
        };

        let orb = OrbConfig {
            window_end_hour: env_parse("ORB_WINDOW_END_HOUR", "11")?,
            window_end_minute: env_parse("ORB_WINDOW_END_MINUTE", "0")?,
            range_size_min_pct: env_decimal("ORB_RANGE_SIZE_MIN_PCT", "0.3")?,
            range_size_max_pct: env_decimal("ORB_RANGE_SIZE_MAX_PCT", "2.0")?,
            volume_multiplier: env_decimal("ORB_VOLUME_MULTIPLIER", "1.5")?,
            max_risk_pct: env_decimal("ORB_MAX_RISK_PCT", "1.5")?,
            t1_pct: env_decimal("ORB_T1_PCT", "1.5")?,
            t2_pct: env_decimal("ORB_T2_PCT", "3.0")?,
        };

        let vwap_reversal = VwapReversalConfig {
            window_start_hour: env_parse("VWAP_WINDOW_START_HOUR", "10")?,
            window_start_minute: env_parse("VWAP_WINDOW_START_MINUTE", "0")?,
            window_end_hour: env_parse("VWAP_WINDOW_END_HOUR", "14")?,
            window_end_minute: env_parse("VWAP_WINDOW_END_MINUTE", "30")?,
            touch_threshold_pct: env_decimal("VWAP_TOUCH_THRESHOLD_PCT", "0.3")?,
            pullback_volume_mult: env_decimal("VWAP_PULLBACK_VOLUME_MULT", "1.2")?,
            reclaim_volume_mult: env_decimal("VWAP_RECLAIM_VOLUME_MULT", "1.8")?,
            setup1_sl_below_vwap_pct: env_decimal("VWAP_SETUP1_SL_BELOW_PCT", "0.5")?,
            t1_pct: env_decimal("VWAP_T1_PCT", "1.0")?,
            t2_pct: env_decimal("VWAP_T2_PCT", "2.0")?,
            max_signals_per_day: env_parse("VWAP_MAX_SIGNALS_PER_DAY", "3")?,
            min_inter_signal_minutes: env_parse("VWAP_MIN_INTER_SIGNAL_MINUTES", "15")?,
        };

        let scoring_weights = ScoringWeights {
            strategy: env_decimal("WEIGHT_STRATEGY", "0.30")?,
            win_rate: env_decimal("WEIGHT_WIN_RATE", "0.30")?,
            risk_reward: env_decimal("WEIGHT_RISK_REWARD", "0.25")?,
            confirmation: env_decimal("WEIGHT_CONFIRMATION", "0.15")?,
        };
        scoring_weights
            .validate()
            .context("scoring weights failed validation")?;

        let trailing = TrailingConfig {
            trail_trigger_pct: env_decimal("TRAIL_TRIGGER_PCT", "1.5")?,
            trail_distance_pct: env_decimal("TRAIL_DISTANCE_PCT", "0.8")?,
            breakeven_trigger_pct: env_decimal("BREAKEVEN_TRIGGER_PCT", "0.8")?,
            sl_proximity_pct: env_decimal("SL_PROXIMITY_PCT", "0.5")?,
            sl_proximity_cooldown_secs: env_parse("SL_PROXIMITY_COOLDOWN_SECS", "60")?,
            near_t2_pct: env_decimal("NEAR_T2_PCT", "0.3")?,
        };

        let adaptive = AdaptiveConfig {
            consecutive_losses_throttle: env_parse("ADAPTIVE_LOSSES_THROTTLE", "3")?,
            consecutive_losses_pause: env_parse("ADAPTIVE_LOSSES_PAUSE", "5")?,
            five_day_win_rate_warn_pct: env_decimal("ADAPTIVE_5D_WIN_RATE_WARN_PCT", "40")?,
            ten_day_win_rate_pause_pct: env_decimal("ADAPTIVE_10D_WIN_RATE_PAUSE_PCT", "30")?,
        };

        let circuit = CircuitConfig {
            sl_limit: env_parse("CIRCUIT_SL_LIMIT", "3")?,
        };

        let news_gate = NewsGateConfig {
            enabled: env_parse("NEWS_GATE_ENABLED", "true")?,
            strong_negative_threshold: env_parse("NEWS_STRONG_NEGATIVE_THRESHOLD", "-0.5")?,
            mild_negative_threshold: env_parse("NEWS_MILD_NEGATIVE_THRESHOLD", "-0.15")?,
            earnings_blackout_enabled: env_parse("EARNINGS_BLACKOUT_ENABLED", "true")?,
        };

        let retry = RetryConfig {
            max_retries: env_parse("RETRY_MAX_ATTEMPTS", "3")?,
            base_delay_ms: env_parse("RETRY_BASE_DELAY_MS", "500")?,
        };

        let risk_sizer = RiskSizerConfig {
            confirmed_double_cap: env_decimal("CONFIRMED_DOUBLE_CAP", "1.5")?,
            confirmed_triple_cap: env_decimal("CONFIRMED_TRIPLE_CAP", "2.0")?,
            signal_expiry_minutes: env_parse("SIGNAL_EXPIRY_MINUTES", "10")?,
            max_trade_risk_pct: env_decimal("MAX_TRADE_RISK_PCT", "1.5")?,
        };

        let scan_interval_seconds: u64 = env_parse("SCAN_INTERVAL_SECONDS", "1")?;
        let metrics_report_interval_seconds: u64 =
            env_parse("METRICS_REPORT_INTERVAL_SECONDS", "60")?;

        let news_feed_urls_str = env::var("NEWS_FEED_URLS").unwrap_or_else(|_| {
            "https://www.moneycontrol.com/rss/marketreports.xml,\
             https://economictimes.indiatimes.com/markets/stocks/rssfeeds/2146842.cms"
                .to_string()
        });
        let news_feed_urls: Vec<String> = news_feed_urls_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            broker,
            chat,
            symbols,
            total_capital,
            max_positions,
            confirmation_window_minutes,
            max_consecutive_scan_errors,
            gap_and_go,
            orb,
            vwap_reversal,
            scoring_weights,
            trailing,
            adaptive,
            circuit,
            news_gate,
            retry,
            risk_sizer,
            scan_interval_seconds,
            news_feed_urls,
            metrics_report_interval_seconds,
        })
    }
}
