//! Cron-like fixed IST events for the trading day (§4.14). Ticks once a
//! minute and fires each job whose `(hour, minute, weekday filter)` matches
//! the current wall clock, skipping silently on non-trading days.
//!
//! No third-party cron crate is in play here -- a minute-resolution
//! `tokio::time::interval` plus a static job table is simpler than wiring a
//! cron expression parser for eight fixed times a day.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Kolkata;
use tracing::{info, warn};

use crate::domain::calendar::TradingCalendar;

#[async_trait]
pub trait SchedulerHooks: Send + Sync {
    async fn fetch_pre_market_news(&self) -> anyhow::Result<()>;
    async fn send_morning_brief(&self) -> anyhow::Result<()>;
    async fn send_pre_market_alert(&self) -> anyhow::Result<()>;
    async fn start_scanning(&self) -> anyhow::Result<()>;
    async fn classify_regime(&self) -> anyhow::Result<()>;
    async fn lock_opening_ranges(&self) -> anyhow::Result<()>;
    async fn reclassify_regime(&self) -> anyhow::Result<()>;
    async fn refresh_news(&self) -> anyhow::Result<()>;
    async fn stop_new_signals(&self) -> anyhow::Result<()>;
    async fn exit_reminder(&self) -> anyhow::Result<()>;
    async fn mandatory_exit(&self) -> anyhow::Result<()>;
    async fn daily_summary(&self) -> anyhow::Result<()>;
    async fn shutdown(&self) -> anyhow::Result<()>;
    async fn weekly_rebalance(&self) -> anyhow::Result<()>;
}

#[derive(Clone, Copy)]
enum DayFilter {
    WeekdayOnly,
    SundayOnly,
}

#[derive(Clone, Copy)]
enum Job {
    PreMarketNews,
    MorningBrief,
    PreMarketAlert,
    StartScanning,
    ClassifyRegime,
    LockOpeningRanges,
    ReclassifyRegime,
    RefreshNews,
    StopNewSignals,
    ExitReminder,
    MandatoryExit,
    DailySummary,
    Shutdown,
    WeeklyRebalance,
}

struct JobEntry {
    job: Job,
    hour: u32,
    minute: u32,
    day_filter: DayFilter,
    name: &'static str,
}

const JOBS: &[JobEntry] = &[
    JobEntry { job: Job::PreMarketNews, hour: 8, minute: 30, day_filter: DayFilter::WeekdayOnly, name: "pre_market_news" },
    JobEntry { job: Job::MorningBrief, hour: 8, minute: 45, day_filter: DayFilter::WeekdayOnly, name: "morning_brief" },
    JobEntry { job: Job::PreMarketAlert, hour: 9, minute: 0, day_filter: DayFilter::WeekdayOnly, name: "pre_market_alert" },
    JobEntry { job: Job::StartScanning, hour: 9, minute: 15, day_filter: DayFilter::WeekdayOnly, name: "start_scanning" },
    JobEntry { job: Job::ClassifyRegime, hour: 9, minute: 30, day_filter: DayFilter::WeekdayOnly, name: "classify_regime" },
    JobEntry { job: Job::LockOpeningRanges, hour: 9, minute: 45, day_filter: DayFilter::WeekdayOnly, name: "lock_opening_ranges" },
    JobEntry { job: Job::ReclassifyRegime, hour: 11, minute: 0, day_filter: DayFilter::WeekdayOnly, name: "reclassify_regime_1100" },
    JobEntry { job: Job::RefreshNews, hour: 11, minute: 15, day_filter: DayFilter::WeekdayOnly, name: "refresh_news_1115" },
    JobEntry { job: Job::ReclassifyRegime, hour: 13, minute: 0, day_filter: DayFilter::WeekdayOnly, name: "reclassify_regime_1300" },
    JobEntry { job: Job::RefreshNews, hour: 13, minute: 15, day_filter: DayFilter::WeekdayOnly, name: "refresh_news_1315" },
    JobEntry { job: Job::ReclassifyRegime, hour: 14, minute: 30, day_filter: DayFilter::WeekdayOnly, name: "reclassify_regime_1430" },
    JobEntry { job: Job::StopNewSignals, hour: 14, minute: 30, day_filter: DayFilter::WeekdayOnly, name: "stop_new_signals" },
    JobEntry { job: Job::ExitReminder, hour: 15, minute: 0, day_filter: DayFilter::WeekdayOnly, name: "exit_reminder" },
    JobEntry { job: Job::MandatoryExit, hour: 15, minute: 15, day_filter: DayFilter::WeekdayOnly, name: "mandatory_exit" },
    JobEntry { job: Job::DailySummary, hour: 15, minute: 30, day_filter: DayFilter::WeekdayOnly, name: "daily_summary" },
    JobEntry { job: Job::Shutdown, hour: 15, minute: 35, day_filter: DayFilter::WeekdayOnly, name: "shutdown" },
    JobEntry { job: Job::WeeklyRebalance, hour: 18, minute: 0, day_filter: DayFilter::SundayOnly, name: "weekly_rebalance" },
];

pub struct MarketScheduler<H: SchedulerHooks> {
    hooks: H,
    calendar: TradingCalendar,
}

impl<H: SchedulerHooks> MarketScheduler<H> {
    pub fn new(hooks: H, calendar: TradingCalendar) -> Self {
        Self { hooks, calendar }
    }

    /// Runs forever, checking the job table once a minute. Intended to be
    /// spawned as a long-lived task; cancellation is non-waiting (§5).
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        let mut last_fired: Option<(u32, u32, u32)> = None;

        loop {
            interval.tick().await;
            let now_ist = Utc::now().with_timezone(&Kolkata);
            let key = (now_ist.day(), now_ist.hour(), now_ist.minute());
            if last_fired == Some(key) {
                continue;
            }
            last_fired = Some(key);

            for entry in JOBS {
                if now_ist.hour() != entry.hour || now_ist.minute() != entry.minute {
                    continue;
                }
                let weekday = now_ist.weekday();
                let matches_day = match entry.day_filter {
                    DayFilter::WeekdayOnly => !matches!(weekday, Weekday::Sat | Weekday::Sun),
                    DayFilter::SundayOnly => weekday == Weekday::Sun,
                };
                if !matches_day {
                    continue;
                }
                self.fire(entry, now_ist.date_naive(), Utc::now()).await;
            }
        }
    }

    async fn fire(&self, entry: &JobEntry, date: chrono::NaiveDate, now: DateTime<Utc>) {
        if matches!(entry.day_filter, DayFilter::WeekdayOnly) {
            match self.calendar.is_trading_day(date) {
                Ok(false) => {
                    info!(job = entry.name, %date, "skipping job: not a trading day");
                    return;
                }
                Ok(true) => {}
                Err(err) => {
                    warn!(job = entry.name, %err, "running job anyway: no holiday data for year");
                }
            }
        }

        info!(job = entry.name, %now, "firing scheduled job");
        let result = match entry.job {
            Job::PreMarketNews => self.hooks.fetch_pre_market_news().await,
            Job::MorningBrief => self.hooks.send_morning_brief().await,
            Job::PreMarketAlert => self.hooks.send_pre_market_alert().await,
            Job::StartScanning => self.hooks.start_scanning().await,
            Job::ClassifyRegime => self.hooks.classify_regime().await,
            Job::LockOpeningRanges => self.hooks.lock_opening_ranges().await,
            Job::ReclassifyRegime => self.hooks.reclassify_regime().await,
            Job::RefreshNews => self.hooks.refresh_news().await,
            Job::StopNewSignals => self.hooks.stop_new_signals().await,
            Job::ExitReminder => self.hooks.exit_reminder().await,
            Job::MandatoryExit => self.hooks.mandatory_exit().await,
            Job::DailySummary => self.hooks.daily_summary().await,
            Job::Shutdown => self.hooks.shutdown().await,
            Job::WeeklyRebalance => self.hooks.weekly_rebalance().await,
        };
        if let Err(err) = result {
            warn!(job = entry.name, %err, "scheduled job failed");
        }
    }
}
