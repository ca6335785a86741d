//! Renders domain types into the chat-facing message text (§11.1).

use rust_decimal::Decimal;

use crate::application::chat::keyboards::{
    build_near_t2_keyboard, build_signal_keyboard, build_sl_approaching_keyboard,
    build_t1_keyboard,
};
use crate::application::risk_management::ExitAlert;
use crate::domain::ports::ChatMessage;
use crate::domain::signal::FinalSignal;

fn star_rating(strength: u8) -> String {
    let strength = strength.clamp(1, 5) as usize;
    let label = match strength {
        1 => "Weak",
        2 => "Fair",
        3 => "Moderate",
        4 => "Strong",
        _ => "Very Strong",
    };
    format!(
        "{}{} ({label})",
        "*".repeat(strength),
        "-".repeat(5 - strength)
    )
}

fn pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    (numerator / denominator * Decimal::from(100)).abs()
}

pub fn format_final_signal(signal_id: i64, signal: &FinalSignal) -> ChatMessage {
    let c = &signal.ranked.candidate;
    let risk_pct = pct(c.stop_loss - c.entry, c.entry);
    let t1_pct = pct(c.target1 - c.entry, c.entry);
    let t2_pct = pct(c.target2 - c.entry, c.entry);
    let stars = star_rating(signal.ranked.signal_strength);

    let text = format!(
        "BUY SIGNAL -- {}\n\n\
         Entry Price: {:.2}\n\
         Stop Loss: {:.2} ({:.1}% risk)\n\
         Target 1: {:.2} ({:.1}%)\n\
         Target 2: {:.2} ({:.1}%)\n\
         Quantity: {} shares\n\
         Capital Required: {:.0}\n\
         Signal Strength: {}\n\
         Strategy: {}\n\n\
         Valid Until: {}\n\
         Reply TAKEN to log this trade",
        c.symbol,
        c.entry,
        c.stop_loss,
        risk_pct,
        c.target1,
        t1_pct,
        c.target2,
        t2_pct,
        signal.quantity,
        signal.capital_required,
        stars,
        c.strategy.as_str(),
        signal.expires_at.format("%H:%M IST"),
    );

    let mut message = ChatMessage::plain(text);
    message.buttons = build_signal_keyboard(signal_id);
    message
}

pub fn format_exit_alert(alert: &ExitAlert) -> ChatMessage {
    let (text, buttons) = match alert {
        ExitAlert::TrailingSlUpdate { symbol, new_sl } => (
            format!("TRAILING SL UPDATE -- {symbol}\nTrailing SL updated to {new_sl:.2}"),
            Vec::new(),
        ),
        ExitAlert::Breakeven { symbol } => (
            format!("BREAKEVEN -- {symbol}\nStop loss moved to entry price."),
            Vec::new(),
        ),
        ExitAlert::Exit {
            symbol,
            reason,
            price,
        } => (
            format!(
                "{} -- {symbol}\nExit at {price:.2}.",
                reason.as_str().to_uppercase()
            ),
            Vec::new(),
        ),
        ExitAlert::T1Reached {
            trade_id,
            symbol,
            price,
        } => (
            format!("TARGET 1 HIT -- {symbol}\nTarget 1 hit at {price:.2}! Consider booking partial profit."),
            build_t1_keyboard(*trade_id),
        ),
        ExitAlert::SlApproaching {
            trade_id,
            symbol,
            ltp,
            sl,
        } => (
            format!("SL APPROACHING -- {symbol}\nLTP {ltp:.2} is within 0.5% of stop loss {sl:.2}."),
            build_sl_approaching_keyboard(*trade_id),
        ),
        ExitAlert::NearT2 {
            trade_id,
            symbol,
            ltp,
            target2,
        } => (
            format!("NEAR TARGET 2 -- {symbol}\nLTP {ltp:.2} is close to Target 2 {target2:.2}."),
            build_near_t2_keyboard(*trade_id),
        ),
        ExitAlert::TimeExitWarning {
            symbol,
            unrealized_pnl_pct,
        } => (
            format!(
                "TIME EXIT REMINDER -- {symbol}\nMarket closing soon. Unrealized P&L: {unrealized_pnl_pct:.1}%. \
                 Consider closing this position."
            ),
            Vec::new(),
        ),
    };
    let mut message = ChatMessage::plain(text);
    message.buttons = buttons;
    message
}
