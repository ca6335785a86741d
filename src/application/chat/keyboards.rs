//! Inline keyboard builders for the chat surface's quick-action buttons (§6, §11.1).

use crate::domain::ports::ChatButton;

fn button(label: &str, callback_data: impl Into<String>) -> ChatButton {
    ChatButton {
        label: label.to_string(),
        callback_data: callback_data.into(),
    }
}

/// The primary signal action row: `[TAKEN] [SKIP] [WATCH]`.
pub fn build_signal_keyboard(signal_id: i64) -> Vec<Vec<ChatButton>> {
    vec![vec![
        button("TAKEN", format!("taken:{signal_id}")),
        button("SKIP", format!("skip:{signal_id}")),
        button("WATCH", format!("watch:{signal_id}")),
    ]]
}

/// T1-hit advisory: `[Book 50% at T1]`.
pub fn build_t1_keyboard(trade_id: i64) -> Vec<Vec<ChatButton>> {
    vec![vec![button(
        "Book 50% at T1",
        format!("partial_exit:{trade_id}:t1"),
    )]]
}

/// T2-hit advisory: `[Exit Remaining at T2]`.
pub fn build_t2_keyboard(trade_id: i64) -> Vec<Vec<ChatButton>> {
    vec![vec![button(
        "Exit Remaining at T2",
        format!("full_exit:{trade_id}:t2"),
    )]]
}

/// SL-proximity alert: `[Exit Now] [Hold]`.
pub fn build_sl_approaching_keyboard(trade_id: i64) -> Vec<Vec<ChatButton>> {
    vec![vec![
        button("Exit Now", format!("exit_now:{trade_id}")),
        button("Hold", format!("hold:{trade_id}")),
    ]]
}

/// Near-T2 alert: `[Take Profit] [Let It Run]`.
pub fn build_near_t2_keyboard(trade_id: i64) -> Vec<Vec<ChatButton>> {
    vec![vec![
        button("Take Profit", format!("take_profit:{trade_id}")),
        button("Let It Run", format!("let_run:{trade_id}")),
    ]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_keyboard_has_three_buttons_in_one_row() {
        let kb = build_signal_keyboard(7);
        assert_eq!(kb.len(), 1);
        assert_eq!(kb[0].len(), 3);
        assert_eq!(kb[0][0].callback_data, "taken:7");
    }

    #[test]
    fn sl_approaching_keyboard_offers_exit_or_hold() {
        let kb = build_sl_approaching_keyboard(3);
        assert_eq!(kb[0][0].label, "Exit Now");
        assert_eq!(kb[0][1].label, "Hold");
    }
}
