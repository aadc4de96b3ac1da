//! Тексты ответов бота. Только форматирование, без ввода-вывода.

use crate::models::ChatState;

pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn format_threshold(threshold: f64) -> String {
    format!("{:.2}", threshold)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "да"
    } else {
        "нет"
    }
}

pub fn started() -> String {
    "✅ Бот включён.\n\
     Режим: отвечаю на ВСЕ сообщения и показываю вероятность токсичности.\n\
     Команды: /help"
        .to_string()
}

pub fn stopped() -> String {
    "🛑 Бот выключен для этого чата. Команды всё ещё доступны.".to_string()
}

pub fn all_messages_enabled() -> String {
    "🔁 Режим включён: отвечаю на все сообщения и показываю вероятность.".to_string()
}

pub fn only_toxic_enabled(state: &ChatState) -> String {
    format!(
        "🎯 Режим включён: отвечаю только при токсичности ≥ порога.\n\
         Текущий порог: {}.",
        format_threshold(state.threshold())
    )
}

/// Порог не разобран: режим всё равно переключён, порог прежний.
pub fn threshold_not_numeric(state: &ChatState) -> String {
    format!(
        "⚠️ Порог должен быть числом, например: /only_toxic 0.6\n\
         Оставляю прежний порог: {}\n\n{}",
        format_threshold(state.threshold()),
        only_toxic_enabled(state)
    )
}

pub fn status(state: &ChatState) -> String {
    format!(
        "ℹ️ Статус:\n\
         • Активен: {}\n\
         • Режим: {}\n\
         • Порог: {}",
        yes_no(state.active),
        state.mode.as_str(),
        format_threshold(state.threshold())
    )
}

pub fn help(state: &ChatState) -> String {
    format!(
        "🆘 Help\n\n\
         Команды:\n\
         • /start — включить бота (режим: все сообщения)\n\
         • /stop — выключить бота\n\
         • /all_messages (или /all_massages) — отвечать на все сообщения и выводить вероятность токсичности\n\
         • /only_toxic <порог> — отвечать только если токсичность ≥ порога (0..1, по умолчанию 0.5)\n\
         • /status — показать текущие настройки\n\
         • /joke — короткий анекдот (ru)\n\n\
         Текущий режим: {}, порог: {}, активен: {}",
        state.mode.as_str(),
        format_threshold(state.threshold()),
        yes_no(state.active)
    )
}

pub fn toxicity(probability: f64) -> String {
    format!("🧪 Вероятность токсичности: {}", format_percent(probability))
}

pub fn toxic_warning(probability: f64, threshold: f64) -> String {
    format!(
        "⚠️ Сообщение похоже на токсичное.\n\
         🧪 Вероятность токсичности: {} (порог {})",
        format_percent(probability),
        format_threshold(threshold)
    )
}

pub fn model_error() -> String {
    "❌ Ошибка модели (см. логи сервера).".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(0.2), "20.0%");
        assert_eq!(format_percent(0.7), "70.0%");
        assert_eq!(format_percent(0.12345), "12.3%");
        assert_eq!(format_percent(1.0), "100.0%");
    }

    #[test]
    fn status_lists_every_field() {
        let mut state = ChatState::default();
        state.mode = Mode::OnlyToxic;
        state.set_threshold(0.7);
        let text = status(&state);
        assert!(text.contains("Активен: нет"));
        assert!(text.contains("only_toxic"));
        assert!(text.contains("0.70"));
    }

    #[test]
    fn help_ends_with_state_summary() {
        let mut state = ChatState::default();
        state.reset_active();
        let text = help(&state);
        assert!(text.contains("/only_toxic"));
        assert!(text.ends_with("Текущий режим: all, порог: 0.50, активен: да"));
    }

    #[test]
    fn warning_mentions_percent_and_threshold() {
        let text = toxic_warning(0.7, 0.7);
        assert!(text.contains("70.0%"));
        assert!(text.contains("0.70"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let state = ChatState::default();
        assert_eq!(status(&state), status(&state));
        assert_eq!(toxicity(0.333), toxicity(0.333));
    }
}
