use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;
use thiserror::Error;

use crate::handlers::{replies, Inbound, Moderator};
use crate::models::chat_state::parse_threshold;
use crate::models::{ChatState, Mode};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Включить бота (режим: все сообщения)")]
    Start,
    #[command(description = "Выключить бота")]
    Stop,
    #[command(
        description = "Отвечать на все сообщения и показывать вероятность",
        alias = "all_massages",
        hide_aliases
    )]
    AllMessages,
    #[command(description = "Отвечать только при токсичности ≥ порога (0..1)")]
    OnlyToxic(String),
    #[command(description = "Показать текущие настройки")]
    Status,
    #[command(description = "Короткий анекдот (ru)")]
    Joke,
    #[command(description = "Справка по командам")]
    Help,
}

/// Имена, которые обязаны работать (меню и синонимы).
const REQUIRED_NAMES: &[&str] = &[
    "start",
    "stop",
    "all_messages",
    "only_toxic",
    "status",
    "joke",
    "help",
];
const ALIASES: &[&str] = &["all_massages"];

impl Command {
    /// Каноническое имя команды в меню.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::AllMessages => "all_messages",
            Command::OnlyToxic(_) => "only_toxic",
            Command::Status => "status",
            Command::Joke => "joke",
            Command::Help => "help",
        }
    }

    /// Первый аргумент `/only_toxic`, остальные игнорируются.
    fn threshold_arg(args: &str) -> Option<&str> {
        args.split_whitespace().next()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandTableError {
    #[error("command {0:?} is not in the command menu")]
    Unmapped(&'static str),
    #[error("command {0:?} is listed twice")]
    Duplicate(String),
    #[error("command {0:?} does not parse")]
    Unparseable(String),
    #[error("menu entry {listed:?} parses as {parsed:?}")]
    Mismatch {
        listed: String,
        parsed: &'static str,
    },
}

fn check_listing(listing: &[BotCommand], aliases: &[&str]) -> Result<(), CommandTableError> {
    let mut covered = HashSet::new();
    for entry in listing {
        let listed = entry.command.trim_start_matches('/').to_string();
        let parsed = Command::parse(&format!("/{listed}"), "")
            .map_err(|_| CommandTableError::Unparseable(listed.clone()))?;
        if parsed.name() != listed {
            return Err(CommandTableError::Mismatch {
                listed,
                parsed: parsed.name(),
            });
        }
        if !covered.insert(parsed.name()) {
            return Err(CommandTableError::Duplicate(listed));
        }
    }

    for alias in aliases {
        Command::parse(&format!("/{alias}"), "")
            .map_err(|_| CommandTableError::Unparseable(alias.to_string()))?;
    }

    for name in REQUIRED_NAMES {
        if !covered.contains(name) {
            return Err(CommandTableError::Unmapped(name));
        }
    }
    Ok(())
}

/// Проверка таблицы команд при старте.
pub fn verify_command_table() -> Result<(), CommandTableError> {
    check_listing(&Command::bot_commands(), ALIASES)
}

/// Применяет команду к состоянию чата и возвращает текст ответа.
/// `None` для команд, которые состояние не читают (анекдот).
pub fn apply(state: &mut ChatState, command: &Command) -> Option<String> {
    let reply = match command {
        Command::Start => {
            state.reset_active();
            replies::started()
        }
        Command::Stop => {
            state.active = false;
            replies::stopped()
        }
        Command::AllMessages => {
            state.active = true;
            state.mode = Mode::All;
            replies::all_messages_enabled()
        }
        Command::OnlyToxic(args) => {
            state.active = true;
            state.mode = Mode::OnlyToxic;

            match Command::threshold_arg(args).map(parse_threshold) {
                None => replies::only_toxic_enabled(state),
                Some(Ok(value)) => {
                    state.set_threshold(value);
                    replies::only_toxic_enabled(state)
                }
                Some(Err(e)) => {
                    log::warn!("⚠️ {}; threshold stays {}", e, state.threshold());
                    replies::threshold_not_numeric(state)
                }
            }
        }
        Command::Status => replies::status(state),
        Command::Help => replies::help(state),
        Command::Joke => return None,
    };
    Some(reply)
}

pub async fn execute(moderator: &Moderator, chat_id: ChatId, command: Command) -> String {
    if command == Command::Joke {
        return moderator.jokes.fetch().await;
    }

    let mut state = moderator.store.lock(chat_id).await;
    let reply = apply(&mut state, &command).unwrap_or_default();
    log::info!(
        "⚙️ /{} applied in chat {}: active={}, mode={}, threshold={:.2}",
        command.name(),
        chat_id,
        state.active,
        state.mode.as_str(),
        state.threshold()
    );
    reply
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    moderator: Arc<Moderator>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    if let Some(reply) = moderator.handle_isolated(chat_id, Inbound::Command(cmd)).await {
        bot.send_message(chat_id, reply).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "toxbot";

    fn command(text: &str) -> Command {
        Command::parse(text, BOT).unwrap_or_else(|e| panic!("{text:?} did not parse: {e}"))
    }

    #[test]
    fn table_is_complete() {
        assert_eq!(verify_command_table(), Ok(()));
    }

    #[test]
    fn table_check_catches_gaps_and_duplicates() {
        let partial = [BotCommand::new("start", ""), BotCommand::new("stop", "")];
        assert_eq!(
            check_listing(&partial, ALIASES),
            Err(CommandTableError::Unmapped("all_messages"))
        );

        let duplicated = [BotCommand::new("start", ""), BotCommand::new("start", "")];
        assert_eq!(
            check_listing(&duplicated, ALIASES),
            Err(CommandTableError::Duplicate("start".into()))
        );

        let listing = Command::bot_commands();
        assert_eq!(
            check_listing(&listing, &["ban"]),
            Err(CommandTableError::Unparseable("ban".into()))
        );
    }

    #[test]
    fn menu_hides_alias() {
        let names: Vec<_> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        assert!(names.contains(&"all_messages".to_string()));
        assert!(!names.contains(&"all_massages".to_string()));
        assert_eq!(names.len(), REQUIRED_NAMES.len());
    }

    #[test]
    fn parses_commands_aliases_and_addressing() {
        assert_eq!(command("/start"), Command::Start);
        assert_eq!(command("/all_massages"), Command::AllMessages);
        assert_eq!(command("/all_messages"), Command::AllMessages);
        assert_eq!(command("/help@toxbot"), Command::Help);
        assert_eq!(command("/only_toxic"), Command::OnlyToxic(String::new()));
        match command("/only_toxic 0.7 extra") {
            Command::OnlyToxic(args) => assert_eq!(Command::threshold_arg(&args), Some("0.7")),
            other => panic!("unexpected {other:?}"),
        }

        assert!(Command::parse("/start@otherbot", BOT).is_err());
        assert!(Command::parse("/unknown", BOT).is_err());
        assert!(Command::parse("/ start", BOT).is_err());
    }

    #[test]
    fn start_is_full_reset() {
        let mut state = ChatState::default();
        state.mode = Mode::OnlyToxic;
        state.set_threshold(0.9);
        apply(&mut state, &Command::Start);
        assert!(state.active);
        assert_eq!(state.mode, Mode::All);
        assert_eq!(state.threshold(), 0.5);
    }

    #[test]
    fn stop_keeps_mode_and_threshold() {
        let mut state = ChatState::default();
        apply(&mut state, &Command::OnlyToxic("0.8".into()));
        apply(&mut state, &Command::Stop);
        assert!(!state.active);
        assert_eq!(state.mode, Mode::OnlyToxic);
        assert_eq!(state.threshold(), 0.8);
    }

    #[test]
    fn all_messages_keeps_threshold() {
        let mut state = ChatState::default();
        state.set_threshold(0.3);
        apply(&mut state, &Command::AllMessages);
        assert!(state.active);
        assert_eq!(state.mode, Mode::All);
        assert_eq!(state.threshold(), 0.3);
    }

    #[test]
    fn only_toxic_clamps_threshold() {
        let mut state = ChatState::default();
        apply(&mut state, &Command::OnlyToxic("-5".into()));
        assert_eq!(state.threshold(), 0.0);

        let reply = apply(&mut state, &Command::OnlyToxic("5".into())).unwrap();
        assert_eq!(state.threshold(), 1.0);
        assert!(reply.contains("1.00"));
    }

    #[test]
    fn only_toxic_with_garbage_switches_mode_but_keeps_threshold() {
        let mut state = ChatState::default();
        state.set_threshold(0.35);
        let reply = apply(&mut state, &Command::OnlyToxic("abc".into())).unwrap();
        assert!(state.active);
        assert_eq!(state.mode, Mode::OnlyToxic);
        assert_eq!(state.threshold(), 0.35);
        assert!(reply.contains("числом"));
        assert!(reply.contains("0.35"));
    }

    #[test]
    fn status_and_help_do_not_mutate() {
        let mut state = ChatState::default();
        let before = state.clone();
        apply(&mut state, &Command::Status);
        apply(&mut state, &Command::Help);
        assert_eq!(state, before);
        assert_eq!(apply(&mut state, &Command::Joke), None);
    }
}
