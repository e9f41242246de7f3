//! Conversation engine - routes each inbound message by the chat's
//! current flow state.
//!
//! Sessions live in memory, keyed by chat id. Each session sits behind its
//! own async mutex, so messages from one chat are processed strictly in
//! arrival order while unrelated chats proceed concurrently. A session has
//! no timeout: a chat may sit mid-flow indefinitely until its next message
//! or a global command.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::errors::{BotError, LedgerError};
use crate::domain::entities::{
    parse_positive_decimal, Command, Content, Currency, FlowState, Message, Session,
    ADD_CURRENCY_LABEL, CHANGE_RATE_LABEL, DELETE_CURRENCY_LABEL,
};
use crate::domain::traits::{KeyboardButton, Store};
use crate::domain::triangle::Triangle;

use super::ledger::CurrencyLedger;

const NO_ACCESS: &str = "You do not have access to this command.";

const USAGE_HINT: &str = "Nothing in progress. Use /help to see the available commands.";

const HELP_TEXT: &str = "Available commands:\n\
    /start - greeting and the command keyboard\n\
    /currencies - list saved currencies\n\
    /convert - convert an amount to the reference currency\n\
    /manage - open the management panel (admins)\n\
    /triangle <a> <b> <c> - classify a triangle by side lengths\n\
    /cancel - abandon the current operation\n\
    /version - show bot version";

/// Outbound reply: text plus an optional reply keyboard.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Vec<Vec<KeyboardButton>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, rows: Vec<Vec<KeyboardButton>>) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(rows),
        }
    }
}

/// The conversational state machine for multi-step currency management.
///
/// Every inbound message yields exactly one [`Reply`], and a transition
/// writes to the ledger at most once.
pub struct ConversationEngine<S: Store> {
    ledger: CurrencyLedger<S>,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
    reference: String,
}

impl<S: Store> ConversationEngine<S> {
    pub fn new(ledger: CurrencyLedger<S>, reference_currency: impl Into<String>) -> Self {
        Self {
            ledger,
            sessions: Mutex::new(HashMap::new()),
            reference: reference_currency.into(),
        }
    }

    pub fn ledger(&self) -> &CurrencyLedger<S> {
        &self.ledger
    }

    async fn session(&self, chat_id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(chat_id))))
            .clone()
    }

    /// Handle one inbound message and produce the reply.
    pub async fn handle(&self, message: &Message) -> Result<Reply, BotError> {
        let session = self.session(&message.chat_id).await;
        let mut session = session.lock().await;

        let reply = match &message.content {
            Content::Command { name, args } => {
                // A global command always interrupts a pending flow.
                if !session.is_idle() {
                    session.reset();
                }
                let command = Command::from_name(name, args.clone());
                self.handle_command(&mut session, message, command).await
            }
            Content::Text(text) => match Command::from_button_label(text) {
                Some(trigger) => {
                    if !session.is_idle() {
                        session.reset();
                    }
                    self.handle_command(&mut session, message, trigger).await
                }
                None => self.handle_text(&mut session, text).await,
            },
            Content::Empty => Ok(Reply::text(USAGE_HINT)),
        };

        tracing::debug!("[{}] state after message: {:?}", session.chat_id, session.state);
        reply
    }

    async fn handle_command(
        &self,
        session: &mut Session,
        message: &Message,
        command: Command,
    ) -> Result<Reply, BotError> {
        let chat_id = &message.chat_id;
        match command {
            Command::Start => {
                let greeting = match &message.sender {
                    Some(user) => format!("Hello, {}!", user.display_name()),
                    None => "Hello!".to_string(),
                };
                let mut text = format!(
                    "{}\n\nAvailable commands:\n\
                     /currencies - list saved currencies\n\
                     /convert - convert an amount to {}",
                    greeting, self.reference
                );
                let mut rows = vec![vec![
                    KeyboardButton::new("/currencies"),
                    KeyboardButton::new("/convert"),
                ]];
                if self.ledger.is_admin(chat_id).await? {
                    text.push_str("\n/manage - open the management panel");
                    rows.push(vec![KeyboardButton::new("/manage")]);
                }
                Ok(Reply::with_keyboard(text, rows))
            }
            Command::Help => Ok(Reply::text(HELP_TEXT)),
            Command::Version => Ok(Reply::text(concat!("kurs-bot v", env!("CARGO_PKG_VERSION")))),
            Command::ListCurrencies => {
                let currencies = self.ledger.list_all().await?;
                if currencies.is_empty() {
                    return Ok(Reply::text("No currencies saved yet."));
                }
                let mut text = String::from("Saved currencies:\n");
                for Currency { name, rate } in &currencies {
                    text.push_str(&format!("{}: {} {}\n", name, rate, self.reference));
                }
                Ok(Reply::text(text.trim_end()))
            }
            Command::Manage => {
                if !self.ledger.is_admin(chat_id).await? {
                    return Ok(Reply::text(NO_ACCESS));
                }
                Ok(Reply::with_keyboard(
                    "Choose an action:",
                    vec![vec![
                        KeyboardButton::new(ADD_CURRENCY_LABEL),
                        KeyboardButton::new(DELETE_CURRENCY_LABEL),
                        KeyboardButton::new(CHANGE_RATE_LABEL),
                    ]],
                ))
            }
            Command::AddCurrency => {
                self.enter_admin_flow(
                    session,
                    chat_id,
                    FlowState::AwaitingAddName,
                    "Enter the currency name:",
                )
                .await
            }
            Command::DeleteCurrency => {
                self.enter_admin_flow(
                    session,
                    chat_id,
                    FlowState::AwaitingDeleteName,
                    "Enter the currency name to delete:",
                )
                .await
            }
            Command::ChangeRate => {
                self.enter_admin_flow(
                    session,
                    chat_id,
                    FlowState::AwaitingChangeName,
                    "Enter the currency name:",
                )
                .await
            }
            Command::Convert => {
                session.advance(FlowState::AwaitingConvertName, None);
                Ok(Reply::text("Enter the currency name:"))
            }
            Command::Cancel => Ok(Reply::text("Cancelled.")),
            Command::Triangle(args) => Ok(Reply::text(triangle_report(&args))),
            Command::Unknown(name) => Ok(Reply::text(format!(
                "Unknown command: /{}\nUse /help to see the available commands.",
                name
            ))),
        }
    }

    /// The add/delete/change flows are restricted to admin identities.
    async fn enter_admin_flow(
        &self,
        session: &mut Session,
        chat_id: &str,
        state: FlowState,
        prompt: &str,
    ) -> Result<Reply, BotError> {
        if !self.ledger.is_admin(chat_id).await? {
            return Ok(Reply::text(NO_ACCESS));
        }
        session.advance(state, None);
        Ok(Reply::text(prompt))
    }

    /// Free text is interpreted against the session's current state.
    async fn handle_text(&self, session: &mut Session, text: &str) -> Result<Reply, BotError> {
        let input = text.trim();
        match session.state {
            FlowState::Idle => Ok(Reply::text(USAGE_HINT)),

            FlowState::AwaitingAddName => {
                if self.ledger.exists(input).await? {
                    session.reset();
                    return Ok(Reply::text(format!("Currency {} already exists.", input)));
                }
                session.advance(FlowState::AwaitingAddRate, Some(input.to_string()));
                Ok(Reply::text(format!(
                    "Enter the rate of {} to {}:",
                    input, self.reference
                )))
            }

            FlowState::AwaitingAddRate => {
                let name = session.pending_currency.take().unwrap_or_default();
                session.reset();
                let rate = match parse_positive_decimal(input) {
                    Ok(rate) => rate,
                    Err(e) => return Ok(Reply::text(format!("{}. Operation cancelled.", e))),
                };
                match self.ledger.insert(&name, rate).await {
                    Ok(()) => Ok(Reply::text(format!(
                        "Currency {} added with rate {}.",
                        name, rate
                    ))),
                    Err(LedgerError::DuplicateCurrency(_)) => {
                        Ok(Reply::text(format!("Currency {} already exists.", name)))
                    }
                    Err(other) => Err(other.into()),
                }
            }

            FlowState::AwaitingDeleteName => {
                session.reset();
                self.ledger.delete(input).await?;
                Ok(Reply::text(format!("Currency {} removed.", input)))
            }

            FlowState::AwaitingChangeName => {
                if !self.ledger.exists(input).await? {
                    session.reset();
                    return Ok(Reply::text(format!("Currency {} not found.", input)));
                }
                session.advance(FlowState::AwaitingChangeRate, Some(input.to_string()));
                Ok(Reply::text(format!(
                    "Enter the new rate of {} to {}:",
                    input, self.reference
                )))
            }

            FlowState::AwaitingChangeRate => {
                let name = session.pending_currency.take().unwrap_or_default();
                session.reset();
                let rate = match parse_positive_decimal(input) {
                    Ok(rate) => rate,
                    Err(e) => return Ok(Reply::text(format!("{}. Operation cancelled.", e))),
                };
                match self.ledger.update_rate(&name, rate).await {
                    Ok(()) => Ok(Reply::text(format!("Rate of {} changed to {}.", name, rate))),
                    Err(LedgerError::CurrencyNotFound(_)) => {
                        Ok(Reply::text(format!("Currency {} not found.", name)))
                    }
                    Err(other) => Err(other.into()),
                }
            }

            FlowState::AwaitingConvertName => {
                // Existence is checked at the amount step, once the lookup
                // actually happens.
                session.advance(FlowState::AwaitingConvertAmount, Some(input.to_string()));
                Ok(Reply::text("Enter the amount to convert:"))
            }

            FlowState::AwaitingConvertAmount => {
                let name = session.pending_currency.take().unwrap_or_default();
                session.reset();
                let amount = match parse_positive_decimal(input) {
                    Ok(amount) => amount,
                    Err(e) => return Ok(Reply::text(format!("{}. Operation cancelled.", e))),
                };
                match self.ledger.get_rate(&name).await? {
                    None => Ok(Reply::text(format!("Currency {} not found.", name))),
                    Some(rate) => {
                        let converted = Currency::new(name.clone(), rate).convert(amount);
                        Ok(Reply::text(format!(
                            "{} {} = {} {}.",
                            amount, name, converted, self.reference
                        )))
                    }
                }
            }
        }
    }
}

fn triangle_report(args: &[String]) -> String {
    let sides: Vec<f64> = args.iter().filter_map(|arg| arg.parse().ok()).collect();
    if args.len() != 3 || sides.len() != 3 {
        return "Usage: /triangle <a> <b> <c>".to_string();
    }
    match Triangle::new(sides[0], sides[1], sides[2]) {
        Ok(triangle) => format!(
            "This is a {} triangle with perimeter {}.",
            triangle.kind().as_str(),
            triangle.perimeter()
        ),
        Err(e) => format!("{}.", e),
    }
}
