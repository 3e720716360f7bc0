//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the credit ledger,
//! including all slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (credits, lending, admin, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{catalog::EquipmentCatalog, service::Ledger},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use tracing::{error, info};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Ledger service backing every command
    pub ledger: Ledger,
    /// Discord user IDs allowed to run admin commands
    pub admins: HashSet<String>,
    /// Equipment that can be borrowed and its price
    pub catalog: EquipmentCatalog,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        ledger: Ledger,
        admins: HashSet<String>,
        catalog: EquipmentCatalog,
    ) -> Self {
        Self {
            ledger,
            admins,
            catalog,
        }
    }

    /// Whether `user_id` may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

/// Poise context type used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Turns expected ledger failures into a reply for the user.
///
/// Returns `None` for infrastructure errors, which should propagate instead.
#[must_use]
pub fn user_message(err: &Error) -> Option<String> {
    match err {
        Error::InsufficientCredit {
            available,
            required,
        } => Some(format!(
            "❌ Insufficient credit! You have {available}, but this needs {required}."
        )),
        Error::NotFound { entity, id } => Some(format!("❌ {entity} {id} was not found.")),
        Error::InvalidArgument { message } => Some(format!("❌ {message}")),
        Error::ConcurrencyConflict { .. } => {
            Some("❌ Your account changed while processing. Please try again.".to_string())
        }
        _ => None,
    }
}

/// Replies with `user_message` for expected failures, propagates the rest.
pub async fn reply_or_propagate(ctx: Context<'_>, err: Error) -> Result<()> {
    match user_message(&err) {
        Some(message) => {
            ctx.say(message).await?;
            Ok(())
        }
        None => Err(err),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .say("An error occurred. Nothing was changed, please try again.")
                .await
            {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Registers the slash commands and runs the Discord client until it stops.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::credits(),
                commands::history(),
                commands::borrows(),
                commands::stats(),
                commands::borrow(),
                commands::return_item(),
                commands::confirm(),
                commands::bonus(),
                commands::accrue(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_domain_errors() {
        let msg = user_message(&Error::InsufficientCredit {
            available: 10,
            required: 15,
        });
        assert_eq!(
            msg.as_deref(),
            Some("❌ Insufficient credit! You have 10, but this needs 15.")
        );

        let msg = user_message(&Error::not_found("Borrow", 4));
        assert_eq!(msg.as_deref(), Some("❌ Borrow 4 was not found."));

        assert!(user_message(&Error::invalid("page numbers start at 1")).is_some());
        assert!(user_message(&Error::ConcurrencyConflict { account_id: 1 }).is_some());
    }

    #[test]
    fn test_user_message_ignores_infrastructure_errors() {
        let err = Error::Config {
            message: "bad".to_string(),
        };
        assert!(user_message(&err).is_none());
    }
}
