//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Equipment Credit Help**\n\
        Borrowing equipment costs credit. Return it on time to get the credit back; \
        late returns cost extra per day. Open borrows slowly restore credit over time.\n\n\
        **Your Account**\n\
        • `/credits` - Shows your balance, totals and credit held by open borrows.\n\
        • `/history [filter] [page]` - Lists your transactions (all, deduct, return, penalty, bonus).\n\
        • `/borrows [status]` - Lists your borrows (all, borrowed, overdue, returned, returned_late).\n\
        • `/stats` - Shows this month's credit totals.\n\n\
        **Lending**\n\
        • `/borrow <equipment> <days>` - Borrows catalog equipment and deducts its listed cost.\n\
        • `/return <borrow_id>` - Returns borrowed equipment.\n\n\
        **Admin Commands**\n\
        • `/confirm <borrow_id>` - Confirms that borrowed equipment was issued.\n\
        • `/bonus <user> <amount> [note]` - Awards bonus credit.\n\
        • `/accrue` - Runs time-based credit restoration now.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
