//! Account Discord commands - `credits`, `history`, `borrows` and `stats`.
//!
//! Read-only views of the caller's credit account. The account is created with the
//! default starting credit the first time a user runs any of these.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, reply_or_propagate},
        core::{
            borrow::BorrowFilter,
            history::HistoryFilter,
            report,
            service::CreditLedger,
        },
        errors::{Error, Result},
    };

    const HISTORY_PAGE_SIZE: u64 = 10;

    /// Shows your credit balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn credits(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let ledger = &ctx.data().ledger;
        let account = ledger.account_for_user(&ctx.author().id.to_string()).await?;

        match ledger.account_snapshot(account.id).await {
            Ok(snapshot) => {
                ctx.say(report::format_account_summary(&snapshot)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Lists your credit transactions, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Transaction type: all, deduct, return, penalty or bonus"]
        #[autocomplete = "autocomplete::autocomplete_history_filter"]
        filter: Option<String>,
        #[description = "Page number (starts at 1)"] page: Option<u64>,
    ) -> Result<()> {
        let filter = match filter.as_deref().unwrap_or("all").parse::<HistoryFilter>() {
            Ok(filter) => filter,
            Err(e) => return reply_or_propagate(ctx, e).await,
        };

        let ledger = &ctx.data().ledger;
        let account = ledger.account_for_user(&ctx.author().id.to_string()).await?;

        match ledger
            .list_history(account.id, filter, page.unwrap_or(1), HISTORY_PAGE_SIZE)
            .await
        {
            Ok(page) => {
                ctx.say(report::format_history_page(&page)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Lists your borrowed and returned equipment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn borrows(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Status: all, borrowed, overdue, returned or returned_late"]
        #[autocomplete = "autocomplete::autocomplete_borrow_filter"]
        status: Option<String>,
    ) -> Result<()> {
        let filter = match status.as_deref().unwrap_or("all").parse::<BorrowFilter>() {
            Ok(filter) => filter,
            Err(e) => return reply_or_propagate(ctx, e).await,
        };

        let ledger = &ctx.data().ledger;
        let account = ledger.account_for_user(&ctx.author().id.to_string()).await?;

        match ledger.list_borrows(account.id, filter).await {
            Ok(borrows) => {
                ctx.say(report::format_borrow_list(&borrows)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Shows this month's credit totals.
    #[poise::command(slash_command, prefix_command)]
    pub async fn stats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let ledger = &ctx.data().ledger;
        let account = ledger.account_for_user(&ctx.author().id.to_string()).await?;

        match ledger.monthly_stats(account.id, chrono::Utc::now()).await {
            Ok(stats) => {
                ctx.say(report::format_monthly_stats(&stats)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
