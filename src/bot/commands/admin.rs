//! Administrator Discord commands - `bonus` and `accrue`.
//!
//! Both check the caller against `LEDGER_ADMIN_IDS` before touching any account.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, reply_or_propagate},
        core::{report, service::CreditLedger},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    const NOT_ADMIN: &str = "❌ Only ledger administrators can use this command.";

    /// Awards bonus credit to a user (admin only).
    #[poise::command(slash_command, prefix_command)]
    pub async fn bonus(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User receiving the bonus"] user: serenity::User,
        #[description = "Credit to award"] amount: i64,
        #[description = "Note shown in the user's history"] note: Option<String>,
    ) -> Result<()> {
        let admin_id = ctx.author().id.to_string();
        if !ctx.data().is_admin(&admin_id) {
            ctx.say(NOT_ADMIN).await?;
            return Ok(());
        }

        let ledger = &ctx.data().ledger;
        let account = ledger.account_for_user(&user.id.to_string()).await?;
        let note = note.unwrap_or_else(|| format!("Awarded by {}", ctx.author().name));

        match ledger.record_bonus(account.id, amount, &note).await {
            Ok(receipt) => {
                info!(admin = %admin_id, target = %user.id, amount, "Bonus awarded");
                ctx.say(format!(
                    "{} ({})",
                    report::format_bonus_receipt(&receipt),
                    user.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Runs time-based credit restoration for every account now (admin only).
    #[poise::command(slash_command, prefix_command)]
    pub async fn accrue(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ctx.data().is_admin(&ctx.author().id.to_string()) {
            ctx.say(NOT_ADMIN).await?;
            return Ok(());
        }

        let outcomes = ctx.data().ledger.accrue_all().await?;
        let credited: Vec<_> = outcomes.iter().filter(|o| o.amount > 0).collect();
        let total: i64 = credited.iter().map(|o| o.amount).sum();

        ctx.say(format!(
            "✅ Accrual finished: {} account(s) credited, {total} credit(s) restored.",
            credited.len()
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
