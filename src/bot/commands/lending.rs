//! Lending Discord commands - `borrow`, `return` and `confirm`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, reply_or_propagate},
        core::{borrow, ledger::due_date, report, service::CreditLedger},
        errors::{Error, Result},
    };
    use chrono::Utc;

    /// Borrows equipment from the catalog, deducting its credit cost.
    #[poise::command(slash_command, prefix_command)]
    pub async fn borrow(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Equipment name or ID"]
        #[autocomplete = "autocomplete::autocomplete_equipment"]
        equipment: String,
        #[description = "Loan length in days"] days: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let ledger = &data.ledger;

        let request = match due_date(Utc::now(), days, ledger.policy())
            .and_then(|due| data.catalog.borrow_request(&equipment, due))
        {
            Ok(request) => request,
            Err(e) => return reply_or_propagate(ctx, e).await,
        };

        let account = ledger.account_for_user(&ctx.author().id.to_string()).await?;
        match ledger.record_borrow(account.id, request).await {
            Ok(receipt) => {
                ctx.say(report::format_borrow_receipt(&receipt)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Returns borrowed equipment.
    #[poise::command(slash_command, prefix_command, rename = "return")]
    pub async fn return_item(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Borrow ID"]
        #[autocomplete = "autocomplete::autocomplete_open_borrow"]
        borrow_id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let ledger = &data.ledger;
        let user_id = ctx.author().id.to_string();

        // Admins may close anyone's borrow, everyone else only their own
        if !data.is_admin(&user_id) {
            let account = ledger.account_for_user(&user_id).await?;
            let owned = borrow::get_borrow_by_id(ledger.database(), borrow_id)
                .await?
                .is_some_and(|b| b.account_id == account.id);
            if !owned {
                ctx.say(format!("❌ You have no borrow #{borrow_id}.")).await?;
                return Ok(());
            }
        }

        match ledger.record_return(borrow_id, Utc::now()).await {
            Ok(receipt) => {
                ctx.say(report::format_return_receipt(&receipt)).await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }

    /// Confirms that borrowed equipment was handed out (admin only).
    #[poise::command(slash_command, prefix_command)]
    pub async fn confirm(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Borrow ID"] borrow_id: i64,
    ) -> Result<()> {
        if !ctx.data().is_admin(&ctx.author().id.to_string()) {
            ctx.say("❌ Only ledger administrators can confirm borrows.")
                .await?;
            return Ok(());
        }

        match ctx.data().ledger.confirm_borrow(borrow_id).await {
            Ok(entry) => {
                ctx.say(format!(
                    "✅ Confirmed borrow #{borrow_id}: {}",
                    report::format_transaction_line(&entry)
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_or_propagate(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
