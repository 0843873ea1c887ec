//! `mart init` - create the store and load demo data.

use anyhow::Result;
use mart_bank::merchant::bootstrap_merchant;

use crate::commands::InitArgs;
use crate::context::Context;
use crate::seed;

pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    // Opening the context already bootstrapped the schema.
    ctx.output
        .info(&format!("Store ready at {}", ctx.config.store.path));

    if args.no_demo {
        let merchant = bootstrap_merchant(&ctx.db, &ctx.config.merchant.name).await?;
        ctx.output
            .success(&format!("Merchant account {} provisioned", merchant.id));
        return Ok(());
    }

    seed::seed(&ctx.db, &ctx.config.merchant.name, &ctx.output).await
}
