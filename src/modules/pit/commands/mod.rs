mod roulette;
mod status;
mod strike;
mod timeout;

use crate::modules::pit::render;
use crate::services::localization::ContextL10nExt;
use crate::services::pit::{ModerationResult, PitCommand, PitResult};
use crate::{Context, Data, Error};
use fluent::FluentArgs;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        strike::strike(),
        strike::release(),
        strike::strikes(),
        status::warn(),
        status::warnings(),
        status::pit(),
        timeout::selftimeout(),
        timeout::timeout(),
        roulette::roulette(),
    ]
}

/// Runs a pit command stamped with the interaction's creation time and replies.
pub(super) async fn run(ctx: Context<'_>, command: PitCommand, ephemeral: bool) -> Result<(), Error> {
    let outcome = ctx
        .data()
        .pit
        .execute(command, ctx.created_at().to_utc())
        .await;
    respond(ctx, outcome, ephemeral).await
}

/// Replies with the rendered outcome. Caller mistakes are answered in the
/// channel; anything else goes to the framework's error handler.
async fn respond(
    ctx: Context<'_>,
    outcome: PitResult<ModerationResult>,
    ephemeral: bool,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_user_facing() => {
            let mut args = FluentArgs::new();
            args.set("error", e.to_string());
            ctx.send(
                poise::CreateReply::default()
                    .content(l10n.t("pit-error", Some(&args)))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Mutations that wrote nothing were duplicate deliveries of the same event
    let content = if !result.inserted && !result.action.is_read_only() {
        l10n.t("pit-duplicate", None)
    } else {
        render::result(&l10n, &result)
    };

    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(ephemeral),
    )
    .await?;
    Ok(())
}
