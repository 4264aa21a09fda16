use super::run;
use crate::services::localization::ContextL10nExt;
use crate::services::pit::{PitCommand, format};
use crate::services::roulette::Pull;
use crate::{Context, Error};
use fluent::FluentArgs;

/// Spin the revolver. One chamber in six sends you to the pit.
#[poise::command(slash_command, guild_only)]
pub async fn roulette(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();
    let l10n = ctx.l10n_user();

    match data.roulette.pull(user_id) {
        Pull::Cooldown { remaining } => {
            let mut args = FluentArgs::new();
            args.set(
                "retry",
                format::relative(ctx.created_at().to_utc() + chrono::Duration::from_std(remaining)?),
            );
            ctx.send(
                poise::CreateReply::default()
                    .content(l10n.t("pit-roulette-cooldown", Some(&args)))
                    .ephemeral(true),
            )
            .await?;
            Ok(())
        }
        Pull::Click => {
            ctx.say(l10n.t("pit-roulette-click", None)).await?;
            Ok(())
        }
        Pull::Bang => {
            let command = PitCommand::MinigamePenalty {
                user_id,
                duration: data.pit.config().roulette_penalty,
                comment: Some("Roulette".to_string()),
            };
            run(ctx, command, false).await
        }
    }
}
