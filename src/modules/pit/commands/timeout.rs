use super::run;
use crate::services::pit::PitCommand;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Put yourself in the pit for a while
#[poise::command(slash_command, guild_only)]
pub async fn selftimeout(
    ctx: Context<'_>,
    #[description = "Hours to spend in the pit (e.g. 1.5)"] hours: f64,
) -> Result<(), Error> {
    let command = PitCommand::SelfTimeout {
        user_id: ctx.author().id.get(),
        hours,
    };
    run(ctx, command, true).await
}

/// Put a user in the pit for a fixed time, without a strike
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "User to timeout"] user: serenity::User,
    #[description = "Hours in the pit (e.g. 0.5)"] hours: f64,
    #[description = "Reason for the timeout"] comment: Option<String>,
) -> Result<(), Error> {
    let command = PitCommand::ManualTimeout {
        user_id: user.id.get(),
        moderator_id: ctx.author().id.get(),
        hours,
        comment,
    };
    run(ctx, command, false).await
}
