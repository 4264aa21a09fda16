use super::run;
use crate::services::pit::PitCommand;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Warn a user. Warnings are recorded but never pit anyone.
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: serenity::User,
    #[description = "What the warning is for"] comment: String,
) -> Result<(), Error> {
    let command = PitCommand::Warn {
        user_id: user.id.get(),
        moderator_id: ctx.author().id.get(),
        comment,
    };
    run(ctx, command, false).await
}

/// List the warnings of a user
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    run(ctx, PitCommand::ListWarnings { user_id: user.id.get() }, true).await
}

/// Show the pit status of a user
#[poise::command(slash_command, guild_only)]
pub async fn pit(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    run(ctx, PitCommand::Status { user_id: target.id.get() }, true).await
}
