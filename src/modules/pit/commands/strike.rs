use super::run;
use crate::services::pit::PitCommand;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Strike a user and put them in the pit
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn strike(
    ctx: Context<'_>,
    #[description = "User to strike"] user: serenity::User,
    #[description = "Severity from 1 (minor) to 5 (severe)"]
    #[min = 1]
    #[max = 5]
    severity: i32,
    #[description = "What the strike is for"] comment: Option<String>,
) -> Result<(), Error> {
    let command = PitCommand::Strike {
        user_id: user.id.get(),
        moderator_id: ctx.author().id.get(),
        severity,
        comment,
    };
    run(ctx, command, false).await
}

/// Release a user from the pit
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn release(
    ctx: Context<'_>,
    #[description = "User to release"] user: serenity::User,
    #[description = "Also remove their newest strike, if it was a mistake"] amend: Option<bool>,
    #[description = "Reason for the release"] comment: Option<String>,
) -> Result<(), Error> {
    let command = PitCommand::Release {
        user_id: user.id.get(),
        moderator_id: ctx.author().id.get(),
        amend: amend.unwrap_or(false),
        comment,
    };
    run(ctx, command, false).await
}

/// Manage recorded strikes
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    subcommands("list", "remove", "comment", "severity")
)]
pub async fn strikes(ctx: Context<'_>) -> Result<(), Error> {
    // This is the parent command, subcommands will handle actual functionality
    ctx.send(
        poise::CreateReply::default()
            .content("Please use a subcommand: `/strikes list`, `/strikes remove`, `/strikes comment` or `/strikes severity`")
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// List every strike of a user
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn list(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    run(ctx, PitCommand::ListStrikes { user_id: user.id.get() }, true).await
}

/// Remove a strike from the record
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Strike number"] id: i32,
) -> Result<(), Error> {
    let command = PitCommand::RemoveStrike {
        strike_id: id,
        moderator_id: ctx.author().id.get(),
    };
    run(ctx, command, false).await
}

/// Replace the comment of a strike
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn comment(
    ctx: Context<'_>,
    #[description = "Strike number"] id: i32,
    #[description = "New comment"] text: String,
) -> Result<(), Error> {
    let command = PitCommand::EditComment {
        strike_id: id,
        moderator_id: ctx.author().id.get(),
        comment: text,
    };
    run(ctx, command, true).await
}

/// Change the severity of a strike
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn severity(
    ctx: Context<'_>,
    #[description = "Strike number"] id: i32,
    #[description = "New severity from 1 to 5"]
    #[min = 1]
    #[max = 5]
    severity: i32,
) -> Result<(), Error> {
    let command = PitCommand::EditSeverity {
        strike_id: id,
        moderator_id: ctx.author().id.get(),
        severity,
    };
    run(ctx, command, false).await
}
