use crate::Data;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::{error, info};

/// Custom event handler for non-command Discord events
pub struct Handler;

#[serenity::async_trait]
impl serenity::EventHandler for Handler {
    async fn dispatch(&self, ctx: &serenity::Context, event: &serenity::FullEvent) {
        match event {
            serenity::FullEvent::Ready { data_about_bot, .. } => {
                info!("Logged in as {}", data_about_bot.user.name);
            }
            // Leaving and rejoining must not shake off the pit role
            serenity::FullEvent::GuildMemberAddition { new_member, .. } => {
                let data = ctx.data::<Data>();
                if new_member.guild_id != data.guild_id {
                    return;
                }

                let user_id = new_member.user.id.get();
                match data.pit.resync(user_id, Utc::now(), None).await {
                    Ok(outcome) => info!("Resynced pit role for rejoining user {}: {:?}", user_id, outcome),
                    Err(e) => error!("Error resyncing pit role for user {}: {:?}", user_id, e),
                }
            }
            _ => {}
        }
    }
}
