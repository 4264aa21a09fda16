use super::error::{ModerationError, PitResult};
use super::format;
use super::sync::{Notice, Notifier, SuspensionFlag};
use crate::services::localization::{FALLBACK_LOCALE, LocalizationManager};
use crate::services::logger::LoggerService;
use futures::StreamExt;
use poise::serenity_prelude as serenity;
use std::pin::pin;
use std::sync::Arc;

/// Discord side of the pit: the pit role is the suspension flag, DMs and the
/// log channel carry notices.
pub struct DiscordGateway {
    http: Arc<serenity::Http>,
    guild_id: serenity::GuildId,
    pit_role: serenity::RoleId,
    logger: Arc<LoggerService>,
    l10n: Arc<LocalizationManager>,
}

impl DiscordGateway {
    pub fn new(
        http: Arc<serenity::Http>,
        guild_id: serenity::GuildId,
        pit_role: serenity::RoleId,
        logger: Arc<LoggerService>,
        l10n: Arc<LocalizationManager>,
    ) -> Self {
        Self {
            http,
            guild_id,
            pit_role,
            logger,
            l10n,
        }
    }

    async fn member(&self, user_id: u64) -> PitResult<serenity::Member> {
        self.guild_id
            .member(&self.http, serenity::UserId::new(user_id))
            .await
            .map_err(|e| ModerationError::ExternalState(format!("member {user_id}: {e}")))
    }
}

fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(e) if e.status_code().is_some_and(|status| status.as_u16() == 404)
    )
}

#[async_trait::async_trait]
impl SuspensionFlag for DiscordGateway {
    async fn is_flagged(&self, user_id: u64) -> PitResult<Option<bool>> {
        match self
            .guild_id
            .member(&self.http, serenity::UserId::new(user_id))
            .await
        {
            Ok(member) => Ok(Some(member.roles.contains(&self.pit_role))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(ModerationError::ExternalState(format!(
                "member {user_id}: {e}"
            ))),
        }
    }

    async fn set_flagged(&self, user_id: u64, flagged: bool, reason: &str) -> PitResult<()> {
        let member = self.member(user_id).await?;
        let result = if flagged {
            member.add_role(&self.http, self.pit_role, Some(reason)).await
        } else {
            member.remove_role(&self.http, self.pit_role, Some(reason)).await
        };
        result.map_err(|e| ModerationError::ExternalState(e.to_string()))
    }

    async fn flagged_users(&self) -> PitResult<Vec<u64>> {
        let mut members = pin!(self.guild_id.members_iter(&self.http));
        let mut users = Vec::new();
        while let Some(member) = members.next().await {
            let member = member
                .map_err(|e| ModerationError::ExternalState(format!("member list: {e}")))?;
            if member.roles.contains(&self.pit_role) {
                users.push(member.user.id.get());
            }
        }
        Ok(users)
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordGateway {
    async fn direct_message(&self, user_id: u64, notice: &Notice) -> PitResult<()> {
        let l10n = self.l10n.get_proxy(FALLBACK_LOCALE);
        let Some(content) = format::direct_message(&l10n, notice) else {
            return Ok(());
        };

        serenity::UserId::new(user_id)
            .direct_message(&self.http, serenity::CreateMessage::new().content(content))
            .await
            .map_err(|e| ModerationError::NotificationDelivery(e.to_string()))?;
        Ok(())
    }

    async fn log(&self, notice: &Notice) -> PitResult<()> {
        let l10n = self.l10n.get_proxy(FALLBACK_LOCALE);
        let entry = format::log_entry(&l10n, notice);

        self.logger
            .log_action(&self.http, &entry)
            .await
            .map_err(|e| ModerationError::NotificationDelivery(e.to_string()))
    }
}
