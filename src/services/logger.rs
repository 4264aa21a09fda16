use crate::Error;
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Audit,
}

impl LogLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            LogLevel::Info => "ℹ️",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
            LogLevel::Audit => "📝",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            LogLevel::Info => 0x3498db,  // Blue
            LogLevel::Warn => 0xf1c40f,  // Yellow
            LogLevel::Error => 0xe74c3c, // Red
            LogLevel::Audit => 0x95a5a6, // Gray
        }
    }
}

/// A log-channel entry before it is turned into components.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
}

pub struct LoggerService {
    log_channel: Option<serenity::ChannelId>,
}

impl LoggerService {
    pub fn new(log_channel: Option<serenity::ChannelId>) -> Self {
        Self { log_channel }
    }

    /// Posts an entry to the moderation log channel. Does nothing when no
    /// channel is configured.
    pub async fn log_action(&self, http: &serenity::Http, entry: &LogEntry) -> Result<(), Error> {
        let Some(channel_id) = self.log_channel else {
            return Ok(());
        };

        let mut inner_components = vec![];

        // Header
        inner_components.push(serenity::CreateContainerComponent::TextDisplay(
            serenity::CreateTextDisplay::new(format!("### {} {}", entry.level.icon(), entry.title)),
        ));

        inner_components.push(serenity::CreateContainerComponent::Separator(
            serenity::CreateSeparator::new(true),
        ));

        inner_components.push(serenity::CreateContainerComponent::TextDisplay(
            serenity::CreateTextDisplay::new(entry.description.clone()),
        ));

        if !entry.fields.is_empty() {
            inner_components.push(serenity::CreateContainerComponent::Separator(
                serenity::CreateSeparator::new(false),
            ));

            for (name, value) in &entry.fields {
                inner_components.push(serenity::CreateContainerComponent::TextDisplay(
                    serenity::CreateTextDisplay::new(format!("> **{}**\n> {}", name, value)),
                ));
            }
        }

        let message = serenity::CreateMessage::new()
            .flags(serenity::MessageFlags::IS_COMPONENTS_V2)
            .components(vec![serenity::CreateComponent::Container(
                serenity::CreateContainer::new(inner_components).accent_color(entry.level.color()),
            )])
            .allowed_mentions(serenity::CreateAllowedMentions::new());

        http.send_message(channel_id.into(), Vec::new(), &message)
            .await?;

        Ok(())
    }
}
