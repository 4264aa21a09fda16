use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

mod db;
mod modules;
mod services;

use services::pit::PitService;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Publish commands. If no guild ID is provided, publish globally.
    #[arg(long, num_args = 0..)]
    publish: Option<Vec<u64>>,

    /// Clear all commands instead of publishing them.
    #[arg(long)]
    clear: bool,

    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,
}

// Custom user data passed to all command functions
pub struct Data {
    pub l10n: Arc<services::localization::LocalizationManager>,
    pub pit: Arc<PitService>,
    pub roulette: Arc<services::roulette::RouletteService>,
    /// The one guild whose pit this bot manages.
    pub guild_id: serenity::GuildId,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

fn env_id(key: &str) -> anyhow::Result<u64> {
    let raw = std::env::var(key).with_context(|| format!("missing {key}"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("{key} is not a Discord id: {raw}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting pit bot...");

    let database_url = std::env::var("DATABASE_URL").context("missing DATABASE_URL")?;
    let db = db::establish_connection(&database_url)
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&db, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        std::process::exit(0);
    }

    let token = serenity::Token::from_env("DISCORD_TOKEN").context("missing DISCORD_TOKEN")?;
    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    // Initialize localization manager
    let l10n = Arc::new(services::localization::LocalizationManager::new());

    // Load and translate commands
    let commands = modules::commands();
    for definition in modules::definitions() {
        let fallback = services::localization::FALLBACK_LOCALE;
        info!(
            "Loaded module {} ({}): {}",
            definition.id,
            l10n.translate(fallback, definition.name_key, None),
            l10n.translate(fallback, definition.description_key, None)
        );
    }

    let framework_options = poise::FrameworkOptions {
        commands,
        ..Default::default()
    };

    // Handle command registration if requested
    if let Some(publish_args) = args.publish {
        let http = serenity::HttpBuilder::new(token.clone()).build();
        let bot_user = http
            .get_current_user()
            .await
            .context("Failed to fetch bot user info")?;
        let application_id = bot_user.id;

        info!("Fetched Application ID: {}", application_id);

        let http = serenity::HttpBuilder::new(token.clone())
            .application_id(serenity::ApplicationId::new(application_id.get()))
            .build();

        let empty_commands = vec![];
        let commands = if args.clear {
            &empty_commands
        } else {
            &framework_options.commands
        };

        if publish_args.is_empty() {
            if args.clear {
                info!("Clearing commands globally...");
            } else {
                info!("Registering commands globally...");
            }

            if let Err(e) = poise::builtins::register_globally(&http, commands).await {
                error!("Failed to register commands globally: {}", e);
            } else {
                info!("Global command operation successful");
            }
        } else {
            for guild_id in publish_args {
                if args.clear {
                    info!("Clearing commands in guild {}...", guild_id);
                } else {
                    info!("Registering commands in guild {}...", guild_id);
                }

                if let Err(e) = poise::builtins::register_in_guild(
                    &http,
                    commands,
                    serenity::GuildId::new(guild_id),
                )
                .await
                {
                    error!("Failed to register commands in guild {}: {}", guild_id, e);
                } else {
                    info!("Guild command operation successful for guild {}", guild_id);
                }
            }
        }
        std::process::exit(0);
    }

    let guild_id = serenity::GuildId::new(env_id("GUILD_ID")?);
    let pit_role = serenity::RoleId::new(env_id("PIT_ROLE_ID")?);
    let log_channel = match std::env::var("LOG_CHANNEL_ID") {
        Ok(_) => Some(serenity::ChannelId::new(env_id("LOG_CHANNEL_ID")?)),
        Err(_) => None,
    };
    let config = services::pit::PitConfig::from_env().context("Invalid pit configuration")?;
    info!("Pit configuration: {:?}", config);

    // Initialize logger service
    let logger = Arc::new(services::logger::LoggerService::new(log_channel));

    // Role, DM and log-channel access for the pit engine
    let http = Arc::new(serenity::HttpBuilder::new(token.clone()).build());
    let gateway = Arc::new(services::pit::gateway::DiscordGateway::new(
        http,
        guild_id,
        pit_role,
        logger,
        l10n.clone(),
    ));

    let roulette = Arc::new(services::roulette::RouletteService::new(
        config.roulette_cooldown,
    ));

    // Initialize pit service
    let pit = Arc::new(PitService::new(
        Arc::new(services::pit::store::DbLedgerStore::new(db)),
        gateway.clone(),
        gateway,
        config,
    ));

    // Create the poise framework
    let framework = poise::Framework::new(framework_options);

    let mut cache_settings = serenity::cache::Settings::default();
    cache_settings.cache_users = true;
    cache_settings.cache_guilds = true;

    // Build the client with both poise framework and custom event handler
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(Box::new(framework))
        .event_handler(Arc::new(services::event_manager::Handler))
        .cache_settings(cache_settings)
        .data(Arc::new(Data {
            l10n,
            pit: pit.clone(),
            roulette,
            guild_id,
        }) as _)
        .await
        .context("Failed to create client")?;

    // Start pit sweep runner
    pit.start_sweep_runner();

    info!("Bot is ready!");
    client.start_autosharded().await.context("Client error")?;

    Ok(())
}
