//! DealScout Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use tracing::{error, info, warn};

use DealScout::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, create_pool, run_migrations},
    services::ServiceFactory,
    state::StateStorage,
    i18n::I18n,
    handlers::{self, AppContext},
    jobs,
    models::event::ChatEvent,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Fallback cadence for the two scheduled jobs when no external scheduler
/// drives them (single-flight per job is assumed at the scheduler level)
const JOB_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting DealScout Telegram Bot...");

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await?;

    info!("Running database migrations...");
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);

    // Initialize i18n system
    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations().await?;

    // Initialize search session storage
    info!("Connecting to Redis...");
    let state_storage = StateStorage::new(settings.redis.clone()).await?;

    // Initialize bot and services
    let bot = Bot::new(&settings.bot.token);
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), settings.clone(), database_service, i18n.clone())?;

    let ctx = Arc::new(AppContext {
        services,
        state: state_storage,
        i18n,
        settings: settings.clone(),
    });

    // Scheduled jobs
    if settings.features.daily_broadcast {
        spawn_job("daily_top", Arc::clone(&ctx), |ctx| async move {
            jobs::run_daily_top_broadcast(&ctx).await.map(|_| ())
        });
    }
    if settings.features.price_watch {
        spawn_job("price_drop", Arc::clone(&ctx), |ctx| async move {
            jobs::run_price_drop_sweep(&ctx).await.map(|_| ())
        });
    }

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("DealScout bot is ready!");
    dispatcher.dispatch().await;

    info!("DealScout bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
}

/// Normalize an incoming message and hand it to the router
async fn handle_message(msg: Message, ctx: Arc<AppContext>) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        // Channel posts and service messages carry no author
        return Ok(());
    };

    let event = ChatEvent {
        user_id: user.id.0 as i64,
        chat_id: msg.chat.id.0,
        text: msg.text().map(|t| t.to_string()),
        is_callback: false,
        callback_data: None,
        locale: user.language_code.clone(),
        display_name: Some(user.first_name.clone()),
    };

    dispatch_event(event, &ctx).await
}

/// Normalize a callback query and hand it to the router
async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: Arc<AppContext>) -> HandlerResult {
    // Answer first to clear the button loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(callback_id = %query.id, error = %e, "Failed to answer callback query");
    }

    let chat_id = query.message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);

    let event = ChatEvent {
        user_id: query.from.id.0 as i64,
        chat_id,
        text: None,
        is_callback: true,
        callback_data: query.data.clone(),
        locale: query.from.language_code.clone(),
        display_name: Some(query.from.first_name.clone()),
    };

    dispatch_event(event, &ctx).await
}

/// Route the event and deliver the resulting descriptor
async fn dispatch_event(event: ChatEvent, ctx: &AppContext) -> HandlerResult {
    let chat_id = event.chat_id;

    match handlers::route_event(&event, ctx).await {
        Ok(response) => {
            handlers::deliver_response(ctx.services.dispatcher.as_ref(), chat_id, &response, &ctx.i18n)
                .await
                .map_err(|e| {
                    error!(chat_id = chat_id, error = %e, "Response delivery failed");
                    e
                })?;
            Ok(())
        }
        Err(e) => {
            error!(user_id = event.user_id, error = %e, "Error routing event");
            // The chat surface only ever sees a localized, friendly message
            let lang = ctx.i18n.detect_user_language(event.locale.as_deref());
            let text = ctx.i18n.t("errors.generic", &lang, None);
            if let Err(send_err) = ctx.services.dispatcher.send_text(chat_id, &text, None).await {
                error!(chat_id = chat_id, error = %send_err, "Failed to deliver error message");
            }
            Err(e.into())
        }
    }
}

/// Spawn one scheduled job on a fixed interval
fn spawn_job<F, Fut>(name: &'static str, ctx: Arc<AppContext>, job: F)
where
    F: Fn(Arc<AppContext>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = DealScout::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(JOB_PERIOD);
        // Skip the immediate first tick; the job runs once per period
        interval.tick().await;

        loop {
            interval.tick().await;
            info!(job = name, "Scheduled job starting");
            if let Err(e) = job(Arc::clone(&ctx)).await {
                error!(job = name, error = %e, "Scheduled job failed");
            }
        }
    });
}
