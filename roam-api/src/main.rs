use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use roam_api::{
    app,
    metrics::Metrics,
    state::{AppState, AuthConfig, RateLimit},
    worker,
};
use roam_booking::{
    BookingCoordinator, CheckoutSettings, NotificationWorker, PaymentOrchestrator, ReviewService, Stores,
};
use roam_core::notification::Mailer;
use roam_store::{
    app_config::Config, ChapaClient, DbClient, LogMailer, NotificationProducer, RedisClient, SmtpMailer,
    StoreBookingRepository, StorePaymentRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roam_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Roam API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let bookings = Arc::new(StoreBookingRepository::new(db.pool.clone()));
    let stores = Stores {
        users: bookings.clone(),
        listings: bookings.clone(),
        bookings: bookings.clone(),
        payments: Arc::new(StorePaymentRepository::new(db.pool.clone())),
        reviews: bookings,
    };

    // Kafka
    let producer = NotificationProducer::new(&config.kafka.brokers, &config.kafka.notification_topic)
        .context("Failed to create Kafka producer")?;

    let gateway = ChapaClient::new(&config.chapa).context("Failed to build Chapa client")?;
    let coordinator = BookingCoordinator::new(stores.clone(), Arc::new(producer));
    let orchestrator = PaymentOrchestrator::new(
        Arc::new(gateway),
        stores.clone(),
        coordinator.clone(),
        CheckoutSettings {
            currency: config.chapa.currency.clone(),
            callback_url: config.chapa.callback_url.clone(),
        },
    );

    let mailer: Arc<dyn Mailer> = match &config.mail.smtp_host {
        Some(host) => Arc::new(SmtpMailer::new(host, &config.mail)),
        None => {
            tracing::warn!("No SMTP host configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let notifier = Arc::new(NotificationWorker::new(stores.clone(), mailer));

    let kafka = config.kafka.clone();
    tokio::spawn(async move {
        if let Err(e) =
            worker::start_notification_worker(kafka.brokers, kafka.group_id, kafka.notification_topic, notifier)
                .await
        {
            tracing::error!("Notification worker stopped: {}", e);
        }
    });
    tokio::spawn(worker::start_reconcile_loop(coordinator, config.reconcile.interval_seconds));

    // Redis
    let rate_limit = match &config.redis {
        Some(redis) => Some(RateLimit {
            redis: Arc::new(
                RedisClient::new(&redis.url)
                    .await
                    .context("Failed to connect to Redis")?,
            ),
            requests_per_minute: redis.requests_per_minute,
        }),
        None => None,
    };

    let app_state = AppState {
        orchestrator: Arc::new(orchestrator),
        reviews: Arc::new(ReviewService::new(stores)),
        rate_limit,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        metrics: Arc::new(Metrics::new().context("Failed to register metrics")?),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app(app_state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
