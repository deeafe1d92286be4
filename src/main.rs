use std::{net::TcpListener, sync::Arc, time::Duration};

use env_logger::Env;
use nabavka::{
    configuration::get_configuration,
    services::{
        search_scheduler_handler, HttpPageFetcher, InFlight, Notifier, PageFetcher, PgSubscriberStore,
        SearchJob, SubscriberStore, SweepTrigger, TelegramClient,
    },
    startup::run,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;

    let pool_options = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());
    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(Duration::from_secs(
        configuration.scraper.fetch_timeout_secs,
    ))?);
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramClient::new(
        configuration.telegram.bot_token,
        configuration.telegram.api_base_url,
        Duration::from_secs(configuration.telegram.send_timeout_secs),
    )?);
    let store: Arc<dyn SubscriberStore> = Arc::new(PgSubscriberStore::new(connection_pool));
    let search_job = Arc::new(SearchJob::new(
        fetcher,
        notifier.clone(),
        configuration.scraper.max_pages,
    ));

    let (sweep_sender, sweep_receiver) = mpsc::unbounded_channel::<()>();
    let sweep_trigger = SweepTrigger {
        sender: sweep_sender,
    };

    let in_flight = InFlight::default();

    // Spawn background tasks
    let store_clone = store.clone();
    let in_flight_clone = in_flight.clone();
    let every = Duration::from_secs(configuration.scraper.interval_mins * 60);
    tokio::spawn(async move {
        search_scheduler_handler(store_clone, search_job, every, in_flight_clone, sweep_receiver)
            .await
    });

    run(
        listener,
        store,
        notifier,
        sweep_trigger,
        in_flight,
        configuration.worker_auth,
    )?
    .await?;

    Ok(())
}
