use std::{process, sync::Arc, time::Duration};

use inkblog::{
    application::{
        ai::{AiContentService, GenerationProvider, ThreadRandom},
        articles::ArticleService,
        error::AppError,
        repos::ArticlesRepo,
        ssr::{LoaderRegistry, RouteTable, SsrRenderer, TemplateSource},
    },
    cache::ArticleCache,
    client, config,
    infra::{
        assets::StaticAssets,
        db::MySqlRepositories,
        error::InfraError,
        http::{self, HttpState},
        llm::HttpGenerationClient,
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::VerifyHydration(args) => run_verify_hydration(args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings).await?;
    serve_http(&settings, state).await
}

async fn run_verify_hydration(args: config::VerifyHydrationArgs) -> Result<(), AppError> {
    let report = client::verify_hydration(&args.site, &args.path)
        .await
        .map_err(|err| AppError::unexpected(format!("hydration check failed: {err}")))?;

    for (component, source) in &report.embedded.sources {
        info!(
            target = "inkblog::verify_hydration",
            component = component.name(),
            source = ?source,
            "component data source"
        );
    }

    if !report.passed() {
        return Err(AppError::validation(format!(
            "hydration of {} diverged (embedded vs fetched: {}, served markup matches: {})",
            report.path,
            if report.converged() { "equal" } else { "different" },
            report.server_markup_matches
        )));
    }

    info!(
        target = "inkblog::verify_hydration",
        path = %report.path,
        "embedded and fetched hydration converge"
    );
    Ok(())
}

async fn init_repositories(settings: &config::Settings) -> Result<Arc<MySqlRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = MySqlRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    MySqlRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(MySqlRepositories::new(pool)))
}

async fn build_http_state(
    repositories: Arc<MySqlRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let repo: Arc<dyn ArticlesRepo> = repositories;
    let cache = ArticleCache::from_settings(&settings.cache).await;
    let articles = ArticleService::new(repo, cache);

    let provider: Option<Arc<dyn GenerationProvider>> = match settings.ai.provider.clone() {
        Some(provider) => Some(Arc::new(
            HttpGenerationClient::new(provider, &settings.ai).map_err(AppError::from)?,
        )),
        None => {
            info!(
                target = "inkblog::bootstrap",
                "no AI provider configured; generation uses fallback text"
            );
            None
        }
    };
    let ai = Arc::new(AiContentService::new(provider, Arc::new(ThreadRandom)));

    let renderer = SsrRenderer::new(
        RouteTable::standard(),
        LoaderRegistry::standard(articles.clone()),
        TemplateSource::from_path(settings.ssr.template_path.clone()),
    );

    Ok(HttpState {
        articles,
        ai,
        renderer,
        assets: StaticAssets::new(settings.ssr.static_dir.clone()),
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "inkblog::bootstrap",
        addr = %settings.server.addr,
        "listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(shutdown_rx, settings.server.graceful_shutdown) => {
            warn!(
                target = "inkblog::bootstrap",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "inkblog::bootstrap", "server stopped");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
    info!(target = "inkblog::bootstrap", "shutdown requested; draining connections");
}

async fn drain_deadline(rx: watch::Receiver<bool>, grace: Duration) {
    wait_for_shutdown(rx).await;
    tokio::time::sleep(grace).await;
}
