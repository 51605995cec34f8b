use std::{process, sync::Arc};

use butik::{
    application::{
        admin::{AdminProductService, AdminTaxonomyService},
        error::AppError,
        images::ImageService,
        session::SessionService,
    },
    cache::CatalogCache,
    config,
    infra::{
        cloudinary::CloudinaryClient,
        error::InfraError,
        firestore::FirestoreClient,
        http::{self, AdminState},
        http_client,
        identity::IdentityToolkitClient,
        telemetry,
    },
};
use tokio::{sync::watch, try_join};
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
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Some(config::Command::CheckConfig) => {
            info!(
                target = "butik::config",
                public_addr = %settings.server.public_addr,
                admin_addr = %settings.server.admin_addr,
                project_id = %settings.firestore.project_id,
                cloud_name = %settings.cloudinary.cloud_name,
                "configuration is valid"
            );
            Ok(())
        }
        Some(config::Command::Serve(_)) | None => run_serve(settings).await,
    }
}

struct Application {
    catalog: CatalogCache,
    admin_state: AdminState,
}

fn build_application(settings: &config::Settings) -> Result<Application, AppError> {
    let client = http_client::build(&settings.http_client)?;

    let store = Arc::new(FirestoreClient::new(client.clone(), &settings.firestore));
    let catalog = CatalogCache::new(store.clone());

    let image_host = Arc::new(CloudinaryClient::new(client.clone(), &settings.cloudinary));
    let images = ImageService::new(
        image_host,
        settings.cloudinary.folder.clone(),
        settings.cloudinary.max_image_bytes,
    );
    if settings.cloudinary.api_secret.is_none() {
        warn!(
            target = "butik::config",
            "image host credentials missing; hosted images will not be deleted"
        );
    }

    let identity = Arc::new(IdentityToolkitClient::new(client, &settings.identity));

    let admin_state = AdminState {
        session: Arc::new(SessionService::new(identity)),
        session_settings: settings.session.clone(),
        products: Arc::new(AdminProductService::new(
            store.clone(),
            store.clone(),
            images.clone(),
        )),
        taxonomy: Arc::new(AdminTaxonomyService::new(store.clone(), store)),
        images: Arc::new(images),
        catalog: catalog.clone(),
    };

    Ok(Application {
        catalog,
        admin_state,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application(&settings)?;

    let public_router = http::build_router(app.catalog);
    let admin_router = http::build_admin_router(app.admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "butik::server",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));

    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        wait_for_shutdown(shutdown_rx).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = async { try_join!(public_server, admin_server) } => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            info!(target = "butik::server", "servers stopped");
        }
        _ = deadline => {
            warn!(
                target = "butik::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown window elapsed; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "butik::server", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "butik::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target = "butik::server", "shutdown signal received");
}
