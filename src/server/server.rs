//! actix-web server for the sync API

use crate::config::{Config, ServerConfig};
use crate::core::sync::SyncPipeline;
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{Result, SyncError};
use actix_cors::Cors;
use actix_web::{
    App, HttpServer as ActixHttpServer,
    middleware::{DefaultHeaders, Logger},
    web,
};
use tracing::info;

/// HTTP server
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: &Config, pipeline: &SyncPipeline) -> Self {
        Self {
            config: config.server().clone(),
            state: AppState::new(config.clone(), pipeline),
        }
    }

    /// Application with CORS, body limits and JSON errors; shared by tests
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let server = state.config.server();

        let cors = if server.cors_permissive {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_methods(vec!["GET", "POST"])
                .allow_any_header()
                .max_age(3600)
        };

        let json = web::JsonConfig::default()
            .limit(server.max_body_size)
            .error_handler(|err, _req| SyncError::BadRequest(err.to_string()).into());

        App::new()
            .app_data(state)
            .app_data(json)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("Server", "offline-sync")))
            .configure(routes::configure_routes)
    }

    /// Serve until the process receives a shutdown signal
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.bind_address();

        let state = web::Data::new(self.state);
        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()));
        if let Some(workers) = self.config.workers {
            server = server.workers(workers);
        }

        let server = server
            .bind(&bind_addr)
            .map_err(|e| SyncError::config(format!("Failed to bind {}: {}", bind_addr, e)))?
            .run();

        info!(address = %bind_addr, "Sync API listening");
        server
            .await
            .map_err(|e| SyncError::internal(format!("HTTP server failed: {}", e)))?;

        info!("Sync API stopped");
        Ok(())
    }
}
