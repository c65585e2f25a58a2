mod config;
mod db;
mod deadline;
mod error;
mod generation;
mod job_controller;
mod maintenance;
mod render;
mod services;
mod storage;
mod templates;
#[cfg(test)]
mod test_support;
mod workflows;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorTaxonomy;
use crate::generation::DocumentGenerator;
use crate::job_controller::state::JobsState;
use crate::render::subprocess::SubprocessRenderer;
use crate::services::AppState;
use crate::storage::local::LocalFsStorage;
use crate::storage::signing::UrlSigner;
use crate::templates::TemplateRepository;
use crate::workflows::CaseService;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.scratch_dir)?;
    let db = Database::open(&config.database_path)
        .map_err(|e| startup_error("failed to open database", e))?;
    let storage = Arc::new(
        LocalFsStorage::new(&config.storage_root, config.temp_ttl)
            .map_err(|e| startup_error("failed to open storage", e))?,
    );
    let signer = Arc::new(
        UrlSigner::new(
            config.public_base_url.clone(),
            config.signing_secret.as_bytes(),
            config.signed_url_ttl,
        )
        .map_err(|e| startup_error("invalid signing secret", e))?,
    );
    let renderer = Arc::new(SubprocessRenderer {
        docx_cmd: config.docx_cmd.clone(),
        docx_args: config.docx_args.clone(),
        soffice_cmd: config.soffice_cmd.clone(),
        soffice_args: config.soffice_args.clone(),
        scratch_dir: config.scratch_dir.clone(),
    });
    let templates = TemplateRepository::new(storage.clone(), &config.scratch_dir);
    let generator = DocumentGenerator::new(
        storage.clone(),
        templates.clone(),
        renderer,
        &config.scratch_dir,
    );
    let cases = CaseService::new(db.clone(), storage.clone(), signer.clone(), generator);
    let state = AppState {
        cases,
        storage,
        signer,
        templates,
        db,
        scratch_dir: config.scratch_dir.clone(),
        request_timeout: config.request_timeout,
        max_upload_bytes: config.max_upload_bytes,
    };

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let taxonomy = ErrorTaxonomy::default();
    let max_upload_bytes = config.max_upload_bytes;
    info!(
        "Server running at http://{}:{} (public base {})",
        config.host, config.port, config.public_base_url
    );

    HttpServer::new(move || {
        App::new()
            .app_data(error::json_config(max_upload_bytes))
            .app_data(error::query_config())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .app_data(web::Data::new(taxonomy.clone()))
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .configure(services::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
