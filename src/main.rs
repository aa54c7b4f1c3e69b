use std::process::ExitCode;
use tracing::error;
use crate::alert::logic::start_alerts;
use crate::api::server::start_server;
use crate::channels::domain::Channels;
use crate::context::domain::AppContext;
use crate::sweep::domain::start_timer;
use crate::sweep::logic::start_sweep;
use crate::system::domain::{init_tracing, System};

mod alert;
mod api;
mod channels;
mod config;
mod context;
mod database;
mod favorite;
mod pollution;
mod sweep;
mod system;
mod threshold;
mod user;

#[cfg(test)]
mod testing;


#[tokio::main]
async fn main() -> ExitCode {

    let system = match System::new() {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Error: configuración inválida: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&system);

    let channels = Channels::new();
    let app_context = match AppContext::new(system, channels.services_to_alert).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error: no se pudo crear el cliente de contaminación: {e}");
            return ExitCode::FAILURE;
        }
    };

    start_alerts(channels.alert_from_services,
                 app_context.clone());

    start_timer(channels.timer_to_sweep,
                channels.timer_from_sweep);

    start_sweep(channels.sweep_to_timer,
                channels.sweep_from_timer,
                app_context.clone());

    if let Err(e) = start_server(app_context).await {
        error!("Error: la API HTTP terminó con error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
