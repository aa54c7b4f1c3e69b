//! Barrido periódico de AQI de las ciudades favoritas.
//!
//! # Arquitectura de Actores
//! Funciona en coordinación con una tarea de temporización:
//! 1. Esta tarea solicita un temporizador (`Event::InitTimer`).
//! 2. La tarea de temporización espera y responde con `Event::Timeout`.
//! 3. Esta tarea ejecuta un barrido completo y reinicia el ciclo.
//!
//! Cada ciudad se procesa de forma aislada: un fallo en una ciudad se registra
//! en su `CityOutcome` y el barrido continúa con las siguientes.


use std::time::Duration;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use crate::context::domain::AppContext;
use crate::database::domain::{FavoriteCity, User};
use crate::system::domain::ServiceError;
use super::domain::{CityOutcome, Event, SweepReport};


/// Procesa una ciudad: AQI actual, umbral, alerta y persistencia.
///
/// La alerta se despacha en cada barrido mientras el AQI sea >= umbral, aunque
/// el valor no haya cambiado respecto del barrido anterior.
async fn check_city(ctx: &AppContext,
                    city: &FavoriteCity,
                    user: &User) -> Result<CityOutcome, ServiceError> {

    debug!("Debug: revisando ciudad {} del usuario {}", city.city_name, user.username);

    let reading = ctx.pollution
        .get_current_pollution(city.latitude, city.longitude)
        .await
        .map_err(|e| ServiceError::Upstream(e.to_string()))?;

    let threshold = ctx.thresholds.get_user_aqi_threshold(user.id).await?;

    debug!("Debug: ciudad {}, AQI actual {:?}, nuevo AQI {}, umbral {}",
           city.city_name, city.current_aqi, reading.aqi, threshold);

    let alerted = reading.aqi >= threshold;
    if alerted {
        info!("Info: AQI {} supera el umbral {} en {}", reading.aqi, threshold, city.city_name);
        if let Err(e) = ctx.alerts.process_alert(user, city, reading.aqi) {
            error!("Error: no se pudo despachar la alerta de {}: {e}", city.city_name);
        }
    }

    ctx.cities.update_aqi(city.id, reading.aqi, Utc::now()).await?;

    info!("Info: AQI actualizado para {}: anterior={:?}, nuevo={}",
          city.city_name, city.current_aqi, reading.aqi);

    Ok(CityOutcome::Updated {
        city_id: city.id,
        previous_aqi: city.current_aqi,
        aqi: reading.aqi,
        alerted,
    })
}


/// Ejecuta un barrido completo sobre todas las ciudades favoritas, en secuencia.
pub async fn run_sweep(ctx: &AppContext) -> SweepReport {
    info!("Info: iniciando barrido de AQI a las {}", Utc::now());

    let cities = match ctx.cities.find_all_with_owner().await {
        Ok(cities) => cities,
        Err(e) => {
            error!("Error: no se pudieron listar las ciudades favoritas: {e}");
            return SweepReport::default();
        }
    };
    info!("Info: {} ciudades a revisar", cities.len());

    let mut report = SweepReport { outcomes: Vec::with_capacity(cities.len()) };
    for (city, user) in &cities {
        let outcome = match check_city(ctx, city, user).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error revisando la ciudad {}: {e}", city.city_name);
                CityOutcome::Failed { city_id: city.id, error: e.to_string() }
            }
        };
        debug!("Debug: ciudad {} -> {:?}", outcome.city_id(), outcome);
        report.outcomes.push(outcome);
    }

    info!("Info: barrido finalizado, {} alertas, {} fallos", report.alerts(), report.failures());
    report
}


/// Ejecuta el bucle principal de barridos.
///
/// # Flujo de Trabajo
/// 1. Envía `Event::InitTimer` con la espera inicial.
/// 2. Al recibir `Event::Timeout` ejecuta `run_sweep`.
/// 3. Solicita un nuevo timer de `interval` para el siguiente ciclo.
///
/// # Argumentos
/// * `tx_event`: Canal para enviar comandos al temporizador.
/// * `rx_from_timer`: Canal para recibir `Timeout`.
/// * `app_context`: Contexto con los colaboradores.
/// * `initial_delay` / `interval`: espera antes del primer barrido y entre barridos.
#[instrument(
    name = "run_sweep_task",
    skip(tx_event, rx_from_timer, app_context)
)]
pub async fn run_sweep_task(tx_event: mpsc::Sender<Event>,
                            mut rx_from_timer: mpsc::Receiver<Event>,
                            app_context: AppContext,
                            initial_delay: Duration,
                            interval: Duration) {

    info!("Info: sweep task creada");

    if tx_event.send(Event::InitTimer(initial_delay)).await.is_err() {
        error!("Error: no se pudo enviar el evento al temporizador");
    }

    while let Some(event) = rx_from_timer.recv().await {
        match event {
            Event::Timeout => {
                run_sweep(&app_context).await;
                if tx_event.send(Event::InitTimer(interval)).await.is_err() {
                    error!("Error: no se pudo enviar el evento al temporizador");
                }
            }
            _ => {}
        }
    }
    info!("Info: sweep task finalizada");
}


/// Inicializa y ejecuta la tarea de barrido en segundo plano (tokio task).
pub fn start_sweep(to_timer: mpsc::Sender<Event>,
                   from_timer: mpsc::Receiver<Event>,
                   ctx: AppContext) {

    info!("Info: iniciando tarea de barrido");
    let initial_delay = Duration::from_secs(ctx.system.sweep_initial_delay_secs);
    let interval = Duration::from_secs(ctx.system.sweep_interval_secs);

    tokio::spawn(async move {
        run_sweep_task(
            to_timer,
            from_timer,
            ctx,
            initial_delay,
            interval,
        ).await;
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::testing::{test_context, MemoryStore, RecordingAlertSink, ScriptedPollution};

    struct Fixture {
        store: Arc<MemoryStore>,
        pollution: Arc<ScriptedPollution>,
        alerts: Arc<RecordingAlertSink>,
        ctx: AppContext,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let pollution = Arc::new(ScriptedPollution::new());
        let alerts = Arc::new(RecordingAlertSink::new());
        let ctx = test_context(store.clone(), pollution.clone(), alerts.clone());
        Fixture { store, pollution, alerts, ctx }
    }

    #[tokio::test]
    async fn failing_city_does_not_stop_the_sweep() {
        let f = fixture();
        let user = f.store.add_user("ana", 100);
        let paris = f.store.add_city(user.id, "Paris", 48.85, 2.35);
        let lyon = f.store.add_city(user.id, "Lyon", 45.76, 4.83);
        let nice = f.store.add_city(user.id, "Nice", 43.70, 7.27);
        f.pollution.set_aqi(48.85, 2.35, 2);
        f.pollution.fail(45.76, 4.83);
        f.pollution.set_aqi(43.70, 7.27, 3);

        let report = run_sweep(&f.ctx).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failures(), 1);
        assert!(report.outcomes[1].is_failure());
        assert_eq!(report.outcomes[1].city_id(), lyon.id);
        assert_eq!(f.store.city(paris.id).unwrap().current_aqi, Some(2));
        assert_eq!(f.store.city(nice.id).unwrap().current_aqi, Some(3));

        let untouched = f.store.city(lyon.id).unwrap();
        assert_eq!(untouched.current_aqi, None);
        assert_eq!(untouched.last_checked, lyon.last_checked);
    }

    #[tokio::test]
    async fn persistence_failure_is_isolated() {
        let f = fixture();
        let user = f.store.add_user("ana", 100);
        let paris = f.store.add_city(user.id, "Paris", 48.85, 2.35);
        let lyon = f.store.add_city(user.id, "Lyon", 45.76, 4.83);
        f.pollution.set_aqi(48.85, 2.35, 2);
        f.pollution.set_aqi(45.76, 4.83, 2);
        f.store.fail_updates_for(paris.id);

        let report = run_sweep(&f.ctx).await;

        assert!(report.outcomes[0].is_failure());
        assert_eq!(report.outcomes[0].city_id(), paris.id);
        assert_eq!(f.store.city(lyon.id).unwrap().current_aqi, Some(2));

        let untouched = f.store.city(paris.id).unwrap();
        assert_eq!(untouched.current_aqi, None);
        assert_eq!(untouched.last_checked, paris.last_checked);
    }

    #[tokio::test]
    async fn realerts_every_tick_while_above_threshold() {
        let f = fixture();
        let user = f.store.add_user("ana", 3);
        let city = f.store.add_city(user.id, "Paris", 48.85, 2.35);
        f.pollution.set_aqi(48.85, 2.35, 5);

        for tick in 1..=3 {
            let report = run_sweep(&f.ctx).await;
            assert_eq!(report.alerts(), 1);
            assert_eq!(f.alerts.alerts().len(), tick);
        }
        assert!(f.alerts.alerts().iter().all(|a| *a == (user.id, city.id, 5)));
    }

    #[tokio::test]
    async fn alerts_only_once_threshold_is_crossed() {
        let f = fixture();
        let user = f.store.add_user("ana", 100);
        let city = f.store.add_city(user.id, "Paris", 48.85, 2.35);

        f.pollution.set_aqi(48.85, 2.35, 50);
        let first = run_sweep(&f.ctx).await;
        assert_eq!(first.outcomes[0],
                   CityOutcome::Updated { city_id: city.id, previous_aqi: None, aqi: 50, alerted: false });
        assert!(f.alerts.alerts().is_empty());
        assert_eq!(f.store.city(city.id).unwrap().current_aqi, Some(50));

        f.pollution.set_aqi(48.85, 2.35, 150);
        let second = run_sweep(&f.ctx).await;
        assert_eq!(second.outcomes[0],
                   CityOutcome::Updated { city_id: city.id, previous_aqi: Some(50), aqi: 150, alerted: true });
        assert_eq!(f.alerts.alerts(), vec![(user.id, city.id, 150)]);
        assert_eq!(f.store.city(city.id).unwrap().current_aqi, Some(150));
    }

    #[tokio::test]
    async fn sweep_uses_cached_threshold() {
        let f = fixture();
        let user = f.store.add_user("ana", 3);
        f.store.add_city(user.id, "Paris", 48.85, 2.35);
        f.store.add_city(user.id, "Lyon", 45.76, 4.83);
        f.pollution.set_aqi(48.85, 2.35, 1);
        f.pollution.set_aqi(45.76, 4.83, 1);

        run_sweep(&f.ctx).await;
        run_sweep(&f.ctx).await;

        assert_eq!(f.store.user_loads(), 1);
    }

    #[tokio::test]
    async fn task_sweeps_on_every_timeout() {
        let f = fixture();
        let user = f.store.add_user("ana", 3);
        f.store.add_city(user.id, "Paris", 48.85, 2.35);
        f.pollution.set_aqi(48.85, 2.35, 4);

        let (tx_event, mut rx_event) = mpsc::channel(10);
        let (tx_timeout, rx_timeout) = mpsc::channel(10);
        let handle = tokio::spawn(run_sweep_task(tx_event,
                                                 rx_timeout,
                                                 f.ctx.clone(),
                                                 Duration::ZERO,
                                                 Duration::from_secs(3600)));

        assert!(matches!(rx_event.recv().await, Some(Event::InitTimer(d)) if d == Duration::ZERO));

        tx_timeout.send(Event::Timeout).await.unwrap();
        assert!(matches!(rx_event.recv().await, Some(Event::InitTimer(d)) if d == Duration::from_secs(3600)));
        assert_eq!(f.alerts.alerts().len(), 1);

        tx_timeout.send(Event::Timeout).await.unwrap();
        rx_event.recv().await.unwrap();
        assert_eq!(f.alerts.alerts().len(), 2);

        drop(tx_timeout);
        handle.await.unwrap();
    }
}
