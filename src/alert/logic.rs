//! Despacho y procesamiento de alertas.
//!
//! `ChannelAlertSink` encola la alerta sin bloquear; `alert_task` la consume,
//! la acumula para persistirla en lote (`aqi_alert`) y notifica al webhook
//! configurado en una tarea aparte, de modo que un webhook lento no frena el
//! consumo del canal. Los fallos de entrega sólo se registran en el log.


use std::sync::Arc;
use chrono::Utc;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};
use crate::alert::domain::{AlertBuffer, AlertError, AlertEvent, AlertNotification, AlertSink};
use crate::config::http_client::{CONNECT_TIMEOUT, TIMEOUT};
use crate::config::postgres::FLUSH_INTERVAL;
use crate::context::domain::AppContext;
use crate::database::domain::{AlertStore, FavoriteCity, User};


/// Implementación de `AlertSink` sobre un canal MPSC hacia `alert_task`.
#[derive(Clone, Debug)]
pub struct ChannelAlertSink {
    tx: mpsc::Sender<AlertEvent>,
}


impl ChannelAlertSink {
    pub fn new(tx: mpsc::Sender<AlertEvent>) -> Self {
        Self { tx }
    }
}


impl AlertSink for ChannelAlertSink {
    fn process_alert(&self, user: &User, city: &FavoriteCity, aqi: i32) -> Result<(), AlertError> {
        let event = AlertEvent {
            user: user.clone(),
            city: city.clone(),
            aqi,
            created_at: Utc::now(),
        };

        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => AlertError::QueueFull,
            TrySendError::Closed(_) => AlertError::QueueClosed,
        })
    }
}


/// Cliente del webhook de notificaciones.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}


impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self { client, url: url.to_string() })
    }

    pub async fn notify(&self, notification: &AlertNotification) -> Result<(), AlertError> {
        let response = self.client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}


async fn flush(store: &Arc<dyn AlertStore>, buffer: &mut AlertBuffer) {
    if buffer.is_empty() {
        return;
    }
    let records = buffer.drain();
    let count = records.len();
    match store.insert_alerts(records).await {
        Ok(_) => debug!("Debug: {count} alertas persistidas"),
        Err(e) => error!("Error: No se pudo insertar batch de alertas. {e}"),
    }
}


/// Consume alertas del canal hasta que todos los emisores se cierran.
///
/// # Flujo de Trabajo
/// 1. Cada alerta se agrega al `AlertBuffer` y, si corresponde, se lanza su
///    notificación al webhook en un `JoinSet`.
/// 2. El buffer se vuelca a la base de datos al llenarse o cada `FLUSH_INTERVAL`.
/// 3. Al cerrarse el canal se vuelca lo pendiente, se esperan las
///    notificaciones en curso y la tarea termina.
#[instrument(name = "run_alert_task", skip(rx, store, notifier))]
pub async fn alert_task(mut rx: mpsc::Receiver<AlertEvent>,
                        store: Arc<dyn AlertStore>,
                        notifier: Option<WebhookNotifier>) {

    info!("Info: alert task creada");

    let mut buffer = AlertBuffer::new();
    let mut ticker = interval(FLUSH_INTERVAL);
    let mut notifications = JoinSet::new();

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(event) = msg else {
                    break;
                };

                info!("Info: alerta AQI {} en {} para {}",
                      event.aqi, event.city.city_name, event.user.username);
                buffer.push(event.to_record());

                if let (Some(notifier), Some(notification)) = (notifier.as_ref(), event.to_notification()) {
                    let notifier = notifier.clone();
                    let username = event.user.username.clone();
                    notifications.spawn(async move {
                        if let Err(e) = notifier.notify(&notification).await {
                            warn!("Warning: no se pudo notificar la alerta de {username}: {e}");
                        }
                    });
                }

                if buffer.is_full() {
                    flush(&store, &mut buffer).await;
                }
            }

            _ = ticker.tick() => {
                flush(&store, &mut buffer).await;
            }

            Some(joined) = notifications.join_next(), if !notifications.is_empty() => {
                if let Err(e) = joined {
                    error!("Error: la tarea de notificación terminó con error: {e}");
                }
            }
        }
    }

    flush(&store, &mut buffer).await;
    while notifications.join_next().await.is_some() {}
    info!("Info: alert task finalizada");
}


pub fn start_alerts(rx_from_services: mpsc::Receiver<AlertEvent>,
                    app_context: AppContext) {

    let notifier = match app_context.system.alert_webhook_url.as_deref() {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                error!("Error: no se pudo crear el cliente del webhook: {e}");
                None
            }
        },
        None => None,
    };

    tokio::spawn(async move {
        alert_task(rx_from_services,
                   app_context.alert_store,
                   notifier
        ).await;
    });
}
