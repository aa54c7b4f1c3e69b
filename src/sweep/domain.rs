use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};


#[derive(Debug)]
pub enum Event {
    /// El temporizador expiró: toca barrer.
    Timeout,
    /// Comando interno para iniciar el temporizador.
    InitTimer(Duration),
}


/// Resultado del barrido para una ciudad.
#[derive(Debug, Clone, PartialEq)]
pub enum CityOutcome {
    Updated {
        city_id: i64,
        previous_aqi: Option<i32>,
        aqi: i32,
        alerted: bool,
    },
    Failed {
        city_id: i64,
        error: String,
    },
}


impl CityOutcome {
    pub fn city_id(&self) -> i64 {
        match self {
            CityOutcome::Updated { city_id, .. } | CityOutcome::Failed { city_id, .. } => *city_id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CityOutcome::Failed { .. })
    }
}


/// Resultados de un barrido completo, uno por ciudad, en orden de procesamiento.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub outcomes: Vec<CityOutcome>,
}


impl SweepReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn alerts(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CityOutcome::Updated { alerted: true, .. }))
            .count()
    }
}


pub async fn sweep_timer(tx_to_sweep: mpsc::Sender<Event>,
                         mut cmd_rx: mpsc::Receiver<Event>) {
    loop {
        let duration = match cmd_rx.recv().await {
            Some(Event::InitTimer(d)) => d,
            None => break, // Canal cerrado, terminar tarea
            _ => continue,
        };

        sleep(duration).await;
        if tx_to_sweep.send(Event::Timeout).await.is_err() {
            break;
        }
    }
}


pub fn start_timer(tx_to_sweep: mpsc::Sender<Event>,
                   rx_from_sweep: mpsc::Receiver<Event>) {

    tokio::spawn(async move {
        sweep_timer(
            tx_to_sweep,
            rx_from_sweep
        ).await;
    });
}
