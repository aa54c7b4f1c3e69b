use tokio::sync::mpsc;
use crate::alert::domain::AlertEvent;
use crate::config::alert::QUEUE_SIZE;
use crate::sweep::domain::Event;


pub struct Channels {
    pub sweep_to_timer: mpsc::Sender<Event>,
    pub timer_from_sweep: mpsc::Receiver<Event>,

    pub timer_to_sweep: mpsc::Sender<Event>,
    pub sweep_from_timer: mpsc::Receiver<Event>,

    pub services_to_alert: mpsc::Sender<AlertEvent>,
    pub alert_from_services: mpsc::Receiver<AlertEvent>,
}


impl Channels {
    pub fn new() -> Channels {
        let (s_to_t, t_from_s) = mpsc::channel::<Event>(10);
        let (t_to_s, s_from_t) = mpsc::channel::<Event>(10);
        let (svc_to_a, a_from_svc) = mpsc::channel::<AlertEvent>(QUEUE_SIZE);

        Self {
            sweep_to_timer: s_to_t,
            timer_from_sweep: t_from_s,
            timer_to_sweep: t_to_s,
            sweep_from_timer: s_from_t,
            services_to_alert: svc_to_a,
            alert_from_services: a_from_svc,
        }
    }
}
