pub mod postgres {
    use tokio::time::{Duration};

    pub const WAIT_FOR: Duration = Duration::from_secs(5);
    pub const BATCH_SIZE: usize = 100;
    pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
}

pub mod http_client {
    use tokio::time::{Duration};

    pub const TIMEOUT: Duration = Duration::from_secs(10);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
}

pub mod alert {
    pub const QUEUE_SIZE: usize = 200;
}
