use embassy_time::{Duration, Ticker};

use crate::status;

const STATUS_PERIOD: Duration = Duration::from_secs(5);

#[embassy_executor::task]
pub async fn run() -> ! {
    let mut ticker = Ticker::every(STATUS_PERIOD);
    loop {
        ticker.next().await;
        let current = status::published();
        let shown = current.shown_measurement.map_or(-1, i32::from);
        defmt::info!(
            "status: {} set={}cV shown={}cV buzzer={} ticks={}",
            current.state.label(),
            current.set_value.hundredths(),
            shown,
            current.buzzer_active,
            current.ticks
        );
    }
}
