use embassy_time::{Duration, Ticker};

use crate::hw::board::JoystickPins;
use crate::joystick::{CommandSender, PressDetector, try_enqueue};

/// Switch sampling period; two agreeing samples settle a press.
const SAMPLE_PERIOD: Duration = Duration::from_millis(5);

#[embassy_executor::task]
pub async fn run(pins: JoystickPins<'static>, sender: CommandSender<'static>) -> ! {
    let mut ticker = Ticker::every(SAMPLE_PERIOD);
    let mut detector = PressDetector::new();

    loop {
        ticker.next().await;
        if let Some(command) = detector.sample(pins.levels()) {
            if !try_enqueue(&sender, command) {
                defmt::warn!("joystick: queue full, dropped {}", command.label());
            }
        }
    }
}
