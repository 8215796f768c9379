use embassy_time::{Duration, Ticker};
use voltmeter_core::config::CYCLE_TIME;

use crate::control::ControlLoop;
use crate::hw::FirmwareInstant;
use crate::hw::board::{AdcInput, PinBuzzer};
use crate::joystick::{ChannelCommandSource, CommandReceiver};

#[embassy_executor::task]
pub async fn run(
    mut control: ControlLoop<AdcInput<'static>, PinBuzzer<'static>>,
    receiver: CommandReceiver<'static>,
) -> ! {
    let cycle = u64::try_from(CYCLE_TIME.as_micros()).unwrap_or(u64::MAX);
    let mut ticker = Ticker::every(Duration::from_micros(cycle));
    let mut commands = ChannelCommandSource::new(receiver);

    loop {
        ticker.next().await;
        control.tick(FirmwareInstant::now(), &mut commands);
    }
}
