use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};

use crate::control::ControlLoop;
use crate::hw::FirmwareInstant;
use crate::hw::board::{AdcInput, JoystickPins, PinBuzzer};
use crate::joystick::CommandQueue;

mod control_task;
mod joystick_task;
mod status_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static COMMAND_QUEUE: CommandQueue = CommandQueue::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        ADC1,
        PA0,
        PA5,
        PA6,
        PA7,
        PA8,
        PB0,
        PB1,
        ..
    } = hal::init(config);

    defmt::info!("voltmeter: boot");

    let input = AdcInput::new(Adc::new(ADC1), PA0.degrade_adc());
    let buzzer = PinBuzzer::new(Output::new(PA8, Level::Low, Speed::Low));
    let control = ControlLoop::new(input, buzzer, FirmwareInstant::now());

    let pins = JoystickPins {
        up: Input::new(PA6, Pull::Up),
        down: Input::new(PA7, Pull::Up),
        left: Input::new(PB0, Pull::Up),
        right: Input::new(PB1, Pull::Up),
        select: Input::new(PA5, Pull::Up),
    };

    spawner
        .spawn(control_task::run(control, COMMAND_QUEUE.receiver()))
        .expect("failed to spawn control task");

    spawner
        .spawn(joystick_task::run(pins, COMMAND_QUEUE.sender()))
        .expect("failed to spawn joystick task");

    spawner
        .spawn(status_task::run())
        .expect("failed to spawn status task");

    core::future::pending::<()>().await;
}
