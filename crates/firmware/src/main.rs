//! Pocketwatch Firmware - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI.

#![no_std]
#![no_main]

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input, OutputType, Pull};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals;
use embassy_stm32::time::{khz, Hertz};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use platform::{Button, SleepController, SleepPanel, BUTTON_COUNT};
use static_cell::StaticCell;

use firmware::display::{Ssd1306, StatusScreen, DEFAULT_ADDRESS};
use firmware::hardware::{
    buttons, BackupRegisters, GpioLevels, Pocketwatch, PwmBuzzer, RtcClock, StopStandby, ALARM,
    CAPTURE, QUEUE, TIME,
};
use firmware::{Parts, Runtime, Services};
use input::Event;
use power::SchedulerConfig;
use sound::{SoundEngine, CONFIRM_TONE, NAVIGATION_TONE};

// Panic handler
use panic_probe as _;

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

static SOUND: StaticCell<SoundEngine<'static, PwmBuzzer>> = StaticCell::new();

#[embassy_executor::task]
async fn button_task(pins: [ExtiInput<'static, AnyPin>; BUTTON_COUNT]) {
    buttons::watch(pins).await;
}

#[embassy_executor::task]
async fn ticker_task() {
    CAPTURE.run_ticker(&GpioLevels, || TIME.now_us()).await
}

#[embassy_executor::task]
async fn sound_task(engine: &'static SoundEngine<'static, PwmBuzzer>) {
    engine.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Step 1: wake flags first, before init or the RTC code clears them.
    // See: firmware::boot::BOOT_SEQUENCE_STEPS for the full ordered sequence.
    let sleep = StopStandby::capture_wake_cause();
    let cause = sleep.wake_cause();

    defmt::info!("Pocketwatch Firmware v{=str}", env!("CARGO_PKG_VERSION"));
    defmt::info!("wake cause: {=str}", cause.name());

    // Step 2: clocks
    let p = embassy_stm32::init(firmware::boot::build_embassy_config());
    RtcClock::ensure_running();

    // -----------------------------------------------------------------------
    // Buttons: PA0 (A), PA1 (B), PA2 (Up), PA3 (Down), PD4 (Left), PD5 (Right)
    // -----------------------------------------------------------------------
    let pins: [ExtiInput<'static, AnyPin>; BUTTON_COUNT] = [
        ExtiInput::new(Input::new(p.PA0, Pull::Up).degrade(), p.EXTI0.degrade()),
        ExtiInput::new(Input::new(p.PA1, Pull::Up).degrade(), p.EXTI1.degrade()),
        ExtiInput::new(Input::new(p.PA2, Pull::Up).degrade(), p.EXTI2.degrade()),
        ExtiInput::new(Input::new(p.PA3, Pull::Up).degrade(), p.EXTI3.degrade()),
        ExtiInput::new(Input::new(p.PD4, Pull::Up).degrade(), p.EXTI4.degrade()),
        ExtiInput::new(Input::new(p.PD5, Pull::Up).degrade(), p.EXTI5.degrade()),
    ];

    // Buzzer: TIM3 CH1 on PA6
    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
        None,
        None,
        None,
        khz(1),
        Default::default(),
    );
    let sound = SOUND.init(SoundEngine::new(PwmBuzzer::new(pwm)));

    // Display: SSD1306 on I2C1 (PB8 SCL, PB9 SDA)
    let bus = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH4,
        p.DMA1_CH5,
        Hertz(400_000),
        Default::default(),
    );
    let mut display = Ssd1306::new(bus, DEFAULT_ADDRESS);
    if let Err(e) = display.init().await {
        defmt::error!("display init failed: {=str}", e.name());
    }

    // Step 3: tasks
    if spawner.spawn(button_task(pins)).is_err() {
        defmt::error!("failed to spawn button_task");
    }
    if spawner.spawn(ticker_task()).is_err() {
        defmt::error!("failed to spawn ticker_task");
    }
    if spawner.spawn(sound_task(sound)).is_err() {
        defmt::error!("failed to spawn sound_task");
    }

    // Step 4: boot path
    let mut runtime = Runtime::<Pocketwatch>::new(
        Services {
            queue: &QUEUE,
            capture: &CAPTURE,
            sound,
            time: &TIME,
        },
        Parts {
            sleep,
            alarm: &ALARM,
            retained: BackupRegisters,
        },
        SchedulerConfig::new(),
    );
    let kind = runtime.boot(cause).await;
    defmt::info!("boot complete: {=str}", kind.name());

    // Main loop
    loop {
        if runtime.take_dirty() {
            if StatusScreen::render(&mut display, runtime.now_us()).is_err() {
                defmt::warn!("status screen draw failed");
            }
            if let Err(e) = display.flush().await {
                defmt::warn!("display flush failed: {=str}", e.name());
            }
        }

        match runtime.get_next_event(0).await {
            Event::None => {
                runtime.upkeep(&mut display).await;
            }
            event => {
                if event.is_press_of(Button::A) {
                    runtime.async_submit_tone(CONFIRM_TONE);
                } else if event.transition() == Some(platform::Transition::Press) {
                    runtime.async_submit_tone(NAVIGATION_TONE);
                }
                runtime.set_dirty();
            }
        }
    }
}
