use hanboard_core::{HookEngine, KeyCode, KeyPanel, ScreenOffset, Settings, VirtualKeyboard};
use std::io::BufRead;
use std::sync::Arc;

#[cfg(windows)]
fn dispatcher() -> Arc<dyn hanboard_core::InputDispatcher> {
    Arc::new(hanboard_core::keyboard_hook::SendInputDispatcher)
}

#[cfg(not(windows))]
fn dispatcher() -> Arc<dyn hanboard_core::InputDispatcher> {
    struct Nothing;
    impl hanboard_core::InputDispatcher for Nothing {
        fn key_down(&self, _code: KeyCode) {}
        fn key_up(&self, _code: KeyCode) {}
        fn is_toggle_active(&self, _code: KeyCode) -> bool {
            false
        }
    }
    Arc::new(Nothing)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("Starting global hook test...");

    let mut settings = Settings::load_or_default("hanboard.json");
    settings.hook_enabled = true;

    // Pretend the keyboard window sits at (100, 600) on screen.
    let keyboard = VirtualKeyboard::new(
        KeyPanel::standard(40.0),
        Arc::new(ScreenOffset::new(hanboard_core::Point::new(100, 600))),
        dispatcher(),
    );
    keyboard.on_activated(|code| println!("Activated {:?}", code));

    let engine = HookEngine::global();
    if let Err(e) = keyboard.apply_settings(&engine, &settings) {
        println!("Global hooks unavailable: {}", e);
        return Ok(());
    }

    println!(
        "Hooks running. Caps Lock / Hangul / Shift keys are tracked; Q shows {:?}.",
        keyboard.label_of(KeyCode::Q)
    );
    println!("Press Enter to exit.");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    keyboard.detach();
    Ok(())
}
