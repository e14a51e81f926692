use std::{env, error::Error, fs};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Instant;
use haptic_composer::{
    Duration, HapticPattern, HapticPlayer, LogSink, PatternDuration, PlayOptions, ValidationError,
};
use log::info;

/// Pattern played when no file is given on the command line
fn heartbeat() -> Result<HapticPattern, ValidationError> {
    HapticPattern::builder()
        .delay(200)
        .sharp_pulse(0.9, 40, 0.8)
        .silence(80)
        .pulse(0.6, 60)
        .silence(600)
        .repeat(3)
        .build()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let pattern = match env::args().nth(1) {
        Some(path) => HapticPattern::from_json(&fs::read_to_string(path)?)?,
        None => heartbeat()?,
    };
    match pattern.playback_duration() {
        PatternDuration::Bounded(d) => info!("Expected playback time: {}ms", d.as_millis()),
        PatternDuration::Unbounded => info!("Pattern repeats until stopped"),
    }
    println!("{}", pattern.to_json());

    let player = HapticPlayer::<NoopRawMutex, _>::new(LogSink::new());
    let start = Instant::now();
    let result = block_on(async {
        player.initialize().await?;
        // Patterns which repeat forever are cut off so the demo always ends
        let options = PlayOptions::default().with_timeout(Duration::from_secs(10));
        let result = player.play_with(&pattern, options).await;
        player.dispose().await;
        result
    });

    println!(
        "Playback result: {result:?} after {}ms",
        start.elapsed().as_millis()
    );
    Ok(())
}
