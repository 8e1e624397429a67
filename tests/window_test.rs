#![cfg(feature = "integration-tests")]

use std::time::Duration;

use hover_view::{RunFlag, ViewerConfig, run_until};

#[test]
fn window_opens_renders_and_stops() {
    let flag = RunFlag::new();
    let stopper = flag.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(2));
        stopper.cancel();
    });
    run_until(ViewerConfig::default(), flag).unwrap();
}
