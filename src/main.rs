//! Pixel Dig headless runner
//!
//! Generates a stage, drops a few falling miners, runs the fixed-step loop
//! and logs what happened. Presentation is someone else's job; this binary is
//! for tuning settings files and eyeballing generation.
//!
//! Usage: `pixel-dig [settings.json] [seed] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pixel Dig (native) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a web front end; nothing to run here
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), pixel_dig::ConfigError> {
    use pixel_dig::StageSettings;
    use pixel_dig::consts::{DEFAULT_SEED, SIM_DT};
    use pixel_dig::sim::{Stage, StageEvent};

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => StageSettings::load(path)?,
        None => StageSettings::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10.0);

    let mut stage = Stage::new(&settings, seed)?;
    print_layer_counts(&stage);

    // Bite a surface hole per miner, then drop them in
    let top = settings.height as f32 - settings.miner.height;
    let lanes = 4;
    for lane in 0..lanes {
        let x = settings.width as f32 * (lane as f32 + 0.5) / lanes as f32;
        for _ in 0..4 {
            stage.mine_at(x as i32, settings.height as i32 - 1);
        }
        stage.spawn_miner(x - settings.miner.width * 0.5, top);
    }

    let ticks = (seconds / SIM_DT).round() as u64;
    let mut landings = 0usize;
    let mut uploads = 0usize;
    let mut uploaded_pixels = 0usize;

    for _ in 0..ticks {
        for event in stage.tick(SIM_DT) {
            if let StageEvent::Landed { .. } = event {
                landings += 1;
            }
        }
        // One partial upload per frame, as a renderer would do
        if let Some(rect) = stage.take_dirty() {
            uploads += 1;
            uploaded_pixels += stage.grid().region_pixels(&rect).len();
        }
    }

    for miner in stage.miners() {
        log::info!(
            "Miner {} ended at ({:.1}, {:.1}){}",
            miner.id,
            miner.body.x,
            miner.body.y,
            if miner.grounded { " grounded" } else { "" }
        );
    }

    println!(
        "seed {seed}: {} ticks, money {}, {} landings, {} uploads ({} px), {} of {} cells left",
        stage.time_ticks(),
        stage.money(),
        landings,
        uploads,
        uploaded_pixels,
        stage.grid().live_cells(),
        stage.grid().len()
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn print_layer_counts(stage: &pixel_dig::sim::Stage) {
    let grid = stage.grid();
    let mut counts = vec![0usize; grid.layer_infos().len()];
    for layer in grid.layer_indices().iter().flatten() {
        counts[*layer] += 1;
    }
    for (info, count) in grid.layer_infos().iter().zip(counts) {
        println!(
            "{:>10}: {:>7} px  hardness {:.1}  reward {}",
            info.name, count, info.hardness, info.reward_value
        );
    }
}
