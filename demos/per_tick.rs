use std::sync::Arc;
use std::thread;

use flakeid::{FlakeId, FlakeIdConfig, FlakeIdError, TimeUnit};

fn main() -> Result<(), FlakeIdError> {
    let config = FlakeIdConfig::builder()
        .time_unit(TimeUnit::Seconds)
        .node_id(7)
        .per_tick(16)
        .record_stats(true)
        .build()?;
    let generator = Arc::new(FlakeId::with_config(config)?);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                let id = generator.generate();
                let parts = generator.codec().decompose(id);
                println!("worker {worker}: id {id}, second {}, sequence {}", parts.tick_delta, parts.sequence);
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    if let Some(stats) = generator.cache_stats() {
        println!(
            "cache: {} hits, {} misses, {} evictions",
            stats.hits, stats.misses, stats.evictions
        );
    }
    Ok(())
}
