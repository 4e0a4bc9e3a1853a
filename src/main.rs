/*!
 * gc-stress
 *
 * Brings libgc up in incremental mode and churns through batches of
 * short-lived objects, relying on the collector to reclaim each batch.
 * Prints the final heap counters as JSON.
 *
 * Environment variables:
 * - GC_ALLOC_* : collector configuration (see `GcConfig::from_env`)
 * - GC_STRESS_ITERATIONS: number of batches (default: 1024)
 */

use std::error::Error;
use tracing::info;

use gc_alloc::core::limits::{STRESS_ITERATIONS, STRESS_OBJECTS_PER_ITERATION, STRESS_OBJECT_SIZE};
use gc_alloc::{bootstrap, init_tracing, Allocator, Bdwgc, GcConfig};
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = GcConfig::from_env()?.with_incremental(true);
    let iterations = std::env::var("GC_STRESS_ITERATIONS")
        .ok()
        .map(|v| v.parse::<usize>())
        .transpose()?
        .unwrap_or(STRESS_ITERATIONS);

    let ctx = bootstrap(Arc::new(Bdwgc::new()), config);
    let allocator = ctx.allocator();

    info!(
        iterations,
        objects = STRESS_OBJECTS_PER_ITERATION,
        object_size = STRESS_OBJECT_SIZE,
        policy = %allocator.policy(),
        "Starting allocation churn"
    );

    let started = Instant::now();
    for iteration in 0..iterations {
        for _ in 0..STRESS_OBJECTS_PER_ITERATION {
            let mut block = allocator.alloc(STRESS_OBJECT_SIZE)?;
            unsafe { block.as_mut_slice()[0] = iteration as u8 };
        }
        if iteration % 128 == 0 {
            let stats = ctx.heap_stats();
            info!(
                iteration,
                heap_size = stats.heap_size,
                collections = stats.collections,
                "Churn progress"
            );
        }
    }
    let stats = ctx.heap_stats();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        collections = stats.collections,
        heap_size = stats.heap_size,
        "Churn complete"
    );

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
