use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use implicit_bvh::{BBox, Bvh, Ray, TraverseOptions};
use log::{error, info, LevelFilter};
use nalgebra_glm::Vec3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use config::BenchConfig;
use options::Options;
use report::{time, BenchReport, QueryReport, SweepReport};

mod config;
mod options;
mod report;

/// The edge length of the cubic scene the synthetic geometry is placed in.
const SCENE_SIZE: f32 = 100f32;

/// Initializes the program logging
///
/// # Arguments
/// * `filter` - The log level filter, i.e., the minimum log level to be logged.
fn initialize_logging(filter: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    builder.filter_level(filter).init();
}

fn random_pos(rng: &mut ChaCha8Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(0f32..SCENE_SIZE),
        rng.random_range(0f32..SCENE_SIZE),
        rng.random_range(0f32..SCENE_SIZE),
    )
}

fn random_offset(rng: &mut ChaCha8Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(-1f32..1f32),
        rng.random_range(-1f32..1f32),
        rng.random_range(-1f32..1f32),
    )
}

/// Generates the bounding boxes of randomly placed triangles.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `count` - The number of triangles to generate.
fn generate_triangles(rng: &mut ChaCha8Rng, count: usize) -> Vec<BBox<f32, 3>> {
    (0..count)
        .map(|_| {
            let center = random_pos(rng);

            let a = center + random_offset(rng);
            let b = center + random_offset(rng);
            let c = center + random_offset(rng);

            BBox::from_triangle(&a, &b, &c)
        })
        .collect()
}

/// Generates random rays through the scene.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `count` - The number of rays to generate.
fn generate_rays(rng: &mut ChaCha8Rng, count: usize) -> Vec<Ray<f32, 3>> {
    (0..count)
        .map(|_| {
            let pos = random_pos(rng);

            let mut dir = random_offset(rng);
            while dir.norm_squared() < 1e-6f32 {
                dir = random_offset(rng);
            }

            Ray::new(pos, dir)
        })
        .collect()
}

/// Generates random positions inside the scene.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `count` - The number of positions to generate.
fn generate_points(rng: &mut ChaCha8Rng, count: usize) -> Vec<Vec3> {
    (0..count).map(|_| random_pos(rng)).collect()
}

/// Runs the program and returns the report of the benchmark run.
///
/// # Arguments
/// * `options` - The program options.
fn run_program(options: Options) -> Result<BenchReport> {
    let config = {
        let file = File::open(&options.config).with_context(|| {
            format!(
                "Failed to open the configuration '{}'",
                options.config.display()
            )
        })?;

        BenchConfig::read(file)?
    };

    info!("Scene: {} triangles", config.num_triangles);
    info!(
        "Queries: {} rays, {} points",
        config.num_rays, config.num_points
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut report = BenchReport::default();

    let ((leaves, rays, points), elapsed) = time(|| {
        (
            generate_triangles(&mut rng, config.num_triangles),
            generate_rays(&mut rng, config.num_rays),
            generate_points(&mut rng, config.num_points),
        )
    });
    report.generate = elapsed;

    let (bvh, elapsed) = time(|| Bvh::build(leaves));
    let bvh = bvh?;
    report.build = elapsed;

    info!(
        "Built hierarchy with {} levels and {} internal nodes in {:.2} ms",
        bvh.tree().levels(),
        bvh.nodes().len(),
        report.build.as_secs_f64() * 1e3f64
    );

    if let Some(path) = options.index_out.as_ref() {
        let writer = File::create(path)
            .with_context(|| format!("Failed to create the index file '{}'", path.display()))?;

        bvh.write(writer)?;
        info!("Wrote index to '{}'", path.display());
    }

    for &num_threads in config.thread_counts.iter() {
        let traverse_options = TraverseOptions {
            num_threads,
            min_traversals_per_thread: config.min_traversals_per_thread,
        };

        let (hits, elapsed) = time(|| bvh.intersect_rays(&rays, &traverse_options));
        let rays_report = QueryReport {
            elapsed,
            hits: hits?.len(),
        };
        info!(
            "{} threads: {} ray hits in {:.2} ms",
            num_threads,
            rays_report.hits,
            rays_report.elapsed.as_secs_f64() * 1e3f64
        );

        let (hits, elapsed) = time(|| bvh.intersect_points(&points, &traverse_options));
        let points_report = QueryReport {
            elapsed,
            hits: hits?.len(),
        };
        info!(
            "{} threads: {} point hits in {:.2} ms",
            num_threads,
            points_report.hits,
            points_report.elapsed.as_secs_f64() * 1e3f64
        );

        report.sweeps.push(SweepReport {
            num_threads,
            rays: rays_report,
            points: points_report,
        });
    }

    if !report.hits_agree() {
        error!("Hit counts diverged between thread counts");
    }

    Ok(report)
}

fn main() {
    let options = Options::parse();
    initialize_logging(options.log_level);
    options.dump_to_log();

    match run_program(options) {
        Ok(report) => {
            info!("Benchmark report:");
            for line in report.to_string().lines() {
                info!("{}", line);
            }
            info!("Program completed successfully");
        }
        Err(err) => {
            error!("Program failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
