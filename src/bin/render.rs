use std::path::PathBuf;
use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use log::info;

use buddhabrot::{render, write_png16, Floor, RenderConfig, SeedStrategy, Strategy};

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const SIZE: &str = "image_size";
const ITERATIONS: &str = "iteration_cap";
const THREADS: &str = "thread_count";
const SAMPLES: &str = "max_trials_per_cell";
const OUTPUT: &str = "output";
const STRATEGY: &str = "strategy";
const NO_MIRROR: &str = "no-mirror";
const ZERO_FLOOR: &str = "zero-floor";
const SEED: &str = "seed";
const MIN_CELL: &str = "min-cell";
const MAX_DEPTH: &str = "max-depth";

fn args<'a>() -> ArgMatches<'a> {
    App::new("render")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Adaptive Buddhabrot renderer")
        .arg(
            Arg::with_name(SIZE)
                .required(true)
                .index(1)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_536,
                        "Could not parse image size",
                        "Image size must be between 1 and 65536",
                    )
                })
                .help("Width and height of the output image"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(true)
                .index(2)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Maximum number of iterations per orbit"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(true)
                .index(3)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse thread count",
                        "Thread count must be between 1 and 1024",
                    )
                })
                .help("Number of render workers"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .required(true)
                .index(4)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse trial count",
                        "Trial count must be between 1 and 1000000",
                    )
                })
                .help("Most random trials spent on one region"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (default: buddhabrot_<size>_<iterations>_<trials>_<strategy>.png)"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .long(STRATEGY)
                .short("s")
                .takes_value(true)
                .possible_values(&["grid", "quadtree"])
                .default_value("grid")
                .help("How the plane is divided into regions"),
        )
        .arg(
            Arg::with_name(NO_MIRROR)
                .long(NO_MIRROR)
                .help("Do not fold in the mirror image across the real axis"),
        )
        .arg(
            Arg::with_name(ZERO_FLOOR)
                .long(ZERO_FLOOR)
                .help("Treat zero rather than the smallest density as black"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    validate_range(&s, 0, u64::max_value(), "Could not parse seed", "")
                })
                .help("Fixed base seed, for repeatable renders"),
        )
        .arg(
            Arg::with_name(MIN_CELL)
                .long(MIN_CELL)
                .takes_value(true)
                .default_value("1e-5")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        4.0,
                        "Could not parse minimum cell size",
                        "Minimum cell size must be positive and at most 4",
                    )
                })
                .help("Smallest quadtree box that may still be split"),
        )
        .arg(
            Arg::with_name(MAX_DEPTH)
                .long(MAX_DEPTH)
                .takes_value(true)
                .default_value("1024")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse depth cap",
                        "Depth cap must be at least 1",
                    )
                })
                .help("Largest quadtree depth counter; it doubles at every level"),
        )
        .get_matches()
}

// Every value below has already been through a validator, so a
// parse failure here is a bug in the argument table.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, String> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| format!("Missing value for {}", name))?;
    T::from_str(raw).map_err(|_| format!("Could not parse {} '{}'", name, raw))
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, String> {
    Ok(RenderConfig {
        image_size: value(matches, SIZE)?,
        iterations: value(matches, ITERATIONS)?,
        threads: value(matches, THREADS)?,
        max_samples: value(matches, SAMPLES)?,
        strategy: value::<Strategy>(matches, STRATEGY)?,
        mirror: !matches.is_present(NO_MIRROR),
        floor: if matches.is_present(ZERO_FLOOR) {
            Floor::Zero
        } else {
            Floor::Minimum
        },
        seed: match matches.value_of(SEED) {
            Some(_) => SeedStrategy::Fixed(value(matches, SEED)?),
            None => SeedStrategy::Entropy,
        },
        min_cell_size: value(matches, MIN_CELL)?,
        max_depth: value(matches, MAX_DEPTH)?,
        ..RenderConfig::default()
    })
}

fn main() {
    env_logger::init();
    let matches = args();

    let config = match config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    let output = matches
        .value_of(OUTPUT)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config.file_name()));

    let result = render(&config).and_then(|rendering| {
        info!(
            "{} trials, {} escaping orbits",
            rendering.stats.trials, rendering.stats.escapes
        );
        write_png16(&output, &rendering.composite)
    });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
