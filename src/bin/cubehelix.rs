use std::path::{Path, PathBuf};

use clap::{App, Arg, ArgMatches};
use log::info;

use buddhabrot::palette::colorize_file;

const INPUT: &str = "input";
const AMOUNT: &str = "amount";

fn args<'a>() -> ArgMatches<'a> {
    App::new("cubehelix")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Colours a sixteen-bit grayscale Buddhabrot with the cubehelix palette")
        .arg(
            Arg::with_name(INPUT)
                .required(true)
                .index(1)
                .help("Sixteen-bit grayscale PNG produced by render"),
        )
        .arg(
            Arg::with_name(AMOUNT)
                .required(false)
                .index(2)
                .default_value("3.0")
                .validator(|s| match s.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(()),
                    _ => Err("Could not parse contrast amount".to_string()),
                })
                .help("Contrast of the logistic brightness curve"),
        )
        .get_matches()
}

// cubehelix_<name> next to the input.
fn output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.png".to_string());
    input.with_file_name(format!("cubehelix_{}", name))
}

fn main() {
    env_logger::init();
    let matches = args();

    let input = Path::new(matches.value_of(INPUT).unwrap_or_default());
    let amount = matches
        .value_of(AMOUNT)
        .and_then(|a| a.parse::<f64>().ok())
        .unwrap_or(3.0);
    let output = output_path(input);

    if let Err(e) = colorize_file(input, &output, amount) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    info!("wrote {}", output.display());
}
