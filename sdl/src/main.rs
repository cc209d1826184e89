use std::{
    fs::File,
    path::Path,
    sync::mpsc,
    time::{Duration, Instant},
};

use clap::{App, Arg, ArgMatches};
use notify::Watcher;
use raycore::scene::{LightSampling, SceneOptions};
use thiserror::Error;

use crate::interpret::{InterpretError, Interpreter};

mod interpret;
mod tokenize;

#[derive(Debug, Error)]
enum RenderError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Interpret(#[from] InterpretError),

    #[error("failed to write the image: {0}")]
    Output(#[from] image::ImageError),

    #[error("invalid value for --{name}: {value}")]
    Argument { name: &'static str, value: String },
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &'static str) -> Result<T, RenderError> {
    let value = matches.value_of(name).unwrap_or_default();
    value.parse().map_err(|_| RenderError::Argument {
        name,
        value: value.to_owned(),
    })
}

fn render(matches: &ArgMatches) -> Result<(), RenderError> {
    let source = matches.value_of("SOURCE").unwrap_or_default();
    let output = matches.value_of("output").unwrap_or("render.png");

    let options = SceneOptions {
        max_depth: parse_arg(matches, "depth")?,
        seed: parse_arg(matches, "seed")?,
        light_sampling: match matches.value_of("light-sampling") {
            Some("pixel") => LightSampling::PerPixel,
            _ => LightSampling::Fresh,
        },
        ..Default::default()
    };
    let width = parse_arg(matches, "width")?;
    let height = parse_arg(matches, "height")?;
    let time: f64 = parse_arg(matches, "time")?;

    let now = Instant::now();
    let file = File::open(source).map_err(|source_err| RenderError::Open {
        path: source.to_owned(),
        source: source_err,
    })?;
    let base_dir = Path::new(source).parent().unwrap_or_else(|| Path::new(""));
    let mut scene = Interpreter::new(file)?
        .with_base_dir(base_dir)
        .with_options(options)
        .run()?;
    scene.camera.set_resolution(width, height);

    log::info!("scene constructed in {:.2?}", now.elapsed());

    scene.update_transforms(time);
    scene.render_to(output)?;
    log::info!("wrote {} in {:.2?}", output, now.elapsed());

    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let matches = App::new("Raytracer SDL Interpreter")
        .version("1.0")
        .about("Renders a positional scene description with a Whitted-style ray tracer")
        .arg(
            Arg::with_name("SOURCE")
                .help("The source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .help("The output file, its extension picks the format")
                .default_value("render.png"),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .help("Image width in pixels")
                .default_value("800"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .help("Image height in pixels")
                .default_value("600"),
        )
        .arg(
            Arg::with_name("depth")
                .long("depth")
                .short("d")
                .help("Maximum number of reflection/transmission bounces")
                .default_value("4"),
        )
        .arg(
            Arg::with_name("time")
                .long("time")
                .short("t")
                .help("Time offset objects are moved to along their acceleration")
                .default_value("0"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .help("Seed for every sampler and sample stream")
                .default_value("0"),
        )
        .arg(
            Arg::with_name("light-sampling")
                .long("light-sampling")
                .help("Whether area lights draw fresh points per shading or replay them per pixel")
                .possible_values(&["fresh", "pixel"])
                .default_value("fresh"),
        )
        .arg(
            Arg::with_name("watch")
                .long("watch")
                .short("w")
                .help("Whether or not to watch the file and rerender on save")
                .required(false),
        )
        .get_matches();

    if let Err(e) = render(&matches) {
        log::error!("failed to render: {}", e);
        if !matches.is_present("watch") {
            std::process::exit(1);
        }
    }

    if matches.is_present("watch") {
        let source = matches.value_of("SOURCE").unwrap_or_default();

        let (tx, rx) = mpsc::channel();
        let mut watcher = match notify::watcher(tx, Duration::from_millis(500)) {
            Ok(watcher) => watcher,
            Err(e) => {
                log::error!("failed to create a file watcher: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = watcher.watch(source, notify::RecursiveMode::NonRecursive) {
            log::error!("failed to watch {}: {}", source, e);
            std::process::exit(1);
        }

        log::info!("now listening for file changes at {}", source);
        loop {
            match rx.recv() {
                Ok(notify::DebouncedEvent::Write(_)) => {
                    if let Err(e) = render(&matches) {
                        log::error!("failed to render: {}", e);
                    }
                }
                Err(e) => {
                    log::error!("file watcher disconnected: {}", e);
                    break;
                }
                _ => (),
            }
        }
    }
}
