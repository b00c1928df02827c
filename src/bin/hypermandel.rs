extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate hypermandel;
extern crate log;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use hypermandel::{
    AlgebraKind, CancelToken, FormulaKind, FractalInfo, FractalMode, Quaternion, RenderContext,
    Renderer, Resolution, Shader,
};
use log::info;
use std::str::FromStr;
use std::sync::Arc;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_formula(s: &str) -> Option<FormulaKind> {
    match s {
        "quadratic" => Some(FormulaKind::Quadratic),
        "cubic" => Some(FormulaKind::Cubic),
        "lambda" => Some(FormulaKind::Lambda),
        "solid" => Some(FormulaKind::Solid),
        _ => match parse_pair::<String>(s, ':') {
            Some((ref name, ref n)) if name == "power" => match u32::from_str(n) {
                Ok(n) if n >= 2 => Some(FormulaKind::Power(n)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

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

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const FORMULA: &str = "formula";
const ALGEBRA: &str = "algebra";
const MODE: &str = "mode";
const CONSTANT: &str = "constant";
const SLICE: &str = "slice";
const ITERATIONS: &str = "iterations";
const BAILOUT: &str = "bailout";
const SHADER: &str = "shader";
const SUPERSAMPLE: &str = "supersample";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const DEPTH: &str = "depth";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("hypermandel")
        .version("0.1.0")
        .about("Hypercomplex and quaternion fractal renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("320x240")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(FORMULA)
                .long(FORMULA)
                .short("f")
                .takes_value(true)
                .default_value("quadratic")
                .validator(|s| match parse_formula(&s) {
                    Some(_) => Ok(()),
                    None => Err("Formula must be quadratic, cubic, lambda, solid or power:N".to_string()),
                })
                .help("Iterated formula"),
        )
        .arg(
            Arg::with_name(ALGEBRA)
                .long(ALGEBRA)
                .short("a")
                .takes_value(true)
                .possible_values(&["quaternion", "hypercomplex"])
                .default_value("quaternion")
                .help("Number system the orbit is computed in"),
        )
        .arg(
            Arg::with_name(MODE)
                .long(MODE)
                .short("m")
                .takes_value(true)
                .possible_values(&["julia", "mandelbrot"])
                .default_value("julia")
                .help("Julia or Mandelbrot seeding"),
        )
        .arg(
            Arg::with_name(CONSTANT)
                .long(CONSTANT)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.2,0.8,0,0")
                .validator(|s| match Quaternion::from_str(&s) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Could not parse Julia constant".to_string()),
                })
                .help("Julia constant as four comma separated components"),
        )
        .arg(
            Arg::with_name(SLICE)
                .long(SLICE)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0")
                .validator(|s| {
                    validate_range(
                        &s,
                        -1e6,
                        1e6,
                        "Could not parse slice",
                        "Slice is out of range",
                    )
                })
                .help("Fixed fourth coordinate"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("12")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 100000",
                    )
                })
                .help("Maximum iterations per point"),
        )
        .arg(
            Arg::with_name(BAILOUT)
                .long(BAILOUT)
                .short("b")
                .takes_value(true)
                .default_value("4")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        1e12,
                        "Could not parse bailout radius",
                        "Bailout radius must be positive",
                    )
                })
                .help("Escape radius"),
        )
        .arg(
            Arg::with_name(SHADER)
                .long(SHADER)
                .takes_value(true)
                .possible_values(&["phong", "lambert"])
                .default_value("phong")
                .help("Surface shading model"),
        )
        .arg(
            Arg::with_name(SUPERSAMPLE)
                .long(SUPERSAMPLE)
                .help("Average nine jittered rays per pixel"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to render with; defaults to one per CPU"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .default_value("24301")
                .validator(|s| match u64::from_str(&s) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Could not parse seed".to_string()),
                })
                .help("Seed for the pixel order and sample jitter"),
        )
        .arg(
            Arg::with_name(DEPTH)
                .long(DEPTH)
                .short("d")
                .takes_value(true)
                .help("Also write the depth buffer as a grayscale image"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| failure::format_err!("missing value for --{}", name))?;
    T::from_str(raw).map_err(|_| failure::format_err!("could not parse --{} {:?}", name, raw))
}

fn scene(matches: &ArgMatches) -> Result<FractalInfo, failure::Error> {
    let mut scene = FractalInfo::default();

    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap_or(""), 'x')
        .ok_or_else(|| failure::format_err!("Could not parse output image size"))?;
    scene.resolution = Resolution::new(width, height);

    scene.fractal.formula = parse_formula(matches.value_of(FORMULA).unwrap_or(""))
        .ok_or_else(|| failure::format_err!("Could not parse formula"))?;
    scene.fractal.algebra = match matches.value_of(ALGEBRA) {
        Some("hypercomplex") => AlgebraKind::HyperComplex,
        _ => AlgebraKind::Quaternion,
    };
    scene.fractal.mode = match matches.value_of(MODE) {
        Some("mandelbrot") => FractalMode::Mandelbrot,
        _ => FractalMode::Julia,
    };
    let c: Quaternion = value(matches, CONSTANT)?;
    scene.fractal.constant = [c.w, c.x, c.y, c.z];
    scene.fractal.slice = value(matches, SLICE)?;
    scene.fractal.max_iterations = value(matches, ITERATIONS)?;
    scene.fractal.bailout = value(matches, BAILOUT)?;

    if matches.value_of(SHADER) == Some("lambert") {
        scene.shader = Shader::Lambert;
    }
    scene.supersample = matches.is_present(SUPERSAMPLE);

    // Keep pixels square.
    let aspect = width as f64 / height.max(1) as f64;
    scene.camera.view_width = scene.camera.view_height * aspect;
    Ok(scene)
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let scene = Arc::new(scene(matches)?);
    let seed: u64 = value(matches, SEED)?;
    let threads = match matches.value_of(THREADS) {
        Some(_) => value(matches, THREADS)?,
        None => num_cpus::get(),
    };

    let mut renderer = Renderer::for_scene(scene, RenderContext::new(seed))?;
    let cancel = CancelToken::new();
    let result = if threads > 1 {
        renderer.render_parallel(threads, &cancel)?
    } else {
        renderer.set_progress_interval(16 * 1024);
        renderer.render_all_with_progress(&cancel, |p| {
            info!("{:.0}% rendered", 100.0 * p.fraction());
        })?
    };

    let output = matches.value_of(OUTPUT).unwrap_or("");
    result.pixels.save(output)?;
    info!("wrote {}", output);

    if let Some(depth) = matches.value_of(DEPTH) {
        renderer.target().depth_image().save(depth)?;
        info!("wrote depth buffer to {}", depth);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
