//! Reads SVG path and writes SVG path of its stroke, bounds and area go to stderr
use contour::*;
use std::{env, fs::File, io::Read};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    styles: LineStyles,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            styles: LineStyles::default(),
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "stroke".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-w" => {
                    let width = args.next().ok_or("-w requires argument")?;
                    result.styles.line_width = width.parse()?;
                }
                "-j" => {
                    let join = args.next().ok_or("-j requires argument")?;
                    result.styles.line_join = join.parse()?;
                }
                "-c" => {
                    let cap = args.next().ok_or("-c requires argument")?;
                    result.styles.line_cap = cap.parse()?;
                }
                "-m" => {
                    let limit = args.next().ok_or("-m requires argument")?;
                    result.styles.miter_limit = limit.parse()?;
                }
                "-d" => {
                    let dash = args.next().ok_or("-d requires argument")?;
                    result.styles.line_dash = dash
                        .split(',')
                        .map(|length| length.trim().parse())
                        .collect::<Result<_, _>>()?;
                }
                "-s" => {
                    let styles = args.next().ok_or("-s requires argument")?;
                    let mut contents = String::new();
                    File::open(styles)?.read_to_string(&mut contents)?;
                    result.styles = LineStyles::from_json(&contents)?;
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        _ => return Err("unexpected positional argment".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!("Reads SVG path and writes SVG path of its stroke");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-w <width>] [-j <join>] [-c <cap>] [-m <limit>] [-d <dash>] [-s <styles.json>] <file.path>",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -w <width>         line width (default: 1)");
            eprintln!("    -j <join>          line join miter|round|bevel");
            eprintln!("    -c <cap>           line cap butt|round|square");
            eprintln!("    -m <limit>         miter limit (default: 10)");
            eprintln!("    -d <dash>          comma separated dash lengths");
            eprintln!("    -s <styles.json>   load line styles from JSON file");
            eprintln!("    <file.path>        file containing SVG path ('-' means stdin)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

/// Load shape from the file
fn shape_load(path: &str) -> Result<Shape, Error> {
    let shape = if path != "-" {
        Shape::read_svg_path(File::open(path)?)?
    } else {
        Shape::read_svg_path(std::io::stdin().lock())?
    };
    Ok(shape)
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let mut shape = shape_load(&args.input_file)?;
    if !args.styles.line_dash.is_empty() {
        // stroking ignores dashes, split the shape first
        shape = shape.dashed(&args.styles.line_dash, args.styles.line_dash_offset);
    }
    let stroke = shape.stroked_shape(&args.styles);
    eprintln!("stroke bbox: {:?}", stroke.bbox());
    eprintln!("stroke area: {}", stroke.signed_area().abs());
    stroke.write_svg_path(std::io::stdout().lock())?;
    println!();
    Ok(())
}
