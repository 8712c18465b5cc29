use pathliner::{FlattenOptions, Matrix};

pub const HELP: &str = "pathliner

USAGE:
    pathliner [OPTIONS] [INPUT]

OPTIONS:
    -h, --help\t\t\tPrint this message
    --dash <a,b,...>\t\tDash pattern (alternating dash and gap lengths)
    --dash-offset <x>\t\tPhase offset of the dash pattern
    --stroke-width <w>\t\tReturn stroke outlines of width w
    --scale <s>\t\t\tScale the drawing by s
    --flip-y\t\t\tMirror the drawing vertically

INPUT is an SVG file or SVG text, stdin is read if it is missing.

Returns a 3D JSON array.";

fn parse_number(flag: &str, value: Option<String>) -> Result<f64, Box<dyn std::error::Error>> {
    let value = value.ok_or_else(|| format!("Missing value for {}", flag))?;
    value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid value for {}: {}", flag, e).into())
}

fn main() {
    fn inner() -> Result<(), Box<dyn std::error::Error>> {
        let mut input = None;
        let mut options = FlattenOptions::default();
        let mut dash: Vec<f64> = Vec::new();
        let mut dash_offset = 0.0;
        let mut scale = 1.0;
        let mut flip_y = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => {
                    println!("{}", HELP);
                    return Ok(());
                }
                "--dash" => {
                    let value = args.next().ok_or("Missing value for --dash")?;
                    dash = value
                        .split(',')
                        .map(|len| parse_number("--dash", Some(len.to_string())))
                        .collect::<Result<_, _>>()?;
                }
                "--dash-offset" => dash_offset = parse_number("--dash-offset", args.next())?,
                "--stroke-width" => {
                    options = options.with_stroke_width(parse_number("--stroke-width", args.next())?);
                }
                "--scale" => scale = parse_number("--scale", args.next())?,
                "--flip-y" => flip_y = true,
                _ => {
                    input = Some(arg);
                }
            }
        }

        let mut transform = Matrix::from_scale(scale, scale);
        if flip_y {
            transform.scale(1.0, -1.0);
        }
        options = options
            .with_transform(transform)
            .with_dashes(dash_offset, dash);

        let mut input = if let Some(input) = input {
            input
        } else {
            let mut buffer = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
            buffer
        };

        if std::path::Path::new(&input).exists() {
            input = std::fs::read_to_string(&input)?;
        }

        let lines = pathliner::parse(&input, &options)?;

        let lines_len = lines.len();

        let mut out = String::with_capacity(lines_len * 36);

        out.push_str("[\r\n");

        for (idx, line) in lines.into_iter().enumerate() {
            out.push_str("  [\r\n");
            let line_len = line.len();
            for (idx, pathliner::CoordinatePair { x, y }) in line.into_iter().enumerate() {
                out.push_str(&format!("    [{}, {}]", x, y));
                if idx != (line_len - 1) {
                    out.push(',');
                }
                out.push_str("\r\n");
            }
            out.push_str("  ]");
            if idx != (lines_len - 1) {
                out.push(',');
            }
            out.push_str("\r\n");
        }
        out.push(']');

        println!("{}", out);

        Ok(())
    }

    if let Err(e) = inner() {
        eprintln!("{}", e);
        std::process::exit(2);
    }
}
