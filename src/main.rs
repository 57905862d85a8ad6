use clap::Parser;
use sheet_optimizer::render;
use sheet_optimizer::{CutPiece, OptimizeOptions, SheetSize, optimize};

#[derive(Parser)]
#[command(
    name = "sheet_optimizer",
    about = "Nests rectangular pieces onto stock sheets with kerf and margin allowances"
)]
struct Cli {
    /// Stock sheets as WxH[:price] (e.g. 3050x2050:140)
    #[arg(long = "sheet", num_args = 1.., required = true)]
    sheets: Vec<String>,

    /// Material of every sheet (one material per run)
    #[arg(long, default_value = "")]
    material: String,

    /// Sheet thickness in mm
    #[arg(long, default_value_t = 0.0)]
    thickness: f64,

    /// Cut pieces as [id=]WxH:qty[:fixed] (e.g. door=800x600:3 400x300:5:fixed)
    #[arg(long = "cuts", num_args = 1.., required = true)]
    cuts: Vec<String>,

    /// Blade kerf in mm
    #[arg(long, default_value_t = OptimizeOptions::DEFAULT_BLADE_KERF)]
    kerf: u32,

    /// Unusable border along each sheet edge in mm
    #[arg(long, default_value_t = OptimizeOptions::DEFAULT_MARGIN)]
    margin: u32,

    /// Cutting speed in mm/min, used for the time estimate
    #[arg(long, default_value_t = OptimizeOptions::DEFAULT_CUTTING_SPEED_MM_PER_MIN)]
    speed: f64,

    /// Disable rotation for every piece
    #[arg(long)]
    no_rotate: bool,

    /// Show an ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Print the full result as JSON instead of a cut-list
    #[arg(long, conflicts_with = "layout")]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid dimensions '{}', expected WxH", s))?;
    let width = w
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = h
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok((width, height))
}

fn parse_sheet(s: &str, material: &str, thickness: f64) -> Result<SheetSize, String> {
    let (dims, price) = match s.split_once(':') {
        Some((dims, price)) => {
            let price = price
                .parse::<f64>()
                .map_err(|_| format!("invalid price in '{}'", s))?;
            (dims, price)
        }
        None => (s, 0.0),
    };
    let (width, height) = parse_dimensions(dims)?;
    Ok(SheetSize {
        width,
        height,
        material: material.to_string(),
        thickness,
        price_per_sheet: price,
    })
}

fn parse_cut(s: &str, index: usize, allow_rotate: bool) -> Result<CutPiece, String> {
    let (id, rest) = match s.split_once('=') {
        Some((id, rest)) => (id.to_string(), rest),
        None => (format!("P{}", index + 1), s),
    };
    let parts: Vec<&str> = rest.split(':').collect();
    let (dims, qty, fixed) = match parts.as_slice() {
        [dims, qty] => (*dims, *qty, false),
        [dims, qty, "fixed"] => (*dims, *qty, true),
        _ => return Err(format!("invalid cut '{}', expected [id=]WxH:qty[:fixed]", s)),
    };
    let (width, height) = parse_dimensions(dims)?;
    let quantity = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(CutPiece {
        id,
        width,
        height,
        quantity,
        can_rotate: allow_rotate && !fixed,
        label: None,
    })
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let sheets: Vec<SheetSize> = cli
        .sheets
        .iter()
        .map(|s| parse_sheet(s, &cli.material, cli.thickness))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let pieces: Vec<CutPiece> = cli
        .cuts
        .iter()
        .enumerate()
        .map(|(i, c)| parse_cut(c, i, !cli.no_rotate))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let options = OptimizeOptions {
        blade_kerf: cli.kerf,
        margin: cli.margin,
        cutting_speed_mm_per_min: cli.speed,
    };

    let result = optimize(&sheets, &pieces, &options).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.layout {
        for (i, layout) in result.sheets.iter().enumerate() {
            println!("Sheet {}:", i + 1);
            print!("{}", render::render_sheet(layout));
            println!();
        }
    }
    print!("{}", render::cut_list(&result));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet() {
        let sheet = parse_sheet("3050x2050:140.5", "PMMA", 3.0).unwrap();
        assert_eq!((sheet.width, sheet.height), (3050, 2050));
        assert_eq!(sheet.price_per_sheet, 140.5);
        assert_eq!(sheet.material, "PMMA");

        let sheet = parse_sheet("1000x500", "", 0.0).unwrap();
        assert_eq!(sheet.price_per_sheet, 0.0);

        assert!(parse_sheet("1000", "", 0.0).is_err());
        assert!(parse_sheet("1000x500:cheap", "", 0.0).is_err());
    }

    #[test]
    fn test_parse_cut() {
        let cut = parse_cut("door=800x600:3", 0, true).unwrap();
        assert_eq!(cut.id, "door");
        assert_eq!((cut.width, cut.height, cut.quantity), (800, 600, 3));
        assert!(cut.can_rotate);

        let cut = parse_cut("400x300:5:fixed", 1, true).unwrap();
        assert_eq!(cut.id, "P2");
        assert!(!cut.can_rotate);

        let cut = parse_cut("400x300:5", 2, false).unwrap();
        assert!(!cut.can_rotate);

        assert!(parse_cut("400x300", 0, true).is_err());
        assert!(parse_cut("400x300:5:sideways", 0, true).is_err());
        assert!(parse_cut("400x300:many", 0, true).is_err());
    }
}
