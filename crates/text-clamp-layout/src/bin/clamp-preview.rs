use std::env;
use std::io::Read;
use std::process::ExitCode;

use text_clamp::{Clamp, ClampConfig, ClampEvent, Fragment, LineHeight, PassOutcome};
use text_clamp_layout::{FontFamily, WrapConfig, WrapOracle};

#[derive(Clone, Debug)]
struct Args {
    input: Option<String>,
    clamp: ClampConfig,
    wrap: WrapConfig,
    show_lines: bool,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cfg = parse_args(args)?;
    let markup = read_input(cfg.input.as_deref())?;
    let mut fragment = Fragment::from_markup(&markup).map_err(|e| e.to_string())?;
    let oracle = WrapOracle::new(cfg.wrap);

    let mut clamp = Clamp::new(cfg.clamp.clone());
    clamp.set_event_sink(|event| {
        if let ClampEvent::Diagnostic(diagnostic) = event {
            eprintln!("warning: {}", diagnostic);
        }
    });
    let outcome = clamp.on_attached(&mut fragment, &oracle);

    println!("{}", fragment.to_markup());
    if cfg.show_lines {
        for (idx, line) in oracle.layout_lines(&fragment).iter().enumerate() {
            eprintln!("{:>3} | {}", idx + 1, line);
        }
    }
    let label = match outcome {
        PassOutcome::NotAttempted => "not attempted",
        PassOutcome::Fits => "fits",
        PassOutcome::Truncated => "truncated",
        PassOutcome::NothingToTruncate => "nothing to truncate",
    };
    eprintln!(
        "outcome: {} (measurements={}, probes={})",
        label,
        oracle.measurements(),
        clamp.last_fit().map(|fit| fit.probes).unwrap_or(0)
    );
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).map_err(|e| format!("read {}: {}", path, e))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let has_positional_input = args.get(1).is_some_and(|v| !v.starts_with("--"));
    let mut cfg = Args {
        input: if has_positional_input {
            Some(args[1].clone())
        } else {
            None
        },
        clamp: ClampConfig::default(),
        wrap: WrapConfig::default(),
        show_lines: false,
    };

    let mut i = if has_positional_input { 2usize } else { 1usize };
    while i < args.len() {
        match args[i].as_str() {
            "--lines" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--lines requires a value".to_string())?;
                cfg.clamp.lines = Some(
                    v.parse::<i32>()
                        .map_err(|_| format!("invalid --lines value '{}'", v))?,
                );
                i += 2;
            }
            "--max-height" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--max-height requires a value".to_string())?;
                cfg.clamp.max_height = Some(
                    v.parse::<f32>()
                        .map_err(|_| format!("invalid --max-height value '{}'", v))?,
                );
                i += 2;
            }
            "--marker" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--marker requires a value".to_string())?;
                cfg.clamp.marker = v.clone();
                i += 2;
            }
            "--width" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--width requires a value".to_string())?;
                cfg.wrap.width_px = v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid --width value '{}'", v))?;
                i += 2;
            }
            "--font-size" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--font-size requires a value".to_string())?;
                cfg.wrap.font_size_px = v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid --font-size value '{}'", v))?;
                i += 2;
            }
            "--line-height" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--line-height requires a value".to_string())?;
                cfg.wrap.line_height = LineHeight::parse(v);
                i += 2;
            }
            "--mono" => {
                cfg.wrap.family = FontFamily::Monospace;
                i += 1;
            }
            "--show-lines" => {
                cfg.show_lines = true;
                i += 1;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"clamp-preview - clamp markup against the reference wrapping oracle

USAGE:
  cargo run -p text-clamp-layout --bin clamp-preview -- [input|-] [options]

OPTIONS:
  --lines <n>          maximum rendered lines (wins over --max-height)
  --max-height <px>    maximum rendered height
  --marker <text>      truncation marker (default: …)
  --width <px>         box width (default: 200)
  --font-size <px>     font size (default: 16)
  --line-height <v>    line height in px or "normal" (default: 20px)
  --mono               use the monospace width model
  --show-lines         print laid-out lines to stderr

Markup is read from stdin when no input path (or "-") is given.
"#
}
