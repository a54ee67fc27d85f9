//! bitburst — interactive entry point.

use bitburst::app::{run, AppConfig};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║      bitburst — pop the bugs with one finger     ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "camera")]
    println!("  Mode: webcam + MediaPipe sidecar");
    #[cfg(not(feature = "camera"))]
    println!("  Mode: mouse simulation  (use --features camera for hardware)");
    println!();

    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("usage: bitburst [--seed N]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cfg) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn parse_args() -> Result<AppConfig, String> {
    let mut cfg = AppConfig::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--seed needs a value".to_string())?;
                let seed = value
                    .parse()
                    .map_err(|_| format!("bad seed: {}", value))?;
                cfg.seed = Some(seed);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(cfg)
}
