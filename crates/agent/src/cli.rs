use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config_path: PathBuf,
    /// Validate the config and exit.
    pub check: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Run(Args),
    Version,
    Help,
}

const USAGE: &str = "Usage: vigil_agent --config <PATH> [OPTIONS]\n\n\
Options:\n  \
-c, --config <PATH>  Configuration file path\n      \
--check          Validate the configuration and exit\n  \
-V, --version        Print version\n  \
-h, --help           Print help";

pub fn parse() -> Args {
    match parse_from(std::env::args().skip(1)) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Version) => {
            println!("vigil_agent {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            std::process::exit(0);
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    }
}

fn parse_from<I>(argv: I) -> Result<Parsed, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = argv.into_iter();
    let mut config_path = None;
    let mut check = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(Parsed::Version),
            "--help" | "-h" => return Ok(Parsed::Help),
            "--check" => check = true,
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path argument".to_string())?;
                config_path = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    let config_path = config_path.ok_or_else(|| "--config <path> is required".to_string())?;
    Ok(Parsed::Run(Args { config_path, check }))
}
