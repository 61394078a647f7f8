use crate::cli::{ConfigArgs, ConfigCommands};
use crate::config::PartialAppConfig;
use crate::error::Result;

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => handle_show(),
        ConfigCommands::Path => handle_path(),
    }
}

fn handle_show() -> Result<()> {
    print!("{}", PartialAppConfig::defaults().to_toml()?);
    Ok(())
}

fn handle_path() -> Result<()> {
    let path = PartialAppConfig::default_path()?;
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist; built-in defaults are used)");
    }
    Ok(())
}
