use super::args::*;

pub mod employees;
pub mod watch;

use roster_core::{EmployeeResolver, RosterConfig};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;

    match cli.cmd {
        Command::List(args) => employees::list(&resolver(&config)?, args).await,
        Command::Get(args) => employees::get(&resolver(&config)?, args).await,
        Command::AnnualSalary(args) => employees::annual_salary(&resolver(&config)?, args).await,
        Command::Search(args) => employees::search(&resolver(&config)?, args),
        Command::UpdatedSince(args) => employees::updated_since(&resolver(&config)?, args),
        Command::Watch(args) => watch::run(config, args).await,
    }
}

/// File (if given) or defaults, then `ROSTER_*` env, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<RosterConfig> {
    let mut config = match &cli.config {
        Some(path) => RosterConfig::from_yaml_file(path)?,
        None => RosterConfig::from_env(),
    };

    if let Some(url) = &cli.upstream_url {
        config = config.with_upstream_url(url.clone());
    }
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }

    Ok(config)
}

fn resolver(config: &RosterConfig) -> anyhow::Result<EmployeeResolver> {
    Ok(EmployeeResolver::from_config(config)?)
}
