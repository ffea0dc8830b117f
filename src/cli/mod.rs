pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "giftcert")]
#[command(about = "Gift certificate store administration: migrations, seed data and admin accounts")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Generate random tags, certificates, users and orders")]
    Seed {
        #[arg(long, default_value_t = 10, help = "Number of records of each kind")]
        records: u32,
    },

    #[command(about = "Create a user holding ROLE_ADMIN")]
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::db::migrate(output_format).await,
        Commands::Seed { records } => commands::db::seed(records, output_format).await,
        Commands::CreateAdmin { username, email, password, name } => {
            let request = commands::user::AdminRequest { username, email, password, name };
            commands::user::create_admin(request, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seed_records() {
        let cli = Cli::try_parse_from(["giftcert", "--json", "seed", "--records", "25"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Seed { records: 25 }));
    }

    #[test]
    fn create_admin_requires_credentials() {
        assert!(Cli::try_parse_from(["giftcert", "create-admin", "--username", "root"]).is_err());

        let cli = Cli::try_parse_from([
            "giftcert", "create-admin", "--username", "root", "--email", "root@mail.com", "--password", "pw",
        ])
        .unwrap();
        match cli.command {
            Commands::CreateAdmin { username, name, .. } => {
                assert_eq!(username, "root");
                assert!(name.is_none());
            }
            _ => panic!("expected create-admin"),
        }
    }
}
