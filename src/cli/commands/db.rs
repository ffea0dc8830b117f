use serde_json::json;

use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::services::SeedService;

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = super::connect().await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(output_format, "Migrations applied", None)
}

pub async fn seed(records: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    if records == 0 {
        anyhow::bail!("--records must be greater than zero");
    }

    let pool = super::connect().await?;
    let summary = SeedService::new(pool).generate(records).await?;

    output_success(
        output_format,
        &format!("Generated {} records of each kind", records),
        Some(json!({
            "tags": summary.tags,
            "certificates": summary.certificates,
            "users": summary.users,
            "orders": summary.orders,
        })),
    )?;
    output_details(
        output_format,
        &[
            ("tags", summary.tags.to_string()),
            ("certificates", summary.certificates.to_string()),
            ("users", summary.users.to_string()),
            ("orders", summary.orders.to_string()),
        ],
    );
    Ok(())
}
