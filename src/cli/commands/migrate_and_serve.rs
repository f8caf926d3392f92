use anyhow::Result;
use tracing::{info, trace};

use super::{init_database, serve};

pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations before startup");

    init_database(database_url).await?;
    serve(database_url, bind_address).await
}
