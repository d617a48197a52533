use std::env::var;
use gdsro::{Attachment, Config, Result, gds::info};

pub async fn main() -> Result<()> {
    let config = Config::parse(&var("DATABASE_URL").unwrap())?;
    let db = Attachment::open(&config).await?;
    assert!(db.is_valid().await);
    db.detach().await?;
    assert!(!db.is_valid().await);

    let db = Attachment::open(&Config::from_env()).await?;
    tracing::info!(version = db.protocol_version(), "attached");

    for item in db.info_items(&[info::PAGE_SIZE, info::DB_SQL_DIALECT]).await? {
        let (item, value) = item?;
        tracing::info!(item, value = gdsro::info::vax_integer(&value), "database info");
    }

    db.on_warning(|w| tracing::warn!("{w}"));

    // detach twice is fine
    db.detach().await?;
    db.detach().await?;

    Ok(())
}
