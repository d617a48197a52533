use gdsro::{Attachment, Blob, Config, Result};

pub async fn main() -> Result<()> {
    let db = Attachment::open(&Config::from_env()).await?;
    let mut tx = db.begin().await?;

    let content = "lorem ipsum ".repeat(8000);

    let mut blob = Blob::create(&tx, None).await?;
    blob.write_all(content.as_bytes()).await?;
    let id = blob.id();
    blob.close().await?;

    let mut blob = Blob::open(&tx, id, None).await?;
    let read = blob.read_to_end().await?;
    blob.close().await?;

    assert_eq!(read, content.as_bytes());

    tx.rollback().await?;
    db.detach().await?;
    Ok(())
}
