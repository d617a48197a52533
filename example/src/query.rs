use futures::StreamExt;
use gdsro::{Attachment, Config, Result, SqlType, Sqlda, StatementType, XsqlVar};

pub async fn main() -> Result<()> {
    let db = Attachment::open(&Config::from_env()).await?;

    // Execute

    let mut tx = db.begin().await?;
    db.execute_immediate(&tx, "recreate table gdsro(id integer, name varchar(32))", None, None).await?;
    tx.commit().await?;

    let mut tx = db.begin().await?;
    let mut stmt = db.statement().await?;

    stmt.prepare(&tx, "insert into gdsro(id, name) values(?, ?)").await?;
    assert_eq!(stmt.statement_type(), Some(StatementType::Insert));

    let mut input: Sqlda = stmt.describe_bind().await?;
    for (id, name) in [(1, "Deez"), (2, "Foo")] {
        input.set(0, id);
        input.set(1, name);
        stmt.execute(&tx, Some(&input)).await?;
    }

    // insert returns no rows
    assert!(stmt.fetch().await?.is_none());
    tx.commit_retaining().await?;

    // Queries

    stmt.prepare(&tx, "select id, name from gdsro order by id").await?;
    stmt.execute(&tx, None).await?;

    let mut datas = vec![];
    while let Some(row) = stmt.fetch().await? {
        let (id, name): (i32, String) = row.decode()?;
        datas.push((id, name));
    }
    assert_eq!(datas.len(), 2);
    assert_eq!(datas[0].1.as_str(), "Deez");
    stmt.close().await?;

    stmt.execute(&tx, None).await?;
    let mut rows = stmt.rows_as::<(i32, String)>();
    while let Some(row) = rows.next().await {
        let (_id, _name) = row?;
    }
    drop(rows);
    stmt.close().await?;

    let count = Sqlda::from_vars(vec![XsqlVar::new(SqlType::Int64, 8)]);
    let row = db
        .execute_immediate(&tx, "select count(*) from gdsro", None, Some(&count))
        .await?;
    tracing::info!(?row, "inline");

    // Error case

    stmt.prepare(&tx, "select foo").await.unwrap_err();
    stmt.free(gdsro::FreeOption::Drop).await?;

    tx.commit().await?;
    tx.commit().await.unwrap_err();

    db.detach().await?;
    Ok(())
}
