use asset_sqlite::{DataAccess, DirContext, ParamValue};
use rusqlite::Connection;
use tempfile::TempDir;

struct Fixture {
    assets: TempDir,
    storage: TempDir,
    data: DataAccess,
}

fn fixture() -> Fixture {
    let assets = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    let conn = Connection::open(assets.path().join("app.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE t (a INTEGER, b TEXT);
         CREATE TABLE typed (i INTEGER, f REAL, t TEXT, b BLOB, n TEXT);",
    )
    .unwrap();
    drop(conn);

    let data = DataAccess::new(DirContext::new(assets.path(), storage.path()));
    Fixture {
        assets,
        storage,
        data,
    }
}

#[tokio::test]
async fn insert_then_select_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let fx = fixture();

    let inserted = fx
        .data
        .execute(
            "app.db",
            "INSERT INTO t VALUES (?, ?)",
            &[ParamValue::Int(1), ParamValue::Text("a".into())],
        )
        .await?;
    assert!(!inserted.is_err(), "unexpected error: {:?}", inserted.error);

    let selected = fx.data.execute("app.db", "SELECT * FROM t", &[]).await?;
    assert!(!selected.is_err());
    assert_eq!(selected.column_names, vec!["a", "b"]);
    assert_eq!(selected.rows, vec![vec!["1", "a"]]);
    Ok(())
}

#[tokio::test]
async fn typed_values_read_back_in_string_form() -> Result<(), Box<dyn std::error::Error>> {
    let fx = fixture();

    let inserted = fx
        .data
        .mutate(
            "app.db",
            "INSERT INTO typed VALUES (?, ?, ?, ?, ?)",
            &[
                ParamValue::Int(7),
                ParamValue::Float(3.5),
                ParamValue::Text("x".into()),
                ParamValue::Blob(b"bin".to_vec()),
                ParamValue::Null,
            ],
        )
        .await?;
    assert!(!inserted.is_err(), "unexpected error: {:?}", inserted.error);

    let selected = fx
        .data
        .query("app.db", "SELECT i, f, t, b, n FROM typed", &[])
        .await?;
    assert_eq!(selected.rows, vec![vec!["7", "3.5", "x", "bin", ""]]);
    assert_eq!(selected.get(0, "f"), Some("3.5"));
    Ok(())
}

#[tokio::test]
async fn first_access_copies_the_asset_into_storage() -> Result<(), Box<dyn std::error::Error>> {
    let fx = fixture();

    assert!(!fx.storage.path().join("app.db").exists());
    fx.data.query("app.db", "SELECT * FROM t", &[]).await?;
    assert!(fx.storage.path().join("app.db").exists());
    Ok(())
}

#[tokio::test]
async fn later_accesses_reuse_the_handle_without_recopying(
) -> Result<(), Box<dyn std::error::Error>> {
    let fx = fixture();

    fx.data
        .mutate(
            "app.db",
            "INSERT INTO t VALUES (?, ?)",
            &[ParamValue::Int(9), ParamValue::Text("kept".into())],
        )
        .await?;

    // A re-copy from the pristine asset would make this row vanish.
    let selected = fx
        .data
        .query(
            "app.db",
            "SELECT b FROM t WHERE a = ?",
            &[ParamValue::Int(9)],
        )
        .await?;
    assert_eq!(selected.rows, vec![vec!["kept"]]);

    // The bundled asset itself is never written to.
    let asset = Connection::open(fx.assets.path().join("app.db"))?;
    let asset_rows: i64 = asset.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?;
    assert_eq!(asset_rows, 0);
    Ok(())
}

#[tokio::test]
async fn parameterized_reads_bind_string_coerced_values(
) -> Result<(), Box<dyn std::error::Error>> {
    let fx = fixture();

    for (a, b) in [(1, "one"), (2, "two")] {
        fx.data
            .mutate(
                "app.db",
                "INSERT INTO t VALUES (?, ?)",
                &[ParamValue::Int(a), ParamValue::Text(b.into())],
            )
            .await?;
    }

    let selected = fx
        .data
        .query(
            "app.db",
            "SELECT b FROM t WHERE a = ?",
            &[ParamValue::Int(2)],
        )
        .await?;
    assert_eq!(selected.rows, vec![vec!["two"]]);
    Ok(())
}
