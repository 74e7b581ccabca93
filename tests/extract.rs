use rusqlite::Connection;
use sqmap::db::{self, seed, Database, DatabaseError};
use sqmap::types::ColumnInfo;

#[test]
fn extracts_seeded_legacy_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed::seed_legacy(&path).unwrap();

    let snapshot = db::extract_path(&path).unwrap();
    let names: Vec<&str> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["tb_cli_reg", "tb_vendas_hdr", "tb_prod_cat"]);
    assert_eq!(snapshot.column_count(), 17);

    let clients = snapshot.table("tb_cli_reg").unwrap();
    assert_eq!(
        clients.columns[0],
        ColumnInfo {
            name: "id_cli".to_string(),
            data_type: "INTEGER".to_string(),
            nullable: true,
            is_primary_key: true,
            foreign_key_ref: None,
        }
    );
    let c_nom = clients.column("c_nom").unwrap();
    assert!(!c_nom.nullable);
    assert_eq!(c_nom.data_type, "TEXT");

    let sales = snapshot.table("tb_vendas_hdr").unwrap();
    assert_eq!(
        sales.column("id_cli").unwrap().foreign_key_ref.as_deref(),
        Some("tb_cli_reg.id_cli")
    );
    assert_eq!(sales.column("vl_tot").unwrap().data_type, "DECIMAL(10,2)");
}

#[test]
fn description_is_stable_across_extractions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed::seed_legacy(&path).unwrap();

    let first = db::extract_path(&path).unwrap();
    let second = db::extract_path(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.table("tb_vendas_hdr").unwrap().description(),
        "Table: tb_vendas_hdr\nColumns: id_vnd (INTEGER) [PRIMARY KEY], \
         id_cli (INTEGER) [FOREIGN KEY -> tb_cli_reg.id_cli], dt_vnd (DATE), \
         vl_tot (DECIMAL(10,2)), st_vnd (TEXT)"
    );
}

#[test]
fn empty_database_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE t (x INTEGER); DROP TABLE t;")
        .unwrap();

    let snapshot = db::extract_path(&path).unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn unreachable_source_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = db::extract_path(dir.path().join("nope.db")).err().unwrap();
    assert!(matches!(err, DatabaseError::NotFound(_)));

    let mapped: sqmap::MapperError = err.into();
    assert!(matches!(mapped, sqmap::MapperError::Connection(_)));
}

#[test]
fn in_memory_connection_can_be_wrapped() {
    let database = Database::from_connection(seed::modern_in_memory().unwrap());
    let snapshot = database.extract().unwrap();
    assert_eq!(snapshot.tables[0].name, "customers");
}
