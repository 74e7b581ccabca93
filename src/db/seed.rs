//! Sample legacy and modern databases for demos and tests.
//!
//! The legacy schema uses abbreviated Portuguese identifiers; the modern one
//! carries the same data under clean English names.

use super::DatabaseError;
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

const LEGACY_SCHEMA: &str = "
CREATE TABLE tb_cli_reg (
    id_cli INTEGER PRIMARY KEY,
    c_nom TEXT NOT NULL,
    c_email TEXT,
    dt_nasc DATE,
    tel_cel TEXT,
    end_rua TEXT,
    end_cep TEXT
);
CREATE TABLE tb_vendas_hdr (
    id_vnd INTEGER PRIMARY KEY,
    id_cli INTEGER,
    dt_vnd DATE NOT NULL,
    vl_tot DECIMAL(10,2),
    st_vnd TEXT,
    FOREIGN KEY (id_cli) REFERENCES tb_cli_reg(id_cli)
);
CREATE TABLE tb_prod_cat (
    id_prod INTEGER PRIMARY KEY,
    nm_prod TEXT NOT NULL,
    desc_prod TEXT,
    preco_unit DECIMAL(8,2),
    qtd_est INTEGER
);
INSERT INTO tb_cli_reg VALUES (1, 'João Silva', 'joao@email.com', '1985-03-15', '11999887766', 'Rua das Flores 123', '01234-567');
INSERT INTO tb_vendas_hdr VALUES (1, 1, '2023-12-01', 299.99, 'CONF');
INSERT INTO tb_prod_cat VALUES (1, 'Notebook Dell', 'Laptop para escritório', 2500.00, 10);
";

const MODERN_SCHEMA: &str = "
CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    email_address TEXT,
    birth_date DATE,
    phone_number TEXT,
    street_address TEXT,
    postal_code TEXT
);
CREATE TABLE orders (
    order_id INTEGER PRIMARY KEY,
    customer_id INTEGER,
    order_date DATE NOT NULL,
    total_amount DECIMAL(10,2),
    order_status TEXT,
    FOREIGN KEY (customer_id) REFERENCES customers(customer_id)
);
CREATE TABLE products (
    product_id INTEGER PRIMARY KEY,
    product_name TEXT NOT NULL,
    product_description TEXT,
    unit_price DECIMAL(8,2),
    stock_quantity INTEGER
);
";

fn create(path: &Path, sql: &str) -> Result<(), DatabaseError> {
    if path.exists() {
        return Err(DatabaseError::AlreadyExists(
            path.to_string_lossy().to_string(),
        ));
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(sql)?;
    info!(path = %path.display(), "seeded database");
    Ok(())
}

/// Create the sample legacy database at `path`
pub fn seed_legacy<P: AsRef<Path>>(path: P) -> Result<(), DatabaseError> {
    create(path.as_ref(), LEGACY_SCHEMA)
}

/// Create the sample modern database at `path`
pub fn seed_modern<P: AsRef<Path>>(path: P) -> Result<(), DatabaseError> {
    create(path.as_ref(), MODERN_SCHEMA)
}

/// Load the legacy sample into an in-memory connection
pub fn legacy_in_memory() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(LEGACY_SCHEMA)?;
    Ok(conn)
}

/// Load the modern sample into an in-memory connection
pub fn modern_in_memory() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(MODERN_SCHEMA)?;
    Ok(conn)
}
