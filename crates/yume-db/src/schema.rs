use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use std::error::Error;

/// Creates the journal table and its index if they do not exist yet.
///
/// Runs on every startup and is idempotent.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let ddl = match backend {
        DatabaseBackend::Postgres => include_str!("schema/postgres.sql"),
        DatabaseBackend::Sqlite => include_str!("schema/sqlite.sql"),
        other => return Err(DbErr::Custom(format!("unsupported database backend: {other:?}"))),
    };

    for statement in ddl.split(';').map(str::trim).filter(|statement| !statement.is_empty()) {
        db.execute(Statement::from_string(backend, statement.to_owned()))
            .await
            .inspect_err(|error| tracing::error!(error = error as &dyn Error, "failed to apply schema statement"))?;
    }
    Ok(())
}
