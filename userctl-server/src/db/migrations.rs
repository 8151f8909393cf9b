//! Schema for the users table

use sqlx::PgPool;

/// Create the users table if it does not exist
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running user migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR(40) PRIMARY KEY,
            username VARCHAR(100) NOT NULL,
            email VARCHAR(100) NOT NULL,
            phone VARCHAR(18) NOT NULL,
            date_of_birth DATE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS users_username_idx ON users (username)")
        .execute(pool)
        .await?;

    tracing::info!("User migrations complete");
    Ok(())
}
