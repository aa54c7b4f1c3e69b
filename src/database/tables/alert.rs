use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use crate::database::domain::AlertRecord;


/// Inicializa la tabla `aqi_alert` en la base de datos si no existe.
///
/// Esta tabla almacena el historial de alertas de calidad de aire despachadas.
pub async fn create_table_alert(pool: &PgPool) -> Result<(), sqlx::Error>  {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS aqi_alert (
            id              BIGSERIAL PRIMARY KEY,
            user_id         BIGINT NOT NULL,
            city_id         BIGINT NOT NULL,
            city_name       TEXT NOT NULL,
            aqi             INTEGER NOT NULL,
            threshold       INTEGER NOT NULL,
            created_at      TIMESTAMPTZ NOT NULL
        );
        "#
    )
        .await?;
    Ok(())
}


/// Realiza una inserción masiva (batch) de alertas usando `QueryBuilder`.
///
/// # Argumentos
/// * `pool`: Pool de conexiones a Postgres.
/// * `data_vec`: Vector con las alertas a insertar.
pub async fn insert_alert(pool: &PgPool,
                          data_vec: Vec<AlertRecord>
) -> Result<(), sqlx::Error> {

    if data_vec.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO aqi_alert (
            user_id, city_id, city_name, aqi, threshold, created_at
        ) "
    );

    query_builder.push_values(data_vec, |mut b, data| {
        b.push_bind(data.user_id)
            .push_bind(data.city_id)
            .push_bind(data.city_name)
            .push_bind(data.aqi)
            .push_bind(data.threshold)
            .push_bind(data.created_at);
    });

    let query = query_builder.build();
    query.execute(pool).await?;

    Ok(())
}
