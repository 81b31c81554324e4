use crate::db;
use crate::models::Activity;
use crate::repos::weather_results::WeatherTable;

pub async fn get<'a>(client: &db::Client<'a>, id: i64) -> Result<Option<Activity>, tokio_postgres::Error> {
    let stmt = "SELECT id, start_date FROM activity WHERE id = $1";
    client
        .query_opt(stmt, &[&id])
        .await?
        .as_ref()
        .map(|row| Activity::try_from(row))
        .transpose()
}

/// Activities with streams and no weather row yet, newest first.
pub async fn list_pending<'a>(
    client: &db::Client<'a>,
    table: &WeatherTable,
    limit: i64,
) -> Result<Vec<Activity>, tokio_postgres::Error> {
    let stmt = format!(
        "SELECT a.id, a.start_date FROM activity a \
         WHERE EXISTS (SELECT 1 FROM activity_streams s WHERE s.activity_id = a.id) \
         AND NOT EXISTS (SELECT 1 FROM {} w WHERE w.activity_id = a.id) \
         ORDER BY a.start_date DESC \
         LIMIT $1",
        table
    );
    let rows = client.query(stmt.as_str(), &[&limit]).await?;
    super::from_rows(rows)
}
