use crate::db;
use crate::models::ActivityStreams;

pub async fn by_activity<'a>(
    client: &db::Client<'a>,
    activity_id: i64,
) -> Result<Option<ActivityStreams>, tokio_postgres::Error> {
    let stmt = "SELECT activity_id, time, latlng FROM activity_streams \
                WHERE activity_id = $1 LIMIT 1";
    client
        .query_opt(stmt, &[&activity_id])
        .await?
        .as_ref()
        .map(|row| ActivityStreams::try_from(row))
        .transpose()
}
