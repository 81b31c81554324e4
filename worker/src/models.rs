use chrono::NaiveDateTime;
use tokio_postgres::Row;

#[derive(Clone, Debug)]
pub struct Activity {
    pub id: i64,
    pub start_date: NaiveDateTime,
}

impl TryFrom<&Row> for Activity {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Activity {
            id: row.try_get("id")?,
            start_date: row.try_get("start_date")?,
        })
    }
}

/// Raw recorded streams of an activity, as stored.
#[derive(Clone, Debug, Default)]
pub struct ActivityStreams {
    pub activity_id: i64,
    /// Comma-separated elapsed seconds
    pub time: Option<String>,
    /// `[lat, lon],[lat, lon],...`
    pub latlng: Option<String>,
}

impl TryFrom<&Row> for ActivityStreams {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(ActivityStreams {
            activity_id: row.try_get("activity_id")?,
            time: row.try_get("time")?,
            latlng: row.try_get("latlng")?,
        })
    }
}
