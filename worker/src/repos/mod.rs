pub mod activities;
pub mod activity_streams;
pub mod weather_results;

use tokio_postgres::Row;

pub fn from_rows<A>(rows: Vec<Row>) -> Result<Vec<A>, tokio_postgres::Error>
where
    A: for<'a> TryFrom<&'a Row, Error = tokio_postgres::Error>,
{
    rows.iter().map(|row| A::try_from(row)).collect()
}
