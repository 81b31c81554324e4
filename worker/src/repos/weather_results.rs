use std::fmt;
use std::str::FromStr;

use weather_engine::WeatherResult;

use crate::db;

/// Name of the table weather results are written to. Only plain SQL identifiers
/// are accepted since the name is interpolated into statements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherTable(String);

impl WeatherTable {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WeatherTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let valid = s.len() <= 63
            && chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(WeatherTable(s.to_string()))
        } else {
            Err(format!("invalid table name: {:?}", s))
        }
    }
}

impl fmt::Display for WeatherTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// DDL for a weather table. Its name is configurable, so it is created here rather
/// than by a migration.
pub fn create_table_sql(table: &WeatherTable) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         activity_id BIGINT PRIMARY KEY REFERENCES activity (id) ON DELETE CASCADE, \
         temp TEXT NOT NULL, \
         wet_bulb TEXT NOT NULL, \
         wind_direction TEXT NOT NULL, \
         wind_speed TEXT NOT NULL, \
         apparent_temp TEXT NOT NULL, \
         humidity TEXT NOT NULL, \
         air_pressure TEXT NOT NULL, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
         )",
        table
    )
}

pub async fn create_table<'a>(client: &db::Client<'a>, table: &WeatherTable) -> Result<(), tokio_postgres::Error> {
    client.batch_execute(&create_table_sql(table)).await
}

/// Replaces the weather row of an activity in a single transaction.
pub async fn replace<'a>(
    client: &mut db::Client<'a>,
    table: &WeatherTable,
    result: &WeatherResult,
) -> Result<(), tokio_postgres::Error> {
    let tx = client.transaction().await?;
    tx.execute(
        format!("DELETE FROM {} WHERE activity_id = $1", table).as_str(),
        &[&result.activity_id],
    )
    .await?;
    tx.execute(
        format!(
            "INSERT INTO {} (activity_id, temp, wet_bulb, wind_direction, wind_speed, apparent_temp, humidity, air_pressure) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            table
        )
        .as_str(),
        &[
            &result.activity_id,
            &result.temp,
            &result.wet_bulb,
            &result.wind_direction,
            &result.wind_speed,
            &result.apparent_temp,
            &result.humidity,
            &result.air_pressure,
        ],
    )
    .await?;
    tx.commit().await
}
