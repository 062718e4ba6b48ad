use crate::config::Config;
use crate::db::{self, LookupError};
use crate::types::{ErrorBody, LookupRequest, LookupResponse};
use log::{debug, error, info, warn};

#[derive(Debug)]
pub enum Outcome {
    Matched(LookupResponse),
    NoPlateNumber(ErrorBody),
    Unavailable(ErrorBody),
    Failed(LookupError),
}

/// Runs one lookup against the plate database. Blocking.
///
/// The connection is opened before the fields are checked and is closed
/// again before this returns, whatever the outcome.
pub fn check_plate(config: &Config, fields: &[(String, String)]) -> Outcome {
    let conn = match db::open(&config.database_path) {
        Ok(conn) => conn,
        Err(e) => {
            error!("{}", e);
            return Outcome::Unavailable(ErrorBody::connection_failed());
        }
    };

    let request = match LookupRequest::from_fields(fields) {
        Some(request) => request,
        None => {
            warn!("No plate number in request ({} fields)", fields.len());
            return Outcome::NoPlateNumber(ErrorBody::no_plate_number(fields, config.debug_echo));
        }
    };
    debug!(
        "Plate {} at ({}, {})-({}, {})",
        request.plate_number, request.x1, request.y1, request.x2, request.y2
    );

    match db::find_plates(&conn, &config.table, &request.plate_number) {
        Ok(results) => {
            info!(
                "Plate {} matched {} record(s)",
                request.plate_number,
                results.len()
            );
            Outcome::Matched(LookupResponse::new(request.plate_number, results))
        }
        Err(e) => Outcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::seed;
    use crate::types::PlateRecord;
    use std::path::PathBuf;

    fn config(database_path: PathBuf) -> Config {
        Config {
            listen_addr: ([127, 0, 0, 1], 0).into(),
            database_path,
            table: "license_plates".to_string(),
            debug_echo: false,
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matched() {
        let (_dir, path) = seed(&[("กข1234ต", Some("สมชาย"), Some("กรุงเทพ"))]);
        match check_plate(&config(path), &fields(&[("plate_number", "กข1234")])) {
            Outcome::Matched(response) => assert_eq!(
                response,
                LookupResponse {
                    plate_number: "กข1234".to_string(),
                    found: true,
                    results: vec![PlateRecord {
                        plate_number: "กข1234ต".to_string(),
                        owner_name: Some("สมชาย".to_string()),
                        province: Some("กรุงเทพ".to_string()),
                    }],
                }
            ),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn unreachable_store_wins_over_missing_plate() {
        let dir = tempfile::tempdir().unwrap();
        match check_plate(&config(dir.path().join("absent.db")), &[]) {
            Outcome::Unavailable(body) => assert_eq!(body, ErrorBody::connection_failed()),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn missing_plate_echo_follows_config() {
        let (_dir, path) = seed(&[]);
        let submitted = fields(&[("x1", "10")]);
        let mut config = config(path);

        match check_plate(&config, &submitted) {
            Outcome::NoPlateNumber(body) => assert_eq!(body.debug, None),
            other => panic!("unexpected outcome {:?}", other),
        }

        config.debug_echo = true;
        match check_plate(&config, &submitted) {
            Outcome::NoPlateNumber(body) => {
                assert_eq!(body, ErrorBody::no_plate_number(&submitted, true))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn query_fault() {
        let (_dir, path) = seed(&[]);
        let mut config = config(path);
        config.table = "missing_table".to_string();
        match check_plate(&config, &fields(&[("plate_number", "AB")])) {
            Outcome::Failed(LookupError::Query(_)) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
